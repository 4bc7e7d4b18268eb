//! Bearer token providers
//!
//! The token is owned by the surrounding page (login glue writes it, logout
//! clears it). Fetchers only ever read it through this trait.

use std::fmt;

/// Read-only source of an opaque bearer token
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` when the user is not signed in
    fn bearer_token(&self) -> Option<String>;
}

/// Provider that never yields a token
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Fixed token, mostly for tests and one-shot CLI runs
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Reads the token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this provider reads
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialProvider for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token() {
        assert_eq!(StaticToken::new("abc").bearer_token().as_deref(), Some("abc"));
        assert_eq!(StaticToken::new("").bearer_token(), None);
        assert_eq!(NoCredentials.bearer_token(), None);
    }

    #[test]
    fn test_static_token_debug_hides_secret() {
        let debug = format!("{:?}", StaticToken::new("secret"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_env_token() {
        let provider = EnvToken::new("PARTIALS_TEST_TOKEN_UNSET_9F2C");
        assert_eq!(provider.bearer_token(), None);
        assert_eq!(provider.var(), "PARTIALS_TEST_TOKEN_UNSET_9F2C");
    }
}
