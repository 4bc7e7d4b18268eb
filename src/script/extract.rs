//! Script extraction
//!
//! Scans injected fragment markup for `<script>` elements. Markup assigned
//! to a container's contents is inert, so the loader needs the scripts as
//! descriptors it can turn back into live nodes.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::EmbeddedScript;

/// Matches either an HTML comment or a complete script element.
/// Comments are matched first so scripts inside them are skipped. Quoted
/// attribute values may contain `>`.
fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?is)<!--.*?-->|<script\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</script\s*>"#,
        )
        .expect("script pattern is valid")
    })
}

/// One `name[=value]` pair of a start tag
fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\s*([^\s=/>]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s>]+))?"#)
            .expect("attribute pattern is valid")
    })
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|(quot|apos|lt|gt|amp));")
            .expect("entity pattern is valid")
    })
}

/// Extract every script element from `html`, in document order
///
/// - `src` may be double-quoted, single-quoted or bare
/// - an empty `src` falls back to the inline body
/// - unterminated script tags are ignored
pub fn extract_scripts(html: &str) -> Vec<EmbeddedScript> {
    script_pattern()
        .captures_iter(html)
        .filter_map(|caps| {
            // Comment branch has no capture groups
            let attributes = caps.get(1)?.as_str();
            let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            Some(match src_attribute(attributes) {
                Some(src) => EmbeddedScript::External { src },
                None => EmbeddedScript::Inline {
                    code: body.to_string(),
                },
            })
        })
        .collect()
}

/// Value of the first attribute named exactly `src`
fn src_attribute(attributes: &str) -> Option<String> {
    let raw = attribute_pattern()
        .captures_iter(attributes)
        .find(|caps| caps[1].eq_ignore_ascii_case("src"))?
        .get(2)
        .map(|m| unquote(m.as_str()))?
        .trim();

    if raw.is_empty() {
        None
    } else {
        Some(decode_entities(raw))
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Decode named and numeric character references in one pass.
/// References that do not name a valid character are left as written.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    entity_pattern()
        .replace_all(value, |caps: &Captures<'_>| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                match &caps[3] {
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    _ => Some('&'),
                }
            };

            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external(src: &str) -> EmbeddedScript {
        EmbeddedScript::External { src: src.into() }
    }

    fn inline(code: &str) -> EmbeddedScript {
        EmbeddedScript::Inline { code: code.into() }
    }

    #[test]
    fn test_vendor_bundle() {
        let html = r#"<script src="/lib/a.js"></script><script>window.__x=1</script>"#;
        assert_eq!(
            extract_scripts(html),
            vec![external("/lib/a.js"), inline("window.__x=1")]
        );
    }

    #[test]
    fn test_document_order_mixed() {
        let html = r#"
            <div class="vendor">
              <script>var s1 = 1;</script>
              <script type="text/javascript" src="/lib/chart.umd.js" defer></script>
              <p>between</p>
              <script>
                var s3 = s1 + 2;
              </script>
            </div>
        "#;

        let scripts = extract_scripts(html);
        assert_eq!(scripts.len(), 3);
        assert_eq!(scripts[0], inline("var s1 = 1;"));
        assert_eq!(scripts[1], external("/lib/chart.umd.js"));
        match &scripts[2] {
            EmbeddedScript::Inline { code } => assert_eq!(code.trim(), "var s3 = s1 + 2;"),
            other => panic!("expected inline script, got {:?}", other),
        }
    }

    #[test]
    fn test_quoting_styles_and_case() {
        let html = "<SCRIPT SRC='/a.js'></SCRIPT><script src=/b.js></script >";
        assert_eq!(extract_scripts(html), vec![external("/a.js"), external("/b.js")]);
    }

    #[test]
    fn test_entities_in_src_are_decoded() {
        let html = r#"<script src="/lib/app.js?v=2&amp;min=1"></script>"#;
        assert_eq!(extract_scripts(html), vec![external("/lib/app.js?v=2&min=1")]);
    }

    #[test]
    fn test_data_src_is_not_src() {
        let html = r#"<script data-src="/lazy.js">init()</script>"#;
        assert_eq!(extract_scripts(html), vec![inline("init()")]);
    }

    #[test]
    fn test_numeric_references_in_src_are_decoded() {
        let html = r#"<script src="/a.js?x=1&#38;y=2&#x26;z=3"></script>"#;
        assert_eq!(extract_scripts(html), vec![external("/a.js?x=1&y=2&z=3")]);
    }

    #[test]
    fn test_references_decode_once() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&#xD800;&bogus;"), "&#xD800;&bogus;");
    }

    #[test]
    fn test_gt_inside_quoted_attribute() {
        let html = r#"<script data-cfg="a>b">run()</script>"#;
        assert_eq!(extract_scripts(html), vec![inline("run()")]);

        let html = r#"<script data-cfg='x>y' src="/lib/c.js"></script>"#;
        assert_eq!(extract_scripts(html), vec![external("/lib/c.js")]);
    }

    #[test]
    fn test_src_inside_other_attribute_value() {
        let html = r#"<script data-note="see src=/evil.js">init()</script>"#;
        assert_eq!(extract_scripts(html), vec![inline("init()")]);
    }

    #[test]
    fn test_self_closing_slash_and_bare_flags() {
        let html = r#"<script async src=/lib/d.js /></script>"#;
        assert_eq!(extract_scripts(html), vec![external("/lib/d.js")]);
    }

    #[test]
    fn test_empty_src_is_inline() {
        let html = r#"<script src="">run()</script>"#;
        assert_eq!(extract_scripts(html), vec![inline("run()")]);
    }

    #[test]
    fn test_commented_out_scripts_are_skipped() {
        let html = r#"<!-- <script src="/old.js"></script> --><script src="/new.js"></script>"#;
        assert_eq!(extract_scripts(html), vec![external("/new.js")]);
    }

    #[test]
    fn test_unterminated_script_is_ignored() {
        assert!(extract_scripts("<div><script>let a = 1;</div>").is_empty());
    }

    #[test]
    fn test_markup_without_scripts() {
        assert!(extract_scripts("<nav><a href=\"/\">Home</a></nav>").is_empty());
        assert!(extract_scripts("").is_empty());
    }

    #[test]
    fn test_script_like_element_names_are_not_scripts() {
        let html = "<scripts>nope</scripts><noscript>fallback</noscript>";
        assert!(extract_scripts(html).is_empty());
    }
}
