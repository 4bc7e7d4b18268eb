//! # Partials
//!
//! Fragment loading for a server-rendered dashboard: fetches HTML fragments
//! (sidebar, navbar, vendor-script bundle, ...) from the origin, splices
//! them into placeholder containers, and re-activates the scripts of one
//! designated container in source order.
//!
//! ## Modules
//!
//! - [`fragment`]: fragment requests, load errors, the HTTP fetcher
//! - [`script`]: script extraction and live script nodes
//! - [`document`]: the page seam and its in-memory implementation
//! - [`loader`]: concurrent load / inject / activate orchestration
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use partials::{HttpFetcher, LayoutLoader, PageDocument};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Arc::new(HttpFetcher::new(Some("http://localhost:5500"))?);
//!     let loader = LayoutLoader::new(fetcher);
//!
//!     let mut page = PageDocument::with_containers(["sidebar", "vendorjs"]);
//!     let sidebar_ready = loader.ready("sidebar");
//!
//!     let report = loader
//!         .load_layout_components(
//!             &mut page,
//!             [
//!                 ("sidebar", "/partials/sidebar.html"),
//!                 ("vendorjs", "/partials/vendor.html"),
//!             ],
//!         )
//!         .await;
//!
//!     println!("{} of {} fragments loaded", report.loaded().count(), report.len());
//!     sidebar_ready.wait(std::time::Duration::from_secs(1)).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod fragment;
pub mod loader;
pub mod logging;
pub mod script;

// Re-export top-level types for convenience
pub use fragment::{
    CredentialProvider, EnvToken, FragmentFetcher, FragmentRequest, FragmentResult, HttpFetcher,
    LoadError, LoadResult, NoCredentials, StaticToken,
};

pub use script::{extract_scripts, EmbeddedScript, ScriptNode};

pub use document::{Container, Document, DocumentSnapshot, PageDocument, ScriptHost};

pub use loader::{
    ContainerOutcome, ContainerReady, Injection, LayoutLoader, LoadMode, LoadReport, LoaderEvent,
    LoaderOptions, ReadyError, DEFAULT_ACTIVATION_CONTAINER,
};

pub use config::{generate_default_config, Config, ConfigError, LoaderConfig, LoggingConfig};
