//! # fnbind Config
//!
//! Typed configuration for fnbind services, loaded in layers from
//! defaults, a TOML or JSON file, and `FNBIND__SECTION__KEY` environment
//! variables.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//!
//! [decoder]
//! max_body_bytes = 65536
//! disallow_unknown_fields = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fnbind_config::ConfigLoader;
//!
//! # fn main() -> Result<(), fnbind_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("fnbind.toml")?
//!     .with_env_prefix("FNBIND")
//!     .load()?;
//!
//! let decoder = config.decoder.to_decoder();
//! let server = config.server.to_server_config();
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/fnbind-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::FnbindConfig;
pub use error::ConfigError;
pub use loader::{ConfigFormat, ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{DecoderSection, LogFormat, LoggingSection, MetricsSection, ServerSection};
