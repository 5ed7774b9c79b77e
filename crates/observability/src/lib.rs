//! parley observability: one call to set up logging for the bot.
//!
//! ```no_run
//! use parley_observability::{init, ObservabilityConfig};
//!
//! init(ObservabilityConfig::from_env().with_version(env!("CARGO_PKG_VERSION")))?;
//! tracing::info!("Bot started");
//! parley_observability::shutdown();
//! # Ok::<(), parley_observability::ObservabilityError>(())
//! ```
//!
//! # Environment Variables
//!
//! - `PARLEY_LOG` or `RUST_LOG` - log filter
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` - enables OTLP span export
//! - `OTEL_SERVICE_NAME`, `OTEL_SERVICE_VERSION` - resource attributes

pub mod config;
pub mod error;
pub mod telemetry;
pub mod tracing;

pub use config::ObservabilityConfig;
pub use error::ObservabilityError;
pub use telemetry::{init, shutdown};
pub use tracing::{record_duration, record_error};
