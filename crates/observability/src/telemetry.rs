//! Subscriber setup: env-filtered console output, plus OTLP span export when
//! an endpoint is configured (OpenTelemetry 0.31).

use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::ObservabilityConfig;
use crate::error::ObservabilityError;

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Install the global subscriber. Fails if one is already installed.
///
/// An unreachable OTLP endpoint is not an error: the exporter is skipped and
/// a warning is logged.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    let env_filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::Config(format!("invalid log filter '{level}': {e}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let fmt_layer = config
        .enable_console
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    let (otel_layer, otlp_error) = match &config.otlp_endpoint {
        Some(endpoint) => match build_tracer_provider(&config, endpoint) {
            Ok((tracer, provider)) => {
                global::set_tracer_provider(provider.clone());
                let _ = TRACER_PROVIDER.set(provider);
                (Some(OpenTelemetryLayer::new(tracer)), None)
            }
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ObservabilityError::InitFailed(e.to_string()))?;

    match (&config.otlp_endpoint, otlp_error) {
        (Some(endpoint), None) => {
            tracing::info!(service.name = %config.service_name, otlp.endpoint = %endpoint, "OTLP tracing enabled")
        }
        (Some(endpoint), Some(e)) => tracing::warn!(
            endpoint = %endpoint,
            error = %e,
            "Failed to initialize OTLP export, logging to console only"
        ),
        (None, _) => tracing::debug!(service.name = %config.service_name, "Console logging initialized"),
    }

    Ok(())
}

fn build_tracer_provider(
    config: &ObservabilityConfig,
    endpoint: &str,
) -> Result<(SdkTracer, SdkTracerProvider), ObservabilityError> {
    let mut attributes = vec![KeyValue::new("service.name", config.service_name.clone())];
    if let Some(version) = &config.service_version {
        attributes.push(KeyValue::new("service.version", version.clone()));
    }
    let resource = Resource::builder().with_attributes(attributes).build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.to_string())
        .build()
        .map_err(|e| ObservabilityError::InitFailed(e.to_string()))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    let tracer = provider.tracer(config.service_name.clone());

    Ok((tracer, provider))
}

/// Flush pending spans. Safe to call when OTLP was never enabled.
pub fn shutdown() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("failed to flush traces: {e}");
        }
    }
}
