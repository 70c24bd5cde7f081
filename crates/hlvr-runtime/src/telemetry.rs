//! Log and trace pipeline setup.
//!
//! Call [`init_tracing`] once at startup.  Every frame runs inside a `frame`
//! span, so with an OTLP collector attached each frame shows up as one trace
//! with the pose wait and protocol emission inside it.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). Enables the OTLP/HTTP span exporter. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `HLVR_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//!
//! # Example
//!
//! ```rust,no_run
//! let _guard = hlvr_runtime::telemetry::init_tracing("hlvr");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "HLVR_LOG_FORMAT";
/// Collector base URL; span export is off when unset.
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Install the global subscriber, with OTLP export when configured.
///
/// The returned guard flushes pending spans when dropped; keep it alive in
/// `main`.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());
    let provider = build_provider(service_name);

    // Disabled layers are `None`.
    let spans = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("hlvr")));
    let json_logs = json.then(|| tracing_subscriber::fmt::layer().json());
    let compact_logs = (!json).then(|| tracing_subscriber::fmt::layer().compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(spans)
        .with(json_logs)
        .with(compact_logs)
        .init();

    TracerProviderGuard(provider)
}

/// Shuts the tracer provider down, flushing spans, when dropped.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[hlvr] span export shutdown failed: {e}");
        }
    }
}

fn wants_json(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var(OTLP_ENDPOINT_ENV).ok()?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[hlvr] span exporter unavailable: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // The frame loop is synchronous; the batch exporter would need a
            // background runtime.
            .with_simple_exporter(exporter)
            .build(),
    )
}
