//! Tracing subscriber setup.

use super::tracer;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_NAME: &str = "newsrank";

/// Installs the global tracing subscriber.
///
/// Layers:
/// 1. An [`EnvFilter`] built from `RUST_LOG`, else `config.trace_level`, else `"info"`
/// 2. A compact fmt layer writing to stderr
/// 3. When `config.trace_file` is set, an OpenTelemetry layer exporting spans
///    to that file as JSON lines
///
/// Never fails: an invalid filter falls back to `"info"`, an unusable trace
/// directory disables span export, and calls after the first are ignored.
///
/// # Example
///
/// ```rust
/// use newsrank::observability::init_tracing;
/// use newsrank::Config;
///
/// let config = Config {
///     trace_level: Some("newsrank=debug".to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let directive = resolve_filter(std::env::var("RUST_LOG").ok(), config.trace_level.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let otel_layer = config.trace_file.as_ref().and_then(|path| {
        let path = crate::infrastructure::expand_tilde(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).ok()?;
        }
        let provider = tracer::create_tracer_provider(path, SERVICE_NAME);
        Some(OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();
}

/// Filter directive precedence: non-empty `RUST_LOG`, then the configured level, then `"info"`.
fn resolve_filter(env: Option<String>, configured: Option<&str>) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_config() {
        assert_eq!(resolve_filter(Some("trace".into()), Some("warn")), "trace");
        assert_eq!(resolve_filter(Some("  ".into()), Some("warn")), "warn");
        assert_eq!(resolve_filter(None, None), "info");
    }
}
