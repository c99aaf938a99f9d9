//! OpenTelemetry tracer provider that exports spans to a JSON-lines file.

use super::file_writer::FileWriter;
use super::span_formatter::SpanFormatter;
use futures_util::future::BoxFuture;
use opentelemetry::trace::TraceError;
use opentelemetry::KeyValue;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Writes each exported span as one line via [`FileWriter`].
struct JsonLinesExporter {
    writer: FileWriter,
    formatter: SpanFormatter,
    is_shutdown: AtomicBool,
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Box::pin(std::future::ready(Err(TraceError::from("exporter is shut down"))));
        }

        let result = batch
            .iter()
            .try_for_each(|span| self.writer.write_line(&self.formatter.format_span(span).to_string()))
            .map_err(|e| TraceError::from(e.to_string()));
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for JsonLinesExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesExporter")
            .field("writer", &self.writer)
            .field("is_shutdown", &self.is_shutdown)
            .finish_non_exhaustive()
    }
}

/// Builds a provider whose spans are written to `file_path` as they finish.
///
/// Uses the simple (synchronous) span processor, so no runtime is needed and
/// nothing is lost if the process exits without shutting the provider down.
pub fn create_tracer_provider(file_path: PathBuf, service: &'static str) -> TracerProvider {
    let exporter = JsonLinesExporter {
        writer: FileWriter::new(file_path),
        formatter: SpanFormatter::new(service),
        is_shutdown: AtomicBool::new(false),
    };

    TracerProvider::builder()
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(Resource::new(vec![KeyValue::new("service.name", service)])),
        )
        .with_simple_exporter(exporter)
        .build()
}
