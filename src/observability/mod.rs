//! Logging and optional span export.
//!
//! Everything in the crate logs through `tracing`. [`init_tracing`] wires the
//! subscriber: human-readable lines on stderr, plus an OpenTelemetry pipeline
//! when a trace file is configured:
//!
//! ```text
//! tracing spans → tracing-opentelemetry → SDK tracer provider → JSON lines file
//! ```
//!
//! The trace file is capped in size and keeps one backup (`<file>.1`).
//!
//! # Configuration
//!
//! Filter directive precedence:
//! 1. `RUST_LOG`
//! 2. `trace_level` in [`Config`](crate::Config)
//! 3. `"info"`
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `tracer`: Tracer provider with the JSON-lines span exporter
//! - `span_formatter`: Span → JSON record
//! - `file_writer`: Size-capped line writer

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::init_tracing;
