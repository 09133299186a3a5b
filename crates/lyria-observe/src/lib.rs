//! Observability setup for Lyria: structured logging with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
