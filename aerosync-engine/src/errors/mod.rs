mod telemetry;

pub use telemetry::TelemetryError;
