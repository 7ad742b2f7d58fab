/// Recoverable failures while loading historical data.
///
/// Nothing in the engine is fatal to the host process. Unresolvable
/// topics and non-finite readings are not errors at all: they are
/// dropped and counted. An error here means the offending module's
/// state was left untouched and the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid timestamp {value:?} in historical batch")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("empty dashboard payload for module {module_id}")]
    EmptyDashboard { module_id: String },
}
