mod settings;

pub use settings::{Logger, Settings, Telemetry};
