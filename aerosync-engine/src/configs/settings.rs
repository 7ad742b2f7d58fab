use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

/// Telemetry engine tuning.
///
/// Two deployment contexts share the engine: the dashboard keeps a
/// deep history per channel, the card view only a short tail. Both
/// capacities are configuration, never hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// Series capacity for dashboard consumers
    pub history_capacity: usize,
    /// Series capacity for lightweight live views
    pub live_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub telemetry: Telemetry,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Config::builder()
            .set_default("logger.level", "info")?
            .set_default("telemetry.history_capacity", 5000_i64)?
            .set_default("telemetry.live_capacity", 100_i64)?
            .add_source(File::with_name("configs/default").required(false))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::default().separator("_"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_files() {
        let settings = Settings::new().unwrap();

        assert_eq!(settings.telemetry.history_capacity, 5000);
        assert_eq!(settings.telemetry.live_capacity, 100);
        assert_eq!(settings.logger.level, "info");
    }
}
