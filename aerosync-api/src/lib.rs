pub mod keys;
pub mod message;
pub mod models;
pub mod registry;
pub mod staleness;
pub mod thresholds;
