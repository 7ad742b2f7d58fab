mod coordinator;
mod module_registry;
mod series_store;
mod status_aggregator;

pub use coordinator::{DashboardPayload, IngestSnapshot, ModuleDataCoordinator, RawPoint};
pub use module_registry::{ModuleHandle, ModuleRegistry};
pub use series_store::{DEDUP_TOLERANCE_MS, SeriesBuffer, SeriesStore};
pub use status_aggregator::{apply_fragment, merge_dashboard_status, record_measurement};
