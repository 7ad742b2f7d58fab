//! Per-module shared state, created lazily on first contact.

use std::collections::HashMap;
use std::sync::Arc;

use aerosync_api::models::DeviceStatusSnapshot;
use parking_lot::RwLock;

use super::SeriesStore;

/// State of one module: its assembled status snapshot and its series
/// buffers, independently lockable so a status fragment never blocks
/// a measurement for the same module.
#[derive(Debug)]
pub struct ModuleHandle {
    pub status: RwLock<DeviceStatusSnapshot>,
    pub series: RwLock<SeriesStore>,
}

impl ModuleHandle {
    fn new(series_capacity: usize) -> Self {
        Self {
            status: RwLock::new(DeviceStatusSnapshot::default()),
            series: RwLock::new(SeriesStore::new(series_capacity)),
        }
    }

    /// Owned copy of the current status snapshot.
    pub fn status_snapshot(&self) -> DeviceStatusSnapshot {
        self.status.read().clone()
    }
}

/// Registry of known modules, keyed by module id.
///
/// Modules are never pre-declared; the first message from an unknown
/// id creates its handle. Creation is exactly-once under concurrent
/// first contact.
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<ModuleHandle>>>,
    series_capacity: usize,
}

impl ModuleRegistry {
    pub fn new(series_capacity: usize) -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
            series_capacity,
        }
    }

    /// Handle for a module, creating it on first contact.
    pub fn get_or_create(&self, module_id: &str) -> Arc<ModuleHandle> {
        if let Some(handle) = self.modules.read().get(module_id) {
            return Arc::clone(handle);
        }

        let mut modules = self.modules.write();
        Arc::clone(
            modules
                .entry(module_id.to_owned())
                .or_insert_with(|| Arc::new(ModuleHandle::new(self.series_capacity))),
        )
    }

    pub fn get(&self, module_id: &str) -> Option<Arc<ModuleHandle>> {
        self.modules.read().get(module_id).cloned()
    }

    /// Known module ids, sorted for stable output.
    pub fn module_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.modules.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}
