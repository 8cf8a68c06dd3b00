//! Application state shared by the handlers.

use fuelsite_core::UploadServerConfig;
use fuelsite_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub max_file_size_bytes: usize,
}

impl AppState {
    pub fn new(config: &UploadServerConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_file_size_bytes: config.max_file_size_bytes,
        }
    }
}
