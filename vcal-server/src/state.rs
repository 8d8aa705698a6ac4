use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use vcal_core::LocalStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The durable copy of the events. Every client request goes through it,
    /// and its snapshot channel drives the broadcasts.
    pub store: Arc<LocalStore>,
}

impl AppState {
    pub async fn open(data_file: impl Into<PathBuf>) -> Result<Self> {
        let store = LocalStore::open(data_file).await?;
        Ok(AppState {
            store: Arc::new(store),
        })
    }
}
