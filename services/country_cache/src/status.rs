//! Status tracker for the global cache status singleton

use chrono::{DateTime, Utc};
use country_types::StatusRecord;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::store::CountryStore;

#[derive(Clone)]
pub struct StatusTracker {
    store: Arc<dyn CountryStore>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn CountryStore>) -> Self {
        Self { store }
    }

    /// Overwrite the singleton.
    ///
    /// `total_countries` must be the count just observed from the store after
    /// the upsert, not the size of the batch.
    pub async fn record_refresh(
        &self,
        total_countries: u64,
        refreshed_at: DateTime<Utc>,
    ) -> Result<StatusRecord> {
        let status = StatusRecord::new(total_countries, refreshed_at);
        self.store.save_status(&status).await?;
        debug!(total_countries, %refreshed_at, "Status updated");
        Ok(status)
    }

    /// Current status, or `{0, null}` before the first refresh
    pub async fn get_status(&self) -> Result<StatusRecord> {
        Ok(self.store.load_status().await?.unwrap_or_default())
    }
}
