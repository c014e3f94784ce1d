//! Read-side entry points over the cache

use country_types::{CountryFilter, CountryQuery, CountryRecord, CountrySort, StatusRecord};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::status::StatusTracker;
use crate::store::CountryStore;

/// Raw list parameters as a routing layer receives them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    /// `"<field>_<direction>"`, e.g. `gdp_desc`
    pub sort: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ListParams {
    pub fn to_query(&self) -> CountryQuery {
        CountryQuery {
            filter: CountryFilter {
                region: non_blank(&self.region),
                currency_code: non_blank(&self.currency),
            },
            sort: non_blank(&self.sort).map(|s| {
                // Parsing is infallible; unknown parts fall back to defaults
                s.parse::<CountrySort>().unwrap_or_default()
            }),
            limit: None,
        }
    }
}

/// Query layer, read-only apart from single-record delete
#[derive(Clone)]
pub struct CountryQueryService {
    store: Arc<dyn CountryStore>,
    status: StatusTracker,
}

impl CountryQueryService {
    pub fn new(store: Arc<dyn CountryStore>) -> Self {
        Self {
            status: StatusTracker::new(store.clone()),
            store,
        }
    }

    pub async fn list_countries(&self, params: &ListParams) -> Result<Vec<CountryRecord>> {
        let query = params.to_query();
        let rows = self.store.find_all(&query).await?;
        debug!(?query, rows = rows.len(), "Listed countries");
        Ok(rows)
    }

    /// Case-insensitive lookup
    pub async fn get_country(&self, name: &str) -> Result<CountryRecord> {
        self.store
            .find_by_name(name)
            .await?
            .ok_or_else(|| CacheError::not_found(name))
    }

    /// Delete by name, `NotFound` when nothing matches
    pub async fn delete_country(&self, name: &str) -> Result<()> {
        if self.store.find_by_name(name).await?.is_none() {
            return Err(CacheError::not_found(name));
        }

        self.store.delete_by_name(name).await?;
        info!("Deleted country '{}'", name);
        Ok(())
    }

    pub async fn get_status(&self) -> Result<StatusRecord> {
        self.status.get_status().await
    }
}
