//! Cache store gateway
//!
//! [`CountryStore`] is the narrow data-access contract the pipeline and the
//! query layer are written against. Any backend honouring it can be passed
//! in; [`MemoryStore`] is the bundled one.
//!
//! Contract notes:
//! - names are unique case-insensitively ([`country_types::name_key`])
//! - `upsert_all` overwrites matching rows and inserts new ones; rows absent
//!   from the batch stay untouched. A failure part-way through may leave the
//!   batch partially applied.
//! - `find_all` follows [`CountryQuery::apply`] semantics, including dropping
//!   rows with no GDP estimate when sorting by GDP
//! - `delete_by_name` succeeds when nothing matched and reports whether a row
//!   was removed

use async_trait::async_trait;
use country_types::{CountryQuery, CountryRecord, StatusRecord};

use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Replace-by-key bulk write
    async fn upsert_all(&self, records: &[CountryRecord]) -> Result<(), StoreError>;

    /// Exact live row count
    async fn count(&self) -> Result<u64, StoreError>;

    /// Filtered, sorted read
    async fn find_all(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>, StoreError>;

    /// Case-insensitive exact lookup
    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>, StoreError>;

    /// Case-insensitive delete; `Ok(false)` when no row matched
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Overwrite the status singleton
    async fn save_status(&self, status: &StatusRecord) -> Result<(), StoreError>;

    /// Read the status singleton, `None` before the first refresh
    async fn load_status(&self) -> Result<Option<StatusRecord>, StoreError>;
}
