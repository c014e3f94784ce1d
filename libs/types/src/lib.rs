//! # Country Cache Types
//!
//! Shared data model for the country cache workspace.
//!
//! - **Cached records**: [`CountryRecord`] and the [`StatusRecord`] singleton
//! - **Feed payloads**: [`RawCountry`] and [`RateTable`] as delivered by the
//!   reference-data and exchange-rate feeds, before reconciliation
//! - **Queries**: [`CountryQuery`] filter/sort description shared by the store
//!   gateway and the query layer
//!
//! Field names serialize in `snake_case` so persisted snapshots and API
//! responses keep the same shape as the upstream service.

pub mod country;
pub mod feed;
pub mod query;

pub use country::{name_key, CountryRecord, StatusRecord};
pub use feed::{RateTable, RawCountry, RawCurrency};
pub use query::{CountryFilter, CountryQuery, CountrySort, SortDirection, SortField};
