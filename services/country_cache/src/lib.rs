//! # Country Cache
//!
//! Locally queryable cache of country reference data enriched with an
//! estimated GDP.
//!
//! ## Refresh flow
//!
//! ```text
//! CountrySource ──► reconcile ──► CountryStore::upsert_all ──► StatusTracker
//!  (both feeds,      (merge,        (replace by name)            (live count)
//!   concurrent)       GDP, gate)                                      │
//!                                                                     ▼
//!                                          SummaryMaterializer (detached task)
//! ```
//!
//! [`RefreshPipeline::run_refresh`] returns once the status is committed.
//! Reads go through [`CountryQueryService`]. Both are written against the
//! [`CountryStore`] trait; [`MemoryStore`] is the bundled backend.

pub mod error;
pub mod pipeline;
pub mod query;
pub mod reconcile;
pub mod service;
pub mod status;
pub mod store;
pub mod summary;

pub use error::{CacheError, ErrorKind, Result, StoreError};
pub use pipeline::{AbortReason, PipelineState, RefreshPipeline, RefreshSummary};
pub use query::{CountryQueryService, ListParams};
pub use reconcile::{
    estimate_gdp, reconcile, FixedMultiplier, MultiplierSource, RandomMultiplier, Reconciled,
    Rejection, SeededMultiplier,
};
pub use service::CountryCacheService;
pub use status::StatusTracker;
pub use store::{CountryStore, MemoryStore};
pub use summary::{format_value, SummaryMaterializer, SummaryRenderer, SvgSummaryRenderer};
