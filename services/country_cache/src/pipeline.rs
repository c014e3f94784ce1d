//! Refresh pipeline
//!
//! One run walks `Idle → Fetching → Reconciling → Persisting → Materializing`
//! and returns once the status singleton is committed. Materialization runs on
//! a detached task and moves the state back to `Idle` when it finishes. Any
//! failure before that point parks the pipeline in `Aborted`.
//!
//! Concurrent runs are not serialized; the store applies them
//! last-writer-wins.

use chrono::{DateTime, Utc};
use country_feed_adapter::{fetch_feeds, CountrySource, Feed};
use country_types::{CountryRecord, StatusRecord};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{CacheError, Result};
use crate::reconcile::{reconcile, MultiplierSource, RandomMultiplier};
use crate::status::StatusTracker;
use crate::store::CountryStore;
use crate::summary::{SummaryMaterializer, SummaryRenderer};

/// Per-feed fetch bound used when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Both feeds in flight
    Fetching,
    Reconciling,
    /// Writing rows, counting, updating status
    Persisting,
    /// Refresh committed, summary task running
    Materializing,
    /// Last run failed before committing
    Aborted(AbortReason),
}

/// Why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    SourceUnavailable(Feed),
    NoValidRecords,
    StoreFailure,
}

/// Result of a committed refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub total_countries: u64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Orchestrates fetch, reconcile, persist and the summary trigger
pub struct RefreshPipeline {
    source: Arc<dyn CountrySource>,
    store: Arc<dyn CountryStore>,
    status: StatusTracker,
    materializer: Arc<SummaryMaterializer>,
    multiplier: Arc<dyn MultiplierSource>,
    fetch_timeout: Duration,
    state: Arc<RwLock<PipelineState>>,
    materialization: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshPipeline {
    pub fn new(
        source: Arc<dyn CountrySource>,
        store: Arc<dyn CountryStore>,
        renderer: Arc<dyn SummaryRenderer>,
    ) -> Self {
        Self {
            source,
            status: StatusTracker::new(store.clone()),
            materializer: Arc::new(SummaryMaterializer::new(store.clone(), renderer)),
            store,
            multiplier: Arc::new(RandomMultiplier),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Arc::new(RwLock::new(PipelineState::Idle)),
            materialization: Mutex::new(None),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_multiplier(mut self, multiplier: Arc<dyn MultiplierSource>) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Size of the summary projection
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        let materializer =
            SummaryMaterializer::new(self.store.clone(), self.materializer.renderer())
                .with_top_n(top_n);
        self.materializer = Arc::new(materializer);
        self
    }

    pub fn state(&self) -> PipelineState {
        *self.state.read()
    }

    fn set_state(&self, next: PipelineState) {
        let mut state = self.state.write();
        debug!("Pipeline state {:?} -> {:?}", *state, next);
        *state = next;
    }

    fn abort(&self, reason: AbortReason, err: CacheError) -> CacheError {
        error!(?reason, "Refresh aborted: {}", err);
        self.set_state(PipelineState::Aborted(reason));
        err
    }

    /// Run one refresh and return the committed status.
    ///
    /// The summary is materialized in the background; its outcome never
    /// affects the result.
    #[tracing::instrument(skip(self))]
    pub async fn run_refresh(&self) -> Result<RefreshSummary> {
        let started_at = Utc::now();
        info!("Starting country refresh from {}", self.source.name());

        self.set_state(PipelineState::Fetching);
        let feeds = match fetch_feeds(self.source.as_ref(), self.fetch_timeout).await {
            Ok(feeds) => feeds,
            Err(e) => {
                let feed = e.feed();
                return Err(self.abort(AbortReason::SourceUnavailable(feed), e.into()));
            }
        };
        debug!(
            countries = feeds.countries.len(),
            rates = feeds.rates.len(),
            "Feeds fetched"
        );

        self.set_state(PipelineState::Reconciling);
        let reconciled = match reconcile(
            &feeds.countries,
            &feeds.rates,
            started_at,
            self.multiplier.as_ref(),
        ) {
            Ok(reconciled) => reconciled,
            Err(e) => return Err(self.abort(AbortReason::NoValidRecords, e)),
        };

        self.set_state(PipelineState::Persisting);
        let status = match self.persist(&reconciled.records, started_at).await {
            Ok(status) => status,
            Err(e) => return Err(self.abort(AbortReason::StoreFailure, e)),
        };

        self.set_state(PipelineState::Materializing);
        self.spawn_materialization(status.clone());

        info!(
            total_countries = status.total_countries,
            rejected = reconciled.rejected,
            "Country refresh complete"
        );
        Ok(RefreshSummary {
            total_countries: status.total_countries,
            last_refreshed_at: started_at,
        })
    }

    async fn persist(
        &self,
        records: &[CountryRecord],
        refreshed_at: DateTime<Utc>,
    ) -> Result<StatusRecord> {
        self.store.upsert_all(records).await?;
        info!("Upserted {} countries", records.len());

        let total = self.store.count().await?;
        self.status.record_refresh(total, refreshed_at).await
    }

    fn spawn_materialization(&self, status: StatusRecord) {
        let render = self.materializer.clone().spawn(status);
        let state = self.state.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = render.await {
                error!("Summary task panicked: {}", e);
            }

            // A newer run may already own the state
            let mut current = state.write();
            if *current == PipelineState::Materializing {
                *current = PipelineState::Idle;
            }
        });

        if let Some(previous) = self.materialization.lock().replace(handle) {
            debug!(
                "Replacing handle of earlier materialization (finished: {})",
                previous.is_finished()
            );
        }
    }

    /// Await the most recent materialization task, if any
    pub async fn wait_for_materialization(&self) {
        let handle = self.materialization.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Materialization task panicked: {}", e);
            }
        }
    }
}
