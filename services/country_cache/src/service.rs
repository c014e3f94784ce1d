//! Service wiring from configuration

use anyhow::{Context, Result};
use cache_config::CacheServiceConfig;
use country_feed_adapter::{CountrySource, HttpCountrySource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::CacheError;
use crate::pipeline::RefreshPipeline;
use crate::query::CountryQueryService;
use crate::store::{CountryStore, MemoryStore};
use crate::summary::SvgSummaryRenderer;

/// Pipeline and query layer sharing one store
pub struct CountryCacheService {
    pipeline: RefreshPipeline,
    queries: CountryQueryService,
    summary_path: PathBuf,
}

impl CountryCacheService {
    /// Build the HTTP-backed service described by `config`
    pub fn from_config(config: &CacheServiceConfig) -> Result<Self> {
        let source = HttpCountrySource::from_settings(&config.feeds)
            .context("failed to build HTTP client for feeds")?;

        let store = if config.store.persist_to_disk {
            let path = config.snapshot_path();
            info!("Opening country store at {:?}", path);
            MemoryStore::open(&path)
                .with_context(|| format!("failed to open country store at {path:?}"))?
        } else {
            info!("Country store persistence disabled");
            MemoryStore::new()
        };

        Ok(Self::with_parts(config, Arc::new(source), Arc::new(store)))
    }

    /// Build with an explicit source and store; feed URLs in `config` are ignored
    pub fn with_parts(
        config: &CacheServiceConfig,
        source: Arc<dyn CountrySource>,
        store: Arc<dyn CountryStore>,
    ) -> Self {
        let summary_path = config.summary.output_path.clone();
        let renderer = Arc::new(SvgSummaryRenderer::new(summary_path.clone()));

        let pipeline = RefreshPipeline::new(source, store.clone(), renderer)
            .with_fetch_timeout(config.feeds.timeout())
            .with_top_n(config.summary.top_n);

        Self {
            pipeline,
            queries: CountryQueryService::new(store),
            summary_path,
        }
    }

    pub fn pipeline(&self) -> &RefreshPipeline {
        &self.pipeline
    }

    pub fn queries(&self) -> &CountryQueryService {
        &self.queries
    }

    /// Where the summary artifact is written
    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// The summary path, once a refresh has rendered it
    pub fn existing_summary_path(&self) -> std::result::Result<&Path, CacheError> {
        if self.summary_path.is_file() {
            Ok(&self.summary_path)
        } else {
            Err(CacheError::SummaryNotFound(self.summary_path.clone()))
        }
    }
}
