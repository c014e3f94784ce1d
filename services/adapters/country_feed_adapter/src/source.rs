//! Source trait and the concurrent two-feed fetch

use async_trait::async_trait;
use country_types::{RateTable, RawCountry};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Feed, Result, SourceError};

/// Access to the two external feeds.
///
/// Implementations translate transport problems into [`SourceError`] and
/// never retry; retry policy belongs to whoever triggers the refresh.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch the full country reference list
    async fn fetch_reference_data(&self) -> Result<Vec<RawCountry>>;

    /// Fetch USD-based exchange rates keyed by currency code
    async fn fetch_exchange_rates(&self) -> Result<RateTable>;
}

/// Both feeds, fetched together
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub countries: Vec<RawCountry>,
    pub rates: RateTable,
}

/// Fetch both feeds concurrently, each bounded by `timeout`.
///
/// Fails fast on the first feed error. The other in-flight fetch is dropped,
/// which cancels it, so no request outlives a failed refresh.
pub async fn fetch_feeds(source: &dyn CountrySource, timeout: Duration) -> Result<FeedSnapshot> {
    debug!("Fetching feeds from {} (timeout {:?})", source.name(), timeout);

    let reference = bounded(Feed::ReferenceData, timeout, source.fetch_reference_data());
    let rates = bounded(Feed::ExchangeRates, timeout, source.fetch_exchange_rates());

    let (countries, rates) = tokio::try_join!(reference, rates).map_err(|e| {
        warn!("Feed fetch failed ({}): {}", e.feed(), e);
        e
    })?;

    debug!(
        "Fetched {} countries and {} exchange rates",
        countries.len(),
        rates.len()
    );

    Ok(FeedSnapshot { countries, rates })
}

async fn bounded<T, F>(feed: Feed, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            feed,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
