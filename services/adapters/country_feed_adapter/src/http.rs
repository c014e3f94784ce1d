//! HTTP implementation of [`CountrySource`]
//!
//! Talks to a REST Countries style endpoint for reference data and an
//! open.er-api style endpoint for exchange rates. Only transport and payload
//! shape are checked here; record-level validation happens during
//! reconciliation.

use async_trait::async_trait;
use cache_config::FeedSettings;
use country_types::{RateTable, RawCountry};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{Feed, Result, SourceError};
use crate::source::CountrySource;

/// Exchange-rate endpoint response
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,

    #[serde(default, rename = "error-type")]
    error_type: Option<String>,

    #[serde(default)]
    rates: Option<RateTable>,
}

pub struct HttpCountrySource {
    client: reqwest::Client,
    reference_data_url: String,
    exchange_rates_url: String,
    timeout: Duration,
}

impl HttpCountrySource {
    /// Create a source for the given endpoints
    pub fn new(
        reference_data_url: impl Into<String>,
        exchange_rates_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            reference_data_url: reference_data_url.into(),
            exchange_rates_url: exchange_rates_url.into(),
            timeout,
        })
    }

    pub fn from_settings(settings: &FeedSettings) -> std::result::Result<Self, reqwest::Error> {
        Self::new(
            settings.reference_data_url.clone(),
            settings.exchange_rates_url.clone(),
            settings.timeout(),
            &settings.user_agent,
        )
    }

    async fn get_bytes(&self, feed: Feed, url: &str) -> Result<Vec<u8>> {
        debug!("GET {} ({})", url, feed);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(feed, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                feed,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(feed, e))?;

        Ok(body.to_vec())
    }

    fn transport_error(&self, feed: Feed, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout {
                feed,
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SourceError::Transport {
                feed,
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_reference_data(&self) -> Result<Vec<RawCountry>> {
        let body = self
            .get_bytes(Feed::ReferenceData, &self.reference_data_url)
            .await?;
        parse_reference_data(&body)
    }

    async fn fetch_exchange_rates(&self) -> Result<RateTable> {
        let body = self
            .get_bytes(Feed::ExchangeRates, &self.exchange_rates_url)
            .await?;
        parse_exchange_rates(&body)
    }
}

/// Parse the reference-data body: a JSON array of country entries
pub fn parse_reference_data(body: &[u8]) -> Result<Vec<RawCountry>> {
    serde_json::from_slice::<Vec<RawCountry>>(body).map_err(|e| SourceError::Malformed {
        feed: Feed::ReferenceData,
        reason: e.to_string(),
    })
}

/// Parse the exchange-rate body, requiring a `rates` object
pub fn parse_exchange_rates(body: &[u8]) -> Result<RateTable> {
    let malformed = |reason: String| SourceError::Malformed {
        feed: Feed::ExchangeRates,
        reason,
    };

    let response: RatesResponse =
        serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;

    // A body without `result` is accepted as long as it carries rates
    match response.result.as_deref() {
        None | Some("success") => {}
        Some(result) => {
            return Err(malformed(format!(
                "provider reported {}: {}",
                result,
                response.error_type.as_deref().unwrap_or("unknown")
            )));
        }
    }

    response
        .rates
        .ok_or_else(|| malformed("response has no rates object".to_string()))
}
