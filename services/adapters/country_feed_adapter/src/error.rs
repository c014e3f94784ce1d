//! Error types for the feed adapter

use std::fmt;
use thiserror::Error;

/// Result type alias for feed operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// The two independent external feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Country reference data (names, capitals, populations, currencies)
    ReferenceData,
    /// USD-based exchange rates
    ExchangeRates,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::ReferenceData => "reference_data",
            Feed::ExchangeRates => "exchange_rates",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed could not deliver a usable payload.
///
/// Every variant names the feed that failed so callers can report which
/// upstream is down.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Request did not complete within the per-feed bound
    #[error("{feed} feed timed out after {timeout_ms}ms")]
    Timeout {
        feed: Feed,
        timeout_ms: u64,
    },

    /// Connection or transport failure
    #[error("{feed} feed unreachable: {reason}")]
    Transport {
        feed: Feed,
        reason: String,
    },

    /// Non-2xx response
    #[error("{feed} feed returned HTTP {status}")]
    HttpStatus {
        feed: Feed,
        status: u16,
    },

    /// Body did not have the expected shape
    #[error("{feed} feed returned a malformed payload: {reason}")]
    Malformed {
        feed: Feed,
        reason: String,
    },
}

impl SourceError {
    /// Which feed failed
    pub fn feed(&self) -> Feed {
        match self {
            SourceError::Timeout { feed, .. }
            | SourceError::Transport { feed, .. }
            | SourceError::HttpStatus { feed, .. }
            | SourceError::Malformed { feed, .. } => *feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_reports_its_feed() {
        let errors = [
            SourceError::Timeout {
                feed: Feed::ReferenceData,
                timeout_ms: 15_000,
            },
            SourceError::Transport {
                feed: Feed::ExchangeRates,
                reason: "connection refused".into(),
            },
            SourceError::HttpStatus {
                feed: Feed::ExchangeRates,
                status: 502,
            },
            SourceError::Malformed {
                feed: Feed::ReferenceData,
                reason: "expected array".into(),
            },
        ];

        let feeds: Vec<_> = errors.iter().map(SourceError::feed).collect();
        assert_eq!(
            feeds,
            vec![
                Feed::ReferenceData,
                Feed::ExchangeRates,
                Feed::ExchangeRates,
                Feed::ReferenceData
            ]
        );
        assert_eq!(errors[0].to_string(), "reference_data feed timed out after 15000ms");
        assert_eq!(errors[2].to_string(), "exchange_rates feed returned HTTP 502");
    }
}
