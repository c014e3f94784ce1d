//! Raw payloads from the two external feeds.
//!
//! These mirror the upstream JSON loosely: every field the feed may omit is
//! optional so a single sparse entry never fails the whole payload.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exchange rates keyed by currency code, USD-based.
pub type RateTable = HashMap<String, f64>;

/// Country entry from the reference-data feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub capital: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub population: Option<u64>,

    #[serde(default)]
    pub flag: Option<String>,

    #[serde(default)]
    pub currencies: Option<Vec<RawCurrency>>,
}

impl RawCountry {
    /// Code of the first listed currency, if any.
    pub fn primary_currency_code(&self) -> Option<&str> {
        self.currencies
            .as_ref()
            .and_then(|currencies| currencies.first())
            .and_then(|currency| currency.code.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub symbol: Option<String>,
}
