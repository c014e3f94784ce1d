//! Persisted entities: one [`CountryRecord`] per country and the global
//! [`StatusRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-insensitive uniqueness key for a country name.
///
/// Every lookup, upsert and delete goes through this so `"FRANCE"` and
/// `"france"` address the same row.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One cached country, produced by reconciliation and owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// Display name, unique case-insensitively
    pub name: String,

    pub capital: Option<String>,

    pub region: Option<String>,

    pub population: u64,

    /// ISO-4217 style code of the first listed currency
    pub currency_code: Option<String>,

    /// Units of `currency_code` per USD
    pub exchange_rate: Option<f64>,

    /// Derived estimate, `None` when population or rate are unavailable
    pub estimated_gdp: Option<f64>,

    pub flag_url: Option<String>,

    /// Start time of the refresh that last wrote this record
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRecord {
    /// Store key for this record.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Global cache status. Exactly one logical instance exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusRecord {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn new(total_countries: u64, last_refreshed_at: DateTime<Utc>) -> Self {
        Self {
            total_countries,
            last_refreshed_at: Some(last_refreshed_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_ignores_case_and_padding() {
        assert_eq!(name_key("FRANCE"), "france");
        assert_eq!(name_key("  France "), "france");
        assert_eq!(name_key("Côte d'Ivoire"), name_key("CÔTE D'IVOIRE"));
    }

    #[test]
    fn default_status_is_empty() {
        let status = StatusRecord::default();
        assert_eq!(status.total_countries, 0);
        assert!(status.last_refreshed_at.is_none());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["total_countries"], 0);
        assert!(json["last_refreshed_at"].is_null());
    }

    #[test]
    fn record_serializes_snake_case() {
        let record = CountryRecord {
            name: "Ghana".to_string(),
            capital: Some("Accra".to_string()),
            region: Some("Africa".to_string()),
            population: 31_072_940,
            currency_code: Some("GHS".to_string()),
            exchange_rate: Some(15.2),
            estimated_gdp: None,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["currency_code"], "GHS");
        assert_eq!(json["exchange_rate"], 15.2);
        assert!(json["estimated_gdp"].is_null());
        assert_eq!(record.key(), "ghana");
    }
}
