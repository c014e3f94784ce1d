//! Reconciliation: merge the reference feed with the rate table
//!
//! Each raw entry becomes at most one [`CountryRecord`]. Population defaults
//! to zero, the first listed currency is the country's currency, and the rate
//! comes from the USD table. The GDP estimate is
//! `population * multiplier / rate` rounded to six decimals, where the
//! multiplier is drawn from `[1000, 2000)` per record.
//!
//! Entries without a name, with zero population, without a currency code or
//! whose currency has no usable rate never leave this module.

use chrono::{DateTime, Utc};
use country_types::{name_key, CountryRecord, RateTable, RawCountry};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

pub const MULTIPLIER_MIN: f64 = 1000.0;
pub const MULTIPLIER_MAX: f64 = 2000.0;

/// Decimal places kept on the GDP estimate
const GDP_DECIMALS: i32 = 6;

/// Source of the per-record GDP multiplier
pub trait MultiplierSource: Send + Sync {
    /// Next multiplier in `[MULTIPLIER_MIN, MULTIPLIER_MAX)`
    fn next_multiplier(&self) -> f64;
}

/// Production multiplier backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMultiplier;

impl MultiplierSource for RandomMultiplier {
    fn next_multiplier(&self) -> f64 {
        rand::thread_rng().gen_range(MULTIPLIER_MIN..MULTIPLIER_MAX)
    }
}

/// Reproducible multiplier sequence for tests and replays
pub struct SeededMultiplier {
    rng: Mutex<StdRng>,
}

impl SeededMultiplier {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl MultiplierSource for SeededMultiplier {
    fn next_multiplier(&self) -> f64 {
        self.rng.lock().gen_range(MULTIPLIER_MIN..MULTIPLIER_MAX)
    }
}

/// Constant multiplier for exact-value assertions
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(pub f64);

impl MultiplierSource for FixedMultiplier {
    fn next_multiplier(&self) -> f64 {
        self.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// A rate is usable only when it is finite and strictly positive
fn usable_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Estimate GDP, or `None` when population is zero, no usable rate exists or
/// the quotient overflows.
///
/// The multiplier is only drawn when a rate is usable.
pub fn estimate_gdp(
    population: u64,
    exchange_rate: Option<f64>,
    multiplier: &dyn MultiplierSource,
) -> Option<f64> {
    if population == 0 {
        return None;
    }
    let rate = exchange_rate.and_then(usable_rate)?;

    let gdp = population as f64 * multiplier.next_multiplier() / rate;
    Some(round_to(gdp, GDP_DECIMALS)).filter(|gdp| gdp.is_finite())
}

/// Why a raw entry was left out of the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
    ZeroPopulation,
    MissingCurrency,
    UnresolvedRate { currency_code: String },
    /// Rate so small the estimate is not representable
    EstimateOverflow { currency_code: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingName => f.write_str("missing name"),
            Rejection::ZeroPopulation => f.write_str("zero population"),
            Rejection::MissingCurrency => f.write_str("no currency code"),
            Rejection::UnresolvedRate { currency_code } => {
                write!(f, "no exchange rate for {currency_code}")
            }
            Rejection::EstimateOverflow { currency_code } => {
                write!(f, "GDP estimate overflows for {currency_code} rate")
            }
        }
    }
}

/// Records ready to persist plus the number of entries dropped
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub records: Vec<CountryRecord>,
    pub rejected: usize,
}

/// Merge one raw entry with the rate table.
pub fn reconcile_entry(
    raw: &RawCountry,
    rates: &RateTable,
    refreshed_at: DateTime<Utc>,
    multiplier: &dyn MultiplierSource,
) -> std::result::Result<CountryRecord, Rejection> {
    let name = raw.name.as_deref().map(str::trim).unwrap_or_default();
    let population = raw.population.unwrap_or(0);

    let currency_code = raw
        .primary_currency_code()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    let exchange_rate = currency_code
        .as_ref()
        .and_then(|code| rates.get(code))
        .copied()
        .and_then(usable_rate);

    let estimated_gdp = estimate_gdp(population, exchange_rate, multiplier);

    // Integrity gate, evaluated on the resolved inputs rather than on the estimate
    if name.is_empty() {
        return Err(Rejection::MissingName);
    }
    if population == 0 {
        return Err(Rejection::ZeroPopulation);
    }
    let Some(currency_code) = currency_code else {
        return Err(Rejection::MissingCurrency);
    };
    if exchange_rate.is_none() {
        return Err(Rejection::UnresolvedRate { currency_code });
    }
    if estimated_gdp.is_none() {
        return Err(Rejection::EstimateOverflow { currency_code });
    }

    Ok(CountryRecord {
        name: name.to_string(),
        capital: non_blank(&raw.capital),
        region: non_blank(&raw.region),
        population,
        currency_code: Some(currency_code),
        exchange_rate,
        estimated_gdp,
        flag_url: non_blank(&raw.flag),
        last_refreshed_at: refreshed_at,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reconcile a whole batch stamped with one `refreshed_at`.
///
/// Entries whose names collide case-insensitively collapse to the last one
/// seen. Fails with [`CacheError::NoValidRecords`] when nothing survives, so
/// an empty refresh can never reach the store.
pub fn reconcile(
    countries: &[RawCountry],
    rates: &RateTable,
    refreshed_at: DateTime<Utc>,
    multiplier: &dyn MultiplierSource,
) -> Result<Reconciled> {
    let mut records: Vec<CountryRecord> = Vec::with_capacity(countries.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rejected = 0;

    for raw in countries {
        match reconcile_entry(raw, rates, refreshed_at, multiplier) {
            Ok(record) => match positions.get(&record.key()) {
                Some(&index) => {
                    debug!("Duplicate country '{}' replaces earlier entry", record.name);
                    records[index] = record;
                }
                None => {
                    positions.insert(name_key(&record.name), records.len());
                    records.push(record);
                }
            },
            Err(reason) => {
                rejected += 1;
                warn!(
                    name = raw.name.as_deref().unwrap_or(""),
                    population = raw.population.unwrap_or(0),
                    currency_code = raw.primary_currency_code().unwrap_or(""),
                    "Skipping country: {}",
                    reason
                );
            }
        }
    }

    if records.is_empty() {
        warn!("No valid countries after processing ({} rejected)", rejected);
        return Err(CacheError::NoValidRecords { rejected });
    }

    debug!("Reconciled {} countries, rejected {}", records.len(), rejected);
    Ok(Reconciled { records, rejected })
}
