//! Filter and sort description for reads over the cache.
//!
//! The rules here are the read contract every store backend must honour:
//! region matches as a case-insensitive substring, currency as a
//! case-insensitive exact code, and a GDP sort drops rows whose estimate is
//! missing instead of ordering them last.

use crate::country::{name_key, CountryRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency_code: Option<String>,
}

impl CountryFilter {
    pub fn matches(&self, record: &CountryRecord) -> bool {
        if let Some(region) = non_empty(&self.region) {
            let needle = region.to_lowercase();
            match &record.region {
                Some(value) if value.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }

        if let Some(code) = non_empty(&self.currency_code) {
            match &record.currency_code {
                Some(value) if value.eq_ignore_ascii_case(code.trim()) => {}
                _ => return false,
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Population,
    Gdp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort order for list reads.
///
/// Parses from the `<field>_<direction>` form used by callers, e.g.
/// `gdp_desc` or `population_asc`. Unknown fields fall back to `name` and any
/// direction other than `desc` is ascending, so parsing never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountrySort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl CountrySort {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub const fn gdp_desc() -> Self {
        Self::new(SortField::Gdp, SortDirection::Desc)
    }

    fn compare(&self, a: &CountryRecord, b: &CountryRecord) -> Ordering {
        let primary = match self.field {
            SortField::Name => name_key(&a.name).cmp(&name_key(&b.name)),
            SortField::Population => a.population.cmp(&b.population),
            SortField::Gdp => {
                let a = a.estimated_gdp.unwrap_or(f64::NEG_INFINITY);
                let b = b.estimated_gdp.unwrap_or(f64::NEG_INFINITY);
                a.total_cmp(&b)
            }
        };

        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };

        // Stable output for equal keys
        primary.then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
    }
}

impl FromStr for CountrySort {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (field, direction) = match s.split_once('_') {
            Some((field, direction)) => (field, direction),
            None => (s.as_str(), ""),
        };

        let field = match field {
            "gdp" => SortField::Gdp,
            "population" => SortField::Population,
            _ => SortField::Name,
        };
        let direction = if direction == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        Ok(Self::new(field, direction))
    }
}

impl fmt::Display for CountrySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Name => "name",
            SortField::Population => "population",
            SortField::Gdp => "gdp",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{field}_{direction}")
    }
}

/// A complete list read: filter, optional sort, optional row limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryQuery {
    pub filter: CountryFilter,
    pub sort: Option<CountrySort>,
    pub limit: Option<usize>,
}

impl CountryQuery {
    /// Top `n` records by estimated GDP, missing estimates excluded.
    pub fn top_by_gdp(n: usize) -> Self {
        Self {
            filter: CountryFilter::default(),
            sort: Some(CountrySort::gdp_desc()),
            limit: Some(n),
        }
    }

    pub fn sort_or_default(&self) -> CountrySort {
        self.sort.unwrap_or_default()
    }

    /// Apply filter, GDP null exclusion, ordering and limit to `records`.
    pub fn apply<I>(&self, records: I) -> Vec<CountryRecord>
    where
        I: IntoIterator<Item = CountryRecord>,
    {
        let sort = self.sort_or_default();
        let mut rows: Vec<CountryRecord> = records
            .into_iter()
            .filter(|record| self.filter.matches(record))
            .filter(|record| sort.field != SortField::Gdp || record.estimated_gdp.is_some())
            .collect();

        rows.sort_by(|a, b| sort.compare(a, b));

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}
