//! Query layer behaviour over a seeded store

use chrono::Utc;
use country_cache::{
    CacheError, CountryQueryService, CountryStore, ErrorKind, ListParams, MemoryStore,
};
use country_types::{CountryRecord, StatusRecord};
use std::sync::Arc;

fn record(
    name: &str,
    region: &str,
    currency: &str,
    population: u64,
    gdp: Option<f64>,
) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        capital: None,
        region: Some(region.to_string()),
        population,
        currency_code: Some(currency.to_string()),
        exchange_rate: Some(1.0),
        estimated_gdp: gdp,
        flag_url: None,
        last_refreshed_at: Utc::now(),
    }
}

async fn seeded() -> (CountryQueryService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_all(&[
            record("France", "Europe", "EUR", 67_000_000, Some(9.0e10)),
            record("Germany", "Europe", "EUR", 83_000_000, Some(1.2e11)),
            record("Nigeria", "Africa", "NGN", 206_000_000, Some(2.5e11)),
            record("Ghana", "Africa", "GHS", 31_000_000, None),
            record("Iceland", "Northern Europe", "ISK", 370_000, Some(4.0e8)),
        ])
        .await
        .unwrap();
    (CountryQueryService::new(store.clone()), store)
}

fn names(rows: &[CountryRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
}

fn list(region: Option<&str>, currency: Option<&str>, sort: Option<&str>) -> ListParams {
    ListParams {
        region: region.map(str::to_string),
        currency: currency.map(str::to_string),
        sort: sort.map(str::to_string),
    }
}

#[tokio::test]
async fn test_get_country_ignores_case() {
    let (queries, _) = seeded().await;

    let upper = queries.get_country("FRANCE").await.unwrap();
    let lower = queries.get_country("france").await.unwrap();
    assert_eq!(upper, lower);
    assert_eq!(upper.name, "France");
}

#[tokio::test]
async fn test_get_missing_country_is_not_found() {
    let (queries, _) = seeded().await;

    let err = queries.get_country("Atlantis").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound { ref name } if name == "Atlantis"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind().http_status(), 404);
}

#[tokio::test]
async fn test_delete_country() {
    let (queries, store) = seeded().await;

    queries.delete_country("gHaNa").await.unwrap();
    assert_eq!(store.count().await.unwrap(), 4);

    let err = queries.delete_country("Ghana").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_region_filter_is_substring() {
    let (queries, _) = seeded().await;

    let rows = queries.list_countries(&list(Some("europe"), None, None)).await.unwrap();
    assert_eq!(names(&rows), vec!["France", "Germany", "Iceland"]);
}

#[tokio::test]
async fn test_currency_filter_is_exact() {
    let (queries, _) = seeded().await;

    let rows = queries.list_countries(&list(None, Some("eur"), None)).await.unwrap();
    assert_eq!(names(&rows), vec!["France", "Germany"]);

    let rows = queries.list_countries(&list(None, Some("EU"), None)).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_gdp_sort_never_returns_missing_estimates() {
    let (queries, _) = seeded().await;

    let desc = queries.list_countries(&list(None, None, Some("gdp_desc"))).await.unwrap();
    assert_eq!(names(&desc), vec!["Nigeria", "Germany", "France", "Iceland"]);
    assert!(desc.iter().all(|r| r.estimated_gdp.is_some()));

    let asc = queries.list_countries(&list(Some("africa"), None, Some("gdp_asc"))).await.unwrap();
    assert_eq!(names(&asc), vec!["Nigeria"]);
}

#[tokio::test]
async fn test_population_sort_and_default_order() {
    let (queries, _) = seeded().await;

    let rows = queries
        .list_countries(&list(None, None, Some("population_desc")))
        .await
        .unwrap();
    assert_eq!(names(&rows), vec!["Nigeria", "Germany", "France", "Ghana", "Iceland"]);

    let rows = queries.list_countries(&ListParams::default()).await.unwrap();
    assert_eq!(names(&rows), vec!["France", "Germany", "Ghana", "Iceland", "Nigeria"]);

    let rows = queries.list_countries(&list(Some(""), Some(""), Some("name_desc"))).await.unwrap();
    assert_eq!(names(&rows), vec!["Nigeria", "Iceland", "Ghana", "Germany", "France"]);
}

#[tokio::test]
async fn test_status_defaults_on_empty_store() {
    let queries = CountryQueryService::new(Arc::new(MemoryStore::new()));

    let status = queries.get_status().await.unwrap();
    assert_eq!(status.total_countries, 0);
    assert!(status.last_refreshed_at.is_none());
    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        serde_json::json!({ "total_countries": 0, "last_refreshed_at": null })
    );
}

#[tokio::test]
async fn test_status_reflects_saved_singleton() {
    let (queries, store) = seeded().await;
    let now = Utc::now();
    store.save_status(&StatusRecord::new(5, now)).await.unwrap();

    let status = queries.get_status().await.unwrap();
    assert_eq!(status.total_countries, 5);
    assert_eq!(status.last_refreshed_at, Some(now));
}
