//! Live API tests. Run with: `BANXICO_TOKEN=... cargo test --features online -- --nocapture`
#![cfg(feature = "online")]

use bmx_rs::{Client, DataQuery, DateRange, Language};
use chrono::NaiveDate;

fn client() -> Client {
    let token = std::env::var("BANXICO_TOKEN").expect("BANXICO_TOKEN must be set for online tests");
    Client::new(token)
}

#[test]
fn fetch_metadata_two_series() {
    let rows = client()
        .get_metadata(&["SF43718".into(), "SF60653".into()], Language::English)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].series_code, "SF43718");
    assert_eq!(rows[1].series_code, "SF60653");
}

#[test]
fn fetch_small_range() {
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
        NaiveDate::from_ymd_opt(2020, 3, 13).unwrap(),
    )
    .unwrap();
    let tables = client()
        .get_data(&["SF43718".into()], &DataQuery::new().range(range))
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert!(!tables[0].is_empty());
    assert!(tables[0].observations.iter().all(|o| range.start <= o.date && o.date <= range.end));
}

#[test]
fn fetch_latest_only() {
    let tables = client()
        .get_data(&["SF43718".into()], &DataQuery::new().latest(true))
        .unwrap();
    assert_eq!(tables[0].len(), 1);
}

#[test]
fn invalid_token_is_request_failure() {
    let err = Client::new("not-a-token")
        .get_metadata(&["SF43718".into()], Language::English)
        .unwrap_err();
    assert!(err.is_request_failure());
}
