use bmx_rs::models::{MetadataRecord, Observation, SeriesTable};
use bmx_rs::storage;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn table(code: &str, name: &str, n: usize) -> SeriesTable {
    let observations = (0..n)
        .map(|i| Observation {
            date: NaiveDate::from_ymd_opt(2020, 1, 1 + i as u32).unwrap(),
            value: 1000.5 + i as f64,
            series_name: name.into(),
            series_code: code.into(),
        })
        .collect();
    SeriesTable {
        series_code: code.into(),
        series_name: name.into(),
        observations,
    }
}

#[test]
fn save_csv_and_json() {
    let tables = vec![table("SF1", "One", 3), table("SF2", "Two", 2)];
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("obs.csv");
    storage::save_csv(&tables, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv_txt.lines();
    assert_eq!(lines.next(), Some("series_code,series_name,fecha,dato"));
    assert_eq!(lines.next(), Some("SF1,One,2020-01-01,1000.5"));
    assert_eq!(csv_txt.lines().count(), 1 + 5);

    let json_path = dir.path().join("obs.json");
    storage::save_json(&tables, &json_path).unwrap();
    let json_txt = fs::read_to_string(&json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json_txt).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 2);
    assert_eq!(v[0]["observations"][0]["fecha"], "2020-01-01");
    assert_eq!(v[0]["observations"][0]["dato"], 1000.5);
}

//spreadsheet apps evaluate cells starting with = + - @ as formulas;
//titles come from a remote API, so they are prefixed with a quote
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let tables = vec![table("SF1", "=HYPERLINK(\"http://evil\")", 1)];
    let dir = tempdir().unwrap();
    let path = dir.path().join("inj.csv");
    storage::save_csv(&tables, &path).unwrap();
    let txt = fs::read_to_string(&path).unwrap();
    assert!(txt.contains("'=HYPERLINK"));
    assert!(!txt.contains(",=HYPERLINK"));
}

#[test]
fn metadata_csv_and_json() {
    let rows = vec![MetadataRecord {
        series_code: "SF43718".into(),
        title: "FIX".into(),
        start_date: Some("12/11/1991".into()),
        end_date: None,
        periodicity: Some("Diaria".into()),
        figure: None,
        unit: Some("Pesos por Dólar".into()),
        extra: BTreeMap::new(),
    }];
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("meta.csv");
    storage::save_metadata_csv(&rows, &csv_path).unwrap();
    let txt = fs::read_to_string(&csv_path).unwrap();
    assert!(txt.starts_with("idSerie,titulo,fechaInicio,fechaFin,"));
    assert!(txt.contains("SF43718,FIX,12/11/1991,,Diaria,,Pesos por Dólar"));

    let json_path = dir.path().join("meta.json");
    storage::save_metadata_json(&rows, &json_path).unwrap();
    let json_txt = fs::read_to_string(&json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json_txt).unwrap();
    assert_eq!(v[0]["idSerie"], "SF43718");
}
