//! Turns decoded `bmx.series` payloads into tidy tables.
//!
//! Two concerns live here:
//! - per-field parsing (`dd/mm/yyyy` dates, comma-grouped numbers), and
//! - aligning the returned series with the requested codes, so that titles
//!   and codes are attached to the observations they belong to even when the
//!   API reorders or drops a series.

use crate::error::{BmxError, Result};
use crate::models::{MissingPolicy, Observation, RawObservation, RawSeries, SeriesTable};
use chrono::NaiveDate;
use log::{debug, info};

/// Placeholder the API uses for missing or withheld observations.
pub const NO_DATA: &str = "N/E";

/// Parse a `dd/mm/yyyy` observation date.
pub fn parse_fecha(series: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").map_err(|_| BmxError::DateParse {
        series: series.to_string(),
        raw: raw.to_string(),
    })
}

/// Parse a value such as `"1,234.56"`: commas are thousands separators.
///
/// Returns `None` when the text is not a finite number after stripping them.
pub fn parse_dato(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_placeholder(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || t.eq_ignore_ascii_case(NO_DATA)
}

/// Normalize one raw series into a table, attaching its title and code to every row.
pub fn normalize_series(raw: RawSeries, policy: MissingPolicy) -> Result<SeriesTable> {
    let RawSeries {
        series_code,
        title,
        datos,
    } = raw;
    let datos: Vec<RawObservation> = datos.unwrap_or_default();

    let mut observations = Vec::with_capacity(datos.len());
    let mut skipped = 0usize;
    for obs in datos {
        let date = parse_fecha(&series_code, &obs.fecha)?;
        let value = match parse_dato(&obs.dato) {
            Some(v) => v,
            None if policy == MissingPolicy::Skip && is_placeholder(&obs.dato) => {
                skipped += 1;
                continue;
            }
            None => {
                return Err(BmxError::NumericParse {
                    series: series_code.clone(),
                    date,
                    raw: obs.dato,
                });
            }
        };
        observations.push(Observation {
            date,
            value,
            series_name: title.clone(),
            series_code: series_code.clone(),
        });
    }

    if skipped > 0 {
        info!("series {series_code}: skipped {skipped} observations without data");
    }
    Ok(SeriesTable {
        series_code,
        series_name: title,
        observations,
    })
}

/// Reorder `items` to follow `requested`, matching on series code.
///
/// Codes compare case-insensitively. Any requested code absent from the
/// response, or any returned code that was not requested, is reported as
/// [`BmxError::SeriesMismatch`].
pub fn align_to_request<T>(
    requested: &[String],
    items: Vec<T>,
    code_of: impl Fn(&T) -> &str,
) -> Result<Vec<T>> {
    let mut slots: Vec<Option<T>> = requested.iter().map(|_| None).collect();
    let mut unexpected = Vec::new();

    for item in items {
        let code = code_of(&item).trim().to_string();
        match requested
            .iter()
            .position(|r| r.trim().eq_ignore_ascii_case(&code))
        {
            Some(i) if slots[i].is_none() => slots[i] = Some(item),
            // a second copy of a series is as wrong as an unknown one
            _ => unexpected.push(code),
        }
    }

    let missing: Vec<String> = requested
        .iter()
        .zip(&slots)
        .filter(|(_, slot)| slot.is_none())
        .map(|(code, _)| code.clone())
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(BmxError::SeriesMismatch {
            missing,
            unexpected,
        });
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Align raw series with the request and normalize each one, in request order.
pub fn unpack_series(
    requested: &[String],
    raw: Vec<RawSeries>,
    policy: MissingPolicy,
) -> Result<Vec<SeriesTable>> {
    let aligned = align_to_request(requested, raw, |s| s.series_code.as_str())?;
    aligned
        .into_iter()
        .enumerate()
        .map(|(i, series)| {
            debug!("normalizing series {i}: {}", series.series_code);
            normalize_series(series, policy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, rows: &[(&str, &str)]) -> RawSeries {
        RawSeries {
            series_code: code.into(),
            title: format!("Title {code}"),
            datos: Some(
                rows.iter()
                    .map(|(f, d)| RawObservation {
                        fecha: (*f).into(),
                        dato: (*d).into(),
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn fecha_is_day_month_year() {
        let d = parse_fecha("SF1", "15/03/2020").unwrap();
        assert_eq!(d.format("%Y-%m-%d").to_string(), "2020-03-15");
        assert!(matches!(
            parse_fecha("SF1", "2020-03-15"),
            Err(BmxError::DateParse { .. })
        ));
        assert!(parse_fecha("SF1", "31/02/2020").is_err());
    }

    #[test]
    fn dato_strips_thousands_separators() {
        assert_eq!(parse_dato("1,234.56"), Some(1234.56));
        assert_eq!(parse_dato("1,000,000"), Some(1_000_000.0));
        assert_eq!(parse_dato(" -0.25 "), Some(-0.25));
        assert_eq!(parse_dato("N/E"), None);
        assert_eq!(parse_dato(""), None);
        assert_eq!(parse_dato("NaN"), None);
    }

    #[test]
    fn placeholder_fails_by_default_and_is_dropped_on_skip() {
        let s = raw("SF1", &[("01/01/2020", "1.5"), ("02/01/2020", "N/E")]);
        let err = normalize_series(s.clone(), MissingPolicy::Fail).unwrap_err();
        match err {
            BmxError::NumericParse { series, date, raw } => {
                assert_eq!(series, "SF1");
                assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
                assert_eq!(raw, "N/E");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let t = normalize_series(s, MissingPolicy::Skip).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.observations[0].value, 1.5);
    }

    #[test]
    fn skip_still_rejects_garbage() {
        let s = raw("SF1", &[("01/01/2020", "abc")]);
        assert!(normalize_series(s, MissingPolicy::Skip).is_err());
    }

    #[test]
    fn alignment_follows_request_order() {
        let requested = vec!["SF2".to_string(), "SF1".to_string()];
        let out = unpack_series(
            &requested,
            vec![raw("SF1", &[]), raw("SF2", &[("01/01/2020", "2")])],
            MissingPolicy::Fail,
        )
        .unwrap();
        assert_eq!(out[0].series_code, "SF2");
        assert_eq!(out[0].series_name, "Title SF2");
        assert_eq!(out[1].series_code, "SF1");
        assert!(out[1].is_empty());
    }

    #[test]
    fn alignment_reports_missing_and_unexpected() {
        let requested = vec!["SF1".to_string(), "SF2".to_string()];
        let err = unpack_series(
            &requested,
            vec![raw("SF1", &[]), raw("SF9", &[])],
            MissingPolicy::Fail,
        )
        .unwrap_err();
        match err {
            BmxError::SeriesMismatch {
                missing,
                unexpected,
            } => {
                assert_eq!(missing, vec!["SF2".to_string()]);
                assert_eq!(unexpected, vec!["SF9".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
