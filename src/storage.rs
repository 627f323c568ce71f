use crate::error::Result;
use crate::models::{MetadataRecord, SeriesTable};
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix text cells that a spreadsheet would evaluate as a formula.
fn safe_cell(s: &str) -> Cow<'_, str> {
    if s.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{s}"))
    } else {
        Cow::Borrowed(s)
    }
}

fn opt_cell(s: &Option<String>) -> Cow<'_, str> {
    safe_cell(s.as_deref().unwrap_or(""))
}

/// Save observation tables as one flat CSV with header
/// `series_code,series_name,fecha,dato`, series in the given order.
pub fn save_csv<P: AsRef<Path>>(tables: &[SeriesTable], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["series_code", "series_name", "fecha", "dato"])?;
    for t in tables {
        for o in &t.observations {
            wtr.serialize((
                safe_cell(&o.series_code),
                safe_cell(&o.series_name),
                o.iso_date(),
                o.value,
            ))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Save observation tables as a pretty JSON array of per-series objects.
pub fn save_json<P: AsRef<Path>>(tables: &[SeriesTable], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(tables)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save metadata rows as CSV. Only the typed columns are written.
pub fn save_metadata_csv<P: AsRef<Path>>(rows: &[MetadataRecord], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record([
        "idSerie",
        "titulo",
        "fechaInicio",
        "fechaFin",
        "periodicidad",
        "cifra",
        "unidad",
    ])?;
    for m in rows {
        wtr.serialize((
            safe_cell(&m.series_code),
            safe_cell(&m.title),
            opt_cell(&m.start_date),
            opt_cell(&m.end_date),
            opt_cell(&m.periodicity),
            opt_cell(&m.figure),
            opt_cell(&m.unit),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save metadata rows as pretty JSON, including fields beyond the typed ones.
pub fn save_metadata_json<P: AsRef<Path>>(rows: &[MetadataRecord], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
