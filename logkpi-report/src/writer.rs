//! Summary row serialization.
//!
//! CSV output has a header row in [`SummaryRow::COLUMNS`] order, written even
//! for an empty batch. JSON Lines output has one object per row.
//!
//! [`write_atomic`] writes to a `.tmp` sibling and renames it over the final
//! path, so a failed run never leaves a partial summary file behind.

use logkpi_core::config::OutputFormat;
use logkpi_core::{KpiError, SummaryRow};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Serialize `rows` to `out` in the given format.
pub fn write_rows<W: Write>(out: &mut W, rows: &[SummaryRow], format: OutputFormat) -> Result<(), KpiError> {
    match format {
        OutputFormat::Csv => write_csv(out, rows)?,
        OutputFormat::Jsonl => {
            for row in rows {
                serde_json::to_writer(&mut *out, row)?;
                out.write_all(b"\n")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `rows` to `path` atomically: tmp file → rename.
pub fn write_atomic(path: &Path, rows: &[SummaryRow], format: OutputFormat) -> Result<(), KpiError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let result = (|| -> Result<(), KpiError> {
        let file = std::fs::File::create(&tmp)?;
        let mut out = BufWriter::new(file);
        write_rows(&mut out, rows, format)?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            debug!(path = %path.display(), rows = rows.len(), "Summary written");
            Ok(())
        }
        Err(e) => {
            remove_tmp(&tmp);
            Err(e)
        }
    }
}

/// Best-effort cleanup. A tmp file that was never created is not a failure.
fn remove_tmp(tmp: &Path) {
    match std::fs::remove_file(tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, path = %tmp.display(), "Failed to remove tmp file"),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_csv<W: Write>(out: &mut W, rows: &[SummaryRow]) -> io::Result<()> {
    out.write_all(SummaryRow::COLUMNS.join(",").as_bytes())?;
    out.write_all(b"\n")?;

    let mut buf = itoa::Buffer::new();
    for row in rows {
        write_field(out, &row.date_utc)?;
        out.write_all(b",")?;
        write_field(out, &row.endpoint_base)?;
        for count in [
            row.requests_total,
            row.success_2xx,
            row.client_4xx,
            row.server_5xx,
            row.parse_errors,
        ] {
            out.write_all(b",")?;
            out.write_all(buf.format(count).as_bytes())?;
        }
        // `{:?}` keeps the trailing `.0` on whole numbers.
        writeln!(out, ",{:?},{:?}", row.avg_elapsed_ms, row.p90_elapsed_ms)?;
    }
    Ok(())
}

/// RFC 4180 quoting: only when the field needs it.
fn write_field<W: Write>(out: &mut W, field: &str) -> io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        out.write_all(b"\"")?;
        out.write_all(field.replace('"', "\"\"").as_bytes())?;
        out.write_all(b"\"")
    } else {
        out.write_all(field.as_bytes())
    }
}
