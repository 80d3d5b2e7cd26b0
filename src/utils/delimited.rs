//! Plain comma-delimited text files.
//!
//! Deliberately naive: no quoting and no escaping. A field containing a comma
//! will be split on read.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::sources::HarvestError;

/// Write `columns` then one comma-joined line per row to `dir/file_name`.
///
/// Creates `dir` (and parents) when missing. Returns the written path.
pub fn write_delimited<S: AsRef<str>>(
    rows: &[Vec<String>],
    dir: impl AsRef<Path>,
    file_name: &str,
    columns: &[S],
) -> Result<PathBuf, HarvestError> {
    let path = dir.as_ref().join(file_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&path)?);

    let header: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    writeln!(writer, "{}", header.join(","))?;
    for row in rows {
        writeln!(writer, "{}", row.join(","))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Read a file line by line, splitting every line on `,`.
///
/// The header line, if any, is returned like every other line.
pub fn read_delimited(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>, HarvestError> {
    let reader = BufReader::new(File::open(path.as_ref())?);

    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        rows.push(line.split(',').map(str::to_string).collect());
    }
    Ok(rows)
}
