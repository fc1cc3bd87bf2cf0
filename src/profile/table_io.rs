//src/profile/table_io.rs

use std::io::{BufWriter, Write};
use std::path::Path;

use super::matrix::ProfileMatrix;
use crate::error::{ProfileError, Result};
use crate::output::write_atomically;
use crate::reader::read_numbered_lines;

/// First cell of the header row of a merged table.
pub const TABLE_CORNER: &str = "#SampleID";

/// Writes `table` as tab-separated text: a `#SampleID` header naming the
/// samples, then one row per feature in ascending order.
pub fn write_profile_table<P: AsRef<Path>>(filepath: P, table: &ProfileMatrix) -> Result<()> {
    let path = filepath.as_ref();
    let sorted = table.sorted();

    write_atomically(path, |tmp| {
        let mut out = BufWriter::new(tmp.as_file_mut());
        let mut write_all = || -> std::io::Result<()> {
            write!(out, "{}", TABLE_CORNER)?;
            for sample in sorted.samples() {
                write!(out, "\t{}", sample)?;
            }
            writeln!(out)?;
            for (feature, row) in sorted.rows() {
                write!(out, "{}", feature)?;
                for v in row {
                    write!(out, "\t{}", v)?;
                }
                writeln!(out)?;
            }
            out.flush()
        };
        write_all().map_err(|e| ProfileError::write(path, e))
    })?;

    log::info!(
        "Wrote {} features x {} samples to {}",
        sorted.n_features(),
        sorted.n_samples(),
        path.display()
    );
    Ok(())
}

/// Reads a table written by [`write_profile_table`]. The first line is the
/// sample header; every other line must hold one count per sample.
pub fn read_profile_table<P: AsRef<Path>>(filepath: P) -> Result<ProfileMatrix> {
    let path = filepath.as_ref();
    let mut lines = read_numbered_lines(path)?.into_iter();

    let Some((_, header)) = lines.next() else {
        return Err(ProfileError::parse(path, 1, "", "empty table, no header line"));
    };
    let samples: Vec<String> = header.split('\t').skip(1).map(str::to_string).collect();

    let mut features = Vec::new();
    let mut values = Vec::new();
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let feature = fields.next().unwrap_or_default().to_string();
        let row = fields
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ProfileError::parse(path, line_no, &line, e.to_string()))?;
        if row.len() != samples.len() {
            return Err(ProfileError::parse(
                path,
                line_no,
                &line,
                format!("expected {} counts, found {}", samples.len(), row.len()),
            ));
        }
        if features.contains(&feature) {
            return Err(ProfileError::DuplicateFeature { path: path.to_path_buf(), feature });
        }
        features.push(feature);
        values.push(row);
    }

    log::info!(
        "Loaded {} features x {} samples from {}",
        features.len(),
        samples.len(),
        path.display()
    );
    Ok(ProfileMatrix::from_rows(features, samples, values))
}
