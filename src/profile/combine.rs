//src/profile/combine.rs

use ahash::AHashSet;
use rayon::prelude::*;
use std::path::Path;

use super::matrix::{ProfileMatrix, SampleProfile};
use crate::config::{BrackenColumns, ProfileConfig};
use crate::error::{ProfileError, Result};
use crate::reader::read_numbered_lines;

/// Reads a two-column `feature\tcount` profile. Lines starting with the
/// comment marker and blank lines are ignored.
pub fn read_profile(name: &str, path: &Path, config: &ProfileConfig) -> Result<SampleProfile> {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut counts = Vec::new();

    for (line_no, line) in read_numbered_lines(path)? {
        if line.starts_with(config.comment_marker.as_str()) || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 2 {
            return Err(ProfileError::parse(
                path,
                line_no,
                &line,
                format!("expected 2 tab-separated fields, found {}", fields.len()),
            ));
        }
        let count: f64 = fields[1].trim().parse().map_err(|_| {
            ProfileError::parse(path, line_no, &line, format!("count '{}' is not a number", fields[1]))
        })?;
        let feature = fields[0].to_string();
        if !seen.insert(feature.clone()) {
            return Err(ProfileError::DuplicateFeature { path: path.to_path_buf(), feature });
        }
        counts.push((feature, count));
    }

    log::debug!("Read {} features for sample '{}' from {}", counts.len(), name, path.display());
    Ok(SampleProfile { name: name.to_string(), counts })
}

/// Reads the re-estimated read counts of a Bracken abundance report, keyed by
/// taxonomy ID. The sample name is the caller's label, never the file name.
pub fn read_bracken(name: &str, path: &Path, columns: &BrackenColumns) -> Result<SampleProfile> {
    let mut lines = read_numbered_lines(path)?
        .into_iter()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_no, header)) = lines.next() else {
        return Err(ProfileError::parse(path, 1, "", "empty report, no header line"));
    };
    let header_fields: Vec<&str> = header.split('\t').map(str::trim).collect();
    let column = |wanted: &str| {
        header_fields.iter().position(|h| *h == wanted).ok_or_else(|| {
            ProfileError::parse(path, header_no, &header, format!("no '{}' column", wanted))
        })
    };
    let taxid_col = column(columns.taxid_column.as_str())?;
    let count_col = column(columns.count_column.as_str())?;
    let width = header_fields.len();

    let mut seen: AHashSet<String> = AHashSet::new();
    let mut counts = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != width {
            return Err(ProfileError::parse(
                path,
                line_no,
                &line,
                format!("expected {} tab-separated fields, found {}", width, fields.len()),
            ));
        }
        let taxid = fields[taxid_col].trim().to_string();
        let count: f64 = fields[count_col].trim().parse().map_err(|_| {
            ProfileError::parse(
                path,
                line_no,
                &line,
                format!("{} '{}' is not a number", columns.count_column, fields[count_col]),
            )
        })?;
        if !seen.insert(taxid.clone()) {
            return Err(ProfileError::DuplicateFeature { path: path.to_path_buf(), feature: taxid });
        }
        counts.push((taxid, count));
    }

    log::debug!("Read {} taxa for sample '{}' from {}", counts.len(), name, path.display());
    Ok(SampleProfile { name: name.to_string(), counts })
}

/// Merges `(sample, path)` pairs of two-column profiles into one
/// feature x sample matrix. Files are parsed in parallel; any unreadable or
/// malformed file fails the whole merge.
pub fn combine_profiles<S, P>(profiles: &[(S, P)], config: &ProfileConfig) -> Result<ProfileMatrix>
where
    S: AsRef<str> + Sync,
    P: AsRef<Path> + Sync,
{
    let parsed = profiles
        .par_iter()
        .map(|(name, path)| read_profile(name.as_ref(), path.as_ref(), config))
        .collect::<Result<Vec<_>>>()?;

    let matrix = ProfileMatrix::outer_join(parsed)?;
    log::info!(
        "Combined {} profiles into {} features",
        matrix.n_samples(),
        matrix.n_features()
    );
    Ok(matrix)
}

/// Merges `(sample, path)` pairs of Bracken reports into one taxonomy ID x
/// sample matrix of re-estimated read counts.
pub fn combine_bracken<S, P>(reports: &[(S, P)], columns: &BrackenColumns) -> Result<ProfileMatrix>
where
    S: AsRef<str> + Sync,
    P: AsRef<Path> + Sync,
{
    let parsed = reports
        .par_iter()
        .map(|(name, path)| read_bracken(name.as_ref(), path.as_ref(), columns))
        .collect::<Result<Vec<_>>>()?;

    let matrix = ProfileMatrix::outer_join(parsed)?;
    log::info!(
        "Combined {} Bracken reports into {} taxa",
        matrix.n_samples(),
        matrix.n_features()
    );
    Ok(matrix)
}
