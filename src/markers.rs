//src/markers.rs

use std::path::Path;

use crate::config::{AccessionRule, MarkerRule, MarkerRules};
use crate::error::{ProfileError, Result};
use crate::reader::read_numbered_lines;
use crate::types::CladeIndex;

/// Reads a marker database (one marker per line) into a [`CladeIndex`].
///
/// A line belongs to the namespace of the first rule whose prefix it starts
/// with; lines matching no rule are headers or other noise and are skipped.
/// A matched line must carry a non-empty accession and a non-empty clade as
/// `clade': '<name>'`, otherwise the whole read fails with [`ProfileError::Parse`].
pub fn read_marker_clades<P: AsRef<Path>>(filepath: P, rules: &MarkerRules) -> Result<CladeIndex> {
    let path = filepath.as_ref();
    let mut index = CladeIndex::new();
    let mut skipped = 0usize;

    for (line_no, line) in read_numbered_lines(path)? {
        let Some(rule) = rules.rules.iter().find(|r| line.starts_with(&r.prefix)) else {
            skipped += 1;
            continue;
        };

        let accession = extract_accession(&line, rule).ok_or_else(|| {
            ProfileError::parse(path, line_no, &line, format!("no accession after '{}'", rule.prefix))
        })?;
        let clade = extract_clade(&line, rules).ok_or_else(|| {
            ProfileError::parse(path, line_no, &line, format!("no {}...' clade entry", rules.clade_marker))
        })?;

        index.add_marker(clade, &rule.namespace, accession);
    }

    log::info!("Loaded {} clades from {}", index.len(), path.display());
    log::debug!("Skipped {} non-marker lines in {}", skipped, path.display());
    Ok(index)
}

fn extract_accession<'a>(line: &'a str, rule: &MarkerRule) -> Option<&'a str> {
    let first_field = line.split('\t').next()?;
    let accession = match rule.accession {
        AccessionRule::AfterDelimiter(delim) => first_field.split(delim).nth(1),
        AccessionRule::WholeField => Some(first_field),
    };
    accession.filter(|a| !a.trim().is_empty())
}

fn extract_clade<'a>(line: &'a str, rules: &MarkerRules) -> Option<&'a str> {
    let (_, rest) = line.split_once(rules.clade_marker.as_str())?;
    rest.split(rules.clade_quote).next().filter(|clade| !clade.trim().is_empty())
}
