//src/taxid_list.rs

use std::path::Path;

use crate::error::{ProfileError, Result};
use crate::reader::read_numbered_lines;
use crate::types::{AccessionTaxIdMap, TaxId};

/// Parses an accession -> taxonomy ID list in the format:
/// ```text
/// #header
/// <namespace>\t<accession>\t<taxid>
/// ```
/// The first line is a header and always skipped. Results are added to a copy
/// of `existing` when given (later entries overwrite earlier ones), otherwise
/// to a fresh map. `existing` itself is never modified.
///
/// Fails with [`ProfileError::Parse`] when a data line does not hold exactly
/// three tab-separated fields or its taxonomy ID is not a positive integer.
pub fn read_taxid_list<P: AsRef<Path>>(
    filepath: P,
    existing: Option<&AccessionTaxIdMap>,
) -> Result<AccessionTaxIdMap> {
    let mut map = existing.cloned().unwrap_or_default();
    extend_from_list(filepath.as_ref(), &mut map)?;
    Ok(map)
}

fn extend_from_list(path: &Path, map: &mut AccessionTaxIdMap) -> Result<()> {
    let before = map.len();

    for (line_no, line) in read_numbered_lines(path)?.into_iter().skip(1) {
        let record = line.trim_end();
        if record.is_empty() {
            continue;
        }
        let parts: Vec<&str> = record.split('\t').collect();
        if parts.len() != 3 {
            return Err(ProfileError::parse(
                path,
                line_no,
                &line,
                format!("expected 3 tab-separated fields, found {}", parts.len()),
            ));
        }

        let taxid: TaxId = match parts[2].parse() {
            Ok(id) if id > 0 => id,
            _ => {
                return Err(ProfileError::parse(
                    path,
                    line_no,
                    &line,
                    format!("taxonomy ID '{}' is not a positive integer", parts[2]),
                ))
            }
        };
        map.insert(parts[0], parts[1], taxid);
    }

    log::info!(
        "Loaded {} accession taxonomy IDs from {} ({} in total)",
        map.len() - before,
        path.display(),
        map.len()
    );
    Ok(())
}

/// Folds several list files into one map, in order.
pub fn read_taxid_list_many<P: AsRef<Path>>(filepaths: &[P]) -> Result<AccessionTaxIdMap> {
    let mut map = AccessionTaxIdMap::new();
    for path in filepaths {
        extend_from_list(path.as_ref(), &mut map)?;
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const METAPHLAN_TAXIDS: &str = "#type\taccession\ttaxid\n\
        NC\tNC_012493.1\t575918\n\
        NC\tNC_002560.1\t134606\n\
        NC\tNC_002566.1\t134606\n\
        NC\tNC_004904.1\t234829\n\
        gi\t389575461\t633697\n\
        gi\t483970126\t1157633\n\
        gi\t225074862\t556267\n\
        gi\t512550081\t1303518\n\
        GeneID\t2658371\t244590\n\
        GeneID\t11117645\t1054461\n\
        GeneID\t1259969\t205879\n\
        GeneID\t11117646\t1054461\n";

    fn fixture(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_taxid_list() {
        let dir = TempDir::new().unwrap();
        let map = read_taxid_list(fixture(&dir, "taxids.txt", METAPHLAN_TAXIDS), None).unwrap();

        assert_eq!(map.len(), 12);
        let namespaces: BTreeSet<&str> = map.namespaces().collect();
        assert_eq!(namespaces, BTreeSet::from(["GeneID", "NC", "gi"]));
        assert_eq!(map.get("GeneID", "1259969"), Some(205879));
        assert_eq!(map.get("NC", "NC_012493.1"), Some(575918));
    }

    #[test]
    fn test_three_rows_give_three_leaves() {
        let dir = TempDir::new().unwrap();
        let content = "#header\nIMG\t2504756013\t2157\nGenbank\tX71860.1\t633697\nIMG\t2509276007\t633697\n";
        let map = read_taxid_list(fixture(&dir, "gg.txt", content), None).unwrap();

        let namespaces: BTreeSet<&str> = map.namespaces().collect();
        assert_eq!(namespaces, BTreeSet::from(["Genbank", "IMG"]));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_existing_map_is_extended_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let a = fixture(&dir, "a.txt", "#h\ngi\t1\t10\ngi\t2\t20\n");
        let b = fixture(&dir, "b.txt", "#h\ngi\t2\t21\nNC\tNC_1\t30\n");

        let map = read_taxid_list_many(&[a, b]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("gi", "1"), Some(10));
        assert_eq!(map.get("gi", "2"), Some(21));
        assert_eq!(map.get("NC", "NC_1"), Some(30));
    }

    #[test]
    fn test_failed_read_leaves_existing_map_untouched() {
        let dir = TempDir::new().unwrap();
        let good = fixture(&dir, "good.txt", "#h\ngi\t1\t10\n");
        let bad = fixture(&dir, "bad.txt", "#h\ngi\t1\t11\ngi\t2\tabc\n");

        let map = read_taxid_list(&good, None).unwrap();
        assert!(read_taxid_list(&bad, Some(&map)).is_err());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("gi", "1"), Some(10));
    }

    #[test]
    fn test_malformed_lines_are_parse_errors() {
        let dir = TempDir::new().unwrap();
        let names = fixture(&dir, "names.dmp", "1\t|\tall\n1\t|\troot\t|\t\t|\tscientific name\t|\n");
        let err = read_taxid_list(&names, None).unwrap_err();
        match err {
            ProfileError::Parse { line_no, path, .. } => {
                assert_eq!(line_no, 2);
                assert_eq!(path, names);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let bad_id = fixture(&dir, "bad.txt", "#h\ngi\t1\tabc\n");
        assert!(matches!(
            read_taxid_list(bad_id, None),
            Err(ProfileError::Parse { line_no: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_taxid_list(dir.path().join("taxids.txt"), None),
            Err(ProfileError::Read { .. })
        ));
    }
}
