//src/taxdb.rs

use ahash::AHashMap;
use std::path::Path;

use crate::error::{ProfileError, Result};
use crate::reader::read_numbered_lines;
use crate::types::{AccessionTaxIdMap, MergeTable, TaxId};

pub type ParentMap = AHashMap<TaxId, TaxId>;

/// Parses an NCBI taxonomy dump, delimited by `\t|\t`, into a map of its first
/// field to its second field.
/// ```text
/// <id>\t|\t<id>\t|\t...
/// ```
/// Both fields must be integers; anything else fails with
/// [`ProfileError::Value`] naming the offending fields. Blank lines are skipped.
pub fn read_ncbi_dump<P: AsRef<Path>>(filepath: P) -> Result<AHashMap<TaxId, TaxId>> {
    let path = filepath.as_ref();
    let mut entries = AHashMap::new();

    for (line_no, line) in read_numbered_lines(path)? {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();

        let parsed = match (fields.first(), fields.get(1)) {
            (Some(a), Some(b)) => a.parse::<TaxId>().ok().zip(b.parse::<TaxId>().ok()),
            _ => None,
        };
        match parsed {
            Some((key, value)) => {
                entries.insert(key, value);
            }
            None => {
                return Err(ProfileError::Value {
                    path: path.to_path_buf(),
                    line_no,
                    fields: fields.iter().take(2).map(|f| f.to_string()).collect(),
                });
            }
        }
    }
    Ok(entries)
}

/// Reads NCBI's `merged.dmp`: deprecated taxonomy ID -> current taxonomy ID.
pub fn read_ncbi_merged<P: AsRef<Path>>(filepath: P) -> Result<MergeTable> {
    let path = filepath.as_ref();
    let merged = read_ncbi_dump(path)?;
    log::info!("Loaded {} merged taxonomy IDs from {}", merged.len(), path.display());
    Ok(MergeTable::from(merged))
}

/// Reads NCBI's `nodes.dmp` into a child -> parent map.
pub fn read_ncbi_nodes<P: AsRef<Path>>(filepath: P) -> Result<ParentMap> {
    let path = filepath.as_ref();
    let parents = read_ncbi_dump(path)?;
    log::info!("Loaded {} taxonomy nodes from {}", parents.len(), path.display());
    Ok(parents)
}

/// Returns a copy of `map` where every taxonomy ID found in `merged` is replaced
/// by its merge target. One lookup per value; chains are not followed.
pub fn update_taxids(map: &AccessionTaxIdMap, merged: &MergeTable) -> AccessionTaxIdMap {
    let mut updated = map.clone();
    let mut replaced = 0usize;
    for taxid in updated.values_mut() {
        if let Some(new_id) = merged.get(*taxid) {
            *taxid = new_id;
            replaced += 1;
        }
    }
    log::debug!("Updated {} deprecated taxonomy IDs", replaced);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MERGED: &str = "80\t|\t155892\t|\n\
                          67\t|\t32033\t|\n\
                          36\t|\t184914\t|\n\
                          37\t|\t42\t|\n\
                          76\t|\t155892\t|\n\
                          234829\t|\t29\t|\n\
                          12\t|\t74109\t|\n\
                          77\t|\t74311\t|\n\
                          46\t|\t39\t|\n\
                          205879\t|\t74313\t|\n";

    const NODES: &str = "1\t|\t1\t|\tno rank\t|\t\t|\t8\t|\n\
                         2\t|\t131567\t|\tsuperkingdom\t|\t\t|\t0\t|\n\
                         6\t|\t335928\t|\tgenus\t|\t\t|\t0\t|\n";

    const NAMES: &str = "1\t|\tall\t|\t\t|\tsynonym\t|\n\
                         1\t|\troot\t|\t\t|\tscientific name\t|\n";

    fn fixture(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_ncbi_merged() {
        let dir = TempDir::new().unwrap();
        let merged = read_ncbi_merged(fixture(&dir, "merged.dmp", MERGED)).unwrap();

        assert_eq!(merged.len(), 10);
        assert_eq!(merged.get(205879), Some(74313));
        assert_eq!(merged.get(234829), Some(29));
        assert_eq!(merged.get(1), None);
    }

    #[test]
    fn test_read_ncbi_nodes() {
        let dir = TempDir::new().unwrap();
        let nodes = read_ncbi_nodes(fixture(&dir, "nodes.dmp", NODES)).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[&1], 1);
        assert_eq!(nodes[&6], 335928);
    }

    #[test]
    fn test_non_integer_fields_name_the_fields() {
        let dir = TempDir::new().unwrap();
        let err = read_ncbi_merged(fixture(&dir, "names.dmp", NAMES)).unwrap_err();
        match &err {
            ProfileError::Value { fields, line_no, .. } => {
                assert_eq!(fields, &vec!["1".to_string(), "all".to_string()]);
                assert_eq!(*line_no, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("(1, all)"));
    }

    #[test]
    fn test_missing_dump_is_read_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_ncbi_merged(dir.path().join("merged.dmp")),
            Err(ProfileError::Read { .. })
        ));
    }

    #[test]
    fn test_update_taxids_is_single_hop_and_copies() {
        let mut map = AccessionTaxIdMap::new();
        map.insert("GeneID", "1259969", 205879);
        map.insert("NC", "NC_004904.1", 234829);
        map.insert("gi", "389575461", 633697);

        let mut merged = MergeTable::new();
        merged.insert(205879, 74313);
        merged.insert(234829, 29);
        merged.insert(29, 30);

        let updated = update_taxids(&map, &merged);

        assert_eq!(updated.get("GeneID", "1259969"), Some(74313));
        assert_eq!(updated.get("NC", "NC_004904.1"), Some(29));
        assert_eq!(updated.get("gi", "389575461"), Some(633697));
        // the input is untouched
        assert_eq!(map.get("GeneID", "1259969"), Some(205879));
    }
}
