//src/clade_map.rs

use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ProfileError, Result};
use crate::output::write_atomically;
use crate::reader::read_numbered_lines;
use crate::types::{AccessionTaxIdMap, CladeIndex, CladeTaxIdTable, TaxId};

/// Header line of a clade table file, as used by existing MetaPhlAn2 clade maps.
pub const CLADE_TABLE_HEADER: &str = "metaphlan2_clade\tNCBI_taxids";

/// Resolves every accession of every clade to its taxonomy ID.
///
/// Accession lists and the ID map must come from the same reference release:
/// an accession missing from `taxids` fails with
/// [`ProfileError::MissingAccession`] instead of being dropped.
pub fn resolve_clade_taxids(index: &CladeIndex, taxids: &AccessionTaxIdMap) -> Result<CladeTaxIdTable> {
    let mut table = CladeTaxIdTable::new();

    for (clade, namespaces) in index.iter() {
        let mut ids: BTreeSet<TaxId> = BTreeSet::new();
        for (namespace, accessions) in namespaces.iter() {
            for accession in accessions.iter() {
                let taxid = taxids.get(namespace, accession).ok_or_else(|| ProfileError::MissingAccession {
                    clade: clade.clone(),
                    namespace: namespace.clone(),
                    accession: accession.clone(),
                })?;
                ids.insert(taxid);
            }
        }
        table.insert(clade, ids);
    }

    log::info!("Resolved {} clades to taxonomy IDs", table.len());
    Ok(table)
}

/// Writes `<clade>\t<taxid>,<taxid>,...` lines under [`CLADE_TABLE_HEADER`],
/// clades sorted by name.
pub fn write_clade_taxid_table<P: AsRef<Path>>(filepath: P, table: &CladeTaxIdTable) -> Result<()> {
    let path = filepath.as_ref();
    let mut rows: Vec<(&String, &BTreeSet<TaxId>)> = table.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    write_atomically(path, |tmp| {
        let mut out = BufWriter::new(tmp.as_file_mut());
        let mut write_all = || -> std::io::Result<()> {
            writeln!(out, "{}", CLADE_TABLE_HEADER)?;
            for (clade, ids) in &rows {
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                writeln!(out, "{}\t{}", clade, joined.join(","))?;
            }
            out.flush()
        };
        write_all().map_err(|e| ProfileError::write(path, e))
    })?;

    log::info!("Wrote {} clades to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a clade table written by [`write_clade_taxid_table`]. A first line
/// equal to [`CLADE_TABLE_HEADER`] and lines starting with `#` are skipped.
pub fn read_clade_taxid_table<P: AsRef<Path>>(filepath: P) -> Result<CladeTaxIdTable> {
    let path = filepath.as_ref();
    let mut table = CladeTaxIdTable::new();

    for (line_no, line) in read_numbered_lines(path)? {
        let is_header = line_no == 1 && line.trim_end() == CLADE_TABLE_HEADER;
        if is_header || line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let Some((clade, ids)) = line.split_once('\t') else {
            return Err(ProfileError::parse(path, line_no, &line, "expected 2 tab-separated fields"));
        };

        let mut taxids = BTreeSet::new();
        for id in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let taxid: TaxId = id.parse().map_err(|_| {
                ProfileError::parse(path, line_no, &line, format!("taxonomy ID '{}' is not an integer", id))
            })?;
            taxids.insert(taxid);
        }
        table.insert(clade, taxids);
    }

    log::info!("Loaded {} clades from {}", table.len(), path.display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> CladeIndex {
        let mut index = CladeIndex::new();
        index.add_marker("s__Cypovirus_15", "NC", "NC_002560.1");
        index.add_marker("s__Cypovirus_15", "NC", "NC_002566.1");
        index.add_marker("s__Escherichia_phage_vB_EcoP_G7C", "GeneID", "11117645");
        index.add_marker("s__Escherichia_phage_vB_EcoP_G7C", "gi", "1");
        index
    }

    fn sample_map() -> AccessionTaxIdMap {
        let mut map = AccessionTaxIdMap::new();
        map.insert("NC", "NC_002560.1", 134606);
        map.insert("NC", "NC_002566.1", 134606);
        map.insert("GeneID", "11117645", 1054461);
        map.insert("gi", "1", 7);
        map
    }

    #[test]
    fn test_resolve_collects_distinct_ids() {
        let table = resolve_clade_taxids(&sample_index(), &sample_map()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("s__Cypovirus_15"), Some(&BTreeSet::from([134606])));
        assert_eq!(
            table.get("s__Escherichia_phage_vB_EcoP_G7C"),
            Some(&BTreeSet::from([7, 1054461]))
        );
    }

    #[test]
    fn test_missing_accession_is_fatal() {
        let mut index = sample_index();
        index.add_marker("s__Cypovirus_15", "NC", "NC_999999.1");

        match resolve_clade_taxids(&index, &sample_map()) {
            Err(ProfileError::MissingAccession { clade, namespace, accession }) => {
                assert_eq!(clade, "s__Cypovirus_15");
                assert_eq!(namespace, "NC");
                assert_eq!(accession, "NC_999999.1");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_table_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clades.tsv");
        let table = resolve_clade_taxids(&sample_index(), &sample_map()).unwrap();

        write_clade_taxid_table(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "metaphlan2_clade\tNCBI_taxids\ns__Cypovirus_15\t134606\ns__Escherichia_phage_vB_EcoP_G7C\t7,1054461\n"
        );

        assert_eq!(read_clade_taxid_table(&path).unwrap(), table);
    }

    #[test]
    fn test_reads_maps_with_either_header() {
        let dir = TempDir::new().unwrap();
        let tabular = dir.path().join("map_metaphlanclade_ncbitaxids.tsv");
        std::fs::write(&tabular, "metaphlan2_clade\tNCBI_taxids\ns__Cypovirus_15\t134606\n").unwrap();
        let commented = dir.path().join("clades.tsv");
        std::fs::write(&commented, "#clade\ttaxids\ns__Cypovirus_15\t134606\n").unwrap();

        for path in [tabular, commented] {
            let table = read_clade_taxid_table(&path).unwrap();
            assert_eq!(table.len(), 1);
            assert_eq!(table.get("s__Cypovirus_15"), Some(&BTreeSet::from([134606])));
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clades.tsv");
        let table = resolve_clade_taxids(&sample_index(), &sample_map()).unwrap();
        write_clade_taxid_table(&path, &table).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let missing_dir = dir.path().join("gone").join("clades.tsv");
        assert!(matches!(
            write_clade_taxid_table(&missing_dir, &table),
            Err(ProfileError::Write { .. })
        ));
        assert!(!missing_dir.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_write_into_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            write_clade_taxid_table(dir.path(), &CladeTaxIdTable::new()),
            Err(ProfileError::Write { .. })
        ));
    }
}
