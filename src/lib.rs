// src/lib.rs
pub mod biom;
pub mod clade_map;
pub mod config;
pub mod error;
pub mod lineage;
pub mod markers;
mod output;
pub mod profile;
pub mod reader;
pub mod taxdb;
pub mod taxid_list;
pub mod types;

use std::path::Path;

pub use crate::biom::{read_biom_json, write_biom, BiomFormat};
#[cfg(feature = "hdf5")]
pub use crate::biom::read_biom_hdf5;
pub use crate::clade_map::{read_clade_taxid_table, resolve_clade_taxids, write_clade_taxid_table};
pub use crate::config::{
    BiomOptions, BrackenColumns, LevelConfig, LineageConfig, MarkerRules, ProfileConfig,
};
pub use crate::error::{ProfileError, Result};
pub use crate::lineage::{trim_lineage, trim_table_lineages};
pub use crate::markers::read_marker_clades;
pub use crate::profile::{
    combine_bracken, combine_profiles, extract_level, read_profile_table, write_profile_table,
    ProfileMatrix,
};
pub use crate::taxdb::{read_ncbi_merged, update_taxids};
pub use crate::taxid_list::{read_taxid_list, read_taxid_list_many};
pub use crate::types::{AccessionTaxIdMap, CladeIndex, CladeTaxIdTable, MergeTable, TaxId, TranslationMap};

/// Builds the clade -> taxonomy IDs table of a marker database and writes it
/// to `output`.
///
/// 1. Load the accession lists in order (later files win).
/// 2. Remap deprecated IDs through `merged`, when given.
/// 3. Index the marker database by clade.
/// 4. Resolve every marker accession; any unresolved accession fails the run
///    and nothing is written.
pub fn generate_clade_taxid_map<P: AsRef<Path>>(
    taxid_lists: &[P],
    markers: &Path,
    merged: Option<&Path>,
    output: &Path,
    rules: &MarkerRules,
) -> Result<CladeTaxIdTable> {
    let mut taxids = read_taxid_list_many(taxid_lists)?;
    if let Some(merged_path) = merged {
        let merges = read_ncbi_merged(merged_path)?;
        taxids = update_taxids(&taxids, &merges);
    }

    let index = read_marker_clades(markers, rules)?;
    let table = resolve_clade_taxids(&index, &taxids)?;
    write_clade_taxid_table(output, &table)?;
    Ok(table)
}
