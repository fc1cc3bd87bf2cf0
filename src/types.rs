//src/types.rs

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

pub type TaxId = u32;

/// Translation from a rank-level taxon name to a canonical identifier.
pub type TranslationMap = AHashMap<String, String>;

/// `(namespace, accession) -> taxonomy ID`, e.g. `("GeneID", "1259969") -> 205879`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessionTaxIdMap {
    entries: AHashMap<String, AHashMap<String, TaxId>>,
}

impl AccessionTaxIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or silently overwrites an entry.
    pub fn insert(&mut self, namespace: &str, accession: &str, taxid: TaxId) {
        self.entries
            .entry(namespace.to_string())
            .or_default()
            .insert(accession.to_string(), taxid);
    }

    pub fn get(&self, namespace: &str, accession: &str) -> Option<TaxId> {
        self.entries.get(namespace)?.get(accession).copied()
    }

    pub fn namespace(&self, namespace: &str) -> Option<&AHashMap<String, TaxId>> {
        self.entries.get(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of leaf entries across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut TaxId> {
        self.entries.values_mut().flat_map(|m| m.values_mut())
    }
}

/// `clade -> namespace -> accessions` built from a marker database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CladeIndex {
    clades: AHashMap<String, AHashMap<String, AHashSet<String>>>,
}

impl CladeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_marker(&mut self, clade: &str, namespace: &str, accession: &str) {
        self.clades
            .entry(clade.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .insert(accession.to_string());
    }

    pub fn get(&self, clade: &str) -> Option<&AHashMap<String, AHashSet<String>>> {
        self.clades.get(clade)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AHashMap<String, AHashSet<String>>)> {
        self.clades.iter()
    }

    pub fn len(&self) -> usize {
        self.clades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clades.is_empty()
    }
}

/// Deprecated taxonomy ID -> its current replacement. Applied one hop only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeTable {
    merged: AHashMap<TaxId, TaxId>,
}

impl MergeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: TaxId, new: TaxId) {
        self.merged.insert(old, new);
    }

    pub fn get(&self, old: TaxId) -> Option<TaxId> {
        self.merged.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

impl From<AHashMap<TaxId, TaxId>> for MergeTable {
    fn from(merged: AHashMap<TaxId, TaxId>) -> Self {
        Self { merged }
    }
}

/// Clade name -> the set of taxonomy IDs its markers resolve to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CladeTaxIdTable {
    clades: AHashMap<String, BTreeSet<TaxId>>,
}

impl CladeTaxIdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clade: &str, taxids: BTreeSet<TaxId>) {
        self.clades.insert(clade.to_string(), taxids);
    }

    pub fn get(&self, clade: &str) -> Option<&BTreeSet<TaxId>> {
        self.clades.get(clade)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<TaxId>)> {
        self.clades.iter()
    }

    pub fn len(&self) -> usize {
        self.clades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clades.is_empty()
    }

    /// Clades resolving to exactly one taxonomy ID, mapped to that ID.
    /// Clades spanning several IDs have no canonical translation and are left out.
    pub fn translation(&self) -> TranslationMap {
        self.clades
            .iter()
            .filter(|(_, ids)| ids.len() == 1)
            .filter_map(|(clade, ids)| ids.iter().next().map(|id| (clade.clone(), id.to_string())))
            .collect()
    }
}
