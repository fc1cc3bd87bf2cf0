//src/config.rs

/// How an accession is cut out of the first tab-separated field of a marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessionRule {
    /// Take the text between the first and second occurrence of the delimiter
    /// (`gi|12345|...` with `'|'` yields `12345`).
    AfterDelimiter(char),
    /// Take the whole field.
    WholeField,
}

/// One recognised marker line shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    pub prefix: String,
    pub namespace: String,
    pub accession: AccessionRule,
}

impl MarkerRule {
    pub fn new(prefix: &str, namespace: &str, accession: AccessionRule) -> Self {
        Self {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            accession,
        }
    }
}

/// Rules for reading a marker database. Lines matching none of `rules` are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRules {
    pub rules: Vec<MarkerRule>,
    /// Text directly preceding the quoted clade name.
    pub clade_marker: String,
    /// Quote character closing the clade name.
    pub clade_quote: char,
}

impl Default for MarkerRules {
    fn default() -> Self {
        Self {
            rules: vec![
                MarkerRule::new("gi|", "gi", AccessionRule::AfterDelimiter('|')),
                MarkerRule::new("GeneID:", "GeneID", AccessionRule::AfterDelimiter(':')),
                MarkerRule::new("NC_", "NC", AccessionRule::WholeField),
            ],
            clade_marker: "clade': '".to_string(),
            clade_quote: '\'',
        }
    }
}

/// Rank layout and threshold used when trimming lineages by support.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageConfig {
    /// Rank codes from broadest to narrowest.
    pub ranks: Vec<String>,
    /// Text between a rank code and its taxon name (`k__Bacteria`).
    pub rank_delim: String,
    /// Text between ranks of a lineage.
    pub ranksep: String,
    /// A rank is kept only when its support ratio is strictly above this.
    pub min_support: f64,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            ranks: ["k", "p", "c", "o", "f", "g", "s", "t"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            rank_delim: "__".to_string(),
            ranksep: ";".to_string(),
            min_support: 0.5,
        }
    }
}

impl LineageConfig {
    /// Empty placeholder for a rank, e.g. `g__`.
    pub fn placeholder(&self, rank: &str) -> String {
        format!("{}{}", rank, self.rank_delim)
    }
}

/// Settings for extracting one rank level from a lineage-keyed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    /// Separator between ranks in the row labels.
    pub delim: String,
    pub rank_delim: String,
    /// Labels ending with this are unnamed taxa and never extracted.
    pub unnamed_suffix: String,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            delim: "|".to_string(),
            rank_delim: "__".to_string(),
            unnamed_suffix: "_unclassified".to_string(),
        }
    }
}

impl LevelConfig {
    pub fn with_delim(delim: &str) -> Self {
        Self {
            delim: delim.to_string(),
            ..Self::default()
        }
    }
}

/// Layout of two-column per-sample profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub comment_marker: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            comment_marker: "#".to_string(),
        }
    }
}

/// Column names picked out of a Bracken abundance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrackenColumns {
    pub taxid_column: String,
    pub count_column: String,
}

impl Default for BrackenColumns {
    fn default() -> Self {
        Self {
            taxid_column: "taxonomy_id".to_string(),
            count_column: "new_est_reads".to_string(),
        }
    }
}

/// Table-level metadata stamped into BIOM output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomOptions {
    pub table_id: String,
    pub table_type: String,
    pub generated_by: String,
}

impl Default for BiomOptions {
    fn default() -> Self {
        Self {
            table_id: "No Table ID".to_string(),
            table_type: "OTU table".to_string(),
            generated_by: format!("metaprofile-rs {}", env!("CARGO_PKG_VERSION")),
        }
    }
}
