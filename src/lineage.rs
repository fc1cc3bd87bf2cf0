//src/lineage.rs

use ahash::AHashMap;
use std::str::FromStr;

use crate::config::LineageConfig;
use crate::error::{ProfileError, Result};
use crate::profile::ProfileMatrix;
use crate::reader::read_numbered_lines;

/// Evidence for one rank of a lineage: how many hits agree on the taxon out of
/// how many were considered. Written as `"<evidence>;<range>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    pub evidence: f64,
    pub range: f64,
}

impl Support {
    /// `evidence / range`, or `None` when the range is empty.
    pub fn ratio(&self) -> Option<f64> {
        if self.range > 0.0 {
            Some(self.evidence / self.range)
        } else {
            None
        }
    }

    pub fn is_supported(&self, min_support: f64) -> bool {
        self.ratio().map_or(false, |r| r > min_support)
    }
}

impl FromStr for Support {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProfileError::InvalidSupport { value: s.to_string() };
        let (evidence, range) = s.trim().split_once(';').ok_or_else(invalid)?;
        Ok(Support {
            evidence: evidence.trim().parse().map_err(|_| invalid())?,
            range: range.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Truncates `lineage` at the first rank whose support ratio does not exceed
/// `config.min_support`.
///
/// Ranks are walked broadest first. The failing rank and every rank after it
/// become empty placeholders (`g__`), whatever their own support, so the
/// result always has exactly `config.ranks.len()` fields. A zero range counts
/// as unsupported.
pub fn trim_lineage<S: AsRef<str>>(lineage: &str, supports: &[S], config: &LineageConfig) -> Result<String> {
    let fields: Vec<&str> = lineage.split(config.ranksep.as_str()).collect();
    let expected = config.ranks.len();
    if fields.len() != expected {
        return Err(ProfileError::LineageShape { what: "lineage", expected, found: fields.len() });
    }
    if supports.len() != expected {
        return Err(ProfileError::LineageShape { what: "support list", expected, found: supports.len() });
    }
    let supports = supports
        .iter()
        .map(|s| s.as_ref().parse::<Support>())
        .collect::<Result<Vec<_>>>()?;

    let mut trimmed = Vec::with_capacity(expected);
    let mut supported = true;
    for ((field, support), rank) in fields.iter().zip(&supports).zip(&config.ranks) {
        supported = supported && support.is_supported(config.min_support);
        if supported {
            trimmed.push(field.to_string());
        } else {
            trimmed.push(config.placeholder(rank));
        }
    }
    Ok(trimmed.join(&config.ranksep))
}

/// Trims the lineage label of every row that has an entry in `supports`, then
/// sums rows whose trimmed lineages coincide. Rows without supports keep
/// their label.
pub fn trim_table_lineages(
    table: &ProfileMatrix,
    supports: &AHashMap<String, Vec<String>>,
    config: &LineageConfig,
) -> Result<ProfileMatrix> {
    let mut labels = AHashMap::with_capacity(table.n_features());
    for feature in table.features() {
        let label = match supports.get(feature) {
            Some(s) => trim_lineage(feature, s.as_slice(), config)?,
            None => feature.clone(),
        };
        labels.insert(feature.clone(), label);
    }
    let trimmed = table.regroup(|feature| labels.get(feature).cloned().unwrap_or_else(|| feature.to_string()));
    log::info!(
        "Trimmed {} lineages to {} supported lineages",
        table.n_features(),
        trimmed.n_features()
    );
    Ok(trimmed)
}

/// Reads per-lineage support lists, one lineage per line:
/// ```text
/// <lineage>\t<evidence;range>\t<evidence;range>...
/// ```
/// Lines starting with `#` and blank lines are skipped. Support tuples are
/// validated when trimmed, not here.
pub fn read_lineage_supports<P: AsRef<std::path::Path>>(filepath: P) -> Result<AHashMap<String, Vec<String>>> {
    let path = filepath.as_ref();
    let mut supports = AHashMap::new();
    for (line_no, line) in read_numbered_lines(path)? {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let lineage = fields.next().unwrap_or_default().to_string();
        let values: Vec<String> = fields.map(|f| f.trim().to_string()).collect();
        if values.is_empty() {
            return Err(ProfileError::parse(path, line_no, &line, "lineage has no support values"));
        }
        if supports.insert(lineage.clone(), values).is_some() {
            return Err(ProfileError::DuplicateFeature { path: path.to_path_buf(), feature: lineage });
        }
    }
    log::info!("Loaded supports for {} lineages from {}", supports.len(), path.display());
    Ok(supports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_ranks() -> LineageConfig {
        LineageConfig {
            ranks: vec!["k".into(), "p".into(), "c".into()],
            ..LineageConfig::default()
        }
    }

    #[test]
    fn test_unsupported_kingdom_trims_everything() {
        let out = trim_lineage("k__Bacteria;p__X;c__Y", &["1;70", "1;70", "70;70"], &three_ranks()).unwrap();
        assert_eq!(out, "k__;p__;c__");
    }

    #[test]
    fn test_trimming_is_monotonic() {
        let out = trim_lineage("k__Bacteria;p__X;c__Y", &["70;70", "10;70", "70;70"], &three_ranks()).unwrap();
        assert_eq!(out, "k__Bacteria;p__;c__");
    }

    #[test]
    fn test_fully_supported_lineage_is_unchanged() {
        let out = trim_lineage("k__Bacteria;p__X;c__Y", &["70;70", "60;70", "36;70"], &three_ranks()).unwrap();
        assert_eq!(out, "k__Bacteria;p__X;c__Y");
    }

    #[test]
    fn test_threshold_is_strict_and_zero_range_unsupported() {
        let config = three_ranks();
        let out = trim_lineage("k__A;p__B;c__C", &["1;1", "35;70", "1;1"], &config).unwrap();
        assert_eq!(out, "k__A;p__;c__");

        let out = trim_lineage("k__A;p__B;c__C", &["1;1", "1;1", "0;0"], &config).unwrap();
        assert_eq!(out, "k__A;p__B;c__");
    }

    #[test]
    fn test_output_always_has_every_rank() {
        let config = LineageConfig::default();
        let lineage = "k__Bacteria;p__Proteobacteria;c__Gammaproteobacteria;o__Enterobacterales;\
                       f__Enterobacteriaceae;g__Escherichia;s__Escherichia_coli;t__K12";
        let supports = ["9;10", "9;10", "9;10", "9;10", "2;10", "9;10", "9;10", "9;10"];
        let out = trim_lineage(lineage, &supports, &config).unwrap();

        let fields: Vec<&str> = out.split(';').collect();
        assert_eq!(fields.len(), 8);
        for (field, rank) in fields.iter().zip(&config.ranks) {
            assert!(field.starts_with(&format!("{rank}__")));
        }
        assert_eq!(fields[3], "o__Enterobacterales");
        assert_eq!(&fields[4..], &["f__", "g__", "s__", "t__"]);
    }

    #[test]
    fn test_shape_and_support_errors() {
        let config = three_ranks();
        assert!(matches!(
            trim_lineage("k__A;p__B", &["1;1", "1;1", "1;1"], &config),
            Err(ProfileError::LineageShape { what: "lineage", expected: 3, found: 2 })
        ));
        assert!(matches!(
            trim_lineage("k__A;p__B;c__C", &["1;1"], &config),
            Err(ProfileError::LineageShape { what: "support list", .. })
        ));
        assert!(matches!(
            trim_lineage("k__A;p__B;c__C", &["1;1", "x;1", "1;1"], &config),
            Err(ProfileError::InvalidSupport { .. })
        ));
    }

    #[test]
    fn test_trim_table_sums_collapsed_lineages() {
        let table = ProfileMatrix::from_rows(
            vec!["k__A;p__B;c__C".into(), "k__A;p__B;c__D".into(), "k__A;p__E;c__F".into()],
            vec!["s1".into(), "s2".into()],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        );
        let mut supports = AHashMap::new();
        supports.insert("k__A;p__B;c__C".to_string(), vec!["1;1".into(), "1;1".into(), "0;1".into()]);
        supports.insert("k__A;p__B;c__D".to_string(), vec!["1;1".into(), "1;1".into(), "0;1".into()]);

        let trimmed = trim_table_lineages(&table, &supports, &three_ranks()).unwrap();
        assert_eq!(trimmed.n_features(), 2);
        assert_eq!(trimmed.row("k__A;p__B;c__"), Some(&[4.0, 6.0][..]));
        assert_eq!(trimmed.row("k__A;p__E;c__F"), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn test_read_lineage_supports() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("supports.tsv");
        std::fs::write(&path, "#lineage\tk\tp\tc\nk__A;p__B;c__C\t9;10\t8;10\t2;10\n\n").unwrap();

        let supports = read_lineage_supports(&path).unwrap();
        assert_eq!(supports.len(), 1);
        let s = &supports["k__A;p__B;c__C"];
        assert_eq!(trim_lineage("k__A;p__B;c__C", s.as_slice(), &three_ranks()).unwrap(), "k__A;p__B;c__");
    }
}
