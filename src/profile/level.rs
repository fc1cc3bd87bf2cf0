//src/profile/level.rs

use ahash::AHashMap;

use super::matrix::ProfileMatrix;
use crate::config::LevelConfig;
use crate::error::{ProfileError, Result};
use crate::types::TranslationMap;

/// The taxon of `label` at rank `code`, if its last segment names one.
///
/// A segment qualifies when it starts with `code` + rank delimiter, carries a
/// name after that prefix, and is not an unnamed placeholder.
fn level_key<'a>(label: &'a str, code: &str, config: &LevelConfig) -> Option<&'a str> {
    let last = label.rsplit(config.delim.as_str()).next()?;
    let prefix_len = code.len() + config.rank_delim.len();
    let matches = last.len() > prefix_len
        && last.starts_with(code)
        && last[code.len()..].starts_with(config.rank_delim.as_str())
        && !last.ends_with(config.unnamed_suffix.as_str());
    matches.then_some(last)
}

/// Extracts the rows of one rank level from a lineage-keyed table and re-keys
/// them by their last lineage segment (`k__Bacteria|p__Firmicutes` becomes
/// `p__Firmicutes` for code `p`).
///
/// Two distinct lineages ending in the same segment fail with
/// [`ProfileError::DuplicateTaxa`]; they are never summed. When `dic` is
/// given, the extracted names are translated through it a second time and
/// rows whose translations coincide ARE summed. Names missing from `dic` keep
/// their name.
pub fn extract_level(
    table: &ProfileMatrix,
    code: &str,
    config: &LevelConfig,
    dic: Option<&TranslationMap>,
) -> Result<ProfileMatrix> {
    let mut first_label: AHashMap<&str, &str> = AHashMap::new();
    let mut duplicates: Vec<String> = Vec::new();
    for feature in table.features() {
        if let Some(key) = level_key(feature, code, config) {
            if first_label.insert(key, feature).is_some() && !duplicates.iter().any(|d| d == key) {
                duplicates.push(key.to_string());
            }
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(ProfileError::DuplicateTaxa { code: code.to_string(), names: duplicates });
    }

    let level = table.regroup_filtered(|feature| level_key(feature, code, config).map(str::to_string));
    log::info!("Extracted {} taxa at level '{}'", level.n_features(), code);

    let Some(dic) = dic else {
        return Ok(level);
    };
    let untranslated = level.features().iter().filter(|f| !dic.contains_key(f.as_str())).count();
    if untranslated > 0 {
        log::debug!("{} taxa at level '{}' have no translation", untranslated, code);
    }
    let translated = level.regroup(|name| dic.get(name).cloned().unwrap_or_else(|| name.to_string()));
    log::info!("Translated level '{}' into {} identifiers", code, translated.n_features());
    Ok(translated)
}
