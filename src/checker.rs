//! Translation completeness checks against a reference locale.
//!
//! Arrays are opaque leaves throughout: they are checked for presence only,
//! never compared element by element.

use std::collections::{
    BTreeMap,
    HashMap,
};

use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::tree::{
    TranslationTree,
    collect_leaf_paths,
    count_map_leaves,
};

/// Marker shown in place of the key list when a locale has no content at all.
pub const ENTIRE_LOCALE_MISSING: &str = "entire locale missing";

/// Section (top-level key) to the missing paths beneath it.
pub type MissingKeysReport = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckerError {
    #[error("Reference locale '{0}' has no translations loaded")]
    ReferenceLocaleMissing(String),
}

/// Completeness of one locale relative to the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleReport {
    /// Leaves in the reference tree
    pub reference_key_count: usize,
    /// Reference leaves absent from this locale
    pub missing_keys: Vec<String>,
    /// `missing_keys` grouped by section
    pub missing_by_section: MissingKeysReport,
    /// Leaves of this locale absent from the reference
    pub extra_keys: Vec<String>,
    /// Percentage of reference leaves present, 0 to 100
    pub completeness: f64,
    /// Locale has no content while the reference does
    pub entire_locale_missing: bool,
}

impl LocaleReport {
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.missing_keys.len()
    }

    #[must_use]
    pub fn extra_count(&self) -> usize {
        self.extra_keys.len()
    }
}

/// Keys of `reference` absent from `target`, grouped by section.
///
/// A missing subtree is reported once, by its root path. An empty report
/// means the target is complete.
#[must_use]
pub fn find_missing_keys(
    reference: &TranslationTree,
    target: &TranslationTree,
    separator: &str,
) -> MissingKeysReport {
    group_by_section(absent_paths(reference.as_map(), target.as_map(), separator, false))
}

/// Keys of `target` absent from `reference` (orphaned entries).
#[must_use]
pub fn find_extra_keys(
    reference: &TranslationTree,
    target: &TranslationTree,
    separator: &str,
) -> Vec<String> {
    absent_paths(target.as_map(), reference.as_map(), separator, false)
        .into_iter()
        .map(|absent| absent.path)
        .collect()
}

/// Reports every locale in `trees` except the reference against it.
///
/// Counts are leaf-level, so a missing subtree contributes each of its leaves.
///
/// # Errors
/// Returns [`CheckerError::ReferenceLocaleMissing`] when `reference_code` is
/// not in `trees`.
pub fn check_all_locales<S: std::hash::BuildHasher>(
    trees: &HashMap<String, TranslationTree, S>,
    reference_code: &str,
    separator: &str,
) -> Result<BTreeMap<String, LocaleReport>, CheckerError> {
    let reference = trees
        .get(reference_code)
        .ok_or_else(|| CheckerError::ReferenceLocaleMissing(reference_code.to_string()))?;
    let reference_key_count = reference.count_leaves();

    let reports = trees
        .iter()
        .filter(|(code, _)| code.as_str() != reference_code)
        .map(|(code, target)| {
            let missing = absent_paths(reference.as_map(), target.as_map(), separator, true);
            let missing_keys: Vec<String> =
                missing.iter().map(|absent| absent.path.clone()).collect();
            let extra_keys = absent_paths(target.as_map(), reference.as_map(), separator, true)
                .into_iter()
                .map(|absent| absent.path)
                .collect();
            let report = LocaleReport {
                reference_key_count,
                completeness: completeness(reference_key_count, missing_keys.len()),
                missing_by_section: group_by_section(missing),
                missing_keys,
                extra_keys,
                entire_locale_missing: target.is_empty() && reference_key_count > 0,
            };
            tracing::debug!(
                locale = %code,
                missing = report.missing_count(),
                extra = report.extra_count(),
                "Checked locale"
            );
            (code.clone(), report)
        })
        .collect();

    Ok(reports)
}

/// Builds a tree shaped exactly like `reference`.
///
/// Leaves present in `existing` keep their value; every other leaf becomes
/// an empty string. An existing object where the reference has a leaf is
/// replaced too, matching [`find_missing_keys`]. Reference text is never
/// copied.
#[must_use]
pub fn create_filled_translations(
    reference: &TranslationTree,
    existing: &TranslationTree,
) -> TranslationTree {
    TranslationTree::new(fill(reference.as_map(), Some(existing.as_map())))
}

/// Number of leaves in `tree`.
#[must_use]
pub fn count_keys(tree: &TranslationTree) -> usize {
    tree.count_leaves()
}

/// Pending comparison in [`absent_paths`].
struct Entry<'a> {
    /// Top-level key this entry descends from
    section: &'a str,
    /// Full key path
    path: String,
    /// Value on the side being enumerated
    value: &'a Value,
    /// Same position on the other side, if present
    other: Option<&'a Value>,
}

/// Key path found on one side only.
struct AbsentPath<'a> {
    /// Top-level key the path descends from
    section: &'a str,
    /// Full key path
    path: String,
}

/// Paths under `base` that `other` lacks, in pre-order.
///
/// With `expand_leaves`, an absent subtree yields its leaf paths; otherwise
/// it yields its own path. Objects without leaves are skipped. An object and
/// a non-object never match each other.
fn absent_paths<'a>(
    base: &'a Map<String, Value>,
    other: &'a Map<String, Value>,
    separator: &str,
    expand_leaves: bool,
) -> Vec<AbsentPath<'a>> {
    let mut absent = Vec::new();
    let mut stack: Vec<Entry<'a>> = base
        .iter()
        .rev()
        .map(|(key, value)| Entry {
            section: key.as_str(),
            path: key.clone(),
            value,
            other: other.get(key),
        })
        .collect();

    while let Some(Entry { section, path, value, other }) = stack.pop() {
        match (value, other) {
            (Value::Object(children), _) if count_map_leaves(children) == 0 => {}
            (Value::Object(children), Some(Value::Object(other_children))) => {
                stack.extend(children.iter().rev().map(|(key, child)| Entry {
                    section,
                    path: format!("{path}{separator}{key}"),
                    value: child,
                    other: other_children.get(key),
                }));
            }
            (Value::Object(children), _) if expand_leaves => {
                let mut leaves = Vec::new();
                collect_leaf_paths(children, Some(&path), separator, &mut leaves);
                absent.extend(leaves.into_iter().map(|path| AbsentPath { section, path }));
            }
            (Value::Object(_), _) | (_, None | Some(Value::Object(_))) => {
                absent.push(AbsentPath { section, path });
            }
            (_, Some(_)) => {}
        }
    }

    absent
}

/// Groups paths by the section they descend from.
fn group_by_section(paths: Vec<AbsentPath<'_>>) -> MissingKeysReport {
    let mut report = MissingKeysReport::new();
    for AbsentPath { section, path } in paths {
        report.entry(section.to_string()).or_default().push(path);
    }
    report
}

/// Recursive worker of [`create_filled_translations`].
fn fill(reference: &Map<String, Value>, existing: Option<&Map<String, Value>>) -> Map<String, Value> {
    reference
        .iter()
        .map(|(key, reference_value)| {
            let existing_value = existing.and_then(|map| map.get(key));
            let filled = match (reference_value, existing_value) {
                (Value::Object(children), _) => {
                    Value::Object(fill(children, existing_value.and_then(Value::as_object)))
                }
                (_, Some(value)) if !value.is_object() => value.clone(),
                _ => Value::String(String::new()),
            };
            (key.clone(), filled)
        })
        .collect()
}

/// `(total - missing) / total * 100`, or 100 for an empty reference.
#[allow(clippy::float_arithmetic, clippy::cast_precision_loss)]
fn completeness(total: usize, missing: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    total.saturating_sub(missing) as f64 / total as f64 * 100.0
}
