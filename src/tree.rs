//! Read-only translation trees.

use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Translation bundle root must be an object, found {0}")]
    NotAnObject(&'static str),
}

/// Nested key/value content of one locale.
///
/// Values are strings, arrays of records (list content), or nested trees.
/// There is no mutating API: a tree is fixed once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranslationTree(Map<String, Value>);

impl TranslationTree {
    #[must_use]
    pub fn new(root: Map<String, Value>) -> Self {
        Self(root)
    }

    /// Wraps a parsed bundle.
    ///
    /// # Errors
    /// Returns [`TreeError::NotAnObject`] unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TreeError::NotAnObject(json_kind(&other))),
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Walks `key_path` one segment at a time.
    ///
    /// Returns `None` if a segment is absent, a segment is empty, or the walk
    /// has to descend into something that is not an object.
    #[must_use]
    pub fn get(&self, key_path: &str, separator: &str) -> Option<&Value> {
        walk(&self.0, key_path, separator)
    }

    /// Dotted paths of every leaf. Arrays count as leaves.
    #[must_use]
    pub fn leaf_paths(&self, separator: &str) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(&self.0, None, separator, &mut paths);
        paths
    }

    /// Number of leaves (strings, numbers, arrays...) in the tree.
    #[must_use]
    pub fn count_leaves(&self) -> usize {
        count_map_leaves(&self.0)
    }
}

impl From<Map<String, Value>> for TranslationTree {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Resolves `key_path` inside `root`.
pub(crate) fn walk<'a>(
    root: &'a Map<String, Value>,
    key_path: &str,
    separator: &str,
) -> Option<&'a Value> {
    if key_path.is_empty() || separator.is_empty() {
        return None;
    }

    let mut segments = key_path.split(separator);
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Appends the paths of all leaves under `map` to `paths`.
pub(crate) fn collect_leaf_paths(
    map: &Map<String, Value>,
    prefix: Option<&str>,
    separator: &str,
    paths: &mut Vec<String>,
) {
    for (key, value) in map {
        let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
        match value {
            Value::Object(child) if !child.is_empty() => {
                collect_leaf_paths(child, Some(&full_key), separator, paths);
            }
            Value::Object(_) => {}
            _ => paths.push(full_key),
        }
    }
}

/// Counts leaves under `map`; empty objects contribute nothing.
pub(crate) fn count_map_leaves(map: &Map<String, Value>) -> usize {
    map.values()
        .map(|value| match value {
            Value::Object(child) => count_map_leaves(child),
            _ => 1,
        })
        .sum()
}

/// Human-readable JSON type name for error messages.
pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recursively merges `overlay` into `base`; overlay wins on scalar conflicts.
pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn tree(value: Value) -> TranslationTree {
        TranslationTree::from_value(value).unwrap()
    }

    #[rstest]
    #[case::top_level("title", Some(json!("Welcome")))]
    #[case::nested("aboutPage.team.title", Some(json!("Our team")))]
    #[case::subtree("aboutPage.team", Some(json!({"title": "Our team", "members": [{"name": "Ada"}]})))]
    #[case::array("aboutPage.team.members", Some(json!([{"name": "Ada"}])))]
    #[case::absent("aboutPage.roadmap", None)]
    #[case::through_scalar("title.sub", None)]
    #[case::through_array("aboutPage.team.members.0", None)]
    #[case::empty_path("", None)]
    #[case::empty_segment("aboutPage..team", None)]
    #[case::trailing_separator("aboutPage.", None)]
    fn get_walks_key_paths(#[case] key_path: &str, #[case] expected: Option<Value>) {
        let tree = tree(json!({
            "title": "Welcome",
            "aboutPage": {
                "team": {"title": "Our team", "members": [{"name": "Ada"}]}
            }
        }));

        assert_eq!(tree.get(key_path, "."), expected.as_ref());
    }

    #[googletest::test]
    fn get_with_custom_separator() {
        let tree = tree(json!({"common": {"hello": "Hello"}}));

        assert_eq!(tree.get("common/hello", "/"), Some(&json!("Hello")));
        expect_that!(tree.get("common.hello", "/"), none());
        expect_that!(tree.get("common", ""), none());
    }

    #[googletest::test]
    fn from_value_rejects_non_objects() {
        assert_eq!(
            TranslationTree::from_value(json!(["a"])),
            Err(TreeError::NotAnObject("an array"))
        );
        expect_that!(TranslationTree::from_value(json!("x")), err(anything()));
    }

    #[googletest::test]
    fn leaf_paths_treat_arrays_as_leaves() {
        let tree = tree(json!({
            "common": {"hello": "Hello", "empty": {}},
            "team": {"members": [{"name": "Ada"}, {"name": "Bob"}]},
            "count": 3
        }));

        let mut paths = tree.leaf_paths(".");
        paths.sort();

        assert_eq!(paths, vec!["common.hello", "count", "team.members"]);
        expect_that!(tree.count_leaves(), eq(3));
    }

    #[googletest::test]
    fn deep_merge_combines_nested_objects() {
        let mut base = json!({"common": {"hello": "Hello"}, "title": "A"});
        let overlay = json!({"common": {"bye": "Bye"}, "title": "B"});

        if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut base, overlay) {
            deep_merge(base_map, overlay_map);
        }

        assert_eq!(base, json!({"common": {"hello": "Hello", "bye": "Bye"}, "title": "B"}));
    }
}
