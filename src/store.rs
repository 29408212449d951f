//! Write-once resource store.

use std::collections::HashMap;

use crate::input::translation::BundleSource;
use crate::locale::Locales;
use crate::tree::TranslationTree;

/// One translation tree per supported locale.
///
/// Populated once by [`ResourceStore::load`] and read-only afterwards. An
/// empty store (`ResourceStore::default()`) stands for "not loaded yet":
/// every lookup against it misses.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    /// Locale code to tree
    trees: HashMap<String, TranslationTree>,
}

impl ResourceStore {
    /// Fetches every supported locale from `source` concurrently.
    ///
    /// A locale whose fetch fails gets an empty tree; the failure is logged,
    /// never returned.
    pub async fn load<S: BundleSource>(source: &S, locales: &Locales) -> Self {
        let fetches =
            locales.codes().map(move |code| async move { (code, source.fetch(code).await) });
        let results = futures::future::join_all(fetches).await;

        let mut trees = HashMap::with_capacity(results.len());
        for (code, result) in results {
            let tree = match result {
                Ok(tree) => {
                    tracing::debug!(locale = code, keys = tree.count_leaves(), "Loaded translations");
                    tree
                }
                Err(err) => {
                    tracing::warn!(locale = code, "Falling back to an empty tree: {err}");
                    TranslationTree::default()
                }
            };
            trees.insert(code.to_string(), tree);
        }

        Self { trees }
    }

    /// Builds a store from trees that are already in memory.
    #[must_use]
    pub fn from_trees<I, S>(trees: I) -> Self
    where
        I: IntoIterator<Item = (S, TranslationTree)>,
        S: Into<String>,
    {
        Self { trees: trees.into_iter().map(|(code, tree)| (code.into(), tree)).collect() }
    }

    #[must_use]
    pub fn tree(&self, locale: &str) -> Option<&TranslationTree> {
        self.trees.get(locale)
    }

    #[must_use]
    pub const fn trees(&self) -> &HashMap<String, TranslationTree> {
        &self.trees
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
