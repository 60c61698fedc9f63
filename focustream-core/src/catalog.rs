//! Stream catalog
//!
//! The catalog maps a category name to the ordered list of external media
//! ids behind it. It is loaded once at process start from a JSON file of
//! the shape `{"category": ["id", ...], ...}` and treated as immutable
//! afterwards; category order follows the file.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Category → ordered external ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    streams: IndexMap<String, Vec<String>>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Parse the catalog from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let streams: IndexMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|e| Error::Catalog(format!("malformed catalog JSON: {e}")))?;
        Ok(Self { streams })
    }

    /// Build a catalog directly from category/id pairs (used by tests and
    /// embedded deployments).
    #[must_use]
    pub fn from_entries<C, I>(entries: impl IntoIterator<Item = (C, Vec<I>)>) -> Self
    where
        C: Into<String>,
        I: Into<String>,
    {
        let streams = entries
            .into_iter()
            .map(|(category, ids)| {
                (
                    category.into(),
                    ids.into_iter().map(Into::into).collect::<Vec<_>>(),
                )
            })
            .collect();
        Self { streams }
    }

    /// Category names in file order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }

    #[must_use]
    pub fn contains_category(&self, category: &str) -> bool {
        self.streams.contains_key(category)
    }

    /// External ids for a category, in catalog order.
    #[must_use]
    pub fn ids(&self, category: &str) -> Option<&[String]> {
        self.streams.get(category).map(Vec::as_slice)
    }

    /// Every (category, external id) pair, in catalog order.
    pub fn all_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.streams
            .iter()
            .flat_map(|(category, ids)| ids.iter().map(move |id| (category.clone(), id.clone())))
    }

    /// Total number of external ids across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "lofi": ["a1", "a2", "a3"],
        "jazz": ["b1"],
        "nature": ["c1", "c2"]
    }"#;

    #[test]
    fn parses_categories_in_file_order() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("valid catalog");
        assert_eq!(catalog.categories(), vec!["lofi", "jazz", "nature"]);
        assert_eq!(catalog.len(), 6);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn ids_preserve_order_within_a_category() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("valid catalog");
        assert_eq!(
            catalog.ids("lofi").expect("known category"),
            ["a1", "a2", "a3"]
        );
        assert!(catalog.ids("metal").is_none());
    }

    #[test]
    fn all_pairs_walks_the_whole_catalog_in_order() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("valid catalog");
        let pairs: Vec<_> = catalog.all_pairs().collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0], ("lofi".to_string(), "a1".to_string()));
        assert_eq!(pairs[3], ("jazz".to_string(), "b1".to_string()));
        assert_eq!(pairs[5], ("nature".to_string(), "c2".to_string()));
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        let err = Catalog::from_json_str("{\"lofi\": [1, 2]}").expect_err("must fail");
        assert!(matches!(err, Error::Catalog(_)));

        let err = Catalog::from_json_str("not json at all").expect_err("must fail");
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let catalog = Catalog::from_json_file(file.path()).expect("valid catalog");
        assert_eq!(catalog.len(), 6);

        let err = Catalog::from_json_file("/nonexistent/streams.json").expect_err("must fail");
        assert!(matches!(err, Error::Catalog(_)));
    }
}
