//! Recipe document store.
//!
//! The store is a plain collection of recipe documents keyed by `_id`. Two
//! backends exist: [`MemoryStore`] for tests and ephemeral runs, and
//! [`JsonFileStore`] which mirrors the collection to a JSON file on every write.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use crate::recipe::Recipe;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

const BUNDLED_SEED: &str = include_str!("../../data/recipes.json");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access recipe file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("recipe collection is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of an unordered bulk insert. Duplicate identifiers are skipped
/// rather than aborting the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub rejected: Vec<String>,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn all(&self) -> Result<Vec<Recipe>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Recipe>, StoreError>;

    /// The stored document for `id` as-is, including documents that never
    /// deserialized into a [`Recipe`].
    async fn document(&self, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.get(id).await?.map(serde_json::to_value).transpose()?)
    }

    async fn count(&self) -> Result<usize, StoreError>;

    /// Hands out `n` fresh sequential identifiers, starting after the current
    /// collection size (or the highest numeric `_id`, if larger). Identifiers
    /// already handed out are never reused.
    async fn reserve_ids(&self, n: usize) -> Result<Vec<String>, StoreError>;

    async fn insert_many(&self, recipes: Vec<Recipe>) -> Result<InsertSummary, StoreError>;

    /// Returns false when no recipe has this id.
    async fn set_image(&self, id: &str, image: &str) -> Result<bool, StoreError>;
}

/// A loaded collection, split by whether each document deserialized.
/// `unparsed` documents are kept verbatim and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub recipes: Vec<Recipe>,
    pub unparsed: Vec<Value>,
}

pub fn ingest_documents(documents: Vec<Value>) -> Ingested {
    let mut ingested = Ingested::default();
    for (index, document) in documents.into_iter().enumerate() {
        match Recipe::from_document(document.clone()) {
            Ok(recipe) => ingested.recipes.push(recipe),
            Err(e) => {
                warn!(index, error = %e, "keeping malformed recipe document unparsed");
                ingested.unparsed.push(document);
            }
        }
    }
    ingested
}

/// `_id` of a raw document, falling back to the legacy `id` field.
pub fn document_id(document: &Value) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match document.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub fn bundled_recipes() -> Result<Vec<Recipe>, StoreError> {
    let documents: Vec<Value> = serde_json::from_str(BUNDLED_SEED)?;
    Ok(ingest_documents(documents).recipes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_seed_is_complete() {
        let recipes = bundled_recipes().unwrap();
        assert_eq!(recipes.len(), 9);
        assert!(recipes.iter().all(|r| r.servings >= 1));
    }

    #[test]
    fn malformed_documents_are_kept_aside() {
        let broken = json!({"title": "no id and nothing else"});
        let ingested = ingest_documents(vec![
            broken.clone(),
            serde_json::to_value(crate::recipe::test_support::recipe("5", "Soup")).unwrap(),
        ]);
        assert_eq!(ingested.recipes.len(), 1);
        assert_eq!(ingested.recipes[0].id, "5");
        assert_eq!(ingested.unparsed, vec![broken]);
    }

    #[test]
    fn document_ids_accept_legacy_and_numeric_forms() {
        assert_eq!(document_id(&json!({"_id": "7"})), Some("7".to_string()));
        assert_eq!(document_id(&json!({"id": 12})), Some("12".to_string()));
        assert_eq!(document_id(&json!({"title": "x"})), None);
    }
}
