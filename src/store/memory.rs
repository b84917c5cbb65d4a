use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::RwLock;

use super::{document_id, ingest_documents, Ingested, InsertSummary, RecipeStore, StoreError};
use crate::recipe::Recipe;

#[derive(Debug, Default)]
struct Collection {
    recipes: Vec<Recipe>,
    // Documents that failed to deserialize; never searched, never dropped.
    unparsed: Vec<Value>,
    // Highest identifier handed out by reserve_ids so far.
    last_reserved: usize,
}

impl Collection {
    fn len(&self) -> usize {
        self.recipes.len() + self.unparsed.len()
    }

    fn highest_numeric_id(&self) -> usize {
        self.recipes
            .iter()
            .map(|recipe| recipe.id.clone())
            .chain(self.unparsed.iter().filter_map(document_id))
            .filter_map(|id| id.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
    }

    fn reserve(&mut self, n: usize) -> Vec<String> {
        let start = self
            .last_reserved
            .max(self.len())
            .max(self.highest_numeric_id())
            + 1;
        self.last_reserved = start + n - 1;
        (start..start + n).map(|id| id.to_string()).collect()
    }

    fn insert_unordered(&mut self, recipes: Vec<Recipe>) -> InsertSummary {
        let mut seen: HashSet<String> = self
            .recipes
            .iter()
            .map(|r| r.id.clone())
            .chain(self.unparsed.iter().filter_map(document_id))
            .collect();
        let mut summary = InsertSummary::default();
        for recipe in recipes {
            if seen.insert(recipe.id.clone()) {
                self.recipes.push(recipe);
                summary.inserted += 1;
            } else {
                summary.rejected.push(recipe.id);
            }
        }
        summary
    }
}

/// In-process collection guarded by an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: RwLock<Collection>,
}

impl MemoryStore {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self::from_ingested(Ingested {
            recipes,
            unparsed: Vec::new(),
        })
    }

    /// Loads raw documents; the ones that do not deserialize are held as-is.
    pub fn from_documents(documents: Vec<Value>) -> Self {
        Self::from_ingested(ingest_documents(documents))
    }

    pub fn from_ingested(ingested: Ingested) -> Self {
        MemoryStore {
            collection: RwLock::new(Collection {
                recipes: ingested.recipes,
                unparsed: ingested.unparsed,
                last_reserved: 0,
            }),
        }
    }

    /// Every stored document, parsed recipes first, in the on-disk shape.
    pub(crate) async fn documents(&self) -> Result<Vec<Value>, StoreError> {
        let collection = self.collection.read().await;
        let mut documents = collection
            .recipes
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        documents.extend(collection.unparsed.iter().cloned());
        Ok(documents)
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn all(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.collection.read().await.recipes.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        let collection = self.collection.read().await;
        Ok(collection.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn document(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let collection = self.collection.read().await;
        if let Some(recipe) = collection.recipes.iter().find(|r| r.id == id) {
            return Ok(Some(serde_json::to_value(recipe)?));
        }
        Ok(collection
            .unparsed
            .iter()
            .find(|document| document_id(document).as_deref() == Some(id))
            .cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.collection.read().await.recipes.len())
    }

    async fn reserve_ids(&self, n: usize) -> Result<Vec<String>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(self.collection.write().await.reserve(n))
    }

    async fn insert_many(&self, recipes: Vec<Recipe>) -> Result<InsertSummary, StoreError> {
        Ok(self.collection.write().await.insert_unordered(recipes))
    }

    async fn set_image(&self, id: &str, image: &str) -> Result<bool, StoreError> {
        let mut collection = self.collection.write().await;
        match collection.recipes.iter_mut().find(|r| r.id == id) {
            Some(recipe) => {
                recipe.image = image.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
