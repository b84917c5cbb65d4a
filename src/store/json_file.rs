use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{bundled_recipes, ingest_documents, InsertSummary, MemoryStore, RecipeStore, StoreError};
use crate::recipe::Recipe;

/// Collection kept in memory and rewritten to a JSON array file after
/// every change. Documents that do not deserialize are written back verbatim.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    // Held from the in-memory change until the file is replaced, so the last
    // write to land is always the newest collection.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Loads the collection from `path`. A missing file is created from the
    /// bundled seed recipes.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let exists = fs::try_exists(&path).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let inner = if exists {
            let raw = fs::read_to_string(&path).await.map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let documents: Vec<Value> = serde_json::from_str(&raw)?;
            let ingested = ingest_documents(documents);
            if !ingested.unparsed.is_empty() {
                warn!(
                    path = %path.display(),
                    unparsed = ingested.unparsed.len(),
                    "collection holds documents that are not valid recipes"
                );
            }
            info!(path = %path.display(), count = ingested.recipes.len(), "loaded recipe collection");
            MemoryStore::from_ingested(ingested)
        } else {
            let recipes = bundled_recipes()?;
            info!(path = %path.display(), count = recipes.len(), "seeding new recipe collection");
            let inner = MemoryStore::new(recipes);
            write_collection(&path, inner.documents().await?).await?;
            inner
        };

        Ok(JsonFileStore {
            path,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Callers must hold `write_lock`.
    async fn persist(&self) -> Result<(), StoreError> {
        let documents = self.inner.documents().await?;
        let count = documents.len();
        write_collection(&self.path, documents).await?;
        debug!(path = %self.path.display(), count, "persisted recipe collection");
        Ok(())
    }
}

async fn write_collection(path: &Path, documents: Vec<Value>) -> Result<(), StoreError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).await.map_err(|source| StoreError::Io {
        path: dir.clone(),
        source,
    })?;
    let body = serde_json::to_vec_pretty(&documents)?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || replace_file(&dir, &target, &body))
        .await
        .map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

// Written beside the target and renamed over it: readers see the old file or
// the new one, never a truncated one.
fn replace_file(dir: &Path, target: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(body)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl RecipeStore for JsonFileStore {
    async fn all(&self) -> Result<Vec<Recipe>, StoreError> {
        self.inner.all().await
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        self.inner.get(id).await
    }

    async fn document(&self, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.document(id).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }

    async fn reserve_ids(&self, n: usize) -> Result<Vec<String>, StoreError> {
        self.inner.reserve_ids(n).await
    }

    async fn insert_many(&self, recipes: Vec<Recipe>) -> Result<InsertSummary, StoreError> {
        let _guard = self.write_lock.lock().await;
        let summary = self.inner.insert_many(recipes).await?;
        if summary.inserted > 0 {
            self.persist().await?;
        }
        Ok(summary)
    }

    async fn set_image(&self, id: &str, image: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let updated = self.inner.set_image(id, image).await?;
        if updated {
            self.persist().await?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::test_support::recipe;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_seeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("recipes.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 9);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn legacy_ids_are_normalized_on_load() {
        let mut file = NamedTempFile::new().unwrap();
        let mut legacy = serde_json::to_value(recipe("ignored", "Legacy Stew")).unwrap();
        legacy.as_object_mut().unwrap().remove("_id");
        legacy["id"] = json!(42);
        write!(file, "{}", json!([legacy, {"broken": true}])).unwrap();
        file.flush().unwrap();

        let store = JsonFileStore::open(file.path()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("42").await.unwrap().unwrap().title, "Legacy Stew");
    }

    fn read_documents(path: &Path) -> Vec<Value> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn malformed_documents_survive_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        let legacy = json!({"_id": "2", "title": "Legacy", "ingredients": ["rice"], "calories": 300});
        let good = serde_json::to_value(recipe("1", "Good")).unwrap();
        std::fs::write(&path, json!([good, legacy.clone()]).to_string()).unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let ids = store.reserve_ids(1).await.unwrap();
        assert_eq!(ids, vec!["3"]);
        store.insert_many(vec![recipe(&ids[0], "New")]).await.unwrap();

        let on_disk = read_documents(&path);
        assert_eq!(on_disk.len(), 3);
        assert!(on_disk.contains(&legacy));

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(reopened.document("2").await.unwrap(), Some(legacy));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_never_lose_recipes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        let store = Arc::new(JsonFileStore::open(&path).await.unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let ids = store.reserve_ids(1).await.unwrap();
                    store
                        .insert_many(vec![recipe(&ids[0], &format!("Generated {}", i))])
                        .await
                        .unwrap();
                    store.set_image("1", &format!("https://images/{}.jpg", i)).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 25);
        assert_eq!(read_documents(&path).len(), 25);
        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 25);
        assert_eq!(
            reopened.get("1").await.unwrap().unwrap().image,
            store.get("1").await.unwrap().unwrap().image
        );
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn inserts_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        let ids = store.reserve_ids(1).await.unwrap();
        assert_eq!(ids, vec!["10"]);
        store
            .insert_many(vec![recipe(&ids[0], "Generated Curry")])
            .await
            .unwrap();
        store.set_image("1", "https://images/soup.jpg").await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 10);
        assert_eq!(reopened.get("10").await.unwrap().unwrap().title, "Generated Curry");
        assert_eq!(reopened.get("1").await.unwrap().unwrap().image, "https://images/soup.jpg");
    }

    #[tokio::test]
    async fn invalid_json_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            JsonFileStore::open(file.path()).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
