use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::generation::{
    generate_recipes, GenerationError, GenerationOutcome, RecipeGenerator, ValidationEntry,
};
use crate::images::ImageSource;
use crate::recipe::Recipe;
use crate::scaling::DetailView;
use crate::search::{filter_recipes, SearchRequest};
use crate::store::{RecipeStore, StoreError};

/// Recipes generated by the search fallback are requested one at a time.
pub const FALLBACK_GENERATION_COUNT: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub recipes: Vec<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_summary: Option<Vec<ValidationEntry>>,
}

/// The store together with its collaborators.
#[derive(Clone)]
pub struct RecipeCatalog {
    store: Arc<dyn RecipeStore>,
    generator: Arc<dyn RecipeGenerator>,
    images: Arc<dyn ImageSource>,
}

impl RecipeCatalog {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        generator: Arc<dyn RecipeGenerator>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        RecipeCatalog {
            store,
            generator,
            images,
        }
    }

    /// Filters the whole collection. With no matches and `generate_if_empty`
    /// set, falls back to generating a new recipe.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, GenerationError> {
        let all = self.store.all().await?;
        let recipes = filter_recipes(&all, &request.terms, &request.filters);
        info!(
            terms = request.terms.len(),
            matched = recipes.len(),
            total = all.len(),
            "search complete"
        );

        if !recipes.is_empty() || !request.generate_if_empty {
            return Ok(SearchOutcome {
                recipes,
                validation_summary: None,
            });
        }

        info!("no matching recipes, generating new ones");
        let outcome = generate_recipes(
            self.store.as_ref(),
            self.generator.as_ref(),
            self.images.as_ref(),
            &all,
            FALLBACK_GENERATION_COUNT,
        )
        .await?;
        Ok(SearchOutcome {
            recipes: outcome.recipes,
            validation_summary: Some(outcome.validation_summary),
        })
    }

    pub async fn generate(&self, n: usize) -> Result<GenerationOutcome, GenerationError> {
        let all = self.store.all().await?;
        generate_recipes(
            self.store.as_ref(),
            self.generator.as_ref(),
            self.images.as_ref(),
            &all,
            n.max(1),
        )
        .await
    }

    /// The stored document as-is; malformed documents come back raw.
    pub async fn document(&self, id: &str) -> Result<Option<Value>, StoreError> {
        self.store.document(id).await
    }

    pub async fn detail(&self, id: &str) -> Result<DetailView, StoreError> {
        let payload = self
            .store
            .document(id)
            .await?
            .map(|recipe| json!({ "recipe": recipe }));
        Ok(DetailView::from_payload(payload.as_ref()))
    }

    /// Replaces stock `example.com` images with a lookup by title. Returns how
    /// many recipes were updated.
    pub async fn refresh_placeholder_images(&self) -> Result<usize, StoreError> {
        let stale: Vec<Recipe> = self
            .store
            .all()
            .await?
            .into_iter()
            .filter(|recipe| recipe.image.contains("example.com"))
            .collect();
        if stale.is_empty() {
            info!("no recipes with placeholder images found");
            return Ok(0);
        }

        info!(count = stale.len(), "updating placeholder images");
        let mut updated = 0;
        for recipe in stale {
            let query = if recipe.title.is_empty() { "food" } else { recipe.title.as_str() };
            let image = self.images.find_image(query).await;
            if self.store.set_image(&recipe.id, &image).await? {
                info!(title = %recipe.title, "updated recipe image");
                updated += 1;
            } else {
                warn!(id = %recipe.id, "recipe disappeared before its image was updated");
            }
        }
        Ok(updated)
    }
}
