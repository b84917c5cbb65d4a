//! Recipe generation through an external model.
//!
//! The model sits behind [`RecipeGenerator`]: a prompt goes in, raw JSON
//! comes out. Everything after that (coercing to a list, the validation
//! summary, schema checking into [`RecipeDraft`], identifier assignment and
//! persistence) happens here so every generator behaves the same.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api_connection::endpoints::{JsonSchemaDefinition, DEFAULT_MODEL};
use crate::api_connection::{
    first_choice_content, ApiConnectionError, ChatCompletionRequest, ChatMessage, JsonSchema,
    Provider, ResponseFormat,
};
use crate::images::ImageSource;
use crate::recipe::{DietaryTag, Recipe, RecipeDraft};
use crate::store::{RecipeStore, StoreError};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Connection(#[from] ApiConnectionError),
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("model output is neither a recipe object nor an array of recipes")]
    UnexpectedShape,
    #[error("generated recipe #{index} does not match the recipe schema: {source}")]
    Schema {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Sends `prompt` and returns the model's JSON output, unvalidated.
    async fn generate(&self, prompt: &str, n: usize) -> Result<Value, ModelError>;
}

/// One entry per generated item: `ok` when it has a non-empty title and an
/// ingredient list. The raw item is echoed for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationEntry {
    #[serde(rename = "_raw")]
    pub raw: Value,
    pub ok: bool,
}

impl ValidationEntry {
    pub fn for_item(item: &Value) -> Self {
        let has_title = item
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|title| !title.is_empty());
        let has_ingredients = item.get("ingredients").is_some_and(Value::is_array);
        ValidationEntry {
            raw: item.clone(),
            ok: has_title && has_ingredients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub recipes: Vec<Recipe>,
    pub validation_summary: Vec<ValidationEntry>,
}

/// Ingredient names across the collection, de-duplicated in first-seen order.
pub fn ingredient_names(recipes: &[Recipe]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipes
        .iter()
        .flat_map(|recipe| recipe.ingredients.iter())
        .filter(|ingredient| seen.insert(ingredient.name.clone()))
        .map(|ingredient| ingredient.name.clone())
        .collect()
}

pub fn existing_titles(recipes: &[Recipe]) -> Vec<String> {
    recipes
        .iter()
        .map(|recipe| recipe.title.clone())
        .filter(|title| !title.is_empty())
        .collect()
}

pub fn build_prompt(ingredients: &[String], titles: &[String], n: usize) -> String {
    let ingredients_json = serde_json::to_string(ingredients).unwrap_or_else(|_| "[]".to_string());
    let titles_json = serde_json::to_string(titles).unwrap_or_else(|_| "[]".to_string());
    let ask = if n == 1 {
        "Please generate exactly 1 new, distinct recipe that can be prepared using some subset of the available ingredients.".to_string()
    } else {
        format!(
            "Please generate exactly {} new, distinct recipes that can be prepared using some subset of the available ingredients.",
            n
        )
    };
    [
        "You are a recipe generation engine.".to_string(),
        format!("We provide the following available ingredients :\n{}", ingredients_json),
        "We already have these recipes in our dataset (do not duplicate or produce near-identical recipes):".to_string(),
        titles_json,
        ask,
        "Each returned item must strictly follow the provided JSON schema named 'Recipe' (fields, types), and must include realistic quantities, servings, cook/prep times, difficulty (easy|medium|hard), dietary tags where applicable, and nutritionPerServing.".to_string(),
        "Return the result as a JSON array of Recipe objects (no extra text).".to_string(),
    ]
    .join("\n\n")
}

/// A single object counts as a one-item list; anything else is rejected.
pub fn coerce_items(output: Value) -> Result<Vec<Value>, ModelError> {
    match output {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![output]),
        _ => Err(ModelError::UnexpectedShape),
    }
}

fn parse_draft(index: usize, item: &Value) -> Result<RecipeDraft, ModelError> {
    let mut item = item.clone();
    if let Some(object) = item.as_object_mut() {
        object.remove("_id");
        object.remove("id");
    }
    serde_json::from_value(item).map_err(|source| ModelError::Schema { index, source })
}

/// Runs one generation round against the given collection snapshot.
///
/// Persistence is best-effort: insert failures are logged and the generated
/// recipes are returned regardless.
pub async fn generate_recipes(
    store: &dyn RecipeStore,
    generator: &dyn RecipeGenerator,
    images: &dyn ImageSource,
    existing: &[Recipe],
    n: usize,
) -> Result<GenerationOutcome, GenerationError> {
    let prompt = build_prompt(&ingredient_names(existing), &existing_titles(existing), n);
    debug!(prompt_len = prompt.len(), n, "requesting generated recipes");

    let output = generator.generate(&prompt, n).await?;
    let items = coerce_items(output)?;
    let validation_summary: Vec<ValidationEntry> = items.iter().map(ValidationEntry::for_item).collect();

    let mut drafts = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_draft(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    for draft in drafts.iter_mut().filter(|draft| draft.image.trim().is_empty()) {
        let query = if draft.title.is_empty() { "food" } else { draft.title.as_str() };
        draft.image = images.find_image(query).await;
    }

    let ids = store.reserve_ids(drafts.len()).await?;
    let recipes: Vec<Recipe> = drafts
        .into_iter()
        .zip(ids)
        .map(|(draft, id)| draft.into_recipe(id))
        .collect();

    if !recipes.is_empty() {
        match store.insert_many(recipes.clone()).await {
            Ok(summary) => {
                info!(inserted = summary.inserted, "inserted generated recipes");
                if !summary.rejected.is_empty() {
                    warn!(rejected = ?summary.rejected, "some generated recipes were not inserted");
                }
            }
            Err(e) => warn!(error = %e, "failed to insert generated recipes"),
        }
    }

    Ok(GenerationOutcome {
        recipes,
        validation_summary,
    })
}

/// The `Recipe` schema handed to the model.
pub fn recipe_json_schema() -> JsonSchema {
    let ingredient = JsonSchema::object(
        vec![
            ("name", JsonSchema::scalar("string")),
            ("quantity", JsonSchema::scalar("number")),
            ("unit", JsonSchema::scalar("string")),
            ("optional", JsonSchema::scalar("boolean")),
            ("substitutes", JsonSchema::array_of(JsonSchema::scalar("string"))),
        ],
        &["name", "quantity", "unit"],
    );
    let nutrition = JsonSchema::object(
        vec![
            ("calories", JsonSchema::scalar("number")),
            ("protein", JsonSchema::scalar("number")),
            ("fat", JsonSchema::scalar("number")),
            ("carbs", JsonSchema::scalar("number")),
        ],
        &["calories", "protein", "fat", "carbs"],
    )
    .with_description("Nutrition for a single serving.");
    let dietary: Vec<&str> = DietaryTag::ALL.iter().map(DietaryTag::as_str).collect();

    JsonSchema::object(
        vec![
            ("title", JsonSchema::scalar("string")),
            ("description", JsonSchema::scalar("string")),
            ("image", JsonSchema::scalar("string")),
            ("cuisine", JsonSchema::scalar("string")),
            ("ingredients", JsonSchema::array_of(ingredient)),
            ("instructions", JsonSchema::array_of(JsonSchema::scalar("string"))),
            ("servings", JsonSchema::scalar("integer")),
            ("cookTimeMinutes", JsonSchema::scalar("number")),
            ("prepTimeMinutes", JsonSchema::scalar("number")),
            ("difficulty", JsonSchema::string_enum(&["easy", "medium", "hard"])),
            ("dietary", JsonSchema::array_of(JsonSchema::string_enum(&dietary))),
            ("nutritionPerServing", nutrition),
            ("tags", JsonSchema::array_of(JsonSchema::scalar("string"))),
        ],
        &[
            "title",
            "description",
            "image",
            "cuisine",
            "ingredients",
            "instructions",
            "servings",
            "cookTimeMinutes",
            "difficulty",
            "dietary",
            "nutritionPerServing",
        ],
    )
}

fn generation_response_format() -> ResponseFormat {
    // Structured outputs want an object at the top level, so the list is wrapped.
    let wrapper = JsonSchema::object(
        vec![("recipes", JsonSchema::array_of(recipe_json_schema()))],
        &["recipes"],
    );
    ResponseFormat {
        format_type: "json_schema".to_string(),
        json_schema: Some(JsonSchemaDefinition {
            name: "recipe_list".to_string(),
            strict: Some(false),
            schema: wrapper,
        }),
    }
}

/// [`RecipeGenerator`] backed by an OpenRouter chat completion.
#[derive(Debug, Clone)]
pub struct OpenRouterGenerator {
    provider: Provider,
    client: Client,
    model: String,
}

impl OpenRouterGenerator {
    pub fn new(provider: Provider, client: Client, model: Option<String>) -> Self {
        OpenRouterGenerator {
            provider,
            client,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RecipeGenerator for OpenRouterGenerator {
    async fn generate(&self, prompt: &str, n: usize) -> Result<Value, ModelError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(
                    "/no_thinking\nYou are a recipe generation engine. Respond only with JSON, no markdown.",
                ),
                ChatMessage::user(prompt),
            ],
            response_format: Some(generation_response_format()),
            temperature: Some(0.7),
            max_tokens: Some(2048u32.saturating_mul(n.clamp(1, 8) as u32)),
        };

        let response = self.provider.call_chat_completion(&self.client, request).await?;
        let content = first_choice_content(&response)?;
        debug!(content_len = content.len(), "model returned content");

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            warn!(error = %e, "model output was not JSON");
            ModelError::InvalidJson(e)
        })?;
        Ok(match value {
            Value::Object(mut object) if object.contains_key("recipes") => {
                object.remove("recipes").unwrap_or(Value::Null)
            }
            other => other,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned generator that records every prompt it receives.
    pub struct ScriptedGenerator {
        output: Result<Value, String>,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn returning(output: Value) -> Self {
            ScriptedGenerator {
                output: Ok(output),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            ScriptedGenerator {
                output: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecipeGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, _n: usize) -> Result<Value, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.output {
                Ok(value) => Ok(value.clone()),
                Err(message) => Err(ModelError::Connection(ApiConnectionError::EmptyResponse(
                    message.clone(),
                ))),
            }
        }
    }

    pub fn generated_recipe(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Generated",
            "image": "",
            "cuisine": "Fusion",
            "ingredients": [{"name": "rice", "quantity": 1, "unit": "cup"}],
            "instructions": ["Cook the rice."],
            "servings": 2,
            "cookTimeMinutes": 25,
            "difficulty": "easy",
            "dietary": ["vegan"],
            "nutritionPerServing": {"calories": 310, "protein": 6, "fat": 2, "carbs": 64}
        })
    }
}
