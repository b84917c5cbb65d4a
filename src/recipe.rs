use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback image used whenever a recipe has no usable picture.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryTag {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    NutFree,
    Halal,
    Kosher,
}

impl DietaryTag {
    pub const ALL: [DietaryTag; 7] = [
        DietaryTag::Vegetarian,
        DietaryTag::Vegan,
        DietaryTag::GlutenFree,
        DietaryTag::DairyFree,
        DietaryTag::NutFree,
        DietaryTag::Halal,
        DietaryTag::Kosher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryTag::Vegetarian => "vegetarian",
            DietaryTag::Vegan => "vegan",
            DietaryTag::GlutenFree => "gluten-free",
            DietaryTag::DairyFree => "dairy-free",
            DietaryTag::NutFree => "nut-free",
            DietaryTag::Halal => "halal",
            DietaryTag::Kosher => "kosher",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitutes: Vec<String>,
}

/// Nutrition values for a single serving, never totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub calories: f64,
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub protein: f64,
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub fat: f64,
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub carbs: f64,
}

impl Nutrition {
    pub fn scaled(&self, factor: f64) -> Nutrition {
        Nutrition {
            calories: self.calories * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carbs: self.carbs * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub avg: f64,
    pub count: u32,
}

/// Everything a recipe carries except its store identifier.
///
/// Generated recipes come back from the model in this shape; the store
/// assigns the identifier when they are inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub cuisine: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(deserialize_with = "deserialize_servings")]
    pub servings: u32,
    #[serde(deserialize_with = "deserialize_non_negative")]
    pub cook_time_minutes: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub prep_time_minutes: Option<f64>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub dietary: Vec<DietaryTag>,
    pub nutrition_per_serving: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RecipeDraft {
    pub fn into_recipe(self, id: String) -> Recipe {
        Recipe { id, draft: self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub draft: RecipeDraft,
}

impl std::ops::Deref for Recipe {
    type Target = RecipeDraft;

    fn deref(&self) -> &RecipeDraft {
        &self.draft
    }
}

impl std::ops::DerefMut for Recipe {
    fn deref_mut(&mut self) -> &mut RecipeDraft {
        &mut self.draft
    }
}

impl Recipe {
    /// Deserializes a stored document, backfilling `_id` from the legacy `id`
    /// field when the primary identifier is missing.
    pub fn from_document(document: Value) -> Result<Recipe, serde_json::Error> {
        serde_json::from_value(normalize_document(document))
    }

    /// Title, description and ingredient names joined by spaces.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.ingredients.len() + 2);
        parts.push(&self.title);
        parts.push(&self.description);
        parts.extend(self.ingredients.iter().map(|ingredient| ingredient.name.as_str()));
        parts.join(" ")
    }
}

pub fn normalize_document(mut document: Value) -> Value {
    if let Some(object) = document.as_object_mut() {
        let has_primary = object.get("_id").is_some_and(|id| !id.is_null());
        if !has_primary {
            let legacy = match object.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            if let Some(legacy) = legacy {
                object.insert("_id".to_string(), Value::String(legacy));
            }
        }
        object.remove("id");
    }
    document
}

// Model output sometimes writes servings as 4.0; anything below one is rejected.
fn deserialize_servings<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 1.0 || raw.fract() != 0.0 || raw > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "servings must be a whole number >= 1, got {}",
            raw
        )));
    }
    Ok(raw as u32)
}

fn deserialize_non_negative<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a finite number >= 0, got {}",
            raw
        )));
    }
    Ok(raw)
}

fn deserialize_optional_non_negative<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(raw) if !raw.is_finite() || raw < 0.0 => Err(serde::de::Error::custom(format!(
            "expected a finite number >= 0, got {}",
            raw
        ))),
        other => Ok(other),
    }
}
