use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::recipe::{DietaryTag, Difficulty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimeBucket {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "<15")]
    Under15,
    #[serde(rename = "15-30")]
    From15To30,
    #[serde(rename = "30-60")]
    From30To60,
    #[serde(rename = ">60")]
    Over60,
}

impl TimeBucket {
    /// Unknown selectors fall back to `Any`.
    pub fn parse(value: &str) -> Self {
        match value {
            "<15" => TimeBucket::Under15,
            "15-30" => TimeBucket::From15To30,
            "30-60" => TimeBucket::From30To60,
            ">60" => TimeBucket::Over60,
            _ => TimeBucket::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    Any,
    Only(Difficulty),
}

impl DifficultyFilter {
    pub fn parse(value: &str) -> Self {
        Difficulty::parse(value).map_or(DifficultyFilter::Any, DifficultyFilter::Only)
    }
}

impl Serialize for DifficultyFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DifficultyFilter::Any => serializer.serialize_str("any"),
            DifficultyFilter::Only(difficulty) => serializer.serialize_str(difficulty.as_str()),
        }
    }
}

/// Structured, non-text constraints for one search request.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBundle {
    pub time: TimeBucket,
    pub difficulty: DifficultyFilter,
    pub dietary: Vec<DietaryTag>,
    pub calories_min: Option<String>,
    pub calories_max: Option<String>,
    /// Display hint for the client; never narrows results.
    pub servings: Option<u32>,
    pub cuisines: Vec<String>,
}

impl FilterBundle {
    /// Builds filters from an arbitrary JSON value. Every field that is
    /// missing or has the wrong shape falls back to its neutral value.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return FilterBundle::default();
        };

        FilterBundle {
            time: object
                .get("time")
                .and_then(Value::as_str)
                .map(TimeBucket::parse)
                .unwrap_or_default(),
            difficulty: object
                .get("difficulty")
                .and_then(Value::as_str)
                .map(DifficultyFilter::parse)
                .unwrap_or_default(),
            dietary: string_list(object, "dietary")
                .iter()
                .filter_map(|tag| DietaryTag::parse(tag))
                .collect(),
            calories_min: numeric_string(object, "caloriesMin"),
            calories_max: numeric_string(object, "caloriesMax"),
            servings: field::<u32>(object, "servings"),
            cuisines: string_list(object, "cuisines"),
        }
    }
}

/// Body of `POST /recipes/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub terms: Vec<String>,
    pub filters: FilterBundle,
    pub generate_if_empty: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            terms: Vec::new(),
            filters: FilterBundle::default(),
            generate_if_empty: true,
        }
    }
}

impl SearchRequest {
    /// Parses a raw request body. An empty or unparsable body is an empty
    /// search rather than an error.
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return SearchRequest::default();
        };
        SearchRequest {
            terms: string_list(object, "terms"),
            filters: object.get("filters").map(FilterBundle::from_value).unwrap_or_default(),
            generate_if_empty: field::<bool>(object, "generateIfEmpty").unwrap_or(true),
        }
    }
}

fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    object
        .get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

// Non-string entries are dropped, a non-array is treated as empty.
fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

// Calorie bounds arrive as strings from form inputs, but plain numbers are accepted too.
fn numeric_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
