//! Serving-size scaling for the recipe detail view.
//!
//! Ingredient quantities are stored for the recipe's base servings and
//! nutrition is stored per serving. The scaler turns both into what the
//! reader sees for a chosen number of servings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::recipe::{Ingredient, Nutrition, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    #[serde(rename = "per", alias = "per-serving")]
    PerServing,
    Total,
}

/// Formats a scaled quantity: whole numbers when within 1e-6 of one,
/// otherwise two decimals with trailing zeros trimmed.
pub fn format_quantity(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-6 {
        return format!("{}", rounded as i64);
    }
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServingScaler {
    base_servings: u32,
    servings: u32,
    mode: DisplayMode,
}

impl ServingScaler {
    /// Starts at the recipe's own servings. A base of zero is treated as one.
    pub fn new(base_servings: u32) -> Self {
        let base_servings = base_servings.max(1);
        ServingScaler {
            base_servings,
            servings: base_servings,
            mode: DisplayMode::PerServing,
        }
    }

    pub fn for_recipe(recipe: &Recipe) -> Self {
        Self::new(recipe.servings)
    }

    pub fn servings(&self) -> u32 {
        self.servings
    }

    pub fn base_servings(&self) -> u32 {
        self.base_servings
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    pub fn set_servings(&mut self, servings: u32) {
        self.servings = servings.max(1);
    }

    pub fn increment(&mut self) {
        self.servings = self.servings.saturating_add(1);
    }

    pub fn decrement(&mut self) {
        self.set_servings(self.servings.saturating_sub(1));
    }

    /// Applies free-text stepper input: non-digits are stripped and anything
    /// that does not leave a positive number becomes one.
    pub fn set_from_input(&mut self, input: &str) {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        let parsed = digits.parse::<u32>().unwrap_or(0);
        self.set_servings(if parsed == 0 { 1 } else { parsed });
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.servings) / f64::from(self.base_servings)
    }

    pub fn scale_quantity(&self, quantity: f64) -> f64 {
        quantity * self.ratio()
    }

    pub fn display_quantity(&self, quantity: f64) -> String {
        format_quantity(self.scale_quantity(quantity))
    }

    /// `"<qty> <unit> <name>"`, suffixed with `(optional)` when flagged.
    pub fn ingredient_label(&self, ingredient: &Ingredient) -> String {
        let mut label = format!(
            "{} {} {}",
            self.display_quantity(ingredient.quantity),
            ingredient.unit,
            ingredient.name
        );
        if ingredient.optional {
            label.push_str(" (optional)");
        }
        label
    }

    pub fn nutrition_totals(&self, per_serving: &Nutrition) -> Nutrition {
        per_serving.scaled(f64::from(self.servings))
    }

    pub fn displayed_calories(&self, per_serving: &Nutrition) -> f64 {
        match self.mode {
            DisplayMode::PerServing => per_serving.calories,
            DisplayMode::Total => per_serving.calories * f64::from(self.servings),
        }
    }

    pub fn scale(&self, recipe: &Recipe) -> ScaledRecipe {
        let totals = self.nutrition_totals(&recipe.nutrition_per_serving);
        ScaledRecipe {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            base_servings: self.base_servings,
            servings: self.servings,
            mode: self.mode,
            ingredients: recipe
                .ingredients
                .iter()
                .map(|ingredient| ScaledIngredient {
                    name: ingredient.name.clone(),
                    unit: ingredient.unit.clone(),
                    optional: ingredient.optional,
                    quantity: self.scale_quantity(ingredient.quantity),
                    display_quantity: self.display_quantity(ingredient.quantity),
                    label: self.ingredient_label(ingredient),
                })
                .collect(),
            nutrition_per_serving: recipe.nutrition_per_serving,
            nutrition_totals: totals,
            nutrition_totals_display: NutritionDisplay {
                calories: format_quantity(totals.calories),
                protein: format_quantity(totals.protein),
                fat: format_quantity(totals.fat),
                carbs: format_quantity(totals.carbs),
            },
            displayed_calories: self.displayed_calories(&recipe.nutrition_per_serving),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledIngredient {
    pub name: String,
    pub unit: String,
    pub optional: bool,
    pub quantity: f64,
    pub display_quantity: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionDisplay {
    pub calories: String,
    pub protein: String,
    pub fat: String,
    pub carbs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledRecipe {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub base_servings: u32,
    pub servings: u32,
    pub mode: DisplayMode,
    pub ingredients: Vec<ScaledIngredient>,
    pub nutrition_per_serving: Nutrition,
    pub nutrition_totals: Nutrition,
    pub nutrition_totals_display: NutritionDisplay,
    pub displayed_calories: f64,
}

/// What the detail page shows for a fetched `{recipe}` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loaded(Box<Recipe>),
    NotFound,
    InvalidData(String),
}

impl DetailView {
    /// `None` means the fetch came back 404. Otherwise the payload must carry
    /// a `recipe` that deserializes cleanly.
    pub fn from_payload(payload: Option<&Value>) -> DetailView {
        let Some(payload) = payload else {
            return DetailView::NotFound;
        };
        match payload.get("recipe") {
            None | Some(Value::Null) => DetailView::NotFound,
            Some(raw) => match Recipe::from_document(raw.clone()) {
                Ok(recipe) => DetailView::Loaded(Box::new(recipe)),
                Err(e) => DetailView::InvalidData(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::test_support::{ingredient, recipe};
    use serde_json::json;

    #[test]
    fn scales_to_whole_numbers() {
        let mut scaler = ServingScaler::new(2);
        scaler.set_servings(3);
        assert_eq!(scaler.display_quantity(4.0), "6");
        scaler.set_servings(1);
        assert_eq!(scaler.display_quantity(4.0), "2");
    }

    #[test]
    fn fractional_results_keep_two_decimals() {
        let mut scaler = ServingScaler::new(3);
        scaler.set_servings(1);
        assert_eq!(scaler.display_quantity(1.0), "0.33");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_quantity(1.10), "1.1");
        assert_eq!(format_quantity(2.0000001), "2");
        assert_eq!(format_quantity(2.675), "2.67");
    }

    #[test]
    fn zero_base_behaves_like_one() {
        let scaler = ServingScaler::new(0);
        assert_eq!(scaler.base_servings(), 1);
        assert_eq!(scaler.servings(), 1);
        assert_eq!(scaler.display_quantity(3.0), "3");
    }

    #[test]
    fn servings_never_drop_below_one() {
        let mut scaler = ServingScaler::new(1);
        scaler.decrement();
        assert_eq!(scaler.servings(), 1);
        scaler.set_servings(0);
        assert_eq!(scaler.servings(), 1);
        scaler.increment();
        assert_eq!(scaler.servings(), 2);
    }

    #[test]
    fn text_input_is_sanitized() {
        let mut scaler = ServingScaler::new(4);
        scaler.set_from_input("1a2");
        assert_eq!(scaler.servings(), 12);
        scaler.set_from_input("abc");
        assert_eq!(scaler.servings(), 1);
        scaler.set_from_input("0");
        assert_eq!(scaler.servings(), 1);
    }

    #[test]
    fn nutrition_totals_and_display_mode() {
        let recipe = recipe("1", "Soup");
        let mut scaler = ServingScaler::for_recipe(&recipe);
        scaler.set_servings(3);
        let totals = scaler.nutrition_totals(&recipe.nutrition_per_serving);
        assert_eq!(totals.calories, 1200.0);
        assert_eq!(totals.protein, 30.0);
        assert_eq!(scaler.displayed_calories(&recipe.nutrition_per_serving), 400.0);
        scaler.set_mode(DisplayMode::Total);
        assert_eq!(scaler.displayed_calories(&recipe.nutrition_per_serving), 1200.0);
    }

    #[test]
    fn scaled_recipe_labels_optional_ingredients() {
        let mut recipe = recipe("1", "Soup");
        let mut cream = ingredient("cream", 1.0, "cup");
        cream.optional = true;
        recipe.ingredients = vec![ingredient("carrot", 4.0, "pcs"), cream];

        let mut scaler = ServingScaler::for_recipe(&recipe);
        scaler.set_servings(3);
        let scaled = scaler.scale(&recipe);
        assert_eq!(scaled.ingredients[0].label, "6 pcs carrot");
        assert_eq!(scaled.ingredients[1].label, "1.5 cup cream (optional)");
        assert_eq!(scaled.nutrition_totals_display.calories, "1200");
    }

    #[test]
    fn detail_view_states() {
        assert_eq!(DetailView::from_payload(None), DetailView::NotFound);
        assert_eq!(DetailView::from_payload(Some(&json!({}))), DetailView::NotFound);
        assert!(matches!(
            DetailView::from_payload(Some(&json!({"recipe": {"_id": "1", "title": 5}}))),
            DetailView::InvalidData(_)
        ));

        let good = serde_json::to_value(recipe("7", "Soup")).unwrap();
        match DetailView::from_payload(Some(&json!({ "recipe": good }))) {
            DetailView::Loaded(recipe) => assert_eq!(recipe.id, "7"),
            other => panic!("expected loaded view, got {:?}", other),
        }
    }
}
