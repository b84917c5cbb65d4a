use crate::recipe::Recipe;
use crate::search::filters::FilterBundle;
use crate::search::matchers::{
    matches_calories, matches_cuisine, matches_dietary, matches_difficulty, matches_terms,
    matches_time,
};

/// Logical AND of every filter dimension for one recipe.
pub fn recipe_matches(recipe: &Recipe, terms: &[String], filters: &FilterBundle) -> bool {
    matches_terms(&recipe.searchable_text(), terms)
        && matches_time(recipe.cook_time_minutes, filters.time)
        && matches_difficulty(recipe.difficulty, filters.difficulty)
        && matches_dietary(&recipe.dietary, &filters.dietary)
        && matches_calories(
            recipe.nutrition_per_serving.calories,
            filters.calories_min.as_deref(),
            filters.calories_max.as_deref(),
        )
        && matches_cuisine(&recipe.cuisine, &filters.cuisines)
}

/// Keeps the recipes that pass every filter, in their original order.
pub fn filter_recipes(recipes: &[Recipe], terms: &[String], filters: &FilterBundle) -> Vec<Recipe> {
    recipes
        .iter()
        .filter(|recipe| recipe_matches(recipe, terms, filters))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::test_support::{ingredient, recipe};
    use crate::recipe::{DietaryTag, Difficulty};
    use crate::search::filters::{DifficultyFilter, TimeBucket};
    use rand::seq::SliceRandom;
    use rand::Rng;

    fn catalog() -> Vec<Recipe> {
        let mut soup = recipe("1", "Carrot Ginger Soup");
        soup.description = "Silky soup with coconut milk".to_string();
        soup.ingredients = vec![ingredient("carrot", 4.0, "pcs"), ingredient("ginger", 1.0, "tbsp")];
        soup.cook_time_minutes = 30.0;
        soup.dietary = vec![DietaryTag::Vegan, DietaryTag::Vegetarian];
        soup.nutrition_per_serving.calories = 220.0;

        let mut curry = recipe("2", "Thai Green Curry");
        curry.cuisine = "Thai".to_string();
        curry.ingredients = vec![ingredient("chicken", 500.0, "g"), ingredient("basil", 1.0, "cup")];
        curry.cook_time_minutes = 35.0;
        curry.difficulty = Difficulty::Medium;
        curry.dietary = vec![DietaryTag::GlutenFree];
        curry.nutrition_per_serving.calories = 520.0;

        let mut pasta = recipe("3", "Pasta Aglio e Olio");
        pasta.cuisine = "Italian".to_string();
        pasta.ingredients = vec![ingredient("spaghetti", 200.0, "g"), ingredient("garlic", 3.0, "cloves")];
        pasta.cook_time_minutes = 15.0;
        pasta.dietary = vec![DietaryTag::Vegetarian];
        pasta.nutrition_per_serving.calories = 300.0;

        let mut stew = recipe("4", "Ratatouille");
        stew.cuisine = "French".to_string();
        stew.ingredients = vec![ingredient("eggplant", 1.0, "pcs"), ingredient("garlic", 2.0, "cloves")];
        stew.cook_time_minutes = 90.0;
        stew.difficulty = Difficulty::Hard;
        stew.nutrition_per_serving.calories = 299.0;

        vec![soup, curry, pasta, stew]
    }

    fn ids(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_request_returns_everything_in_order() {
        let result = filter_recipes(&catalog(), &[], &FilterBundle::default());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn terms_hit_ingredient_names() {
        let result = filter_recipes(&catalog(), &["GARLIC".to_string()], &FilterBundle::default());
        assert_eq!(ids(&result), vec!["3", "4"]);
    }

    #[test]
    fn dimensions_are_anded() {
        let filters = FilterBundle {
            time: TimeBucket::From15To30,
            dietary: vec![DietaryTag::Vegetarian],
            ..FilterBundle::default()
        };
        assert_eq!(ids(&filter_recipes(&catalog(), &[], &filters)), vec!["1", "3"]);

        let filters = FilterBundle {
            difficulty: DifficultyFilter::Only(Difficulty::Easy),
            calories_min: Some("300".to_string()),
            ..filters
        };
        assert_eq!(ids(&filter_recipes(&catalog(), &[], &filters)), vec!["3"]);
    }

    #[test]
    fn vegan_selection_excludes_vegetarian_only() {
        let filters = FilterBundle {
            dietary: vec![DietaryTag::Vegan],
            ..FilterBundle::default()
        };
        assert_eq!(ids(&filter_recipes(&catalog(), &[], &filters)), vec!["1"]);
    }

    #[test]
    fn cuisine_selection_is_membership() {
        let filters = FilterBundle {
            cuisines: vec!["Italian".to_string(), "Thai".to_string()],
            ..FilterBundle::default()
        };
        assert_eq!(ids(&filter_recipes(&catalog(), &[], &filters)), vec!["2", "3"]);
    }

    #[test]
    fn calorie_min_boundary() {
        let filters = FilterBundle {
            calories_min: Some("300".to_string()),
            ..FilterBundle::default()
        };
        // 300 stays, 299 goes.
        assert_eq!(ids(&filter_recipes(&catalog(), &[], &filters)), vec!["2", "3"]);
    }

    #[test]
    fn servings_hint_never_filters() {
        let filters = FilterBundle {
            servings: Some(12),
            ..FilterBundle::default()
        };
        assert_eq!(filter_recipes(&catalog(), &[], &filters).len(), 4);
    }

    #[test]
    fn adding_terms_never_widens_results() {
        let vocabulary = [
            "soup", "garlic", "a", "thai", "curry", "pasta", "e", "o", "carrot", "zzz", "GIN",
        ];
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let count = rng.gen_range(0..4);
            let mut terms: Vec<String> = vocabulary
                .choose_multiple(&mut rng, count)
                .map(|t| t.to_string())
                .collect();
            let before = filter_recipes(&catalog(), &terms, &FilterBundle::default());
            terms.push(vocabulary.choose(&mut rng).unwrap().to_string());
            let after = filter_recipes(&catalog(), &terms, &FilterBundle::default());
            assert!(after.len() <= before.len());
            assert!(after.iter().all(|r| before.iter().any(|b| b.id == r.id)));
        }
    }
}
