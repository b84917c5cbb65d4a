//! Per-dimension predicates. Each one answers "does this recipe pass this
//! single filter"; the aggregator ANDs them together.

use crate::recipe::{DietaryTag, Difficulty};
use crate::search::filters::{DifficultyFilter, TimeBucket};

/// True when every term is a case-insensitive substring of `haystack`.
/// An empty term list matches everything.
pub fn matches_terms(haystack: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    terms
        .iter()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

// 30 sits in 15-30 and 60 sits in 30-60; the upper bucket is exclusive at its start.
pub fn matches_time(minutes: f64, bucket: TimeBucket) -> bool {
    match bucket {
        TimeBucket::Any => true,
        TimeBucket::Under15 => minutes < 15.0,
        TimeBucket::From15To30 => (15.0..=30.0).contains(&minutes),
        TimeBucket::From30To60 => minutes > 30.0 && minutes <= 60.0,
        TimeBucket::Over60 => minutes > 60.0,
    }
}

pub fn matches_difficulty(difficulty: Difficulty, want: DifficultyFilter) -> bool {
    match want {
        DifficultyFilter::Any => true,
        DifficultyFilter::Only(wanted) => difficulty == wanted,
    }
}

pub fn matches_dietary(recipe_tags: &[DietaryTag], want: &[DietaryTag]) -> bool {
    want.iter().all(|tag| recipe_tags.contains(tag))
}

/// Parses a calorie bound. Absent, blank or non-finite input is unconstrained.
pub fn parse_bound(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn matches_calories(calories: f64, min: Option<&str>, max: Option<&str>) -> bool {
    if let Some(min) = parse_bound(min) {
        if calories < min {
            return false;
        }
    }
    if let Some(max) = parse_bound(max) {
        if calories > max {
            return false;
        }
    }
    true
}

pub fn matches_cuisine(cuisine: &str, selected: &[String]) -> bool {
    selected.is_empty() || selected.iter().any(|c| c == cuisine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn terms_are_anded_and_case_insensitive() {
        let hay = "Pasta Aglio e Olio spaghetti Garlic olive oil";
        assert!(matches_terms(hay, &terms(&["GARLIC", "spag"])));
        assert!(!matches_terms(hay, &terms(&["garlic", "beef"])));
        assert!(matches_terms(hay, &[]));
    }

    #[test]
    fn time_bucket_boundaries() {
        assert!(matches_time(15.0, TimeBucket::From15To30));
        assert!(!matches_time(15.0, TimeBucket::Under15));
        assert!(matches_time(30.0, TimeBucket::From15To30));
        assert!(!matches_time(30.0, TimeBucket::From30To60));
        assert!(matches_time(60.0, TimeBucket::From30To60));
        assert!(!matches_time(60.0, TimeBucket::Over60));
        assert!(matches_time(14.5, TimeBucket::Under15));
        assert!(matches_time(61.0, TimeBucket::Over60));
        assert!(matches_time(999.0, TimeBucket::Any));
    }

    #[test]
    fn difficulty_any_accepts_all() {
        assert!(matches_difficulty(Difficulty::Hard, DifficultyFilter::Any));
        assert!(matches_difficulty(Difficulty::Hard, DifficultyFilter::Only(Difficulty::Hard)));
        assert!(!matches_difficulty(Difficulty::Easy, DifficultyFilter::Only(Difficulty::Hard)));
    }

    #[test]
    fn dietary_requires_every_selected_tag() {
        let tags = [DietaryTag::Vegetarian];
        assert!(!matches_dietary(&tags, &[DietaryTag::Vegan]));
        assert!(matches_dietary(&tags, &[]));
        let tags = [DietaryTag::Vegan, DietaryTag::GlutenFree, DietaryTag::Halal];
        assert!(matches_dietary(&tags, &[DietaryTag::Vegan, DietaryTag::Halal]));
        assert!(!matches_dietary(&tags, &[DietaryTag::Vegan, DietaryTag::Kosher]));
    }

    #[test]
    fn calorie_min_only_is_inclusive() {
        assert!(matches_calories(300.0, Some("300"), None));
        assert!(!matches_calories(299.0, Some("300"), None));
    }

    #[test]
    fn calorie_bounds_ignore_garbage() {
        assert!(matches_calories(10_000.0, Some("abc"), Some("")));
        assert!(matches_calories(10.0, Some(" "), Some("NaN")));
        assert!(matches_calories(10.0, Some("-inf"), Some("inf")));
        assert!(!matches_calories(501.0, None, Some(" 500 ")));
        assert!(matches_calories(500.0, None, Some("500")));
    }

    #[test]
    fn cuisine_is_membership() {
        let selected = terms(&["Italian", "Thai"]);
        assert!(matches_cuisine("Thai", &selected));
        assert!(!matches_cuisine("French", &selected));
        assert!(!matches_cuisine("thai", &selected));
        assert!(matches_cuisine("French", &[]));
    }
}
