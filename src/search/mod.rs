pub mod aggregator;
pub mod filters;
pub mod matchers;

pub use aggregator::{filter_recipes, recipe_matches};
pub use filters::{DifficultyFilter, FilterBundle, SearchRequest, TimeBucket};
