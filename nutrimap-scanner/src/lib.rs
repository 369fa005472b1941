pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod result;

pub use error::FetchError;
pub use extract::{extract_categories, extract_foods, extract_nutrients};
pub use fetch::{
    DEFAULT_BACKOFF_MS, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS, Fetcher, HttpFetcher, MAX_BACKOFF,
};
pub use normalize::{normalize_value, slugify};
pub use result::{CategoryRef, FoodRecord, FoodRef, NutrientValue, Nutrients};

/// Site the calorie guide is served from.
pub const DEFAULT_ORIGIN: &str = "https://www.santemagazine.fr";

/// Root page listing every food category.
pub const DEFAULT_CATALOG_URL: &str =
    "https://www.santemagazine.fr/alimentation/nutriments/guide-des-calories/";
