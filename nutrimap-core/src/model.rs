use nutrimap_scanner::{CategoryRef, FoodRecord, FoodRef};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Result of one fetch-and-parse step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Ok,
    Failed(String),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok => None,
            Outcome::Failed(reason) => Some(reason),
        }
    }
}

/// A food whose page could not be fetched. It has no slot in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodFailure {
    pub food: FoodRef,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    pub category: CategoryRef,
    pub outcome: Outcome,
    pub foods: Vec<FoodRecord>,
    pub failures: Vec<FoodFailure>,
}

impl CategoryEntry {
    pub fn failed(category: CategoryRef, reason: String) -> Self {
        Self {
            category,
            outcome: Outcome::Failed(reason),
            foods: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.category.identifier
    }
}

/// Everything a crawl produced, keyed by category identifier in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    pub catalog: Outcome,
    entries: Vec<CategoryEntry>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self {
            catalog: Outcome::Ok,
            entries: Vec::new(),
        }
    }

    pub fn catalog_failed(reason: String) -> Self {
        Self {
            catalog: Outcome::Failed(reason),
            entries: Vec::new(),
        }
    }

    /// Add a category. An identifier seen before is replaced where it stands,
    /// except that a failed entry never overwrites one that succeeded.
    ///
    /// Returns `false` when the entry was dropped for that reason.
    pub fn insert(&mut self, entry: CategoryEntry) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.identifier() == entry.identifier())
        {
            Some(slot) if slot.outcome.is_ok() && !entry.outcome.is_ok() => false,
            Some(slot) => {
                *slot = entry;
                true
            }
            None => {
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&CategoryEntry> {
        self.entries.iter().find(|e| e.identifier() == identifier)
    }

    pub fn foods(&self, identifier: &str) -> Option<&[FoodRecord]> {
        self.get(identifier).map(|e| e.foods.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryEntry> {
        self.entries.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(CategoryEntry::identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> CrawlSummary {
        let mut summary = CrawlSummary::default();
        for entry in &self.entries {
            if entry.outcome.is_ok() {
                summary.categories_ok += 1;
            } else {
                summary.categories_failed += 1;
            }
            summary.foods_recorded += entry.foods.len();
            summary.foods_failed += entry.failures.len();
        }
        summary
    }
}

impl Default for CrawlResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes as `{ identifier: [record, ...], ... }`.
impl Serialize for CrawlResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.identifier(), &entry.foods)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub categories_ok: usize,
    pub categories_failed: usize,
    pub foods_recorded: usize,
    pub foods_failed: usize,
}

impl CrawlSummary {
    pub fn categories(&self) -> usize {
        self.categories_ok + self.categories_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(identifier: &str) -> CategoryRef {
        CategoryRef {
            identifier: identifier.to_string(),
            source_url: format!("https://example.test/{}/", identifier),
        }
    }

    fn recorded(identifier: &str, names: &[&str]) -> CategoryEntry {
        CategoryEntry {
            category: category(identifier),
            outcome: Outcome::Ok,
            foods: names
                .iter()
                .map(|name| {
                    FoodRecord::new(
                        FoodRef {
                            name: name.to_string(),
                            source_url: format!("https://example.test/{}", name),
                        },
                        Default::default(),
                    )
                })
                .collect(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut result = CrawlResult::new();
        assert!(result.insert(recorded("fruits", &["Pomme"])));
        assert!(result.insert(recorded("laits", &[])));
        assert!(result.insert(recorded("fruits", &["Poire", "Kiwi"])));

        let ids: Vec<&str> = result.identifiers().collect();
        assert_eq!(ids, vec!["fruits", "laits"]);
        assert_eq!(result.foods("fruits").unwrap().len(), 2);
    }

    #[test]
    fn test_failure_does_not_overwrite_success() {
        let mut result = CrawlResult::new();
        result.insert(recorded("fruits", &["Pomme"]));

        let kept = result.insert(CategoryEntry::failed(category("fruits"), "HTTP 503".to_string()));

        assert!(!kept);
        let entry = result.get("fruits").unwrap();
        assert!(entry.outcome.is_ok());
        assert_eq!(entry.foods.len(), 1);
        assert_eq!(result.summary().categories_failed, 0);
    }

    #[test]
    fn test_success_overwrites_failure() {
        let mut result = CrawlResult::new();
        result.insert(CategoryEntry::failed(category("fruits"), "HTTP 503".to_string()));

        assert!(result.insert(recorded("fruits", &["Pomme"])));
        assert!(result.get("fruits").unwrap().outcome.is_ok());
    }
}
