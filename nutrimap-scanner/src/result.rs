use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A food category discovered on the catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub identifier: String,
    pub source_url: String,
}

/// A single food listed on a category page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodRef {
    pub name: String,
    pub source_url: String,
}

/// A nutrient magnitude in micrograms, or `Absent` when the page gave nothing usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NutrientValue {
    Amount(f64),
    Absent,
}

impl NutrientValue {
    pub fn amount(&self) -> Option<f64> {
        match self {
            NutrientValue::Amount(v) => Some(*v),
            NutrientValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NutrientValue::Absent)
    }
}

impl Serialize for NutrientValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NutrientValue::Amount(v) => serializer.serialize_f64(*v),
            NutrientValue::Absent => serializer.serialize_none(),
        }
    }
}

/// Nutrient name to value, iterated in the order names were first seen.
///
/// Inserting a name that is already present replaces its value but keeps its
/// position, so repeated rows on a page behave like a plain map assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nutrients {
    entries: Vec<(String, NutrientValue)>,
}

impl Nutrients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: NutrientValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<NutrientValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NutrientValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Nutrients {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A food together with the nutrients parsed from its page.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodRecord {
    pub food: FoodRef,
    pub nutrients: Nutrients,
}

impl FoodRecord {
    pub fn new(food: FoodRef, nutrients: Nutrients) -> Self {
        Self { food, nutrients }
    }
}

impl Serialize for FoodRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("food", &self.food.name)?;
        map.serialize_entry("link", &self.food.source_url)?;
        map.serialize_entry("nutritional_values", &self.nutrients)?;
        map.end()
    }
}
