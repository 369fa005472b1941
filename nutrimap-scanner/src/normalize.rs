use crate::result::NutrientValue;
use regex::Regex;
use std::sync::LazyLock;

/// Literal the site uses for "no data" in a nutrient cell.
pub const ABSENT_MARKER: &str = "-";

static VALUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)(?:\s*(µg|μg|mg|g))?").unwrap());

/// Mass units recognised after a nutrient magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Microgram,
    Milligram,
    Gram,
}

impl Unit {
    const TABLE: [(&'static str, Unit); 4] = [
        ("µg", Unit::Microgram),
        ("μg", Unit::Microgram),
        ("mg", Unit::Milligram),
        ("g", Unit::Gram),
    ];

    pub fn from_token(token: &str) -> Option<Unit> {
        Self::TABLE
            .iter()
            .find(|(symbol, _)| *symbol == token)
            .map(|(_, unit)| *unit)
    }

    /// Multiplier into micrograms.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Microgram => 1.0,
            Unit::Milligram => 1_000.0,
            Unit::Gram => 1_000_000.0,
        }
    }
}

/// Parse a free-text nutrient cell into micrograms.
///
/// The first number in the text wins. A number without a recognised unit is
/// taken as already being in micrograms.
pub fn normalize_value(raw: &str) -> NutrientValue {
    let value = raw.replace(',', ".");
    if value == ABSENT_MARKER {
        return NutrientValue::Absent;
    }

    let Some(captures) = VALUE_PATTERN.captures(&value) else {
        return NutrientValue::Absent;
    };
    let Ok(magnitude) = captures[1].parse::<f64>() else {
        return NutrientValue::Absent;
    };

    let factor = captures
        .get(2)
        .and_then(|token| Unit::from_token(token.as_str()))
        .map(Unit::factor)
        .unwrap_or(1.0);

    NutrientValue::Amount(magnitude * factor)
}

/// Derive a category identifier from its display name.
///
/// Transliterates to ASCII first, since the later replacements are
/// character-sensitive.
pub fn slugify(display: &str) -> String {
    deunicode::deunicode(display)
        .replace(' ', "-")
        .to_lowercase()
        .replace(',', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_marker() {
        assert_eq!(normalize_value("-"), NutrientValue::Absent);
    }

    #[test]
    fn test_milligrams_with_decimal_comma() {
        assert_eq!(normalize_value("12,5 mg"), NutrientValue::Amount(12500.0));
    }

    #[test]
    fn test_micrograms() {
        assert_eq!(normalize_value("3 µg"), NutrientValue::Amount(3.0));
        assert_eq!(normalize_value("3 μg"), NutrientValue::Amount(3.0));
    }

    #[test]
    fn test_grams() {
        assert_eq!(normalize_value("1,2 g"), NutrientValue::Amount(1_200_000.0));
    }

    #[test]
    fn test_unitless_is_base_unit() {
        assert_eq!(normalize_value("7"), NutrientValue::Amount(7.0));
    }

    #[test]
    fn test_unparseable_is_absent() {
        assert_eq!(normalize_value("abc"), NutrientValue::Absent);
        assert_eq!(normalize_value(""), NutrientValue::Absent);
    }

    #[test]
    fn test_unit_without_space() {
        assert_eq!(normalize_value("4mg"), NutrientValue::Amount(4000.0));
    }

    #[test]
    fn test_first_number_wins() {
        assert_eq!(normalize_value("< 0,5 g"), NutrientValue::Amount(500_000.0));
        assert_eq!(normalize_value("traces 2 mg"), NutrientValue::Amount(2000.0));
    }

    #[test]
    fn test_unknown_unit_is_base_unit() {
        assert_eq!(normalize_value("52 kcal"), NutrientValue::Amount(52.0));
    }

    #[test]
    fn test_dash_with_comma_is_not_absent_marker() {
        assert_eq!(normalize_value("-,"), NutrientValue::Absent);
        assert_eq!(normalize_value("-1"), NutrientValue::Amount(1.0));
    }

    #[test]
    fn test_slugify_accents() {
        assert_eq!(slugify("Légumes et crudités"), "legumes-et-crudites");
    }

    #[test]
    fn test_slugify_commas() {
        assert_eq!(slugify("Viandes, volailles"), "viandes.-volailles");
    }

    #[test]
    fn test_slugify_plain() {
        assert_eq!(slugify("Fruits"), "fruits");
    }
}
