//! Extraction of categories, foods and nutrient tables from parsed pages.

use crate::normalize::{normalize_value, slugify};
use crate::result::{CategoryRef, FoodRef, Nutrients};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Path segment shared by every page of the calorie guide.
pub const GUIDE_PATH: &str = "/alimentation/nutriments/guide-des-calories/";

/// Classes carried by the food links on a category page.
pub const FOOD_LINK_CLASSES: [&str; 4] = [
    "paragraph-primary",
    "text-black",
    "hover:text-primary-main",
    "t-decoration-n",
];

/// Class marking the nutrient lists on a food page.
pub const NUTRIENT_WIDGET_CLASS: &str = "ciqual-widget";

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static LIST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul").unwrap());
static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static PARAGRAPH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Categories linked from the catalog page, in document order.
pub fn extract_categories(document: &Html, origin: &Url) -> Vec<CategoryRef> {
    let mut categories = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains(GUIDE_PATH) {
            continue;
        }

        let identifier = slugify(&stripped_text(&element));
        let source_url = resolve_url(origin, href);
        debug!("Found category {} -> {}", identifier, source_url);
        categories.push(CategoryRef {
            identifier,
            source_url,
        });
    }

    categories
}

/// Foods listed on a category page.
///
/// Only links under `<guide>/{identifier}/` are kept; the match is a raw,
/// case-sensitive substring test on the href. Duplicates are preserved.
pub fn extract_foods(document: &Html, identifier: &str, origin: &Url) -> Vec<FoodRef> {
    let filter = format!("{}{}/", GUIDE_PATH, identifier);
    let mut foods = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        if !has_classes(&element, &FOOD_LINK_CLASSES) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains(&filter) {
            continue;
        }

        foods.push(FoodRef {
            name: stripped_text(&element),
            source_url: resolve_url(origin, href),
        });
    }

    debug!("Category {}: {} food links", identifier, foods.len());
    foods
}

/// Nutrient table of a food page. Pages without a nutrient widget yield an empty table.
pub fn extract_nutrients(document: &Html) -> Nutrients {
    let mut nutrients = Nutrients::new();

    let widgets = document
        .select(&LIST_SELECTOR)
        .filter(|list| has_classes(list, &[NUTRIENT_WIDGET_CLASS]));

    for widget in widgets {
        for item in widget.select(&ITEM_SELECTOR) {
            let mut paragraphs = item.select(&PARAGRAPH_SELECTOR);
            let (Some(name), Some(value)) = (paragraphs.next(), paragraphs.next()) else {
                continue;
            };

            let name = stripped_text(&name).replace(',', ".");
            let value = stripped_text(&value).replace(',', ".");
            nutrients.insert(name, normalize_value(&value));
        }
    }

    nutrients
}

/// Text of an element with each text node trimmed and empty nodes dropped.
pub fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Absolutize a link target against the site origin.
pub fn resolve_url(origin: &Url, href: &str) -> String {
    match origin.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.as_str().trim_end_matches('/'), href),
    }
}

fn has_classes(element: &ElementRef, required: &[&str]) -> bool {
    let classes: Vec<&str> = element.value().classes().collect();
    required.iter().all(|class| classes.contains(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::NutrientValue;

    const FOOD_CLASS: &str = "paragraph-primary text-black hover:text-primary-main t-decoration-n";

    fn origin() -> Url {
        Url::parse("https://www.santemagazine.fr").unwrap()
    }

    #[test]
    fn test_catalog_extraction() {
        let html = Html::parse_document(
            r#"<html><body>
                <a href="/alimentation/nutriments/guide-des-calories/legumes-et-crudites/">
                    Légumes et crudités
                </a>
                <a href="/contact">Contact</a>
                <a href="/alimentation/nutriments/guide-des-calories/viandes.-volailles/">Viandes, volailles</a>
            </body></html>"#,
        );

        let categories = extract_categories(&html, &origin());

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].identifier, "legumes-et-crudites");
        assert_eq!(
            categories[0].source_url,
            "https://www.santemagazine.fr/alimentation/nutriments/guide-des-calories/legumes-et-crudites/"
        );
        assert_eq!(categories[1].identifier, "viandes.-volailles");
    }

    #[test]
    fn test_catalog_keeps_duplicates_in_order() {
        let html = Html::parse_document(
            r#"<a href="/alimentation/nutriments/guide-des-calories/fruits/">Fruits</a>
               <a href="/alimentation/nutriments/guide-des-calories/laits/">Laits</a>
               <a href="/alimentation/nutriments/guide-des-calories/fruits/">Fruits</a>"#,
        );

        let ids: Vec<String> = extract_categories(&html, &origin())
            .into_iter()
            .map(|c| c.identifier)
            .collect();
        assert_eq!(ids, vec!["fruits", "laits", "fruits"]);
    }

    #[test]
    fn test_food_links_filtered_by_category() {
        let html = Html::parse_document(&format!(
            r#"<html><body>
                <a class="{c}" href="/alimentation/nutriments/guide-des-calories/fruits/pomme">Pomme</a>
                <a class="{c}" href="/alimentation/nutriments/guide-des-calories/laits/lait-entier">Lait</a>
                <a class="other" href="/alimentation/nutriments/guide-des-calories/fruits/poire">Poire</a>
                <a class="{c}" href="/alimentation/nutriments/guide-des-calories/fruits/banane">
                    Banane
                </a>
            </body></html>"#,
            c = FOOD_CLASS
        ));

        let foods = extract_foods(&html, "fruits", &origin());

        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0].name, "Pomme");
        assert_eq!(
            foods[0].source_url,
            "https://www.santemagazine.fr/alimentation/nutriments/guide-des-calories/fruits/pomme"
        );
        assert_eq!(foods[1].name, "Banane");
    }

    #[test]
    fn test_food_link_filter_is_case_sensitive() {
        let html = Html::parse_document(&format!(
            r#"<a class="{c}" href="/alimentation/nutriments/guide-des-calories/Fruits/pomme">Pomme</a>"#,
            c = FOOD_CLASS
        ));

        assert!(extract_foods(&html, "fruits", &origin()).is_empty());
    }

    #[test]
    fn test_duplicate_food_links_are_kept() {
        let html = Html::parse_document(&format!(
            r#"<a class="{c}" href="/alimentation/nutriments/guide-des-calories/fruits/pomme">Pomme</a>
               <a class="{c}" href="/alimentation/nutriments/guide-des-calories/fruits/pomme">Pomme</a>"#,
            c = FOOD_CLASS
        ));

        let foods = extract_foods(&html, "fruits", &origin());
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0], foods[1]);
    }

    #[test]
    fn test_absolute_food_links_are_kept() {
        let html = Html::parse_document(&format!(
            r#"<a class="{c}" href="https://cdn.example.com/alimentation/nutriments/guide-des-calories/fruits/kiwi">Kiwi</a>"#,
            c = FOOD_CLASS
        ));

        let foods = extract_foods(&html, "fruits", &origin());
        assert_eq!(
            foods[0].source_url,
            "https://cdn.example.com/alimentation/nutriments/guide-des-calories/fruits/kiwi"
        );
    }

    #[test]
    fn test_nutrient_extraction() {
        let html = Html::parse_document(
            r#"<html><body>
                <ul class="lg:mb-6 mb-4 ciqual-widget">
                    <li><p>Eau</p><p>85,6 g</p></li>
                    <li><p>Calcium</p><p>-</p></li>
                    <li><p>Only one paragraph</p></li>
                    <li><p>Vitamine B9, folates</p><p>12 <span>µg</span></p></li>
                </ul>
                <ul class="unrelated"><li><p>Sodium</p><p>3 mg</p></li></ul>
            </body></html>"#,
        );

        let nutrients = extract_nutrients(&html);

        assert_eq!(nutrients.len(), 3);
        assert_eq!(nutrients.get("Eau"), Some(NutrientValue::Amount(85_600_000.0)));
        assert_eq!(nutrients.get("Calcium"), Some(NutrientValue::Absent));
        assert_eq!(
            nutrients.get("Vitamine B9. folates"),
            Some(NutrientValue::Amount(12.0))
        );
        assert!(!nutrients.contains("Sodium"));
        assert!(!nutrients.contains("Only one paragraph"));
    }

    #[test]
    fn test_repeated_nutrient_last_write_wins() {
        let html = Html::parse_document(
            r#"<ul class="ciqual-widget"><li><p>Eau</p><p>1 g</p></li></ul>
               <ul class="ciqual-widget"><li><p>Eau</p><p>2 mg</p></li></ul>"#,
        );

        let nutrients = extract_nutrients(&html);
        assert_eq!(nutrients.len(), 1);
        assert_eq!(nutrients.get("Eau"), Some(NutrientValue::Amount(2000.0)));
    }

    #[test]
    fn test_missing_widget_gives_empty_table() {
        let html = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(extract_nutrients(&html).is_empty());
    }

    #[test]
    fn test_stripped_text_joins_trimmed_nodes() {
        let html = Html::parse_fragment("<p>  12,5 <b> mg </b> </p>");
        let selector = Selector::parse("p").unwrap();
        let p = html.select(&selector).next().unwrap();
        assert_eq!(stripped_text(&p), "12,5mg");
    }
}
