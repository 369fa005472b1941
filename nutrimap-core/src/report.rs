// JSON/CSV export and the end-of-crawl summary

use crate::error::Result;
use crate::model::{CrawlResult, Outcome};
use chrono::NaiveDateTime;
use colored::Colorize;
use nutrimap_scanner::{NutrientValue, Nutrients};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Both,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "both" | "all" => Some(ReportFormat::Both),
            _ => None,
        }
    }

    pub fn includes_json(self) -> bool {
        matches!(self, ReportFormat::Json | ReportFormat::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, ReportFormat::Csv | ReportFormat::Both)
    }
}

/// One nutrient column of the CSV export.
pub struct CsvColumn {
    pub header: &'static str,
    pub key: &'static str,
    /// Looked up only when `key` is not on the page at all.
    pub fallback: Option<&'static str>,
}

const fn column(header: &'static str, key: &'static str) -> CsvColumn {
    CsvColumn {
        header,
        key,
        fallback: None,
    }
}

pub const CATEGORY_HEADER: &str = "Types d'aliments";
pub const FOOD_HEADER: &str = "aliment";
pub const LINK_HEADER: &str = "link";

/// Nutrient columns in export order.
pub const NUTRIENT_COLUMNS: [CsvColumn; 22] = [
    CsvColumn {
        header: "Quantité",
        key: "Quantity",
        fallback: Some("Nutrients"),
    },
    column("Eau", "Water"),
    column("Protéines", "Proteins"),
    column("Alcool", "Alcohol"),
    column("Glucides", "Carbohydrates"),
    column("Lipides", "Fats"),
    column("Vitamine A(rétinol)", "Vitamin A(retinol)"),
    column("Bêta-carotène(provitamine A)", "Beta-carotene(provitamin A)"),
    column("Vitamine D(cholécalciférol)", "Vitamin D(cholecalciferol)"),
    column("Vitamine E(tocophérol)", "Vitamin E(tocopherol)"),
    column("Vitamine K1", "Vitamin K1"),
    column("Vitamine K2", "Vitamin K2"),
    column("Vitamine C", "Vitamin C"),
    column("Vitamine B1(thiamine)", "Vitamin B1(thiamine)"),
    column("Vitamine B2(riboflavine)", "Vitamin B2(riboflavin)"),
    column("Vitamine B3(niacine)", "Vitamin B3(niacin)"),
    column("Vitamine B5(acide panthonéique)", "Vitamin B5(pantothenic acid)"),
    column("Vitamine B6", "Vitamin B6"),
    column("Vitamine B9(acide folique)", "Vitamin B9(folic acid)"),
    column("Vitamine B12(cobolamine)", "Vitamin B12(cobalamin)"),
    column("Calcium", "Calcium"),
    column("Cuivre", "Copper"),
];

impl CsvColumn {
    /// Cell text for one food. Missing and absent values both export as `0`.
    pub fn cell(&self, nutrients: &Nutrients) -> String {
        let key = match self.fallback {
            Some(fallback) if !nutrients.contains(self.key) => fallback,
            _ => self.key,
        };
        match nutrients.get(key) {
            Some(NutrientValue::Amount(value)) => format_number(value),
            Some(NutrientValue::Absent) | None => "0".to_string(),
        }
    }
}

pub fn csv_headers() -> Vec<&'static str> {
    let mut headers = vec![CATEGORY_HEADER, FOOD_HEADER, LINK_HEADER];
    headers.extend(NUTRIENT_COLUMNS.iter().map(|c| c.header));
    headers
}

/// `{ category: [ { food, link, nutritional_values }, ... ] }`, four-space indent.
pub fn to_json(result: &CrawlResult) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    result.serialize(&mut serializer)?;
    Ok(out)
}

/// One row per recorded food, categories and foods in discovery order.
pub fn to_csv(result: &CrawlResult) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(csv_headers())?;

    for entry in result.categories() {
        for record in &entry.foods {
            let mut row = vec![
                entry.identifier().to_string(),
                record.food.name.clone(),
                record.food.source_url.clone(),
            ];
            row.extend(NUTRIENT_COLUMNS.iter().map(|c| c.cell(&record.nutrients)));
            writer.write_record(&row)?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Shortest round-trip digits with a trailing `.0` on whole values. Decimal
/// exponents outside `-4..16` switch to `1e-05` / `1.5e+16` notation.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let plain = format!("{}", value);
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// `Data_<yy-mm-dd-HH-MM>.json` and `.csv` inside `dir`.
pub fn output_paths(dir: &Path, generated_at: NaiveDateTime) -> (PathBuf, PathBuf) {
    let stamp = generated_at.format("%y-%m-%d-%H-%M");
    (
        dir.join(format!("Data_{}.json", stamp)),
        dir.join(format!("Data_{}.csv", stamp)),
    )
}

pub fn save_report(content: &[u8], path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    Ok(())
}

/// Human-readable crawl summary
pub fn generate_crawl_report(result: &CrawlResult) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if let Outcome::Failed(reason) = &result.catalog {
        report.push_str(&format!("{} Catalog: {}\n", "✗".red().bold(), reason));
        report.push_str("  No categories to process\n");
        return report;
    }

    let summary = result.summary();
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Categories: {}\n", summary.categories()));
    report.push_str(&format!("  Categories failed: {}\n", summary.categories_failed));
    report.push_str(&format!("  Foods recorded: {}\n", summary.foods_recorded));
    report.push_str(&format!("  Foods failed: {}\n", summary.foods_failed));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for entry in result.categories() {
        match &entry.outcome {
            Outcome::Ok => {
                report.push_str(&format!(
                    "  {} {} ({} foods)\n",
                    "✓".green(),
                    entry.identifier(),
                    entry.foods.len()
                ));
                for failure in &entry.failures {
                    report.push_str(&format!(
                        "      {} {}: {}\n",
                        "⚠".yellow(),
                        failure.food.name,
                        failure.reason
                    ));
                }
            }
            Outcome::Failed(reason) => {
                report.push_str(&format!(
                    "  {} {} failed: {}\n",
                    "✗".red(),
                    entry.identifier(),
                    reason
                ));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_plain_range() {
        assert_eq!(format_number(12500.0), "12500.0");
        assert_eq!(format_number(0.0), "0.0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(85_600_000.0), "85600000.0");
        assert_eq!(format_number(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_format_number_exponent_range() {
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(0.000012), "1.2e-05");
        assert_eq!(format_number(1e16), "1e+16");
        assert_eq!(format_number(1.5e16), "1.5e+16");
        assert_eq!(format_number(2e100), "2e+100");
    }

    #[test]
    fn test_format_number_non_finite() {
        assert_eq!(format_number(f64::NAN), "nan");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }
}
