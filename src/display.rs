//! Plain-text product rendering
//!
//! Formats a normalized product as an aligned nutrition table for the
//! terminal. Consumes the normalization output read-only.

use crate::models::{NormalizedProduct, UnitMode};

/// Shown in place of a value the record does not provide
const NOT_AVAILABLE: &str = "n/a";

/// Render the full product card: name, basis, optional serving size and
/// image link, then one row per nutrient.
pub fn render_table(product: &NormalizedProduct) -> String {
    let mut out = String::new();
    out.push_str(&product.name);
    out.push('\n');
    out.push_str(&"=".repeat(product.name.chars().count().max(12)));
    out.push('\n');

    out.push_str("Values ");
    out.push_str(product.basis.as_str());
    out.push('\n');
    if product.basis == UnitMode::PerServing {
        if let Some(serving) = &product.serving_size {
            out.push_str(&format!("Serving size: {serving}\n"));
        }
    }
    if let Some(url) = &product.image_url {
        out.push_str(&format!("Image: {url}\n"));
    }
    out.push('\n');

    let label_width = product
        .entries
        .iter()
        .map(|e| e.key.label().len())
        .max()
        .unwrap_or(0);
    for entry in &product.entries {
        let value = match entry.value {
            Some(v) => format!("{v:.2} {}", entry.display_unit),
            None => NOT_AVAILABLE.to_string(),
        };
        out.push_str(&format!(
            "{:<width$}  {}\n",
            entry.key.label(),
            value.trim_end(),
            width = label_width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutrientEntry, NutrientKey};

    fn sample() -> NormalizedProduct {
        let entries = NutrientKey::ALL
            .iter()
            .map(|&key| match key {
                NutrientKey::EnergyKcal => NutrientEntry::present(key, 250.0),
                NutrientKey::Proteins => NutrientEntry::present(key, 3.2),
                _ => NutrientEntry::absent(key),
            })
            .collect();
        NormalizedProduct {
            name: "Oat Bar".to_string(),
            image_url: None,
            serving_size: Some("30 g".to_string()),
            basis: UnitMode::PerServing,
            entries,
        }
    }

    #[test]
    fn test_table_has_all_rows() {
        let table = render_table(&sample());
        for key in NutrientKey::ALL {
            assert!(table.contains(key.label()), "missing row for {key:?}");
        }
        assert!(table.contains("Oat Bar"));
        assert!(table.contains("250.00 kcal"));
        assert!(table.contains("3.20 g"));
        assert!(table.contains("Serving size: 30 g"));
        assert_eq!(table.matches(NOT_AVAILABLE).count(), 6);
    }

    #[test]
    fn test_per_100g_table_omits_serving_line() {
        let mut product = sample();
        product.basis = UnitMode::Per100g;
        let table = render_table(&product);
        assert!(table.contains("per 100 g"));
        assert!(!table.contains("Serving size"));
    }
}
