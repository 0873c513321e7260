//! Nutrient normalization
//!
//! Maps a raw product record onto the fixed eight-row nutrition table,
//! resolving the unit basis, applying the missing-value policy, and
//! rounding for display. This never fails: a record missing every field
//! simply yields eight absent entries.

use tracing::debug;

use crate::models::{
    NormalizedProduct, NutrientEntry, NutrientKey, RawProductRecord, UnitMode, PLACEHOLDER_NAME,
};

/// Normalize a raw record for display in the requested unit mode.
///
/// Per-serving values are only used when the record itself declares
/// `nutrition_data_per = "serving"`; otherwise the basis falls back to
/// per-100g so serving figures are never fabricated from 100g data.
pub fn normalize(raw: &RawProductRecord, requested: UnitMode) -> NormalizedProduct {
    let serving_denominated = raw.str_field("nutrition_data_per") == Some("serving");
    let basis = if serving_denominated && requested == UnitMode::PerServing {
        UnitMode::PerServing
    } else {
        UnitMode::Per100g
    };
    if basis != requested {
        debug!("record is not serving-denominated, falling back to per-100g");
    }

    let entries = NutrientKey::ALL
        .iter()
        .map(|&key| match lookup(raw, key, basis) {
            Some(value) => NutrientEntry::present(key, round_half_even(value)),
            None => NutrientEntry::absent(key),
        })
        .collect();

    let name = raw
        .str_field("product_name")
        .unwrap_or(PLACEHOLDER_NAME)
        .to_string();
    let image_url = raw
        .str_field("image_front_url")
        .filter(|url| looks_like_url(url))
        .map(String::from);
    let serving_size = if basis == UnitMode::PerServing {
        raw.str_field("serving_size").map(String::from)
    } else {
        None
    };

    NormalizedProduct {
        name,
        image_url,
        serving_size,
        basis,
        entries,
    }
}

fn lookup(raw: &RawProductRecord, key: NutrientKey, basis: UnitMode) -> Option<f64> {
    match basis {
        UnitMode::PerServing => raw.nutriment(&format!("{}_serving", key.raw_key())),
        UnitMode::Per100g => raw.nutriment(key.raw_key()),
    }
}

/// Round to 2 decimal places with ties going to the even neighbor, so
/// repeated normalization of the same record is bit-for-bit stable.
pub fn round_half_even(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawProductRecord {
        RawProductRecord::new(value)
    }

    fn entry(product: &NormalizedProduct, key: NutrientKey) -> &NutrientEntry {
        product
            .entries
            .iter()
            .find(|e| e.key == key)
            .expect("all keys are always present")
    }

    #[test]
    fn test_serving_values_used_when_record_is_serving_denominated() {
        let raw = record(json!({
            "nutriments": { "proteins": 10.005, "proteins_serving": 3.2 },
            "nutrition_data_per": "serving",
        }));
        let product = normalize(&raw, UnitMode::PerServing);
        assert_eq!(product.basis, UnitMode::PerServing);
        let proteins = entry(&product, NutrientKey::Proteins);
        assert_eq!(proteins.value, Some(3.2));
        assert_eq!(proteins.display_unit, "g");
    }

    #[test]
    fn test_serving_request_falls_back_without_serving_basis() {
        for per in [json!("100g"), json!(null), json!({})] {
            let raw = record(json!({
                "nutriments": { "proteins": 10.005, "proteins_serving": 3.2 },
                "nutrition_data_per": per,
            }));
            let product = normalize(&raw, UnitMode::PerServing);
            assert_eq!(product.basis, UnitMode::Per100g);
            assert_eq!(entry(&product, NutrientKey::Proteins).value, Some(10.0));
        }
    }

    #[test]
    fn test_empty_record_yields_eight_absent_entries() {
        for requested in [UnitMode::Per100g, UnitMode::PerServing] {
            let product = normalize(&record(json!({})), requested);
            assert_eq!(product.name, PLACEHOLDER_NAME);
            assert_eq!(product.entries.len(), 8);
            for (entry, key) in product.entries.iter().zip(NutrientKey::ALL) {
                assert_eq!(entry.key, key);
                assert_eq!(entry.value, None);
                assert_eq!(entry.display_unit, "");
            }
        }
    }

    #[test]
    fn test_entries_in_canonical_order_regardless_of_record() {
        let raw = record(json!({
            "nutriments": {
                "salt": 0.5,
                "energy-kcal": 250,
                "fat": 12.0,
            }
        }));
        let product = normalize(&raw, UnitMode::Per100g);
        let keys: Vec<NutrientKey> = product.entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, NutrientKey::ALL.to_vec());
        let energy = entry(&product, NutrientKey::EnergyKcal);
        assert_eq!(energy.value, Some(250.0));
        assert_eq!(energy.display_unit, "kcal");
    }

    #[test]
    fn test_malformed_nutriments_degrade_to_absent() {
        let raw = record(json!({
            "product_name": "Odd Record",
            "nutriments": {
                "fat": "plenty",
                "fiber": null,
                "sugars": [1, 2],
                "salt": "0.25",
            }
        }));
        let product = normalize(&raw, UnitMode::Per100g);
        assert_eq!(entry(&product, NutrientKey::Fat).value, None);
        assert_eq!(entry(&product, NutrientKey::Fiber).value, None);
        assert_eq!(entry(&product, NutrientKey::Sugars).value, None);
        assert_eq!(entry(&product, NutrientKey::Salt).value, Some(0.25));
    }

    #[test]
    fn test_non_object_record_degrades_gracefully() {
        for weird in [json!(null), json!("text"), json!([1, 2, 3]), json!(7)] {
            let product = normalize(&record(weird), UnitMode::Per100g);
            assert_eq!(product.name, PLACEHOLDER_NAME);
            assert!(product.entries.iter().all(|e| e.value.is_none()));
        }
    }

    #[test]
    fn test_rounding_is_half_even_and_stable() {
        assert_eq!(round_half_even(0.125), 0.12);
        assert_eq!(round_half_even(0.375), 0.38);
        assert_eq!(round_half_even(12.345), 12.34);
        for _ in 0..5 {
            assert_eq!(round_half_even(12.345), 12.34);
        }
    }

    #[test]
    fn test_image_url_passed_through_only_when_url_shaped() {
        let good = record(json!({
            "image_front_url": "https://images.example.org/front.jpg"
        }));
        assert_eq!(
            normalize(&good, UnitMode::Per100g).image_url.as_deref(),
            Some("https://images.example.org/front.jpg")
        );

        let bad = record(json!({ "image_front_url": "front.jpg" }));
        assert_eq!(normalize(&bad, UnitMode::Per100g).image_url, None);
    }

    #[test]
    fn test_serving_size_only_reported_on_serving_basis() {
        let raw = record(json!({
            "nutrition_data_per": "serving",
            "serving_size": "30 g",
            "nutriments": { "fat_serving": 4.1 },
        }));
        let serving = normalize(&raw, UnitMode::PerServing);
        assert_eq!(serving.serving_size.as_deref(), Some("30 g"));

        let hundred = normalize(&raw, UnitMode::Per100g);
        assert_eq!(hundred.serving_size, None);
    }

    #[test]
    fn test_blank_name_uses_placeholder() {
        let raw = record(json!({ "product_name": "   " }));
        assert_eq!(normalize(&raw, UnitMode::Per100g).name, PLACEHOLDER_NAME);
    }
}
