//! Product record models
//!
//! The raw record is the unmodified payload returned by the product
//! repository; the normalized product is the fixed-shape table derived
//! from it for display.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name shown when the raw record carries no usable product name
pub const PLACEHOLDER_NAME: &str = "Unknown product";

/// Read-only wrapper over a loosely-typed product payload.
///
/// All field access goes through failure-tolerant lookups; a record of any
/// shape (including a non-object) is accepted and simply yields nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProductRecord(Value);

impl RawProductRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Top-level string field, trimmed; empty strings count as absent
    pub fn str_field(&self, key: &str) -> Option<&str> {
        let s = self.0.get(key)?.as_str()?.trim();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    /// Numeric value under the `nutriments` mapping.
    ///
    /// The upstream record format serves some quantities as JSON strings,
    /// so numeric strings are accepted alongside numbers.
    pub fn nutriment(&self, key: &str) -> Option<f64> {
        let value = self.0.get("nutriments")?.get(key)?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<Value> for RawProductRecord {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// The eight tracked nutrients, in canonical display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientKey {
    EnergyKcal,
    Proteins,
    Carbohydrates,
    Fat,
    Fiber,
    Sugars,
    SaturatedFat,
    Salt,
}

impl NutrientKey {
    /// Canonical display order
    pub const ALL: [NutrientKey; 8] = [
        NutrientKey::EnergyKcal,
        NutrientKey::Proteins,
        NutrientKey::Carbohydrates,
        NutrientKey::Fat,
        NutrientKey::Fiber,
        NutrientKey::Sugars,
        NutrientKey::SaturatedFat,
        NutrientKey::Salt,
    ];

    /// Key used by the raw record's `nutriments` mapping
    pub fn raw_key(&self) -> &'static str {
        match self {
            NutrientKey::EnergyKcal => "energy-kcal",
            NutrientKey::Proteins => "proteins",
            NutrientKey::Carbohydrates => "carbohydrates",
            NutrientKey::Fat => "fat",
            NutrientKey::Fiber => "fiber",
            NutrientKey::Sugars => "sugars",
            NutrientKey::SaturatedFat => "saturated-fat",
            NutrientKey::Salt => "salt",
        }
    }

    /// Human-readable row label
    pub fn label(&self) -> &'static str {
        match self {
            NutrientKey::EnergyKcal => "Energy",
            NutrientKey::Proteins => "Proteins",
            NutrientKey::Carbohydrates => "Carbohydrates",
            NutrientKey::Fat => "Fat",
            NutrientKey::Fiber => "Fiber",
            NutrientKey::Sugars => "Sugar",
            NutrientKey::SaturatedFat => "Saturated Fat",
            NutrientKey::Salt => "Salt",
        }
    }

    /// Unit string shown next to a present value
    pub fn unit(&self) -> &'static str {
        match self {
            NutrientKey::EnergyKcal => "kcal",
            _ => "g",
        }
    }
}

/// Requested unit basis for nutrient display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitMode {
    #[default]
    Per100g,
    PerServing,
}

impl UnitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitMode::Per100g => "per 100 g",
            UnitMode::PerServing => "per serving",
        }
    }
}

/// One row of the nutrition table.
///
/// `display_unit` is empty exactly when `value` is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientEntry {
    pub key: NutrientKey,
    pub value: Option<f64>,
    pub display_unit: &'static str,
}

impl NutrientEntry {
    /// Entry for a nutrient the record does not provide
    pub fn absent(key: NutrientKey) -> Self {
        Self {
            key,
            value: None,
            display_unit: "",
        }
    }

    /// Entry with a value, unit chosen from the key
    pub fn present(key: NutrientKey, value: f64) -> Self {
        Self {
            key,
            value: Some(value),
            display_unit: key.unit(),
        }
    }
}

/// Fixed-shape nutrition facts ready for display.
///
/// `entries` always holds exactly one row per [`NutrientKey`], in canonical
/// order. `basis` is the unit basis actually used for the lookups, which
/// may differ from the caller's request when the record is not
/// serving-denominated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProduct {
    pub name: String,
    pub image_url: Option<String>,
    pub serving_size: Option<String>,
    pub basis: UnitMode,
    pub entries: Vec<NutrientEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_field_tolerates_shapes() {
        let record = RawProductRecord::new(json!({
            "product_name": "  Oat Bar  ",
            "code": 123,
        }));
        assert_eq!(record.str_field("product_name"), Some("Oat Bar"));
        assert_eq!(record.str_field("code"), None);
        assert_eq!(record.str_field("missing"), None);

        let scalar = RawProductRecord::new(json!("not an object"));
        assert_eq!(scalar.str_field("product_name"), None);
    }

    #[test]
    fn test_nutriment_accepts_numbers_and_numeric_strings() {
        let record = RawProductRecord::new(json!({
            "nutriments": {
                "proteins": 10.5,
                "salt": "0.3",
                "fat": "lots",
                "fiber": null,
            }
        }));
        assert_eq!(record.nutriment("proteins"), Some(10.5));
        assert_eq!(record.nutriment("salt"), Some(0.3));
        assert_eq!(record.nutriment("fat"), None);
        assert_eq!(record.nutriment("fiber"), None);
        assert_eq!(record.nutriment("sugars"), None);
    }

    #[test]
    fn test_canonical_order_is_stable() {
        assert_eq!(NutrientKey::ALL.len(), 8);
        assert_eq!(NutrientKey::ALL[0], NutrientKey::EnergyKcal);
        assert_eq!(NutrientKey::ALL[7], NutrientKey::Salt);
        assert_eq!(NutrientKey::EnergyKcal.unit(), "kcal");
        assert_eq!(NutrientKey::Salt.unit(), "g");
    }
}
