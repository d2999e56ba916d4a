use serde::Serialize;
use serde_json::Value;

use crate::units::{WeightUnit, to_lb};

/// One performed or planned set.
///
/// `weight` is `None` for bodyweight or unspecified sets. Deserialization goes
/// through [`normalize`], so every historic stored shape (bare rep counts,
/// numeric strings, missing fields) loads without error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct Set {
    pub weight: Option<f64>,
    pub unit: WeightUnit,
    pub reps: u32,
}

impl Set {
    pub fn new(weight: Option<f64>, unit: WeightUnit, reps: u32) -> Self {
        Self {
            weight,
            unit,
            reps,
        }
    }

    pub fn bodyweight(reps: u32) -> Self {
        Self::new(None, WeightUnit::Lb, reps)
    }

    /// Weight converted to pounds, if the set is loaded.
    pub fn weight_lb(&self) -> Option<f64> {
        self.weight.map(|w| to_lb(w, self.unit))
    }
}

impl From<Value> for Set {
    fn from(raw: Value) -> Self {
        normalize(&raw)
    }
}

/// Coerce a loosely typed value into a number the way stored data expects:
/// empty strings and null count as zero, booleans as 0/1.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn reps_from(value: Option<&Value>) -> u32 {
    match value.and_then(loose_number) {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Convert any raw set representation into a canonical [`Set`].
///
/// Accepts a bare number (legacy rep count), null, or a partial object with
/// `weight`, `unit` and `reps`. Never fails: invalid parts fall back to a
/// null weight, pounds and zero reps.
pub fn normalize(raw: &Value) -> Set {
    let obj = match raw {
        Value::Number(_) => return Set::bodyweight(reps_from(Some(raw))),
        Value::Object(obj) => obj,
        _ => return Set::bodyweight(0),
    };

    let weight = match obj.get("weight") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => loose_number(v).filter(|w| w.is_finite()),
    };
    let unit = obj
        .get("unit")
        .and_then(Value::as_str)
        .and_then(WeightUnit::parse)
        .unwrap_or_default();

    Set {
        weight,
        unit,
        reps: reps_from(obj.get("reps")),
    }
}

/// Human readable summary of the set at position `index` (0-based).
pub fn format_set(set: &Set, index: usize) -> String {
    match set.weight {
        Some(w) => format!("Set {}: {} {}×{}", index + 1, w, set.unit, set.reps),
        None => format!("Set {}: {} reps", index + 1, set.reps),
    }
}

/// Comma separated summary of all sets, or a placeholder when empty.
pub fn summarize_sets(sets: &[Set]) -> String {
    if sets.is_empty() {
        return "No sets yet.".to_string();
    }
    sets.iter()
        .enumerate()
        .map(|(i, s)| format_set(s, i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_number_is_bodyweight_reps() {
        let set = normalize(&json!(5));
        assert_eq!(set, Set::new(None, WeightUnit::Lb, 5));
    }

    #[test]
    fn empty_weight_string_is_null() {
        let set = normalize(&json!({"reps": "8", "weight": "", "unit": "kg"}));
        assert_eq!(set, Set::new(None, WeightUnit::Kg, 8));
    }

    #[test]
    fn null_and_garbage_default() {
        assert_eq!(normalize(&Value::Null), Set::bodyweight(0));
        assert_eq!(normalize(&json!("ten")), Set::bodyweight(0));
        let set = normalize(&json!({"weight": "heavy", "reps": "many"}));
        assert_eq!(set, Set::bodyweight(0));
    }

    #[test]
    fn numeric_strings_parse() {
        let set = normalize(&json!({"weight": "102.5", "reps": 3}));
        assert_eq!(set, Set::new(Some(102.5), WeightUnit::Lb, 3));
    }

    #[test]
    fn negative_reps_clamp_to_zero() {
        assert_eq!(normalize(&json!(-4)).reps, 0);
        assert_eq!(normalize(&json!({"reps": -2, "weight": 10})).reps, 0);
    }

    #[test]
    fn deserializes_mixed_stored_shapes() {
        let sets: Vec<Set> =
            serde_json::from_str(r#"[5, {"weight": 60, "unit": "kg", "reps": 5}, null]"#).unwrap();
        assert_eq!(sets[0], Set::bodyweight(5));
        assert_eq!(sets[1], Set::new(Some(60.0), WeightUnit::Kg, 5));
        assert_eq!(sets[2], Set::bodyweight(0));
    }

    #[test]
    fn serialized_form_is_canonical() {
        let out = serde_json::to_value(Set::new(Some(50.0), WeightUnit::Kg, 5)).unwrap();
        assert_eq!(out, json!({"weight": 50.0, "unit": "kg", "reps": 5}));
        let out = serde_json::to_value(Set::bodyweight(12)).unwrap();
        assert_eq!(out, json!({"weight": null, "unit": "lb", "reps": 12}));
    }

    #[test]
    fn weight_in_pounds() {
        let set = Set::new(Some(50.0), WeightUnit::Kg, 5);
        assert!((set.weight_lb().unwrap() - 110.231).abs() < 1e-9);
        assert_eq!(Set::bodyweight(5).weight_lb(), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            format_set(&Set::new(Some(100.0), WeightUnit::Lb, 5), 0),
            "Set 1: 100 lb×5"
        );
        assert_eq!(format_set(&Set::bodyweight(12), 2), "Set 3: 12 reps");
        assert_eq!(summarize_sets(&[]), "No sets yet.");
    }
}
