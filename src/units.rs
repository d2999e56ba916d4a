use serde::{Deserialize, Serialize};

/// Pounds in one kilogram.
pub const LB_PER_KG: f64 = 2.20462;

/// Unit a set's weight was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "lb")]
    Lb,
    #[serde(rename = "kg")]
    Kg,
}

pub const ALL_UNITS: [WeightUnit; 2] = [WeightUnit::Lb, WeightUnit::Kg];

impl WeightUnit {
    /// Multiplier converting a value in this unit to pounds.
    fn factor(self) -> f64 {
        match self {
            WeightUnit::Lb => 1.0,
            WeightUnit::Kg => LB_PER_KG,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::Kg => "kg",
        }
    }

    /// Parse a stored or user supplied unit name.
    ///
    /// Unrecognized names yield `None` so callers can pick their own default.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Lb),
            "kg" | "kgs" | "kilogram" | "kilograms" => Some(WeightUnit::Kg),
            _ => None,
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert `value` recorded in `unit` to pounds.
pub fn to_lb(value: f64, unit: WeightUnit) -> f64 {
    value * unit.factor()
}

/// Convert a value in pounds to `unit`.
pub fn from_lb(value: f64, unit: WeightUnit) -> f64 {
    value / unit.factor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kg_to_lb_and_back() {
        let lb = to_lb(100.0, WeightUnit::Kg);
        assert!((lb - 220.462).abs() < 1e-9);
        let kg = from_lb(lb, WeightUnit::Kg);
        assert!((kg - 100.0).abs() < 0.01);
    }

    #[test]
    fn pounds_are_unchanged() {
        assert_eq!(to_lb(135.0, WeightUnit::Lb), 135.0);
        assert_eq!(from_lb(135.0, WeightUnit::Lb), 135.0);
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(WeightUnit::parse("KG"), Some(WeightUnit::Kg));
        assert_eq!(WeightUnit::parse(" lbs "), Some(WeightUnit::Lb));
        assert_eq!(WeightUnit::parse("stone"), None);
    }

    #[test]
    fn serializes_as_short_names() {
        assert_eq!(serde_json::to_string(&WeightUnit::Kg).unwrap(), "\"kg\"");
        let unit: WeightUnit = serde_json::from_str("\"lb\"").unwrap();
        assert_eq!(unit, WeightUnit::Lb);
    }
}
