use serde::{Deserialize, Serialize};

/// Direction of a summarised abnormal return. Used only to pick a display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    NonNegative,
    Negative,
}

impl Sign {
    /// Classifies a finite value. Zero counts as non-negative.
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Sign::Negative
        } else {
            Sign::NonNegative
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Sign::Negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_non_negative() {
        assert_eq!(Sign::of(0.0), Sign::NonNegative);
        assert_eq!(Sign::of(-0.0), Sign::NonNegative);
        assert_eq!(Sign::of(-1e-9), Sign::Negative);
        assert!(Sign::of(-2.5).is_negative());
    }
}
