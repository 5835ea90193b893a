use std::fmt;

/// Rejection of a malformed option-chain row
///
/// Scoring skips rows that fail validation instead of aborting the
/// whole chain, so these carry enough detail to log the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NonPositive { field: &'static str },
    Negative { field: &'static str },
    NotFinite { field: &'static str },
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonPositive { field } => {
                write!(f, "{} must be positive", field)
            }
            ValidationError::Negative { field } => {
                write!(f, "{} must not be negative", field)
            }
            ValidationError::NotFinite { field } => {
                write!(f, "{} is not a finite number", field)
            }
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "{} is {} but must be within [{}, {}]", field, value, min, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_field_and_bounds() {
        let err = ValidationError::OutOfRange {
            field: "delta",
            value: 1.4,
            min: -1.0,
            max: 1.0,
        };
        let text = err.to_string();
        assert!(text.contains("delta"));
        assert!(text.contains("1.4"));
        assert!(text.contains("[-1, 1]"));
    }
}
