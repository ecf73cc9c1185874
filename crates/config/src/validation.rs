//! Validation system for configuration values
//!
//! Each config section implements the `ConfigSection` trait which includes validation.

pub use crate::error::ValidationError;

/// Trait for configuration sections that can validate themselves
///
/// New sections plug into load/save by implementing this trait and being
/// added as a field of [`crate::Config`].
pub trait ConfigSection: Default {
    /// Validates the configuration section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another config section into this one, `other` wins
    fn merge(&mut self, other: Self);

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a float is finite and within a range
    pub fn finite_in_range(
        value: f64,
        min: f64,
        max: f64,
        field: &str,
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::with_value(
                field,
                "must be a finite number",
                value,
            ));
        }
        Self::in_range(value, min, max, field)
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a list has at least one entry
    pub fn non_empty_list<T>(values: &[T], field: &str) -> Result<(), ValidationError> {
        if values.is_empty() {
            Err(ValidationError::new(field, "must contain at least one entry"))
        } else {
            Ok(())
        }
    }

    /// Validates that a list is strictly ascending
    pub fn strictly_ascending<T>(values: &[T], field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd,
    {
        if values.windows(2).all(|pair| pair[0] < pair[1]) {
            Ok(())
        } else {
            Err(ValidationError::new(field, "must be in strictly ascending order"))
        }
    }

    /// Validates that a value is one of the allowed options
    pub fn one_of<T>(value: &T, allowed: &[T], field: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + std::fmt::Display,
    {
        if !allowed.contains(value) {
            let allowed_str = allowed
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(ValidationError::with_value(
                field,
                format!("must be one of: {}", allowed_str),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range() {
        assert!(Validator::in_range(400, 100, 2000, "test").is_ok());
        assert!(Validator::in_range(99, 100, 2000, "test").is_err());
        assert!(Validator::in_range(2001, 100, 2000, "test").is_err());
    }

    #[test]
    fn test_finite_in_range_rejects_nan() {
        assert!(Validator::finite_in_range(0.5, 0.0, 1.0, "test").is_ok());
        assert!(Validator::finite_in_range(f64::NAN, 0.0, 1.0, "test").is_err());
        assert!(Validator::finite_in_range(f64::INFINITY, 0.0, 1.0, "test").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("info", "test").is_ok());
        assert!(Validator::not_empty("   ", "test").is_err());
    }

    #[test]
    fn test_lists() {
        assert!(Validator::non_empty_list::<u32>(&[], "test").is_err());
        assert!(Validator::strictly_ascending(&[0.5, 1.0, 2.0], "test").is_ok());
        assert!(Validator::strictly_ascending(&[5, 5, 10], "test").is_err());
    }

    #[test]
    fn test_one_of() {
        assert!(Validator::one_of(&"warn", &["error", "warn", "info"], "test").is_ok());
        let err = Validator::one_of(&"loud", &["error", "warn"], "test").unwrap_err();
        assert_eq!(err.value.as_deref(), Some("loud"));
    }

    #[test]
    fn test_collect_errors() {
        assert!(Validator::collect_errors(vec![Ok(()), Ok(())]).is_ok());
        let result = Validator::collect_errors(vec![
            Ok(()),
            Err(ValidationError::new("field1", "error1")),
            Err(ValidationError::new("field2", "error2")),
        ]);
        assert_eq!(result.unwrap_err().len(), 2);
    }
}
