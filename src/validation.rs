// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

fn country_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Z]{2}$").expect("valid country code pattern"))
}

/// Validates that a destination is an ISO 3166-1 alpha-2 code
/// (two uppercase ASCII letters)
pub fn validate_country_code(country: &str) -> Result<(), ValidationError> {
    if country_code_pattern().is_match(country) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_country_code"))
    }
}

/// Validates that a strategy code is non-empty and kebab-case friendly
pub fn validate_strategy_code(code: &str) -> Result<(), ValidationError> {
    let valid = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_strategy_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_accepts_iso_alpha2() {
        assert!(validate_country_code("UA").is_ok());
        assert!(validate_country_code("US").is_ok());
        assert!(validate_country_code("JP").is_ok());
    }

    #[test]
    fn test_country_code_rejects_malformed() {
        assert!(validate_country_code("ua").is_err());
        assert!(validate_country_code("USA").is_err());
        assert!(validate_country_code("U").is_err());
        assert!(validate_country_code("").is_err());
        assert!(validate_country_code("U1").is_err());
    }

    #[test]
    fn test_strategy_code_rules() {
        assert!(validate_strategy_code("default-pricing").is_ok());
        assert!(validate_strategy_code("promo2").is_ok());
        assert!(validate_strategy_code("").is_err());
        assert!(validate_strategy_code("Default").is_err());
        assert!(validate_strategy_code("has space").is_err());
    }
}
