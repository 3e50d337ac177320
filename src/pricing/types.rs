// Domain type definitions for the Pricing System
// Provides shared types used across condition evaluation and the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator used by condition leaves
///
/// Determines how a fact value is compared against the condition's
/// reference value. Ordering operators require numeric operands; the
/// presence operators inspect the fact itself and ignore the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// Fact value equals the reference value
    Equal,

    /// Fact value differs from the reference value
    NotEqual,

    /// Fact value is strictly greater than the reference (numeric)
    GreaterThan,

    /// Fact value is greater than or equal to the reference (numeric)
    GreaterThanOrEqual,

    /// Fact value is strictly less than the reference (numeric)
    LessThan,

    /// Fact value is less than or equal to the reference (numeric)
    LessThanOrEqual,

    /// Fact resolves to a present (non-absent) value
    IsPresent,

    /// Fact resolves to the absent sentinel
    IsAbsent,
}

impl ComparisonOperator {
    /// Whether this operator checks presence rather than comparing values
    pub fn is_presence_check(&self) -> bool {
        matches!(self, ComparisonOperator::IsPresent | ComparisonOperator::IsAbsent)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Equal => write!(f, "equal"),
            ComparisonOperator::NotEqual => write!(f, "not_equal"),
            ComparisonOperator::GreaterThan => write!(f, "greater_than"),
            ComparisonOperator::GreaterThanOrEqual => write!(f, "greater_than_or_equal"),
            ComparisonOperator::LessThan => write!(f, "less_than"),
            ComparisonOperator::LessThanOrEqual => write!(f, "less_than_or_equal"),
            ComparisonOperator::IsPresent => write!(f, "is_present"),
            ComparisonOperator::IsAbsent => write!(f, "is_absent"),
        }
    }
}

impl std::str::FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(ComparisonOperator::Equal),
            "not_equal" => Ok(ComparisonOperator::NotEqual),
            "greater_than" => Ok(ComparisonOperator::GreaterThan),
            "greater_than_or_equal" => Ok(ComparisonOperator::GreaterThanOrEqual),
            "less_than" => Ok(ComparisonOperator::LessThan),
            "less_than_or_equal" => Ok(ComparisonOperator::LessThanOrEqual),
            "is_present" => Ok(ComparisonOperator::IsPresent),
            "is_absent" => Ok(ComparisonOperator::IsAbsent),
            _ => Err(format!("Invalid comparison operator: {}", s)),
        }
    }
}
