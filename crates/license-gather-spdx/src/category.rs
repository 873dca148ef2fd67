//! ASF-style license categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a license for redistribution with an Apache-licensed
/// product.
///
/// Variants are declared best to worst, so the derived `Ord` is the
/// "worse-than" order: `A < B < X < Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LicenseCategory {
    /// Freely combinable (MIT, BSD, Apache-2.0, ...)
    A,
    /// Combinable in binary form only (weak copyleft: MPL, EPL, CDDL, ...)
    B,
    /// Not combinable (GPL, AGPL, ...)
    X,
    /// Not present in the policy table
    Unknown,
}

impl LicenseCategory {
    /// All categories, best first
    pub const ALL: [LicenseCategory; 4] = [Self::A, Self::B, Self::X, Self::Unknown];

    /// The more restrictive of two categories
    pub fn worse(self, other: Self) -> Self {
        self.max(other)
    }

    /// The more permissive of two categories
    pub fn better(self, other: Self) -> Self {
        self.min(other)
    }

    /// Whether the category comes from a policy table entry
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    /// Returns the string representation of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::X => "X",
            Self::Unknown => "Unknown",
        }
    }

    /// Short human description
    pub fn description(&self) -> &'static str {
        match self {
            Self::A => "may be included in source and binary form",
            Self::B => "may be included in binary form only",
            Self::X => "may not be included",
            Self::Unknown => "is not covered by the license policy",
        }
    }
}

impl fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "x" => Ok(Self::X),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown license category: {}", s)),
        }
    }
}
