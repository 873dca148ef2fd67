//! SPDX license expression model

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::parser::parse_expression;

/// A single license identifier, optionally qualified by an exception
/// (`<id> WITH <exception>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleLicense {
    /// SPDX license identifier (e.g., "Apache-2.0")
    pub id: String,
    /// SPDX exception identifier (e.g., "Classpath-exception-2.0")
    pub exception: Option<String>,
}

impl SimpleLicense {
    /// Create a license without exception
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exception: None,
        }
    }

    /// Qualify the license with an exception
    pub fn with(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}

impl fmt::Display for SimpleLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exception {
            Some(exception) => write!(f, "{} WITH {}", self.id, exception),
            None => write!(f, "{}", self.id),
        }
    }
}

/// An immutable SPDX license expression tree.
///
/// Nodes are built left-associatively in construction order and are never
/// simplified: `a.and(b).and(c)` is `And(And(a, b), c)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LicenseExpression {
    /// A single license, possibly with an exception
    Simple(SimpleLicense),
    /// Both sides apply
    And(Box<LicenseExpression>, Box<LicenseExpression>),
    /// The consumer may pick either side
    Or(Box<LicenseExpression>, Box<LicenseExpression>),
}

impl LicenseExpression {
    /// A single license
    pub fn license(id: impl Into<String>) -> Self {
        Self::Simple(SimpleLicense::new(id))
    }

    /// A single license qualified by an exception
    pub fn with_exception(id: impl Into<String>, exception: impl Into<String>) -> Self {
        Self::Simple(SimpleLicense::new(id).with(exception))
    }

    /// Conjunction of `self` and `other`
    pub fn and(self, other: impl Into<LicenseExpression>) -> Self {
        Self::And(Box::new(self), Box::new(other.into()))
    }

    /// Disjunction of `self` and `other`
    pub fn or(self, other: impl Into<LicenseExpression>) -> Self {
        Self::Or(Box::new(self), Box::new(other.into()))
    }

    /// Leaves of the tree, left to right
    pub fn licenses(&self) -> Vec<&SimpleLicense> {
        let mut out = Vec::new();
        self.collect_licenses(&mut out);
        out
    }

    fn collect_licenses<'a>(&'a self, out: &mut Vec<&'a SimpleLicense>) {
        match self {
            Self::Simple(license) => out.push(license),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_licenses(out);
                right.collect_licenses(out);
            }
        }
    }

    /// Binding strength used when rendering; higher binds tighter
    fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 1,
            Self::And(..) => 2,
            Self::Simple(_) => 3,
        }
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        parent: u8,
        right_side: bool,
    ) -> fmt::Result {
        // Operators are left-associative, so an equal-precedence right
        // operand needs parentheses to keep its shape.
        let own = self.precedence();
        if own < parent || (right_side && own == parent) {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl From<SimpleLicense> for LicenseExpression {
    fn from(license: SimpleLicense) -> Self {
        Self::Simple(license)
    }
}

impl BitAnd for LicenseExpression {
    type Output = LicenseExpression;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for LicenseExpression {
    type Output = LicenseExpression;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let own = self.precedence();
        match self {
            Self::Simple(license) => write!(f, "{}", license),
            Self::And(left, right) => {
                left.fmt_operand(f, own, false)?;
                write!(f, " AND ")?;
                right.fmt_operand(f, own, true)
            }
            Self::Or(left, right) => {
                left.fmt_operand(f, own, false)?;
                write!(f, " OR ")?;
                right.fmt_operand(f, own, true)
            }
        }
    }
}

impl FromStr for LicenseExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expression(s)
    }
}

impl Serialize for LicenseExpression {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LicenseExpression {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_expression(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_is_left_associative() {
        let expr = LicenseExpression::license("MIT")
            .and(LicenseExpression::license("BSD-3-Clause"))
            .and(LicenseExpression::license("ISC"));

        let expected = LicenseExpression::And(
            Box::new(LicenseExpression::And(
                Box::new(LicenseExpression::license("MIT")),
                Box::new(LicenseExpression::license("BSD-3-Clause")),
            )),
            Box::new(LicenseExpression::license("ISC")),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_operators_match_methods() {
        let a = LicenseExpression::license("MIT");
        let b = LicenseExpression::license("Apache-2.0");
        assert_eq!(a.clone() & b.clone(), a.clone().and(b.clone()));
        assert_eq!(a.clone() | b.clone(), a.or(b));
    }

    #[test]
    fn test_no_simplification() {
        let mit = LicenseExpression::license("MIT");
        let expr = mit.clone().and(mit.clone());
        assert_ne!(expr, mit);
        assert_eq!(expr.licenses().len(), 2);
    }

    #[test]
    fn test_display_simple_and_exception() {
        assert_eq!(LicenseExpression::license("MIT").to_string(), "MIT");
        assert_eq!(
            LicenseExpression::with_exception("GPL-2.0-or-later", "Classpath-exception-2.0")
                .to_string(),
            "GPL-2.0-or-later WITH Classpath-exception-2.0"
        );
    }

    #[test]
    fn test_display_parenthesizes_only_when_needed() {
        let mit = LicenseExpression::license("MIT");
        let apache = LicenseExpression::license("Apache-2.0");
        let gpl = LicenseExpression::license("GPL-3.0-only");

        let and_of_or = mit.clone().and(apache.clone().or(gpl.clone()));
        assert_eq!(and_of_or.to_string(), "MIT AND (Apache-2.0 OR GPL-3.0-only)");

        let or_of_and = mit.clone().or(apache.clone().and(gpl.clone()));
        assert_eq!(or_of_and.to_string(), "MIT OR Apache-2.0 AND GPL-3.0-only");

        let chained = mit.clone().and(apache.clone()).and(gpl.clone());
        assert_eq!(chained.to_string(), "MIT AND Apache-2.0 AND GPL-3.0-only");

        let right_nested = mit.and(apache.and(gpl));
        assert_eq!(right_nested.to_string(), "MIT AND (Apache-2.0 AND GPL-3.0-only)");
    }

    #[test]
    fn test_display_parses_back_to_same_tree() {
        let expr = LicenseExpression::license("MIT")
            .or(LicenseExpression::with_exception("GPL-2.0-only", "Classpath-exception-2.0"))
            .and(LicenseExpression::license("BSD-2-Clause").or(LicenseExpression::license("ISC")));
        let reparsed: LicenseExpression = expr.to_string().parse().unwrap();
        assert_eq!(reparsed, expr);
    }

    #[test]
    fn test_licenses_in_order() {
        let expr: LicenseExpression = "MIT OR (Apache-2.0 AND ISC)".parse().unwrap();
        let ids: Vec<&str> = expr.licenses().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["MIT", "Apache-2.0", "ISC"]);
    }

    #[test]
    fn test_serde_as_string() {
        let expr: LicenseExpression = "MIT OR Apache-2.0".parse().unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"MIT OR Apache-2.0\"");
        let back: LicenseExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
        assert!(serde_json::from_str::<LicenseExpression>("\"MIT AND\"").is_err());
    }
}
