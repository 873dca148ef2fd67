//! License Gather SPDX - License expressions and policy evaluation
//!
//! This crate models SPDX license expressions (`AND`, `OR`, `WITH`), parses
//! them from their textual form, and classifies them into ASF-style
//! categories using a configurable policy table.

pub mod category;
pub mod error;
pub mod expression;
pub mod interpreter;
pub mod parser;
pub mod policy;

pub use category::LicenseCategory;
pub use error::{ParseError, Result};
pub use expression::{LicenseExpression, SimpleLicense};
pub use interpreter::LicenseInterpreter;
pub use parser::parse_expression;
pub use policy::PolicyTable;
