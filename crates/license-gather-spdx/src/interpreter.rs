//! License policy interpreter
//!
//! Classifies a [`LicenseExpression`] against a [`PolicyTable`]:
//!
//! - a single license takes its table category (`Unknown` when absent), and a
//!   known exception can lift a known license to the exception's category
//! - `AND` takes the worse side, since every clause applies
//! - `OR` takes the better side, since the consumer may choose

use tracing::{debug, instrument};

use crate::category::LicenseCategory;
use crate::error::Result;
use crate::expression::{LicenseExpression, SimpleLicense};
use crate::parser::parse_expression;
use crate::policy::PolicyTable;

/// Evaluates license expressions under a policy table
#[derive(Debug, Clone)]
pub struct LicenseInterpreter {
    policy: PolicyTable,
}

impl LicenseInterpreter {
    /// Create an interpreter for the given policy
    pub fn new(policy: PolicyTable) -> Self {
        Self { policy }
    }

    /// Interpreter using the built-in ASF policy
    pub fn asf() -> Self {
        Self::new(PolicyTable::asf())
    }

    /// The policy this interpreter evaluates against
    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Category of an expression.
    ///
    /// Walks the tree with an explicit stack, so arbitrarily long `AND`/`OR`
    /// chains built in code evaluate without deep recursion.
    pub fn evaluate(&self, expression: &LicenseExpression) -> LicenseCategory {
        let mut pending = vec![Step::Visit(expression)];
        let mut values: Vec<LicenseCategory> = Vec::new();

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(LicenseExpression::Simple(license)) => {
                    values.push(self.evaluate_license(license));
                }
                Step::Visit(LicenseExpression::And(left, right)) => {
                    pending.extend([Step::And, Step::Visit(right), Step::Visit(left)]);
                }
                Step::Visit(LicenseExpression::Or(left, right)) => {
                    pending.extend([Step::Or, Step::Visit(right), Step::Visit(left)]);
                }
                Step::And | Step::Or => {
                    // Operands are evaluated before their combining step
                    let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
                        return LicenseCategory::Unknown;
                    };
                    values.push(match step {
                        Step::And => left.worse(right),
                        _ => left.better(right),
                    });
                }
            }
        }

        values.pop().unwrap_or(LicenseCategory::Unknown)
    }

    /// Parse and evaluate an expression
    #[instrument(skip(self))]
    pub fn evaluate_str(&self, expression: &str) -> Result<LicenseCategory> {
        let parsed = parse_expression(expression)?;
        let category = self.evaluate(&parsed);
        debug!(%category, "evaluated license expression");
        Ok(category)
    }

    fn evaluate_license(&self, license: &SimpleLicense) -> LicenseCategory {
        let base = self
            .policy
            .license_category(&license.id)
            .unwrap_or(LicenseCategory::Unknown);

        let Some(exception) = &license.exception else {
            return base;
        };
        if !base.is_known() {
            return base;
        }

        match self.policy.exception_category(exception) {
            Some(lifted) => base.better(lifted),
            None => base,
        }
    }
}

/// Work item of the evaluation stack
enum Step<'a> {
    Visit(&'a LicenseExpression),
    And,
    Or,
}

impl Default for LicenseInterpreter {
    fn default() -> Self {
        Self::asf()
    }
}
