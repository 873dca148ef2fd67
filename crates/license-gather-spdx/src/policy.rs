//! License policy tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::LicenseCategory;

/// Per-license base categories and per-exception adjustments.
///
/// Identifiers are matched ASCII case-insensitively, as SPDX identifiers are.
/// An exception entry names the category the exception can lift a license to;
/// it never makes a license more restrictive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    /// License identifier -> base category
    pub licenses: BTreeMap<String, LicenseCategory>,
    /// Exception identifier -> best category reachable with the exception
    pub exceptions: BTreeMap<String, LicenseCategory>,
}

/// Built-in category A licenses
const CATEGORY_A: &[&str] = &[
    "0BSD",
    "AFL-3.0",
    "Apache-1.1",
    "Apache-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSL-1.0",
    "CC0-1.0",
    "EDL-1.0",
    "ISC",
    "MIT",
    "MIT-0",
    "MS-PL",
    "PostgreSQL",
    "Python-2.0",
    "Unicode-3.0",
    "Unicode-DFS-2016",
    "Unlicense",
    "UPL-1.0",
    "W3C",
    "X11",
    "Zlib",
];

/// Built-in category B licenses
const CATEGORY_B: &[&str] = &[
    "CC-BY-4.0",
    "CDDL-1.0",
    "CDDL-1.1",
    "CPL-1.0",
    "EPL-1.0",
    "EPL-2.0",
    "IPL-1.0",
    "MPL-1.1",
    "MPL-2.0",
    "OFL-1.1",
];

/// Built-in category X licenses
const CATEGORY_X: &[&str] = &[
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "BUSL-1.1",
    "CC-BY-NC-4.0",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "SSPL-1.0",
];

/// Built-in exceptions that make a copyleft license combinable
const EXCEPTIONS_A: &[&str] = &[
    "Classpath-exception-2.0",
    "LLVM-exception",
    "Universal-FOSS-exception-1.0",
];

fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

impl PolicyTable {
    /// Empty table: every license is `Unknown`
    pub fn new() -> Self {
        Self::default()
    }

    /// ASF third-party license policy defaults
    pub fn asf() -> Self {
        let mut table = Self::new();
        for (ids, category) in [
            (CATEGORY_A, LicenseCategory::A),
            (CATEGORY_B, LicenseCategory::B),
            (CATEGORY_X, LicenseCategory::X),
        ] {
            for id in ids {
                table.licenses.insert((*id).to_string(), category);
            }
        }
        for id in EXCEPTIONS_A {
            table
                .exceptions
                .insert((*id).to_string(), LicenseCategory::A);
        }
        table
    }

    /// Add or replace a license entry
    pub fn with_license(mut self, id: impl Into<String>, category: LicenseCategory) -> Self {
        self.set_license(id, category);
        self
    }

    /// Add or replace an exception entry
    pub fn with_exception(mut self, id: impl Into<String>, category: LicenseCategory) -> Self {
        self.set_exception(id, category);
        self
    }

    /// Add or replace a license entry, matching existing keys case-insensitively
    pub fn set_license(&mut self, id: impl Into<String>, category: LicenseCategory) {
        let id = id.into();
        self.licenses.retain(|k, _| normalize(k) != normalize(&id));
        self.licenses.insert(id, category);
    }

    /// Add or replace an exception entry, matching existing keys case-insensitively
    pub fn set_exception(&mut self, id: impl Into<String>, category: LicenseCategory) {
        let id = id.into();
        self.exceptions.retain(|k, _| normalize(k) != normalize(&id));
        self.exceptions.insert(id, category);
    }

    /// Layer `other` on top of this table; entries in `other` win
    pub fn merge(&mut self, other: &PolicyTable) {
        for (id, category) in &other.licenses {
            self.set_license(id.clone(), *category);
        }
        for (id, category) in &other.exceptions {
            self.set_exception(id.clone(), *category);
        }
    }

    /// Base category of a license, `None` when not in the table
    pub fn license_category(&self, id: &str) -> Option<LicenseCategory> {
        let key = normalize(id);
        self.licenses
            .iter()
            .find(|(k, _)| normalize(k) == key)
            .map(|(_, c)| *c)
    }

    /// Category an exception lifts a license to, `None` when not in the table
    pub fn exception_category(&self, id: &str) -> Option<LicenseCategory> {
        let key = normalize(id);
        self.exceptions
            .iter()
            .find(|(k, _)| normalize(k) == key)
            .map(|(_, c)| *c)
    }

    /// Number of license entries
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    /// Whether the table has no license entries
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asf_defaults() {
        let table = PolicyTable::asf();
        assert_eq!(table.license_category("MIT"), Some(LicenseCategory::A));
        assert_eq!(table.license_category("MPL-2.0"), Some(LicenseCategory::B));
        assert_eq!(
            table.license_category("GPL-3.0-only"),
            Some(LicenseCategory::X)
        );
        assert_eq!(
            table.exception_category("Classpath-exception-2.0"),
            Some(LicenseCategory::A)
        );
        assert_eq!(table.license_category("WTFPL"), None);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = PolicyTable::asf();
        assert_eq!(table.license_category("apache-2.0"), Some(LicenseCategory::A));
        assert_eq!(
            table.exception_category("CLASSPATH-EXCEPTION-2.0"),
            Some(LicenseCategory::A)
        );
    }

    #[test]
    fn test_set_license_replaces_case_variant() {
        let mut table = PolicyTable::new().with_license("MIT", LicenseCategory::A);
        table.set_license("mit", LicenseCategory::X);
        assert_eq!(table.len(), 1);
        assert_eq!(table.license_category("MIT"), Some(LicenseCategory::X));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = PolicyTable::asf();
        let overrides = PolicyTable::new()
            .with_license("LGPL-2.1-only", LicenseCategory::B)
            .with_license("LicenseRef-Internal", LicenseCategory::A)
            .with_exception("GCC-exception-3.1", LicenseCategory::B);
        base.merge(&overrides);

        assert_eq!(
            base.license_category("LGPL-2.1-only"),
            Some(LicenseCategory::B)
        );
        assert_eq!(
            base.license_category("LicenseRef-Internal"),
            Some(LicenseCategory::A)
        );
        assert_eq!(
            base.exception_category("GCC-exception-3.1"),
            Some(LicenseCategory::B)
        );
        assert_eq!(base.license_category("MIT"), Some(LicenseCategory::A));
    }

    #[test]
    fn test_empty_table() {
        let table = PolicyTable::new();
        assert!(table.is_empty());
        assert_eq!(table.license_category("MIT"), None);
    }
}
