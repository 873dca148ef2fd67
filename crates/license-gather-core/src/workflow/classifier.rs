//! License text classification batch handler

use std::sync::LazyLock;

use async_trait::async_trait;
use license_gather_batch::{BatchHandler, BatchRequest};
use license_gather_spdx::{parse_expression, LicenseExpression};
use regex::Regex;
use tracing::{debug, trace};

use crate::error::CheckError;

/// Regex for `SPDX-License-Identifier:` tags, ignoring trailing comment closers
static SPDX_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)SPDX-License-Identifier:\s*(?P<expr>.+?)\s*(?:\*/|-->)?\s*$")
        .expect("Invalid regex")
});

/// Well-known license headings and phrases, most specific first
static TITLE_RULES: LazyLock<Vec<TitleRule>> = LazyLock::new(|| {
    [
        (r"GNU AFFERO GENERAL PUBLIC LICENSE\s+Version 3", "AGPL-3.0-only"),
        (r"GNU LESSER GENERAL PUBLIC LICENSE\s+Version 2\.1", "LGPL-2.1-only"),
        (r"GNU LESSER GENERAL PUBLIC LICENSE\s+Version 3", "LGPL-3.0-only"),
        (r"GNU GENERAL PUBLIC LICENSE\s+Version 3", "GPL-3.0-only"),
        (r"GNU GENERAL PUBLIC LICENSE\s+Version 2", "GPL-2.0-only"),
        (r"Apache License,?\s+Version 2\.0", "Apache-2.0"),
        (r"Mozilla Public License,?\s+(?:Version|v\.)\s*2\.0", "MPL-2.0"),
        (r"Eclipse Public License\s*-?\s*v(?:ersion)?\s*2\.0", "EPL-2.0"),
        (r"Eclipse Public License\s*-?\s*v(?:ersion)?\s*1\.0", "EPL-1.0"),
        (r"COMMON DEVELOPMENT AND DISTRIBUTION LICENSE \(CDDL\)\s+Version 1\.1", "CDDL-1.1"),
        (r"COMMON DEVELOPMENT AND DISTRIBUTION LICENSE \(CDDL\)\s+Version 1\.0", "CDDL-1.0"),
        (r"Boost Software License\s*-\s*Version 1\.0", "BSL-1.0"),
        (r"CC0 1\.0 Universal", "CC0-1.0"),
        (r"This is free and unencumbered software released into the public domain", "Unlicense"),
        (
            r"Permission to use, copy, modify, and(?:/or)? distribute this software for any\s+purpose with or without fee is hereby granted",
            "ISC",
        ),
        (
            r"Redistribution and use in source and binary forms(?s:.)*Neither the name",
            "BSD-3-Clause",
        ),
        (r"Redistribution and use in source and binary forms", "BSD-2-Clause"),
        (r"Permission is hereby granted, free of charge, to any person obtaining", "MIT"),
        (r"This software is provided 'as-is', without any express or implied", "Zlib"),
    ]
    .into_iter()
    .map(|(pattern, id)| TitleRule {
        pattern: Regex::new(&format!("(?i){}", pattern)).expect("Invalid regex"),
        expression: LicenseExpression::license(id),
    })
    .collect()
});

/// A text pattern that identifies one license
#[derive(Debug, Clone)]
struct TitleRule {
    pattern: Regex,
    expression: LicenseExpression,
}

/// Batch handler that identifies the license of raw license texts.
///
/// An explicit `SPDX-License-Identifier:` tag wins; otherwise the text is
/// matched against well-known license headings. Texts that match nothing
/// fail their own request with [`CheckError::Unclassified`].
#[derive(Debug, Clone)]
pub struct LicenseTextClassifier {
    rules: Vec<TitleRule>,
}

impl LicenseTextClassifier {
    /// Create a classifier with the built-in rules
    pub fn new() -> Self {
        Self {
            rules: TITLE_RULES.clone(),
        }
    }

    /// Add a custom rule, checked before the built-in ones
    pub fn with_rule(mut self, pattern: Regex, expression: LicenseExpression) -> Self {
        self.rules.insert(0, TitleRule {
            pattern,
            expression,
        });
        self
    }

    /// Identify the license of a text
    pub fn classify(&self, text: &str) -> Option<LicenseExpression> {
        for captures in SPDX_TAG_REGEX.captures_iter(text) {
            let tagged = &captures["expr"];
            match parse_expression(tagged) {
                Ok(expression) => return Some(expression),
                Err(e) => trace!(tag = tagged, error = %e, "ignoring malformed SPDX tag"),
            }
        }

        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| rule.expression.clone())
    }
}

impl Default for LicenseTextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchHandler<String, LicenseExpression> for LicenseTextClassifier {
    async fn handle(
        &self,
        batch: Vec<BatchRequest<String, LicenseExpression>>,
    ) -> anyhow::Result<()> {
        debug!(size = batch.len(), "classifying license texts");
        for request in &batch {
            match self.classify(request.input()) {
                Some(expression) => request.complete(expression)?,
                None => request.fail(CheckError::Unclassified)?,
            }
        }
        Ok(())
    }
}
