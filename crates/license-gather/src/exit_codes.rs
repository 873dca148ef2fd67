//! Exit codes for the CLI

#![allow(dead_code)]

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// A dependency or license file is outside the allowed categories
pub const POLICY_VIOLATION: i32 = 3;

/// A license expression could not be parsed
pub const PARSE_ERROR: i32 = 4;
