//! Stable exit codes for devmate CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Planning, validation, execution, or a collaborator failed.
pub const FAILED: i32 = 1;
/// Configuration file or credentials are missing or invalid.
pub const CONFIG: i32 = 2;
