//! Closed catalogue of actions a plan may use.
//!
//! The validator whitelists exactly these names and the planning prompt
//! renders its action catalogue from the same table.

use serde::Serialize;

pub const NOOP: &str = "noop";
pub const PRINT: &str = "print";
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const LIST_FILES: &str = "list_files";
pub const GIT_STATUS: &str = "git_status";
pub const GIT_DIFF: &str = "git_diff";
pub const GIT_COMMIT: &str = "git_commit";
pub const GITHUB_LIST_PRS: &str = "github_list_prs";
pub const GITHUB_GET_PR: &str = "github_get_pr";
pub const GITHUB_GET_PR_COMMENTS: &str = "github_get_pr_comments";
pub const GITHUB_LIST_REVIEW_COMMENTS: &str = "github_list_review_comments";

/// Catalogue entry: action name plus the payload shape shown to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionSpec {
    pub name: &'static str,
    /// Payload example rendered into the planning prompt; empty for none.
    pub payload_hint: &'static str,
}

pub const CATALOGUE: [ActionSpec; 12] = [
    ActionSpec {
        name: NOOP,
        payload_hint: "",
    },
    ActionSpec {
        name: PRINT,
        payload_hint: r#"{ "message": "<text>" }"#,
    },
    ActionSpec {
        name: READ_FILE,
        payload_hint: r#"{ "path": "<file path>" }"#,
    },
    ActionSpec {
        name: WRITE_FILE,
        payload_hint: r#"{ "path": "<file path>", "content": "<new content>" }"#,
    },
    ActionSpec {
        name: LIST_FILES,
        payload_hint: r#"{ "path": "<directory path>" }"#,
    },
    ActionSpec {
        name: GIT_STATUS,
        payload_hint: "",
    },
    ActionSpec {
        name: GIT_DIFF,
        payload_hint: "",
    },
    ActionSpec {
        name: GIT_COMMIT,
        payload_hint: r#"{ "message": "<commit message>" }"#,
    },
    ActionSpec {
        name: GITHUB_LIST_PRS,
        payload_hint: r#"{ "repo": "<owner/repo>" }"#,
    },
    ActionSpec {
        name: GITHUB_GET_PR,
        payload_hint: r#"{ "repo": "<owner/repo>", "pr": <number> }"#,
    },
    ActionSpec {
        name: GITHUB_GET_PR_COMMENTS,
        payload_hint: r#"{ "repo": "<owner/repo>", "pr": <number> }"#,
    },
    ActionSpec {
        name: GITHUB_LIST_REVIEW_COMMENTS,
        payload_hint: r#"{ "repo": "<owner/repo>", "pr_number": <number> }"#,
    },
];

/// True when `name` is in the fixed whitelist.
pub fn is_allowed(name: &str) -> bool {
    CATALOGUE.iter().any(|entry| entry.name == name)
}

/// Whitelisted action names in catalogue order.
pub fn allowed_names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|entry| entry.name)
}
