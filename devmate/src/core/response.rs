//! Parsing of raw text-generation responses into JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{DevmateError, Result};

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```$").expect("fence regex is valid")
});

/// Strip a single surrounding Markdown code fence, if any.
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match FENCED_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a planning response as JSON. Structure is checked later by the validator.
pub fn parse_plan_response(raw: &str) -> Result<Value> {
    let body = unfence(raw);
    serde_json::from_str(body)
        .map_err(|err| DevmateError::PlanningFailed(format!("response is not valid JSON: {err}")))
}

/// Parse a file-selection response. Anything other than a JSON list yields `None`;
/// non-string entries are dropped.
pub fn parse_file_selection(raw: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(unfence(raw)).ok()?;
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}
