//! Structural and whitelist checks for candidate plans.
//!
//! Rules run in a fixed order and stop at the first violation:
//! list → object steps → non-empty `action` → whitelisted `action` →
//! object `payload` (when present).

use serde_json::Value;

use crate::core::actions::is_allowed;
use crate::core::types::{Plan, Step};
use crate::error::{DevmateError, Result};

/// Validate a raw JSON plan and convert it into a typed [`Plan`].
pub fn validate_plan(raw: &Value) -> Result<Plan> {
    let items = raw
        .as_array()
        .ok_or_else(|| invalid(format!("plan must be a list, got {}", kind(raw))))?;

    let mut steps = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        steps.push(validate_step(index, item)?);
    }
    Ok(Plan::new(steps))
}

fn validate_step(index: usize, item: &Value) -> Result<Step> {
    let object = item
        .as_object()
        .ok_or_else(|| invalid(format!("step {index} must be an object, got {}", kind(item))))?;

    let action = match object.get("action") {
        Some(Value::String(action)) if !action.is_empty() => action,
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err(invalid(format!("step {index} must include 'action'")));
        }
        Some(other) => {
            return Err(invalid(format!(
                "step {index} 'action' must be a string, got {}",
                kind(other)
            )));
        }
    };

    if !is_allowed(action) {
        return Err(invalid(format!(
            "step {index} action '{action}' is not allowed"
        )));
    }

    let payload = match object.get("payload") {
        None | Some(Value::Null) => Default::default(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(invalid(format!(
                "step {index} payload must be an object if provided, got {}",
                kind(other)
            )));
        }
    };

    Ok(Step {
        action: action.clone(),
        payload,
    })
}

fn invalid(reason: String) -> DevmateError {
    DevmateError::InvalidPlan(reason)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
