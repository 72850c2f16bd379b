//! Shared deterministic types for plans and run results.
//!
//! These types define stable contracts between the planner, the plan runner,
//! and the executor. They carry no I/O and serialize to the same JSON shapes
//! the text-generation service is asked to produce.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Step payload: string keys to arbitrary JSON values. Absent means empty.
pub type Payload = Map<String, Value>;

/// One `{action, payload}` unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub payload: Payload,
}

impl Step {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_payload(action: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        Self {
            action: action.into(),
            payload,
        }
    }
}

/// Ordered, validated list of steps. Transient: built per intent, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

/// Result of executing one planned step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub action: String,
    pub result: Value,
}

/// Ordered results mirroring plan order, one entry per planned step.
pub type RunResult = Vec<RunEntry>;

/// A pull-request review comment. Every field tolerates absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewComment {
    pub id: Option<u64>,
    pub path: Option<String>,
    pub body: Option<String>,
    pub line: Option<u64>,
}

impl ReviewComment {
    /// Path and body, when both are present and non-empty.
    pub fn actionable(&self) -> Option<(&str, &str)> {
        let path = self.path.as_deref().filter(|p| !p.is_empty())?;
        let body = self.body.as_deref().filter(|b| !b.is_empty())?;
        Some((path, body))
    }
}
