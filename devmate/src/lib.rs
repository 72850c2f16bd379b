//! Plan-then-execute developer agent.
//!
//! A natural-language intent is turned into a JSON plan by a text-generation
//! service, checked against a fixed action whitelist, and executed step by
//! step. The crate keeps a strict separation:
//!
//! - **[`core`]**: pure logic (plan types, action catalogue, validation,
//!   response parsing). No I/O.
//! - **[`io`]**: side-effecting adapters (filesystem, git, GitHub, text
//!   generation, repository context, configuration).
//! - **[`executor`]**: the only path from a plan step to a side effect.
//! - **[`agents`]** and **[`agent`]**: planning, code fixing, and the run loop
//!   with its review-comment autofix.

pub mod agent;
pub mod agents;
pub mod core;
pub mod error;
pub mod executor;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{DevmateError, Result};
