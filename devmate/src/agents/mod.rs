//! Text-generation-backed agents: plan creation and code fixing.
//!
//! Neither agent performs side effects on the repository; the planner only
//! reads candidate files through the context builder.

pub mod fixer;
pub mod planner;

pub use fixer::{CodeFix, CodeFixer};
pub use planner::Planner;
