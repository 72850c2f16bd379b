//! Deterministic, pure logic shared by the planner, runner, and executor.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod actions;
pub mod response;
pub mod types;
pub mod validator;
