//! Side-effecting adapters: filesystem, git, GitHub, text generation, and
//! repository context. Only the executor and the agents call into here.

pub mod config;
pub mod context;
pub mod fs;
pub mod git;
pub mod github;
pub mod llm;
pub mod process;
pub mod prompt;
