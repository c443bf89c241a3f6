//! Infrastructure layer
//!
//! Handles all side effects: processes, terminal, filesystem and prompts.

pub mod dirs;
pub mod filesystem;
pub mod git;
pub mod multiplexer;
pub mod process;
pub mod prompt;
pub mod toolchain;
