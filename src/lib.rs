//! cheribuild - build the CHERI toolchain, CheriBSD and a QEMU disk image
//!
//! Drives the external build tools for each component in dependency order,
//! echoing every command and condensing the output of the long CheriBSD
//! builds into a few status lines.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Projects, lifecycle and target selection
//! - [`infra`] - Infrastructure layer (processes, output multiplexing, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
