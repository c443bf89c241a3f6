//! Core build orchestration
//!
//! Side effects go through [`crate::infra`]; this module decides what runs
//! and in which order.
//!
//! # Submodules
//!
//! - [`classify`] - Build output line classification
//! - [`context`] - Configuration and runners shared by every step
//! - [`project`] - The project interface and its default stages
//! - [`lifecycle`] - Stage sequencing and failure reporting
//! - [`driver`] - Target selection and execution
//! - [`steps`] - Reusable step objects
//! - [`targets`] - The concrete projects
//! - [`global_config`] - Configuration file support

pub mod classify;
pub mod context;
pub mod driver;
pub mod global_config;
pub mod lifecycle;
pub mod project;
pub mod steps;
pub mod targets;
