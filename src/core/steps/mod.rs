//! Reusable pieces of project behaviour
//!
//! - [`repository`] - cloning and pulling one or more checkouts
//! - [`manifest`] - adding generated files to the rootfs manifest

pub mod manifest;
pub mod repository;
