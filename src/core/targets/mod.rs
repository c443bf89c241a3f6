//! The concrete projects
//!
//! Each target is a plain value built from the [`Config`]; nothing is
//! touched on disk until the lifecycle runs it.

pub mod binutils;
pub mod cheribsd;
pub mod disk_image;
pub mod llvm;
pub mod qemu;
pub mod run_qemu;

use crate::config::Config;
use crate::core::project::Project;

/// Every target in dependency order
pub fn all_projects(config: &Config) -> Vec<Box<dyn Project>> {
    vec![
        Box::new(binutils::Binutils::new(config)),
        Box::new(qemu::Qemu::new(config)),
        Box::new(llvm::Llvm::new(config)),
        Box::new(cheribsd::CheriBsd::new(config)),
        Box::new(disk_image::DiskImage::new(config)),
        Box::new(run_qemu::RunQemu::new(config)),
    ]
}
