//! CHERI LLVM and clang, built with cmake and ninja

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::{urls, Config};
use crate::core::context::BuildContext;
use crate::core::project::{BuildTool, Project, ProjectLayout};
use crate::core::steps::repository::GitRepository;
use crate::error::{EnvironmentError, Result};
use crate::infra::process::{echo_command, shell_quote, CommandLine};
use crate::infra::{filesystem, toolchain};

/// Builtin headers that clash with the CheriBSD libc headers, relative to
/// the install prefix
const INCOMPATIBLE_HEADER_PATTERN: &str = r"^lib/clang/3\.[^/]*/include/(std[^/]*|limits\.h)$";

pub struct Llvm {
    layout: ProjectLayout,
    repositories: Vec<GitRepository>,
    sysroot: PathBuf,
    c_compiler: String,
    cxx_compiler: String,
}

impl Llvm {
    pub const NAME: &'static str = "llvm";

    pub fn new(config: &Config) -> Self {
        let layout =
            ProjectLayout::out_of_tree(config, Self::NAME).with_install_dir(config.host_tools_dir());
        let source_dir = layout.source_dir.clone();
        let repositories = vec![
            GitRepository::new(urls::LLVM_REPO, source_dir.clone()),
            GitRepository::new(urls::CLANG_REPO, source_dir.join("tools/clang")),
            GitRepository::new(urls::LLDB_REPO, source_dir.join("tools/lldb")),
        ];
        // the cheribsd object tree mirrors the absolute source path
        let sysroot = config
            .cheribsd_obj()
            .join(format!("mips.mips64{}", config.cheribsd_sources().display()))
            .join("tmp");
        Self {
            layout,
            repositories,
            sysroot,
            // needs at least clang 3.7
            c_compiler: toolchain::preferred_program(&["clang37"], "clang"),
            cxx_compiler: toolchain::preferred_program(&["clang++37"], "clang++"),
        }
    }

    /// Default sysroot baked into the compiler
    pub fn sysroot(&self) -> &Path {
        &self.sysroot
    }
}

/// Builtin headers under `install_dir` that must not shadow the guest's own
pub fn incompatible_headers(install_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern =
        Regex::new(INCOMPATIBLE_HEADER_PATTERN).map_err(|e| EnvironmentError::InvalidPattern {
            pattern: INCOMPATIBLE_HEADER_PATTERN.to_string(),
            error: e.to_string(),
        })?;
    let headers = WalkDir::new(install_dir.join("lib/clang"))
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.strip_prefix(install_dir)
                .ok()
                .and_then(Path::to_str)
                .is_some_and(|relative| pattern.is_match(relative))
        })
        .collect();
    Ok(headers)
}

#[async_trait]
impl Project for Llvm {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn repositories(&self) -> &[GitRepository] {
        &self.repositories
    }

    fn build_tool(&self) -> BuildTool {
        BuildTool::Ninja
    }

    fn configure_command(&self) -> Option<CommandLine> {
        let prefix = self.layout.install_dir()?;
        Some(
            CommandLine::new("cmake")
                .path_arg(&self.layout.source_dir)
                .args(["-G", "Ninja", "-DCMAKE_BUILD_TYPE=Release"])
                .arg(format!("-DCMAKE_CXX_COMPILER={}", self.cxx_compiler))
                .arg(format!("-DCMAKE_C_COMPILER={}", self.c_compiler))
                .arg("-DLLVM_DEFAULT_TARGET_TRIPLE=cheri-unknown-freebsd")
                .arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()))
                .arg(format!("-DDEFAULT_SYSROOT={}", self.sysroot.display()))
                .arg("-DLLVM_TOOL_LLDB_BUILD=OFF"),
        )
    }

    /// `ninja install`, then drop the builtin headers CheriBSD provides itself
    async fn install(&self, ctx: &BuildContext) -> Result<()> {
        let (Some(build_dir), Some(install_dir)) =
            (self.layout.build_dir(), self.layout.install_dir())
        else {
            return Ok(());
        };
        let command = self.build_tool().command().arg("install").current_dir(build_dir);
        ctx.shell().run(&command).await?;

        let headers = incompatible_headers(install_dir)?;
        if headers.is_empty() {
            return ctx.fatal_error(EnvironmentError::MissingArtifact {
                what: "Incompatible builtin includes (build system changed?)".to_string(),
                path: install_dir.join("lib/clang"),
            });
        }
        for header in &headers {
            echo_command(
                &format!("rm {}", shell_quote(&header.display().to_string())),
                None,
            );
            if !ctx.config().pretend() {
                filesystem::remove_file(header)?;
            }
        }
        Ok(())
    }
}
