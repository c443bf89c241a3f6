//! Test utilities
//!
//! Proptest generators plus a fake [`Project`] that records which stages ran.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{Config, ConfigOptions};
use crate::core::context::BuildContext;
use crate::core::project::{self, Project, ProjectLayout};
use crate::error::{ExternalToolError, Result};

pub mod generators {
    use proptest::prelude::*;

    /// Names of the real targets
    pub const TARGET_NAMES: [&str; 6] = ["binutils", "qemu", "llvm", "cheribsd", "disk-image", "run"];

    /// One known target name
    pub fn target_name() -> impl Strategy<Value = String> {
        proptest::sample::select(TARGET_NAMES.to_vec()).prop_map(str::to_string)
    }

    /// A target name that matches nothing
    pub fn unknown_target_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}"
            .prop_filter("must not be a real target", |s| {
                s != "all" && !TARGET_NAMES.contains(&s.as_str())
            })
    }

    /// A request of known names, possibly repeated, in any order
    pub fn target_request() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(target_name(), 1..10)
    }
}

/// Build a context rooted at `root` unless `options` names a source root
pub fn test_context(root: &Path, options: ConfigOptions) -> BuildContext {
    let options = ConfigOptions {
        source_root: options.source_root.or_else(|| Some(root.to_path_buf())),
        ..options
    };
    let config = Config::from_options(options).expect("test config");
    BuildContext::new(Arc::new(config))
}

/// A project whose stages only record that they ran
pub struct RecordingProject {
    name: String,
    layout: ProjectLayout,
    calls: Mutex<Vec<&'static str>>,
    fail_at: Option<&'static str>,
}

impl RecordingProject {
    /// Builds in `<root>/output/<name>-build`
    pub fn new(name: &str, root: &Path) -> Self {
        Self {
            name: name.to_string(),
            layout: ProjectLayout {
                source_dir: root.join(name),
                build_dir: Some(root.join("output").join(format!("{name}-build"))),
                install_dir: None,
            },
            calls: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    /// Make `stage` fail like a command exiting with status 1
    #[must_use]
    pub fn failing_at(mut self, stage: &'static str) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, stage: &'static str) -> Result<()> {
        self.calls.lock().expect("calls lock").push(stage);
        if self.fail_at == Some(stage) {
            return Err(ExternalToolError::Failed {
                command: format!("fake-{stage}"),
                code: 1,
                log: None,
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Project for RecordingProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    async fn update(&self, _ctx: &BuildContext) -> Result<()> {
        self.record("update")
    }

    async fn clean(&self, ctx: &BuildContext) -> Result<()> {
        self.record("clean")?;
        project::clean_build_dir(ctx, &self.layout).await
    }

    async fn configure(&self, _ctx: &BuildContext) -> Result<()> {
        self.record("configure")
    }

    async fn compile(&self, _ctx: &BuildContext) -> Result<()> {
        self.record("compile")
    }

    async fn install(&self, _ctx: &BuildContext) -> Result<()> {
        self.record("install")
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_target_name_generator(name in target_name()) {
            prop_assert!(TARGET_NAMES.contains(&name.as_str()));
        }

        #[test]
        fn test_unknown_target_name_generator(name in unknown_target_name()) {
            prop_assert!(!TARGET_NAMES.contains(&name.as_str()));
            prop_assert_ne!(name, "all");
        }
    }
}
