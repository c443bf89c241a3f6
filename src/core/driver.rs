//! Target selection and execution
//!
//! Requested names are validated as a whole before anything runs. The
//! selected projects always run in the master order, whatever order they
//! were requested in, and each one at most once.

use crate::config::{Config, ALL_TARGETS};
use crate::core::context::BuildContext;
use crate::core::lifecycle;
use crate::core::project::Project;
use crate::core::targets;
use crate::error::{Result, UserInputError};

/// Owns the projects in dependency order
pub struct Driver {
    projects: Vec<Box<dyn Project>>,
}

impl Driver {
    /// `projects` must already be in dependency order
    pub fn new(projects: Vec<Box<dyn Project>>) -> Self {
        Self { projects }
    }

    /// Driver over every real target
    pub fn for_config(config: &Config) -> Self {
        Self::new(targets::all_projects(config))
    }

    /// Target names in master order
    pub fn target_names(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.name()).collect()
    }

    /// Text printed by `--list-targets`
    pub fn describe_targets(&self) -> String {
        format!(
            "The following targets exist: {}\ntarget '{ALL_TARGETS}' can be used to build everything",
            self.target_names().join(", ")
        )
    }

    /// Resolve requested names into projects in master order
    ///
    /// # Errors
    ///
    /// Returns [`UserInputError::InvalidTargets`] naming every unknown
    /// name, in the order requested.
    pub fn select(&self, requested: &[String]) -> Result<Vec<&dyn Project>, UserInputError> {
        let valid = self.target_names();
        let mut invalid: Vec<String> = Vec::new();
        for name in requested {
            if name != ALL_TARGETS && !valid.contains(&name.as_str()) && !invalid.contains(name) {
                invalid.push(name.clone());
            }
        }
        if !invalid.is_empty() {
            return Err(UserInputError::InvalidTargets {
                invalid,
                valid: valid.iter().map(ToString::to_string).collect(),
            });
        }

        let everything = requested.iter().any(|name| name == ALL_TARGETS);
        Ok(self
            .projects
            .iter()
            .filter(|p| everything || requested.iter().any(|name| name == p.name()))
            .map(|p| &**p)
            .collect())
    }

    /// Run the selected projects one after another, stopping at the first
    /// failure
    pub async fn run(&self, ctx: &BuildContext, requested: &[String]) -> Result<()> {
        let selected = self.select(requested)?;
        tracing::info!(
            "Will execute the following targets: {}",
            selected
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(" ")
        );
        for project in selected {
            lifecycle::process(project, ctx).await?;
        }
        Ok(())
    }
}
