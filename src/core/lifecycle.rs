//! Per-project stage sequencing
//!
//! A project always moves through the stages in the same order:
//! update, clean, ensure build directory, configure, compile, install.
//! Update, clean and configure can be switched off by configuration.
//! The first failing stage stops the project and the error records both the
//! failing stage and the last one that completed.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use crate::core::context::BuildContext;
use crate::core::project::Project;
use crate::error::{CheribuildError, Result};

/// Lifecycle position of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    Update,
    Clean,
    EnsureBuildDir,
    Configure,
    Compile,
    Install,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::Clean => "clean",
            Self::EnsureBuildDir => "ensure-build-dir",
            Self::Configure => "configure",
            Self::Compile => "compile",
            Self::Install => "install",
            Self::Done => "done",
        })
    }
}

/// Drives one project through its stages
pub struct Lifecycle<'a> {
    project: &'a dyn Project,
    last_completed: Stage,
}

impl<'a> Lifecycle<'a> {
    pub fn new(project: &'a dyn Project) -> Self {
        Self {
            project,
            last_completed: Stage::Start,
        }
    }

    pub fn last_completed(&self) -> Stage {
        self.last_completed
    }

    /// Run every enabled stage in order
    ///
    /// # Errors
    ///
    /// Returns [`CheribuildError::TargetFailed`] wrapping the first stage
    /// error.
    pub async fn run(&mut self, ctx: &BuildContext) -> Result<()> {
        let project = self.project;
        let config = ctx.config();

        if config.skip_update() {
            tracing::debug!("{}: skipping update", project.name());
        } else {
            self.stage(Stage::Update, project.update(ctx)).await?;
        }

        if config.clean() {
            self.stage(Stage::Clean, project.clean(ctx)).await?;
        }

        self.stage(Stage::EnsureBuildDir, async {
            match project.layout().build_dir() {
                Some(dir) if !dir.is_dir() => ctx.make_dirs(dir),
                _ => Ok(()),
            }
        })
        .await?;

        if config.skip_configure() {
            tracing::debug!("{}: skipping configure", project.name());
        } else {
            self.stage(Stage::Configure, project.configure(ctx)).await?;
        }

        self.stage(Stage::Compile, project.compile(ctx)).await?;
        self.stage(Stage::Install, project.install(ctx)).await?;
        self.last_completed = Stage::Done;
        Ok(())
    }

    async fn stage<F>(&mut self, stage: Stage, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        tracing::debug!(target_name = self.project.name(), %stage, "entering stage");
        work.await.map_err(|source| CheribuildError::TargetFailed {
            target: self.project.name().to_string(),
            stage,
            last_completed: self.last_completed,
            source: Box::new(source),
        })?;
        self.last_completed = stage;
        Ok(())
    }
}

/// Run `project` to completion and report how long it took
pub async fn process(project: &dyn Project, ctx: &BuildContext) -> Result<()> {
    let started = Instant::now();
    Lifecycle::new(project).run(ctx).await?;
    let elapsed = started.elapsed();
    tracing::info!(target_name = project.name(), ?elapsed, "target finished");
    println!(
        "Built target '{}' in {:.2} seconds",
        project.name(),
        elapsed.as_secs_f64()
    );
    Ok(())
}
