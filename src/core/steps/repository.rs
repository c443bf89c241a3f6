//! Keeping source checkouts up to date

use std::path::{Path, PathBuf};

use crate::core::context::BuildContext;
use crate::error::{Result, UserInputError};
use crate::infra::{git, prompt};

/// A remote repository and the directory it is checked out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    url: String,
    path: PathBuf,
}

impl GitRepository {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the repository if it is missing, then `git pull --rebase`
    ///
    /// Cloning needs the user's consent unless running in pretend mode.
    pub async fn sync(&self, ctx: &BuildContext) -> Result<()> {
        if !git::is_repository(&self.path) {
            if !ctx.config().pretend() {
                self.confirm_clone()?;
            }
            ctx.shell().run(&git::clone(&self.url, &self.path)).await?;
        }
        ctx.shell().run(&git::pull_rebase(&self.path)).await
    }

    fn confirm_clone(&self) -> Result<(), UserInputError> {
        let question = format!(
            "{} is not a git repository. Clone it from '{}'?",
            self.path.display(),
            self.url
        );
        match prompt::confirm(&question, false) {
            Ok(true) => Ok(()),
            Ok(false) | Err(UserInputError::NonInteractive { .. }) => {
                Err(UserInputError::MissingSources {
                    path: self.path.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Sync every repository in order, stopping at the first failure
pub async fn sync_all(ctx: &BuildContext, repositories: &[GitRepository]) -> Result<()> {
    for repository in repositories {
        repository.sync(ctx).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;
    use crate::error::CheribuildError;
    use crate::test_utils::test_context;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pretend_sync_of_missing_checkout() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(
            temp.path(),
            ConfigOptions {
                pretend: true,
                ..Default::default()
            },
        );
        let repo = GitRepository::new("https://example.org/qemu", temp.path().join("qemu"));

        repo.sync(&ctx).await.unwrap();

        assert!(!temp.path().join("qemu").exists());
    }

    #[tokio::test]
    async fn test_missing_checkout_without_terminal_is_user_error() {
        // the prompt would block on a terminal
        if prompt::is_interactive() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), ConfigOptions::default());
        let repo = GitRepository::new("https://example.org/qemu", temp.path().join("qemu"));

        let err = repo.sync(&ctx).await.unwrap_err();

        assert!(matches!(
            err,
            CheribuildError::UserInput(UserInputError::MissingSources { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_all_empty_is_noop() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), ConfigOptions::default());
        sync_all(&ctx, &[]).await.unwrap();
    }

    #[test]
    fn test_accessors() {
        let repo = GitRepository::new("https://example.org/llvm", "/src/llvm");
        assert_eq!(repo.url(), "https://example.org/llvm");
        assert_eq!(repo.path(), Path::new("/src/llvm"));
    }
}
