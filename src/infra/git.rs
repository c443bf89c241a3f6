//! Git command lines
//!
//! Source control is delegated to the `git` binary; this module only builds
//! the invocations.

use std::path::Path;

use crate::infra::process::CommandLine;

/// Whether `path` is the top of a git checkout
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

/// `git clone <url> <dest>`
pub fn clone(url: &str, dest: &Path) -> CommandLine {
    CommandLine::new("git").arg("clone").arg(url).path_arg(dest)
}

/// `git pull --rebase` inside `repo`
pub fn pull_rebase(repo: &Path) -> CommandLine {
    CommandLine::new("git")
        .args(["pull", "--rebase"])
        .current_dir(repo)
}

/// `git clean -dfx` inside `repo`: drops every untracked and ignored file
pub fn clean_all(repo: &Path) -> CommandLine {
    CommandLine::new("git").args(["clean", "-dfx"]).current_dir(repo)
}

/// `git checkout HEAD <pathspec>` inside `repo`: restores one subtree to the
/// committed state without touching other local changes
pub fn checkout_head(repo: &Path, pathspec: &str) -> CommandLine {
    CommandLine::new("git")
        .args(["checkout", "HEAD", pathspec])
        .current_dir(repo)
}
