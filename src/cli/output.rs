//! User-facing messages outside the build output itself

use crossterm::style::{style, Stylize};

use crate::error::CheribuildError;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}

/// Print a fatal error to stderr
///
/// Context added by the CLI is followed down to the first cheribuild error,
/// whose own message already carries the details.
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {}", style(status::ERROR).red().bold(), style(error).red());
    if error.downcast_ref::<CheribuildError>().is_some() {
        return;
    }
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
        if cause.is::<CheribuildError>() {
            break;
        }
    }
}

/// Print the closing line of a successful run
pub fn display_success(targets: &[String]) {
    println!(
        "{} Finished: {}",
        style(status::SUCCESS).green().bold(),
        targets.join(" ")
    );
}
