//! Failure logging for subcommands.
//!
//! Every subcommand works on one project file. `log_failure` records the
//! subcommand, that file and the call site before the error reaches `main`'s
//! `?`, so a failed run in a batch script names the file it stopped on.

use std::fmt::Display;
use std::path::Path;
use tracing::error;

pub trait CommandResultExt<T, E> {
    /// On `Err`, log `command` and `file` with the error; the result is returned as is.
    fn log_failure(self, command: &str, file: &Path) -> Result<T, E>;
}

impl<T, E: Display> CommandResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log_failure(self, command: &str, file: &Path) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller = std::panic::Location::caller();
            error!(
                target: "deepnote_cli",
                command,
                file = %file.display(),
                error = %e,
                caller = %format!("{}:{}", caller.file(), caller.line()),
                "{} failed for {}",
                command,
                file.display()
            );
        }
        self
    }
}
