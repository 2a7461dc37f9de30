//! Error types for the shell crate.

use thiserror::Error;

use carapace_core::CoreError;

/// Errors that can occur while driving the application shell.
#[derive(Error, Debug)]
pub enum ShellError {
    /// An error bubbled up from the concurrency core.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The application's `init` callback failed on the worker thread.
    #[error("application initialization failed: {0}")]
    AppInit(String),
}

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;
