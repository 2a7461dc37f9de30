//! The console command boundary.
//!
//! Input bindings may carry a command-line string instead of a callback.
//! Executing those strings is the job of an external named-command registry
//! (typically a debug console); the shell only defines the boundary trait
//! and hands command lines across it.

use thiserror::Error;

/// Errors a command registry can report back to the binding dispatcher.
///
/// Registry errors never abort the run loop; the dispatcher logs them and
/// moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No command with the given name is registered.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command was found but failed to execute.
    #[error("command failed: {0}")]
    Failed(String),
}

/// A named-command registry that executes console command lines.
///
/// Implemented by the debug-console collaborator; the shell invokes it for
/// every fired binding that carries a command string.
pub trait CommandRegistry {
    /// Execute a single command line.
    fn execute(&mut self, command_line: &str) -> Result<(), CommandError>;
}

/// A registry with no commands, for shells that run without a console.
///
/// Every execution fails with [`CommandError::UnknownCommand`], which the
/// binding dispatcher logs as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCommandRegistry;

impl CommandRegistry for NullCommandRegistry {
    fn execute(&mut self, command_line: &str) -> Result<(), CommandError> {
        let name = command_line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        Err(CommandError::UnknownCommand(name))
    }
}
