//! Error types for Carapace core.

use std::fmt;

/// The main error type for Carapace core operations.
#[derive(Debug)]
pub enum CoreError {
    /// Channel-related error.
    Channel(ChannelError),
    /// Job scheduler error.
    Jobs(JobError),
    /// Application initialization failed.
    AppInit(String),
    /// Failed to spawn the app worker thread.
    WorkerSpawn(String),
    /// The app worker thread panicked.
    WorkerPanicked,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(err) => write!(f, "Channel error: {err}"),
            Self::Jobs(err) => write!(f, "Job scheduler error: {err}"),
            Self::AppInit(msg) => write!(f, "Application initialization failed: {msg}"),
            Self::WorkerSpawn(msg) => write!(f, "Failed to spawn app worker thread: {msg}"),
            Self::WorkerPanicked => write!(f, "The app worker thread panicked"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Channel(err) => Some(err),
            Self::Jobs(err) => Some(err),
            _ => None,
        }
    }
}

/// Channel-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The other endpoint has been dropped.
    Disconnected,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "The other endpoint has disconnected"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<ChannelError> for CoreError {
    fn from(err: ChannelError) -> Self {
        Self::Channel(err)
    }
}

/// Job-scheduler-specific errors.
#[derive(Debug)]
pub enum JobError {
    /// Failed to build the worker thread pool.
    PoolCreation(String),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolCreation(msg) => write!(f, "Failed to create worker pool: {msg}"),
        }
    }
}

impl std::error::Error for JobError {}

impl From<JobError> for CoreError {
    fn from(err: JobError) -> Self {
        Self::Jobs(err)
    }
}

/// A specialized Result type for Carapace core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
