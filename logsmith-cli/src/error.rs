//! CLI-specific error types and exit code mapping

use logsmith_core::error::LogsmithError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Analysis flagged threat candidates (non-zero exit for scripting).
    #[error("analysis flagged {0} threat candidate(s)")]
    ThreatsFound(usize),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logsmith-core.
    #[error("{0}")]
    Core(#[from] LogsmithError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                 |
    /// |------|-----------------------------------------|
    /// | 0    | Success                                 |
    /// | 1    | General / command error                 |
    /// | 2    | Configuration error                     |
    /// | 4    | Analysis flagged threats (non-zero)     |
    /// | 10   | IO error                                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ThreatsFound(_) => 4,
            Self::Io(_) => 10,
            Self::Command(_) | Self::JsonSerialize(_) | Self::Core(_) => 1,
        }
    }
}
