use thiserror::Error;

/// All errors produced by the sakibox libraries.
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// An external command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    /// A PID that does not name a single process.
    #[error("Invalid PID: {0}")]
    InvalidPid(i64),

    /// No process is listening on the requested port.
    #[error("No process is listening on port {0}")]
    PortNotFound(u16),

    /// Delivering a signal to a process failed.
    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    /// The terminal could not be switched into or out of raw mode.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the sakibox crates.
pub type Result<T> = std::result::Result<T, ToolboxError>;
