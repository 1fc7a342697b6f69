//! Error type shared by every simfleet crate.

use std::path::PathBuf;

/// Errors raised while configuring a pool or running a job.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Invalid pool or batch configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A parameter the script template requires is absent.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter is present but has the wrong kind of value.
    #[error("invalid parameter {key}: expected {expected}")]
    InvalidParameter {
        /// Parameter name.
        key: String,
        /// What the template needed.
        expected: &'static str,
    },

    /// Filesystem error around a slot's script or result file.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The simulator process could not be started.
    #[error("failed to launch simulator in slot {slot}: {source}")]
    Spawn {
        /// Slot index.
        slot: usize,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The simulator exited unsuccessfully.
    #[error("simulator in slot {slot} exited with {}: {stderr}", describe_exit(.code))]
    SimulatorExit {
        /// Slot index.
        slot: usize,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error (trimmed).
        stderr: String,
    },

    /// The simulator finished but left no result file behind.
    #[error("simulator produced no result file at {}", .0.display())]
    MissingOutput(PathBuf),

    /// A data row could not be read as two numbers.
    #[error("malformed data row at line {line}: {content:?}")]
    MalformedRow {
        /// 0-based line index in the result file.
        line: usize,
        /// Raw line contents.
        content: String,
    },

    /// Fewer block end markers than start markers.
    #[error("unbalanced block markers: {starts} start(s), {ends} end(s)")]
    UnbalancedMarkers {
        /// Number of start markers found.
        starts: usize,
        /// Number of end markers found.
        ends: usize,
    },

    /// A batch document or result set could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

impl SimError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error stems from bad configuration rather than a job run.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingParameter(_) | Self::InvalidParameter { .. }
        )
    }
}
