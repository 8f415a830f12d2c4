use thiserror::Error;

/// Main error type for record-extra
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Transcoding failed for segment {index}: {source}")]
    Segment {
        index: usize,
        #[source]
        source: TranscodeError,
    },

    #[error("Transcoding error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while tokenizing and resolving event tokens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Malformed event #{index} '{token}': {reason}")]
    Malformed {
        index: usize,
        token: String,
        reason: String,
    },

    #[error("Event #{index} record time {current} does not follow {previous}")]
    NonIncreasing {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Errors raised while turning events into an ordered set of clips
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("At least two events are required, got {count}")]
    InsufficientEvents { count: usize },

    #[error("No clip survived synthesis, nothing to concatenate")]
    EmptyTimeline,

    #[error("Clip {index} has stream parameters {found}, expected {expected}")]
    IncompatibleStreams {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Failures reported by the transcoding service
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("{tool} not found or not runnable")]
    ToolNotFound { tool: String },

    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to probe {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Expected artifact is missing or empty: {path}")]
    MissingArtifact { path: String },

    #[error("Clip is {actual:.3}s long, expected {expected:.3}s")]
    Truncated { expected: f64, actual: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Results returned by a transcoding service
pub type TranscodeResult<T> = std::result::Result<T, TranscodeError>;

impl SyncError {
    /// Wrap a transcoding failure with the index of the segment being synthesized
    pub fn segment(index: usize, source: TranscodeError) -> Self {
        Self::Segment { index, source }
    }

    /// Index of the segment whose synthesis failed, if any
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            Self::Segment { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True when the error comes from the caller's input rather than the media tools
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Event(_) | Self::Timeline(TimelineError::InsufficientEvents { .. })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Event(EventError::Malformed { index, token, reason }) => {
                format!(
                    "Event #{} ('{}') is invalid: {}. Expected 'record_time-action[-extra_time]' with action play or pause.",
                    index, token, reason
                )
            }
            Self::Transcode(TranscodeError::ToolNotFound { tool }) => {
                format!("'{}' could not be run. Please install FFmpeg or set its path in the configuration.", tool)
            }
            Self::Segment { index, source: TranscodeError::Truncated { expected, actual } } => {
                format!(
                    "Segment {} needs {:.3}s of the extra video but only {:.3}s could be extracted. Does the extra video end before this segment?",
                    index, expected, actual
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
