use thiserror::Error;

/// Main error type for the Pulse-Analyzer library
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Audio analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Frame source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Contract violations detected by the analysis engine.
///
/// Silence, empty frames and implausible tempo estimates are expected noise
/// and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Non-finite timestamp: {timestamp}")]
    NonFiniteTimestamp { timestamp: f64 },

    #[error("Timestamp went backwards: {previous} -> {current}")]
    TimestampRegressed { previous: f64, current: f64 },

    #[error("Invalid analysis parameters: {details}")]
    InvalidParameters { details: String },
}

/// Frame source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid source parameters: {details}")]
    InvalidParameters { details: String },
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

/// Convenience type alias for Results using PulseError
pub type Result<T> = std::result::Result<T, PulseError>;

impl PulseError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // A file may become readable on retry
            Self::Source(SourceError::LoadFailed { .. }) => true,
            // A regressed clock reading is transient; the next tick can succeed
            Self::Analysis(AnalysisError::TimestampRegressed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(SourceError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Source(SourceError::UnsupportedFormat { format }) => {
                format!("Audio format '{}' is not supported. Supported formats: wav, mp3, flac, ogg, m4a, aac", format)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_errors_convert() {
        let err: PulseError = AnalysisError::NonFiniteTimestamp { timestamp: f64::NAN }.into();
        assert!(matches!(err, PulseError::Analysis(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_errors() {
        let err: PulseError = AnalysisError::TimestampRegressed { previous: 2.0, current: 1.0 }.into();
        assert!(err.is_recoverable());

        let err: PulseError = SourceError::LoadFailed { path: "a.wav".to_string() }.into();
        assert!(err.is_recoverable());

        let err: PulseError = ConfigError::ParseFailed { path: "a.toml".to_string() }.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_user_message() {
        let err: PulseError = SourceError::UnsupportedFormat { format: "xyz".to_string() }.into();
        assert!(err.user_message().contains("xyz"));

        let err = PulseError::generic("boom");
        assert_eq!(err.user_message(), "Generic error: boom");
    }
}
