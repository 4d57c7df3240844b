//! Error types for speechgate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechgateError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Classifier errors
    #[error("Failed to initialize speech classifier: {message}")]
    ClassifierInit { message: String },

    #[error("Frame classification failed: {message}")]
    Classification { message: String },

    // Downstream transcription errors
    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // Session errors
    #[error("Session {session_id} worker failed: {message}")]
    SessionWorker { session_id: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SpeechgateError>;
