//! Error types for HILQ

use thiserror::Error;

/// Main error type for HILQ
#[derive(Error, Debug)]
pub enum HilqError {
    #[error("'{0}' -> alpha must be in [0, 1]")]
    InvalidAlpha(f64),

    #[error("'{0}' -> gamma must be in [0, 1]")]
    InvalidGamma(f64),

    #[error("'{0}' -> epsilon must be in [0, 1]")]
    InvalidEpsilon(f64),

    #[error("'{0}' -> beta must be greater than 0")]
    InvalidBeta(f64),

    #[error("'{mode}' -> epsilon_mode must be one of {supported:?}")]
    InvalidEpsilonMode {
        mode: String,
        supported: &'static [&'static str],
    },

    #[error("'{variant}' -> agent variant must be one of {supported:?}")]
    InvalidVariant {
        variant: String,
        supported: &'static [&'static str],
    },

    #[error("'{0}' -> invalid action")]
    InvalidAction(usize),

    #[error("'{0}' -> invalid state")]
    InvalidState(String),

    #[error("secret length cannot be 0")]
    InvalidSecret,

    #[error("'{0}' -> number of pegs must be positive")]
    InvalidPegCount(usize),

    #[error("'{rating}' -> rating must be in [{min}, {max}]")]
    InvalidRating { rating: f64, min: f64, max: f64 },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Feedback channel closed: {0}")]
    FeedbackClosed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HilqError {
    /// Whether the error was raised while validating construction parameters
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HilqError::InvalidAlpha(_)
                | HilqError::InvalidGamma(_)
                | HilqError::InvalidEpsilon(_)
                | HilqError::InvalidBeta(_)
                | HilqError::InvalidEpsilonMode { .. }
                | HilqError::InvalidVariant { .. }
                | HilqError::InvalidSecret
                | HilqError::InvalidPegCount(_)
                | HilqError::Config(_)
        )
    }
}

/// Result type alias for HILQ operations
pub type Result<T> = std::result::Result<T, HilqError>;
