// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 1201-1203
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Input signal is empty
    pub const EMPTY_INPUT: i32 = 1201;

    /// Input signal is too short to analyze
    pub const TOO_SHORT: i32 = 1202;

    /// Channel count is invalid for mixdown
    pub const INVALID_CHANNEL_COUNT: i32 = 1203;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=ToneAnalysis, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Analysis-related errors
///
/// These errors cover input validation for offline tone analysis. The
/// analysis itself is infallible once the input is accepted.
///
/// Error code range: 1201-1203
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input signal is empty
    EmptyInput,

    /// Input signal is too short to analyze
    TooShort { samples: usize, needed: usize },

    /// Channel count is invalid for mixdown
    InvalidChannelCount { channels: u16 },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::EmptyInput => AnalysisErrorCodes::EMPTY_INPUT,
            AnalysisError::TooShort { .. } => AnalysisErrorCodes::TOO_SHORT,
            AnalysisError::InvalidChannelCount { .. } => AnalysisErrorCodes::INVALID_CHANNEL_COUNT,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::EmptyInput => "Input signal is empty.".to_string(),
            AnalysisError::TooShort { samples, needed } => {
                format!(
                    "Input signal too short: {} samples (need at least {})",
                    samples, needed
                )
            }
            AnalysisError::InvalidChannelCount { channels } => {
                format!("Channel count must be greater than 0 (got {})", channels)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_codes() {
        assert_eq!(
            AnalysisError::EmptyInput.code(),
            AnalysisErrorCodes::EMPTY_INPUT
        );
        assert_eq!(
            AnalysisError::TooShort {
                samples: 1,
                needed: 2
            }
            .code(),
            AnalysisErrorCodes::TOO_SHORT
        );
        assert_eq!(
            AnalysisError::InvalidChannelCount { channels: 0 }.code(),
            AnalysisErrorCodes::INVALID_CHANNEL_COUNT
        );
    }

    #[test]
    fn test_analysis_error_messages() {
        let err = AnalysisError::TooShort {
            samples: 1,
            needed: 2,
        };
        assert_eq!(
            err.message(),
            "Input signal too short: 1 samples (need at least 2)"
        );

        let err = AnalysisError::EmptyInput;
        assert!(err.message().contains("empty"));
    }
}
