// Capture error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Capture error code constants
///
/// Error code range: 1101-1104
pub struct CaptureErrorCodes {}

impl CaptureErrorCodes {
    /// Failed to create the output WAV file
    pub const CREATE_FAILED: i32 = 1101;

    /// Failed to write a sample to the WAV file
    pub const WRITE_FAILED: i32 = 1102;

    /// Failed to finalize the WAV header
    pub const FINALIZE_FAILED: i32 = 1103;

    /// The writer thread panicked
    pub const WORKER_PANICKED: i32 = 1104;
}

/// Log a capture error with structured context
pub fn log_capture_error(err: &CaptureError, context: &str) {
    error!(
        "Capture error in {}: code={}, component=WavCapture, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Capture-related errors
///
/// These errors cover the WAV writer path: file creation, sample writes
/// performed by the writer thread, and header finalization.
///
/// Error code range: 1101-1104
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Failed to create the output WAV file
    CreateFailed { path: String, reason: String },

    /// Failed to write a sample to the WAV file
    WriteFailed { reason: String },

    /// Failed to finalize the WAV header
    FinalizeFailed { reason: String },

    /// The writer thread panicked
    WorkerPanicked,
}

impl ErrorCode for CaptureError {
    fn code(&self) -> i32 {
        match self {
            CaptureError::CreateFailed { .. } => CaptureErrorCodes::CREATE_FAILED,
            CaptureError::WriteFailed { .. } => CaptureErrorCodes::WRITE_FAILED,
            CaptureError::FinalizeFailed { .. } => CaptureErrorCodes::FINALIZE_FAILED,
            CaptureError::WorkerPanicked => CaptureErrorCodes::WORKER_PANICKED,
        }
    }

    fn message(&self) -> String {
        match self {
            CaptureError::CreateFailed { path, reason } => {
                format!("Failed to create {}: {}", path, reason)
            }
            CaptureError::WriteFailed { reason } => {
                format!("Failed to write capture sample: {}", reason)
            }
            CaptureError::FinalizeFailed { reason } => {
                format!("Failed to finalize capture file: {}", reason)
            }
            CaptureError::WorkerPanicked => "Capture writer thread panicked.".to_string(),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CaptureError {}

impl From<hound::Error> for CaptureError {
    fn from(err: hound::Error) -> Self {
        CaptureError::WriteFailed {
            reason: err.to_string(),
        }
    }
}
