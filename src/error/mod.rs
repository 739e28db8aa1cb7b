// Error types for the fp-audio crate
//
// This module defines custom error types for the engine driver, capture, and
// analysis domains, providing structured error handling with stable numeric
// codes alongside the raw status values reported by the native engine.

mod analysis;
mod capture;
mod engine;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use capture::{log_capture_error, CaptureError, CaptureErrorCodes};
pub use engine::{log_engine_error, DriverOp, EngineError, EngineErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling and
/// logging across the crate.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
