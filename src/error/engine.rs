// Engine and driver error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Engine error code constants
///
/// These constants provide a single source of truth for the numeric codes
/// attached to engine errors. The raw status values returned by the native
/// engine are carried separately inside the `Driver` variant.
///
/// Error code range: 1001-1008
pub struct EngineErrorCodes {}

impl EngineErrorCodes {
    /// A driver entry point reported a failure status
    pub const DRIVER_FAILURE: i32 = 1001;

    /// The native driver is already claimed by another instance
    pub const DRIVER_BUSY: i32 = 1002;

    /// No output device is open
    pub const DEVICE_NOT_OPEN: i32 = 1003;

    /// An output device is already open
    pub const DEVICE_ALREADY_OPEN: i32 = 1004;

    /// A stream is already running
    pub const ALREADY_STREAMING: i32 = 1005;

    /// No stream is running
    pub const NOT_STREAMING: i32 = 1006;

    /// Sample rate is invalid (must be > 0)
    pub const INVALID_SAMPLE_RATE: i32 = 1007;

    /// Channel count is invalid (must be > 0)
    pub const INVALID_CHANNEL_COUNT: i32 = 1008;
}

/// Log an engine error with structured context
///
/// This function logs engine errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_engine_error(err: &EngineError, context: &str) {
    error!(
        "Engine error in {}: code={}, component=Engine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Driver entry points, named after the native engine's exported functions
///
/// Carried inside [`EngineError::Driver`] so a failure report names the call
/// that produced the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOp {
    Init,
    Shutdown,
    OpenDefaultDevice,
    CloseDevice,
    StartStream,
    StopStream,
}

impl DriverOp {
    /// The exported symbol this operation maps to
    pub fn symbol(&self) -> &'static str {
        match self {
            DriverOp::Init => "fp_init",
            DriverOp::Shutdown => "fp_shutdown",
            DriverOp::OpenDefaultDevice => "fp_open_default_device",
            DriverOp::CloseDevice => "fp_close_device",
            DriverOp::StartStream => "fp_start_stream",
            DriverOp::StopStream => "fp_stop_stream",
        }
    }
}

/// Decode a raw fp_result_t status into its documented meaning
fn status_name(status: i32) -> &'static str {
    match status {
        0 => "ok",
        -1 => "generic failure",
        -2 => "engine not initialized",
        -3 => "device error",
        -4 => "invalid argument",
        _ => "unknown status",
    }
}

/// Engine-related errors
///
/// These errors cover the driver lifecycle (init through shutdown) and the
/// parameter validation performed before a device is opened. Lifecycle
/// violations are caught by the wrapper before the driver is reached; the
/// `Driver` variant carries the raw status for failures the driver itself
/// reports.
///
/// Error code range: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A driver entry point reported a failure status
    Driver { op: DriverOp, status: i32 },

    /// The native driver is already claimed by another instance in this process
    DriverBusy,

    /// No output device is open
    DeviceNotOpen,

    /// An output device is already open
    DeviceAlreadyOpen,

    /// A stream is already running
    AlreadyStreaming,

    /// No stream is running
    NotStreaming,

    /// Sample rate is invalid (must be > 0)
    InvalidSampleRate { rate: u32 },

    /// Channel count is invalid (must be > 0)
    InvalidChannelCount { channels: u16 },
}

impl EngineError {
    /// Build a `Driver` error from an entry point and its raw status
    pub fn driver(op: DriverOp, status: i32) -> Self {
        EngineError::Driver { op, status }
    }
}

impl ErrorCode for EngineError {
    fn code(&self) -> i32 {
        match self {
            EngineError::Driver { .. } => EngineErrorCodes::DRIVER_FAILURE,
            EngineError::DriverBusy => EngineErrorCodes::DRIVER_BUSY,
            EngineError::DeviceNotOpen => EngineErrorCodes::DEVICE_NOT_OPEN,
            EngineError::DeviceAlreadyOpen => EngineErrorCodes::DEVICE_ALREADY_OPEN,
            EngineError::AlreadyStreaming => EngineErrorCodes::ALREADY_STREAMING,
            EngineError::NotStreaming => EngineErrorCodes::NOT_STREAMING,
            EngineError::InvalidSampleRate { .. } => EngineErrorCodes::INVALID_SAMPLE_RATE,
            EngineError::InvalidChannelCount { .. } => EngineErrorCodes::INVALID_CHANNEL_COUNT,
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::Driver { op, status } => {
                format!(
                    "{} failed: {} (status {})",
                    op.symbol(),
                    status_name(*status),
                    status
                )
            }
            EngineError::DriverBusy => {
                "Native engine already claimed by another instance in this process.".to_string()
            }
            EngineError::DeviceNotOpen => {
                "No output device open. Call open_default_device() first.".to_string()
            }
            EngineError::DeviceAlreadyOpen => {
                "Output device already open. Call close_device() first.".to_string()
            }
            EngineError::AlreadyStreaming => {
                "Stream already running. Call stop_stream() first.".to_string()
            }
            EngineError::NotStreaming => {
                "Stream not running. Call start_stream() first.".to_string()
            }
            EngineError::InvalidSampleRate { rate } => {
                format!("Sample rate must be greater than 0 (got {})", rate)
            }
            EngineError::InvalidChannelCount { channels } => {
                format!("Channel count must be greater than 0 (got {})", channels)
            }
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EngineError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EngineError {}
