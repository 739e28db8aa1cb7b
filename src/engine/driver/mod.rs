//! Driver abstractions over the native engine's exported surface.
//!
//! The native engine exposes six functions and one callback type; this module
//! expresses that contract as the [`AudioDriver`] trait so the safe wrapper
//! in `engine::core` works against the real library and the built-in stub
//! interchangeably.

use std::ffi::c_void;

use crate::engine::core::StreamParams;
use crate::error::EngineError;

/// Raw output callback registered with a driver.
///
/// Matches the native callback type: an interleaved f32 buffer, the number
/// of frames it holds, and the opaque user pointer registered at stream
/// start. The buffer length in samples is `frames * channels` for the
/// channel count the device was opened with.
pub type RawAudioCallback =
    unsafe extern "C" fn(interleaved: *mut f32, frames: usize, user: *mut c_void);

// Result statuses of the native engine contract, shared by every driver.
pub const FP_OK: i32 = 0;
pub const FP_ERR_GENERIC: i32 = -1;
pub const FP_ERR_NOT_INITIALIZED: i32 = -2;
pub const FP_ERR_DEVICE: i32 = -3;
pub const FP_ERR_INVALID_ARG: i32 = -4;

/// Trait implemented by audio drivers.
///
/// The methods map one-to-one onto the native engine's entry points and keep
/// its semantics: `init` and `shutdown` are idempotent, `stop_stream` on an
/// idle stream succeeds, and `close_device` stops a running stream first.
/// Drivers may assume stream parameters were validated by the caller;
/// `frames_per_buffer == 0` resolves to the engine default block size.
pub trait AudioDriver: Send {
    /// Short driver name for logs
    fn name(&self) -> &'static str;

    /// Initialize the engine
    fn init(&mut self) -> Result<(), EngineError>;

    /// Open the default output device with the given stream geometry
    fn open_default_device(&mut self, params: &StreamParams) -> Result<(), EngineError>;

    /// Start the output stream.
    ///
    /// # Safety
    /// `user` must stay valid, and must not be accessed by the caller, until
    /// `stop_stream` returns. The driver may invoke `callback` with it from
    /// a dedicated audio thread.
    unsafe fn start_stream(
        &mut self,
        callback: RawAudioCallback,
        user: *mut c_void,
    ) -> Result<(), EngineError>;

    /// Stop the output stream.
    ///
    /// Once this returns, the callback is never invoked again and the memory
    /// behind `user` may be reclaimed.
    fn stop_stream(&mut self) -> Result<(), EngineError>;

    /// Close the output device, stopping the stream first if needed
    fn close_device(&mut self) -> Result<(), EngineError>;

    /// Tear the engine down, stopping and closing as needed
    fn shutdown(&mut self) -> Result<(), EngineError>;
}

#[cfg(feature = "freepiano")]
mod freepiano;
#[cfg(feature = "freepiano")]
pub use freepiano::FreepianoDriver;

mod stub;
pub use stub::{StubDriver, StubHandle};
