//! Native freepiano_minimal driver
//!
//! Binds the prebuilt engine over its C ABI and adapts it to [`AudioDriver`].
//! The native engine keeps process-global state, so at most one driver
//! instance may be live at a time; [`FreepianoDriver::claim`] enforces that
//! and dropping the driver releases the claim.
//!
//! Link resolution comes from the `freepiano` cargo feature plus the
//! `FREEPIANO_LIB_DIR` environment variable read by the build script.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::engine::core::StreamParams;
use crate::engine::driver::{AudioDriver, RawAudioCallback, FP_OK};
use crate::error::{DriverOp, EngineError};

mod ffi {
    use super::{c_int, c_void, RawAudioCallback};

    #[link(name = "freepiano_minimal")]
    extern "C" {
        pub fn fp_init() -> c_int;
        pub fn fp_shutdown() -> c_int;
        pub fn fp_open_default_device(
            sample_rate: c_int,
            channels: c_int,
            frames_per_buffer: c_int,
        ) -> c_int;
        pub fn fp_close_device() -> c_int;
        pub fn fp_start_stream(cb: RawAudioCallback, user: *mut c_void) -> c_int;
        pub fn fp_stop_stream() -> c_int;
    }
}

/// Guards the process-global native engine against concurrent wrappers
static DRIVER_CLAIMED: AtomicBool = AtomicBool::new(false);

fn check(op: DriverOp, status: c_int) -> Result<(), EngineError> {
    if status == FP_OK {
        Ok(())
    } else {
        Err(EngineError::driver(op, status))
    }
}

/// Driver backed by the native freepiano_minimal library.
///
/// Each method forwards to the corresponding exported function and maps a
/// non-zero status to [`EngineError::Driver`]. Lifecycle teardown is the
/// engine wrapper's job; dropping the driver only releases the claim.
pub struct FreepianoDriver {
    _claim: (),
}

impl FreepianoDriver {
    /// Claim the native engine for this instance.
    ///
    /// # Errors
    /// Returns [`EngineError::DriverBusy`] when another instance is live in
    /// this process.
    pub fn claim() -> Result<Self, EngineError> {
        if DRIVER_CLAIMED.swap(true, Ordering::AcqRel) {
            return Err(EngineError::DriverBusy);
        }
        debug!("[FreepianoDriver] Claimed native engine");
        Ok(Self { _claim: () })
    }
}

impl AudioDriver for FreepianoDriver {
    fn name(&self) -> &'static str {
        "freepiano"
    }

    fn init(&mut self) -> Result<(), EngineError> {
        check(DriverOp::Init, unsafe { ffi::fp_init() })
    }

    fn open_default_device(&mut self, params: &StreamParams) -> Result<(), EngineError> {
        let status = unsafe {
            ffi::fp_open_default_device(
                params.sample_rate as c_int,
                params.channels as c_int,
                params.frames_per_buffer as c_int,
            )
        };
        check(DriverOp::OpenDefaultDevice, status)
    }

    unsafe fn start_stream(
        &mut self,
        callback: RawAudioCallback,
        user: *mut c_void,
    ) -> Result<(), EngineError> {
        check(DriverOp::StartStream, ffi::fp_start_stream(callback, user))
    }

    fn stop_stream(&mut self) -> Result<(), EngineError> {
        // The native call joins its producer thread before returning, which
        // is what makes reclaiming the user pointer safe for callers.
        check(DriverOp::StopStream, unsafe { ffi::fp_stop_stream() })
    }

    fn close_device(&mut self) -> Result<(), EngineError> {
        check(DriverOp::CloseDevice, unsafe { ffi::fp_close_device() })
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        check(DriverOp::Shutdown, unsafe { ffi::fp_shutdown() })
    }
}

impl Drop for FreepianoDriver {
    fn drop(&mut self) {
        DRIVER_CLAIMED.store(false, Ordering::Release);
        debug!("[FreepianoDriver] Released native engine claim");
    }
}
