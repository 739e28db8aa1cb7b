//! Stub driver used when the native engine is not linked
//!
//! This driver implements the full native state machine (same transitions,
//! same failure statuses) without any device I/O, so the demo binary and the
//! test suite run on machines that have neither the prebuilt library nor an
//! audio device.
//!
//! Two pacing modes are supported:
//! - `paced`: a worker thread invokes the callback once per buffer period,
//!   mirroring the native engine's producer loop. Rendered samples are
//!   discarded. Used as the demo fallback.
//! - `manual`: callbacks fire only when [`StubHandle::advance_blocks`] is
//!   called, and rendered samples are recorded for inspection. Used by tests
//!   that need deterministic output.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::engine::core::{StreamParams, DEFAULT_FRAMES_PER_BUFFER};
use crate::engine::driver::{
    AudioDriver, RawAudioCallback, FP_ERR_GENERIC, FP_ERR_NOT_INITIALIZED,
};
use crate::error::{DriverOp, EngineError};

/// Wrapper asserting the registered user pointer may cross into the pacing
/// thread.
struct SendPtr(*mut c_void);

// SAFETY: ownership of the pointee is transferred to the stream between
// start_stream and stop_stream; only the callback invocation dereferences it.
unsafe impl Send for SendPtr {}

/// Callback registration held while a stream is running
struct StreamSlot {
    callback: RawAudioCallback,
    user: SendPtr,
    frames: usize,
    channels: usize,
}

/// State shared between the driver, its pacing thread, and [`StubHandle`]
struct StubShared {
    stream: Mutex<Option<StreamSlot>>,
    streaming: AtomicBool,
    rendered: Mutex<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pacing {
    Realtime,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StubState {
    Created,
    Initialized,
    DeviceOpen,
}

/// Driver that emulates the native engine without device I/O
pub struct StubDriver {
    pacing: Pacing,
    state: StubState,
    params: Option<StreamParams>,
    shared: Arc<StubShared>,
    worker: Option<JoinHandle<()>>,
}

impl StubDriver {
    /// Create a stub that paces the callback in real time.
    ///
    /// A worker thread invokes the callback once per buffer period
    /// (`frames / sample_rate` seconds) while the stream runs, like the
    /// native producer loop. Rendered samples are discarded.
    pub fn paced() -> Self {
        Self::with_pacing(Pacing::Realtime)
    }

    /// Create a stub driven by [`StubHandle::advance_blocks`].
    ///
    /// No thread is spawned; callbacks fire synchronously on the caller of
    /// `advance_blocks`, and rendered samples are recorded on the handle.
    pub fn manual() -> (Self, StubHandle) {
        let driver = Self::with_pacing(Pacing::Manual);
        let handle = StubHandle {
            shared: Arc::clone(&driver.shared),
        };
        (driver, handle)
    }

    fn with_pacing(pacing: Pacing) -> Self {
        Self {
            pacing,
            state: StubState::Created,
            params: None,
            shared: Arc::new(StubShared {
                stream: Mutex::new(None),
                streaming: AtomicBool::new(false),
                rendered: Mutex::new(Vec::new()),
            }),
            worker: None,
        }
    }

    fn spawn_worker(&mut self, params: &StreamParams) -> Result<(), EngineError> {
        let shared = Arc::clone(&self.shared);
        let frames = params.frames_per_buffer as usize;
        let channels = params.channels as usize;
        let period = Duration::from_secs_f64(frames as f64 / params.sample_rate as f64);

        let spawned = thread::Builder::new()
            .name("fp-stub-stream".to_string())
            .spawn(move || {
                let mut scratch = vec![0.0f32; frames * channels];
                while shared.streaming.load(Ordering::Acquire) {
                    if let Ok(guard) = shared.stream.lock() {
                        if let Some(slot) = guard.as_ref() {
                            // SAFETY: the user pointer stays valid until
                            // stop_stream joins this thread; the scratch
                            // buffer holds frames * channels samples.
                            unsafe {
                                (slot.callback)(scratch.as_mut_ptr(), slot.frames, slot.user.0)
                            };
                        }
                    }
                    thread::sleep(period);
                }
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                warn!("[StubDriver] Failed to spawn pacing thread: {}", err);
                Err(EngineError::driver(DriverOp::StartStream, FP_ERR_GENERIC))
            }
        }
    }

    fn halt_stream(&mut self) {
        self.shared.streaming.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("[StubDriver] Pacing thread panicked");
            }
        }
        if let Ok(mut guard) = self.shared.stream.lock() {
            *guard = None;
        }
    }
}

impl AudioDriver for StubDriver {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn init(&mut self) -> Result<(), EngineError> {
        if self.state == StubState::Created {
            self.state = StubState::Initialized;
            debug!("[StubDriver] Initialized");
        }
        Ok(())
    }

    fn open_default_device(&mut self, params: &StreamParams) -> Result<(), EngineError> {
        match self.state {
            StubState::Created => Err(EngineError::driver(
                DriverOp::OpenDefaultDevice,
                FP_ERR_NOT_INITIALIZED,
            )),
            StubState::DeviceOpen => Err(EngineError::driver(
                DriverOp::OpenDefaultDevice,
                FP_ERR_GENERIC,
            )),
            StubState::Initialized => {
                let mut resolved = *params;
                if resolved.frames_per_buffer == 0 {
                    resolved.frames_per_buffer = DEFAULT_FRAMES_PER_BUFFER;
                }
                debug!(
                    "[StubDriver] Opened default device: {} Hz, {} channels, {} frames/buffer",
                    resolved.sample_rate, resolved.channels, resolved.frames_per_buffer
                );
                self.params = Some(resolved);
                self.state = StubState::DeviceOpen;
                Ok(())
            }
        }
    }

    unsafe fn start_stream(
        &mut self,
        callback: RawAudioCallback,
        user: *mut c_void,
    ) -> Result<(), EngineError> {
        if self.state != StubState::DeviceOpen {
            return Err(EngineError::driver(
                DriverOp::StartStream,
                FP_ERR_NOT_INITIALIZED,
            ));
        }
        if self.shared.streaming.load(Ordering::Acquire) {
            return Err(EngineError::driver(DriverOp::StartStream, FP_ERR_GENERIC));
        }
        let Some(params) = self.params else {
            return Err(EngineError::driver(
                DriverOp::StartStream,
                FP_ERR_NOT_INITIALIZED,
            ));
        };

        if let Ok(mut guard) = self.shared.stream.lock() {
            *guard = Some(StreamSlot {
                callback,
                user: SendPtr(user),
                frames: params.frames_per_buffer as usize,
                channels: params.channels as usize,
            });
        }
        self.shared.streaming.store(true, Ordering::Release);

        if self.pacing == Pacing::Realtime {
            if let Err(err) = self.spawn_worker(&params) {
                self.halt_stream();
                return Err(err);
            }
        }
        debug!("[StubDriver] Stream started ({:?} pacing)", self.pacing);
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), EngineError> {
        // Stopping an idle stream succeeds, like the native engine
        if !self.shared.streaming.load(Ordering::Acquire) {
            return Ok(());
        }
        self.halt_stream();
        debug!("[StubDriver] Stream stopped");
        Ok(())
    }

    fn close_device(&mut self) -> Result<(), EngineError> {
        match self.state {
            StubState::Created => Err(EngineError::driver(
                DriverOp::CloseDevice,
                FP_ERR_NOT_INITIALIZED,
            )),
            StubState::Initialized => Ok(()),
            StubState::DeviceOpen => {
                self.stop_stream()?;
                self.params = None;
                self.state = StubState::Initialized;
                debug!("[StubDriver] Device closed");
                Ok(())
            }
        }
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        self.stop_stream()?;
        self.params = None;
        self.state = StubState::Created;
        debug!("[StubDriver] Shut down");
        Ok(())
    }
}

impl Drop for StubDriver {
    fn drop(&mut self) {
        self.halt_stream();
    }
}

/// Inspection and stepping handle for a [`StubDriver::manual`] stub.
///
/// The handle shares state with the driver, so it remains usable after the
/// driver moves into the engine.
pub struct StubHandle {
    shared: Arc<StubShared>,
}

impl StubHandle {
    /// Invoke the registered callback `blocks` times.
    ///
    /// Each invocation renders one buffer of `frames_per_buffer` frames into
    /// a scratch buffer that is appended to the recording.
    ///
    /// # Returns
    /// The number of frames rendered; 0 when no stream is running.
    pub fn advance_blocks(&self, blocks: usize) -> usize {
        if !self.shared.streaming.load(Ordering::Acquire) {
            return 0;
        }
        let Ok(guard) = self.shared.stream.lock() else {
            return 0;
        };
        let Some(slot) = guard.as_ref() else {
            return 0;
        };

        let mut scratch = vec![0.0f32; slot.frames * slot.channels];
        let mut frames_rendered = 0;
        for _ in 0..blocks {
            // SAFETY: the slot stays registered while the lock is held and
            // the scratch buffer holds frames * channels samples.
            unsafe { (slot.callback)(scratch.as_mut_ptr(), slot.frames, slot.user.0) };
            frames_rendered += slot.frames;
            if let Ok(mut rendered) = self.shared.rendered.lock() {
                rendered.extend_from_slice(&scratch);
            }
        }
        frames_rendered
    }

    /// Snapshot of every sample rendered so far
    pub fn rendered(&self) -> Vec<f32> {
        self.shared
            .rendered
            .lock()
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }

    /// Number of samples rendered so far
    pub fn rendered_len(&self) -> usize {
        self.shared
            .rendered
            .lock()
            .map(|samples| samples.len())
            .unwrap_or(0)
    }

    /// Discard the recording
    pub fn clear_rendered(&self) {
        if let Ok(mut rendered) = self.shared.rendered.lock() {
            rendered.clear();
        }
    }

    /// Whether a stream is currently running
    pub fn is_streaming(&self) -> bool {
        self.shared.streaming.load(Ordering::Acquire)
    }
}
