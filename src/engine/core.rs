//! Engine: safe lifecycle wrapper over an [`AudioDriver`].
//!
//! The native engine exposes a linear lifecycle (init → open device → start
//! stream → stop → close → shutdown) and reports illegal transitions with
//! opaque status codes. This wrapper tracks the lifecycle explicitly, rejects
//! illegal transitions with typed errors before the driver is reached, and
//! owns the renderer handed to the stream:
//!
//! - `start_stream` boxes the renderer into a [`CallbackState`] and leaks it
//!   to the raw user pointer the driver carries.
//! - `stop_stream` reclaims the box and hands the renderer back, relying on
//!   the driver guarantee that no callback runs after it returns.
//!
//! Dropping the engine performs best-effort teardown; `shutdown` is the
//! error-aware variant.

use std::ptr::NonNull;

use log::{debug, info};

use crate::engine::callback::{render_trampoline, CallbackState, Render};
use crate::engine::driver::AudioDriver;
use crate::error::{log_engine_error, EngineError};

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Default interleaved channel count
pub const DEFAULT_CHANNELS: u16 = 2;
/// Block size the engine falls back to when the caller passes 0
pub const DEFAULT_FRAMES_PER_BUFFER: u32 = 256;

/// Stream geometry requested from the driver.
///
/// `frames_per_buffer == 0` asks the driver to choose; both the native
/// engine and the stub resolve that to [`DEFAULT_FRAMES_PER_BUFFER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count (2 = stereo)
    pub channels: u16,
    /// Frames per callback buffer (0 = driver chooses)
    pub frames_per_buffer: u32,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
        }
    }
}

impl StreamParams {
    /// Validate the geometry before it reaches a driver.
    ///
    /// The native engine silently coerces out-of-range values instead of
    /// failing; validating here means that coercion never triggers.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        if self.channels == 0 {
            return Err(EngineError::InvalidChannelCount {
                channels: self.channels,
            });
        }
        Ok(())
    }
}

/// Lifecycle states of a live [`Engine`].
///
/// "Uninitialized" is the time before [`Engine::init`] returns, and the
/// stopped end of the lifecycle is reached through drop or
/// [`Engine::shutdown`], so neither needs a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Driver initialized, no device open
    Initialized,
    /// Default output device open, no stream running
    DeviceOpen,
    /// Output stream running, callback live
    Streaming,
}

/// Safe, state-checked wrapper around an audio driver.
///
/// # Example
/// ```
/// use fp_audio::engine::{Engine, StreamParams, StubDriver};
/// use fp_audio::synth::SineOscillator;
///
/// let mut engine = Engine::init(Box::new(StubDriver::paced())).unwrap();
/// engine.open_default_device(StreamParams::default()).unwrap();
/// engine
///     .start_stream(Box::new(SineOscillator::new(440.0, 48_000, 0.2)))
///     .unwrap();
/// let _renderer = engine.stop_stream().unwrap();
/// engine.shutdown().unwrap();
/// ```
pub struct Engine {
    driver: Box<dyn AudioDriver>,
    state: EngineState,
    params: Option<StreamParams>,
    /// Leaked callback state while a stream runs
    active: Option<NonNull<CallbackState>>,
    shut_down: bool,
}

// SAFETY: `active` is the uniquely owned pointer to a `CallbackState`, whose
// contents are Send. While streaming it is only dereferenced by the driver's
// callback thread, and the driver's stop_stream guarantee hands exclusive
// access back before the pointer is reclaimed here.
unsafe impl Send for Engine {}

impl Engine {
    /// Initialize the driver and produce an engine in [`EngineState::Initialized`].
    ///
    /// # Errors
    /// Returns the driver's error when initialization fails; the driver is
    /// dropped in that case.
    pub fn init(mut driver: Box<dyn AudioDriver>) -> Result<Self, EngineError> {
        driver.init().map_err(|err| {
            log_engine_error(&err, "init");
            err
        })?;
        info!("[Engine] Initialized ({} driver)", driver.name());
        Ok(Self {
            driver,
            state: EngineState::Initialized,
            params: None,
            active: None,
            shut_down: false,
        })
    }

    /// Open the default output device with the given geometry.
    ///
    /// On success the engine stores the resolved parameters, with
    /// `frames_per_buffer == 0` replaced by the engine default so
    /// [`Engine::params`] reports what the stream will actually use.
    ///
    /// # Errors
    /// [`EngineError::DeviceAlreadyOpen`] unless the engine is in
    /// [`EngineState::Initialized`]; validation errors for zero rate or
    /// channel count; the driver's error when the device cannot be opened.
    pub fn open_default_device(&mut self, params: StreamParams) -> Result<(), EngineError> {
        if self.state != EngineState::Initialized {
            return Err(EngineError::DeviceAlreadyOpen);
        }
        params.validate()?;

        self.driver.open_default_device(&params).map_err(|err| {
            log_engine_error(&err, "open_default_device");
            err
        })?;

        let mut resolved = params;
        if resolved.frames_per_buffer == 0 {
            resolved.frames_per_buffer = DEFAULT_FRAMES_PER_BUFFER;
        }
        info!(
            "[Engine] Default device open: {} Hz, {} channels, {} frames/buffer",
            resolved.sample_rate, resolved.channels, resolved.frames_per_buffer
        );
        self.params = Some(resolved);
        self.state = EngineState::DeviceOpen;
        Ok(())
    }

    /// Start streaming, handing ownership of `renderer` to the stream.
    ///
    /// The renderer is reachable only through the callback until
    /// [`Engine::stop_stream`] returns it.
    ///
    /// # Errors
    /// [`EngineError::DeviceNotOpen`] / [`EngineError::AlreadyStreaming`] on
    /// bad states; the driver's error when the stream cannot start, in which
    /// case the renderer is dropped.
    pub fn start_stream(&mut self, renderer: Box<dyn Render>) -> Result<(), EngineError> {
        match self.state {
            EngineState::DeviceOpen => {}
            EngineState::Initialized => return Err(EngineError::DeviceNotOpen),
            EngineState::Streaming => return Err(EngineError::AlreadyStreaming),
        }
        let Some(params) = self.params else {
            return Err(EngineError::DeviceNotOpen);
        };

        let state = Box::new(CallbackState::new(renderer, params.channels));
        let user = Box::into_raw(state);

        // SAFETY: `user` comes from Box::into_raw and is not touched again
        // until stop_stream reclaims it, satisfying the start_stream contract.
        let started = unsafe { self.driver.start_stream(render_trampoline, user.cast()) };
        match started {
            Ok(()) => {
                self.active = NonNull::new(user);
                self.state = EngineState::Streaming;
                debug!("[Engine] Stream started");
                Ok(())
            }
            Err(err) => {
                // The driver did not retain the pointer, so the box is ours
                // to reclaim.
                drop(unsafe { Box::from_raw(user) });
                log_engine_error(&err, "start_stream");
                Err(err)
            }
        }
    }

    /// Stop the stream and hand the renderer back.
    ///
    /// # Errors
    /// [`EngineError::NotStreaming`] when no stream is running; the driver's
    /// error when the stop itself fails, in which case the stream is treated
    /// as still running and the renderer stays with it.
    pub fn stop_stream(&mut self) -> Result<Box<dyn Render>, EngineError> {
        if self.state != EngineState::Streaming {
            return Err(EngineError::NotStreaming);
        }
        self.driver.stop_stream().map_err(|err| {
            log_engine_error(&err, "stop_stream");
            err
        })?;
        self.state = EngineState::DeviceOpen;

        let Some(active) = self.active.take() else {
            return Err(EngineError::NotStreaming);
        };
        // SAFETY: the driver guarantees the callback never runs after
        // stop_stream returns, so this is again the sole pointer to the
        // leaked box.
        let state = unsafe { Box::from_raw(active.as_ptr()) };
        debug!("[Engine] Stream stopped");
        Ok(state.into_renderer())
    }

    /// Close the output device, stopping the stream first if one is running
    /// (native semantics). A renderer still attached to the stream is
    /// dropped.
    ///
    /// # Errors
    /// [`EngineError::DeviceNotOpen`] when no device is open; driver errors
    /// from the stop or the close.
    pub fn close_device(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Streaming => {
                let renderer = self.stop_stream()?;
                debug!("[Engine] Renderer discarded by close_device");
                drop(renderer);
            }
            EngineState::DeviceOpen => {}
            EngineState::Initialized => return Err(EngineError::DeviceNotOpen),
        }
        self.driver.close_device().map_err(|err| {
            log_engine_error(&err, "close_device");
            err
        })?;
        self.params = None;
        self.state = EngineState::Initialized;
        info!("[Engine] Device closed");
        Ok(())
    }

    /// Tear the engine down, reporting the first failure.
    ///
    /// Stops the stream and closes the device as needed, then shuts the
    /// driver down. The drop path performs the same steps with failures
    /// logged instead of returned.
    pub fn shutdown(mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Streaming {
            drop(self.stop_stream()?);
        }
        if self.state == EngineState::DeviceOpen {
            self.close_device()?;
        }
        self.driver.shutdown().map_err(|err| {
            log_engine_error(&err, "shutdown");
            err
        })?;
        self.shut_down = true;
        info!("[Engine] Shut down");
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Parameters of the open device, if any
    pub fn params(&self) -> Option<&StreamParams> {
        self.params.as_ref()
    }

    /// Name of the underlying driver
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.shut_down {
            return;
        }
        if self.state == EngineState::Streaming {
            match self.driver.stop_stream() {
                Ok(()) => {
                    if let Some(active) = self.active.take() {
                        // SAFETY: stop succeeded, so the callback is done
                        // with the pointer.
                        drop(unsafe { Box::from_raw(active.as_ptr()) });
                    }
                }
                Err(err) => {
                    // The callback may still run; leaking the state is the
                    // only safe option.
                    log_engine_error(&err, "drop(stop_stream)");
                    self.active = None;
                }
            }
        }
        if let Err(err) = self.driver.shutdown() {
            log_engine_error(&err, "drop(shutdown)");
        }
    }
}

#[cfg(test)]
mod tests;
