//! Engine module housing the driver seam and the safe lifecycle wrapper.
//!
//! `driver` expresses the native engine's exported contract as the
//! [`AudioDriver`] trait (implemented by the native binding and the built-in
//! stub), `callback` adapts the raw buffer callback to safe renderers, and
//! `core` owns the lifecycle state machine around a driver.

pub mod callback;
pub mod core;
pub mod driver;

#[cfg(feature = "freepiano")]
pub use driver::FreepianoDriver;
pub use callback::{CallbackState, Render};
pub use self::core::{
    Engine, EngineState, StreamParams, DEFAULT_CHANNELS, DEFAULT_FRAMES_PER_BUFFER,
    DEFAULT_SAMPLE_RATE,
};
pub use driver::{AudioDriver, RawAudioCallback, StubDriver, StubHandle};
