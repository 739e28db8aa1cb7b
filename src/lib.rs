// fp-audio - safe Rust driver for the freepiano_minimal native audio engine
//
// The native engine owns the device side (default output device, buffer
// scheduling, the audio thread); this crate owns everything above it: a
// state-checked lifecycle wrapper, the sine renderer that feeds the output
// callback, WAV capture of the rendered stream, and offline analysis that
// verifies a capture really contains the expected tone.
//
// Without the `freepiano` cargo feature the crate links nothing native and
// runs on a built-in stub driver with the same contract.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod synth;

// Re-exports for the common path: build a driver, walk the lifecycle,
// render a tone.
#[cfg(feature = "freepiano")]
pub use engine::FreepianoDriver;
pub use engine::{Engine, EngineState, Render, StreamParams, StubDriver};
pub use synth::SineOscillator;
