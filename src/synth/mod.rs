// Signal generators fed into the output callback

mod oscillator;

pub use oscillator::{SineOscillator, DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY_HZ};
