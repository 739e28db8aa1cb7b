//! Output callback adapter between the raw driver callback and safe renderers
//!
//! The drivers know nothing about renderers; they invoke one raw callback
//! with a buffer pointer, a frame count, and the opaque user pointer that was
//! registered at stream start. This module supplies that callback:
//! [`render_trampoline`] recovers the boxed [`CallbackState`] from the user
//! pointer, wraps the buffer in a slice, and hands it to the renderer.
//!
//! # Design
//! The adapter itself does no allocation, locking, or logging; the pointer
//! casts and the slice construction are its whole job. Everything stateful
//! lives in the renderer, which is owned by exactly one stream at a time and
//! is handed back when the stream stops.

use std::ffi::c_void;
use std::slice;

/// Renderer invoked by the output callback to fill interleaved buffers.
///
/// Implementations must write every slot of `interleaved`, whose length is
/// `frames * channels` in frame-major interleaved layout. The callback runs
/// on the driver's audio thread, so implementations should avoid allocation,
/// locking, and blocking I/O.
pub trait Render: Send {
    fn render(&mut self, interleaved: &mut [f32], channels: u16);
}

/// State handed to the driver as the opaque user pointer.
///
/// One boxed value per stream: the box is leaked to a raw pointer at stream
/// start and reconstructed at stream stop, after the driver has guaranteed
/// the callback will not run again.
pub struct CallbackState {
    renderer: Box<dyn Render>,
    channels: u16,
}

impl CallbackState {
    pub fn new(renderer: Box<dyn Render>, channels: u16) -> Self {
        Self { renderer, channels }
    }

    /// Recover the renderer after the stream has stopped
    pub fn into_renderer(self) -> Box<dyn Render> {
        self.renderer
    }
}

/// Raw output callback registered with the driver.
///
/// Ignores invocations with a null buffer, a null user pointer, or a zero
/// frame count; otherwise delegates to the renderer inside the
/// [`CallbackState`] behind `user`.
///
/// # Safety
/// `user` must point to the `CallbackState` registered at stream start, and
/// `interleaved` must be valid for `frames * channels` writes for that
/// state's channel count. The driver must not invoke the callback
/// concurrently with itself or after `stop_stream` has returned.
pub unsafe extern "C" fn render_trampoline(interleaved: *mut f32, frames: usize, user: *mut c_void) {
    if interleaved.is_null() || user.is_null() || frames == 0 {
        return;
    }
    // Real-time path: no allocation, no locks, no logging
    let state = &mut *(user as *mut CallbackState);
    let samples = slice::from_raw_parts_mut(interleaved, frames * state.channels as usize);
    state.renderer.render(samples, state.channels);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SineOscillator;
    use std::ptr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fills every slot with a constant and counts render calls
    struct ConstRender {
        value: f32,
        calls: Arc<AtomicUsize>,
    }

    impl Render for ConstRender {
        fn render(&mut self, interleaved: &mut [f32], _channels: u16) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for slot in interleaved {
                *slot = self.value;
            }
        }
    }

    fn boxed_state(renderer: Box<dyn Render>, channels: u16) -> *mut CallbackState {
        Box::into_raw(Box::new(CallbackState::new(renderer, channels)))
    }

    #[test]
    fn test_trampoline_fills_buffer_through_renderer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Box::new(ConstRender {
            value: 0.75,
            calls: Arc::clone(&calls),
        });
        let state = boxed_state(renderer, 2);

        let mut buffer = vec![0.0f32; 16 * 2];
        unsafe { render_trampoline(buffer.as_mut_ptr(), 16, state.cast()) };

        assert_eq!(calls.load(Ordering::SeqCst), 1, "Renderer called once");
        assert!(buffer.iter().all(|&s| s == 0.75), "Every slot written");

        drop(unsafe { Box::from_raw(state) });
    }

    #[test]
    fn test_trampoline_keeps_phase_across_invocations() {
        let state = boxed_state(Box::new(SineOscillator::new(440.0, 48_000, 0.2)), 2);

        let mut first = vec![0.0f32; 256 * 2];
        let mut second = vec![0.0f32; 256 * 2];
        unsafe {
            render_trampoline(first.as_mut_ptr(), 256, state.cast());
            render_trampoline(second.as_mut_ptr(), 256, state.cast());
        }

        let mut reference = SineOscillator::new(440.0, 48_000, 0.2);
        let mut expected = vec![0.0f32; 512 * 2];
        reference.fill_interleaved(&mut expected, 2);

        assert_eq!(first, expected[..512], "First buffer matches the sequence");
        assert_eq!(second, expected[512..], "Second buffer continues the phase");

        drop(unsafe { Box::from_raw(state) });
    }

    #[test]
    fn test_trampoline_ignores_null_buffer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Box::new(ConstRender {
            value: 1.0,
            calls: Arc::clone(&calls),
        });
        let state = boxed_state(renderer, 2);

        unsafe { render_trampoline(ptr::null_mut(), 256, state.cast()) };
        assert_eq!(calls.load(Ordering::SeqCst), 0, "Null buffer must be ignored");

        drop(unsafe { Box::from_raw(state) });
    }

    #[test]
    fn test_trampoline_ignores_null_user() {
        let mut buffer = vec![3.0f32; 8];
        unsafe { render_trampoline(buffer.as_mut_ptr(), 4, ptr::null_mut()) };
        assert!(buffer.iter().all(|&s| s == 3.0), "Buffer must be untouched");
    }

    #[test]
    fn test_trampoline_ignores_zero_frames() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Box::new(ConstRender {
            value: 1.0,
            calls: Arc::clone(&calls),
        });
        let state = boxed_state(renderer, 2);

        let mut buffer = vec![0.0f32; 8];
        unsafe { render_trampoline(buffer.as_mut_ptr(), 0, state.cast()) };
        assert_eq!(calls.load(Ordering::SeqCst), 0, "Zero frames must be ignored");

        drop(unsafe { Box::from_raw(state) });
    }
}
