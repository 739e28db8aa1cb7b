//! WAV capture of the rendered output stream
//!
//! The audio callback must never block on file I/O, so capture is split in
//! two halves connected by a lock-free SPSC ring:
//! - [`CaptureTap`]: held on the audio side, pushes rendered samples into the
//!   ring and counts the ones that do not fit.
//! - [`WavCaptureWorker`]: owns the writer thread that drains the ring into a
//!   32-bit float WAV file and finalizes the header on completion.
//!
//! [`Tee`] wraps any renderer so the samples reach the tap without the engine
//! knowing capture exists. Dropping the tap (usually by dropping the renderer
//! returned from `stop_stream`) signals the worker to finish.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};
use rtrb::{Consumer, PopError, Producer, RingBuffer};

use crate::engine::callback::Render;
use crate::error::{log_capture_error, CaptureError};

/// Default ring capacity in samples, matching the transfer ring inside the
/// native engine.
pub const DEFAULT_RING_CAPACITY: usize = 1 << 16;

/// Totals reported by [`WavCaptureWorker::finish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    /// Samples written to the WAV file
    pub samples_written: u64,
    /// Samples discarded because the ring was full
    pub samples_dropped: u64,
}

/// Audio-side half of the capture pipeline.
///
/// Pushing is lock-free and allocation-free; when the ring is full the sample
/// is dropped and counted instead of blocking the audio thread. Dropping the
/// tap signals the writer thread that no more samples are coming.
pub struct CaptureTap {
    producer: Producer<f32>,
    dropped: Arc<AtomicU64>,
    done: Arc<AtomicBool>,
    drop_warned: bool,
}

impl CaptureTap {
    /// Push rendered samples into the ring, dropping the ones that do not fit
    pub fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            if self.producer.push(sample).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if !self.drop_warned {
                    // Warn once; the audio thread must not log per sample
                    self.drop_warned = true;
                    warn!("[Capture] Ring full, dropping samples (writer too slow?)");
                }
            }
        }
    }

    /// Samples dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for CaptureTap {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Release);
    }
}

/// Handle to the writer thread.
///
/// Call [`finish`](Self::finish) after the tap is dropped to join the thread
/// and collect the totals; dropping the worker without finishing detaches the
/// thread, which still drains the ring and finalizes the file on its own.
pub struct WavCaptureWorker {
    handle: JoinHandle<Result<u64, CaptureError>>,
    dropped: Arc<AtomicU64>,
}

impl WavCaptureWorker {
    /// Wait for the writer to drain the ring and finalize the WAV file.
    ///
    /// The worker only exits once the tap has been dropped; calling this with
    /// the tap still alive blocks until it goes away.
    ///
    /// # Errors
    /// [`CaptureError::WorkerPanicked`] when the writer thread panicked, or
    /// the write/finalize error the thread ran into.
    pub fn finish(self) -> Result<CaptureStats, CaptureError> {
        let samples_written = self
            .handle
            .join()
            .map_err(|_| CaptureError::WorkerPanicked)
            .and_then(|result| result)
            .map_err(|err| {
                log_capture_error(&err, "finish");
                err
            })?;
        Ok(CaptureStats {
            samples_written,
            samples_dropped: self.dropped.load(Ordering::Relaxed),
        })
    }
}

/// Create the WAV file and spawn the writer thread.
///
/// The file is created up front so a bad path fails before any audio runs.
/// Samples are written as 32-bit float, the format the callback produces.
///
/// # Arguments
/// * `path` - Output WAV file path
/// * `sample_rate` - Stream sample rate in Hz
/// * `channels` - Interleaved channel count of the pushed samples
/// * `ring_capacity` - Ring size in samples ([`DEFAULT_RING_CAPACITY`] fits
///   about a third of a second of stereo audio at 48 kHz)
pub fn spawn_wav_writer<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    ring_capacity: usize,
) -> Result<(CaptureTap, WavCaptureWorker), CaptureError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let writer =
        WavWriter::create(&path, spec).map_err(|err| CaptureError::CreateFailed {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        })?;

    let (producer, consumer) = RingBuffer::new(ring_capacity);
    let done = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicU64::new(0));

    let worker_done = Arc::clone(&done);
    let handle = thread::Builder::new()
        .name("fp-capture-writer".to_string())
        .spawn(move || writer_loop(writer, consumer, worker_done))
        .map_err(|err| CaptureError::CreateFailed {
            path: path.as_ref().display().to_string(),
            reason: format!("failed to spawn writer thread: {err}"),
        })?;

    info!(
        "[Capture] Writing {} Hz, {} channel capture to {}",
        sample_rate,
        channels,
        path.as_ref().display()
    );

    Ok((
        CaptureTap {
            producer,
            dropped: Arc::clone(&dropped),
            done,
            drop_warned: false,
        },
        WavCaptureWorker { handle, dropped },
    ))
}

fn writer_loop(
    mut writer: WavWriter<std::io::BufWriter<std::fs::File>>,
    mut consumer: Consumer<f32>,
    done: Arc<AtomicBool>,
) -> Result<u64, CaptureError> {
    let mut samples_written = 0u64;
    loop {
        match consumer.pop() {
            Ok(sample) => {
                writer.write_sample(sample)?;
                samples_written += 1;
            }
            Err(PopError::Empty) => {
                // Check the completion flag only when the ring is drained so
                // no pushed sample is left behind.
                if done.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
    }
    writer
        .finalize()
        .map_err(|err| CaptureError::FinalizeFailed {
            reason: err.to_string(),
        })?;
    info!("[Capture] Finalized capture file, {} samples", samples_written);
    Ok(samples_written)
}

/// Renderer wrapper that copies the rendered buffer into a [`CaptureTap`].
///
/// Delegates to the inner renderer first, then taps the filled buffer, so
/// the stream output is unaffected by capture.
pub struct Tee<R: Render> {
    inner: R,
    tap: CaptureTap,
}

impl<R: Render> Tee<R> {
    pub fn new(inner: R, tap: CaptureTap) -> Self {
        Self { inner, tap }
    }
}

impl<R: Render> Render for Tee<R> {
    fn render(&mut self, interleaved: &mut [f32], channels: u16) {
        self.inner.render(interleaved, channels);
        self.tap.push(interleaved);
    }
}
