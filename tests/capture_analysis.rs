// End-to-end: engine + manual stub + capture tee render a tone into a WAV
// file, and the analysis side verifies the file really contains it.

use fp_audio::analysis::{analyze_tone, to_mono};
use fp_audio::capture::{self, Tee};
use fp_audio::engine::{Engine, StreamParams, StubDriver};
use fp_audio::synth::SineOscillator;

const SAMPLE_RATE: u32 = 48_000;
const CHANNELS: u16 = 2;
const FRAMES_PER_BUFFER: u32 = 256;

/// Stream one second of the demo tone through the capture tee into `path`.
fn capture_one_second(path: &std::path::Path) -> capture::CaptureStats {
    let params = StreamParams {
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
        frames_per_buffer: FRAMES_PER_BUFFER,
    };
    let (driver, handle) = StubDriver::manual();
    let mut engine = Engine::init(Box::new(driver)).expect("init should succeed");
    engine
        .open_default_device(params)
        .expect("open should succeed");

    // Ring sized for the whole burst: the manual stub renders much faster
    // than real time, so the writer thread may lag the producer.
    let ring_capacity = (SAMPLE_RATE as usize * CHANNELS as usize).next_power_of_two();
    let (tap, worker) = capture::spawn_wav_writer(path, SAMPLE_RATE, CHANNELS, ring_capacity)
        .expect("capture spawn should succeed");

    let oscillator = SineOscillator::new(440.0, SAMPLE_RATE, 0.2);
    engine
        .start_stream(Box::new(Tee::new(oscillator, tap)))
        .expect("start should succeed");

    let blocks = (SAMPLE_RATE / FRAMES_PER_BUFFER) as usize;
    let frames = handle.advance_blocks(blocks);
    assert_eq!(frames, blocks * FRAMES_PER_BUFFER as usize);

    // Dropping the renderer releases the tap and lets the writer finish
    drop(engine.stop_stream().expect("stop should succeed"));
    engine.shutdown().expect("shutdown should succeed");

    worker.finish().expect("capture finish should succeed")
}

fn read_float_wav(path: &std::path::Path) -> (Vec<f32>, hound::WavSpec) {
    let mut reader = hound::WavReader::open(path).expect("capture file should open");
    let spec = reader.spec();
    let samples = reader
        .samples::<f32>()
        .collect::<Result<Vec<f32>, _>>()
        .expect("capture file should decode");
    (samples, spec)
}

#[test]
fn captured_stream_contains_the_expected_tone() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("demo_tone.wav");

    let stats = capture_one_second(&path);
    let expected_samples =
        (SAMPLE_RATE / FRAMES_PER_BUFFER) as u64 * FRAMES_PER_BUFFER as u64 * CHANNELS as u64;
    assert_eq!(stats.samples_dropped, 0, "The ring held the whole burst");
    assert_eq!(stats.samples_written, expected_samples);

    let (samples, spec) = read_float_wav(&path);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, CHANNELS);
    assert_eq!(samples.len() as u64, expected_samples);

    let mono = to_mono(&samples, spec.channels).expect("mixdown should succeed");
    let report = analyze_tone(&mono, spec.sample_rate).expect("analysis should succeed");

    assert!(
        (report.dominant_hz - 440.0).abs() <= report.resolution_hz,
        "Dominant {} Hz should be within one bin ({} Hz) of 440 Hz",
        report.dominant_hz,
        report.resolution_hz
    );
    assert!(report.peak_to_rest_db.is_finite());
    assert_eq!(report.harmonics.len(), 5);
    assert!(
        report.harmonics[0].magnitude > report.harmonics[4].magnitude * 10.0,
        "A sine capture should carry no real harmonic content"
    );
}

#[test]
fn captured_file_matches_the_rendered_samples() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("bitexact.wav");

    capture_one_second(&path);
    let (samples, _) = read_float_wav(&path);

    let mut reference = SineOscillator::new(440.0, SAMPLE_RATE, 0.2);
    let mut expected = vec![0.0f32; samples.len()];
    reference.fill_interleaved(&mut expected, CHANNELS);

    assert_eq!(
        samples, expected,
        "The capture path must be bit-exact, not merely tone-alike"
    );
}
