use crate::config::AudioSourceKind;
use crate::error::EngineError;
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::HeapRb;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Normalized per-tick band snapshot. Every field is clamped to [0, 1]
/// regardless of input signal amplitude; consumers keep no history here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioMetrics {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub volume: f32,
    pub overall: f32,
}

impl AudioMetrics {
    pub fn clamped(self) -> Self {
        Self {
            bass: self.bass.clamp(0.0, 1.0),
            mid: self.mid.clamp(0.0, 1.0),
            treble: self.treble.clamp(0.0, 1.0),
            volume: self.volume.clamp(0.0, 1.0),
            overall: self.overall.clamp(0.0, 1.0),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.bass == 0.0
            && self.mid == 0.0
            && self.treble == 0.0
            && self.volume == 0.0
            && self.overall == 0.0
    }
}

/// Seqlock-published metrics: the analyzer thread stores, the render tick
/// loads without ever blocking on the audio subsystem.
pub struct AtomicMetrics {
    seq: AtomicU64,
    bass: AtomicU32,
    mid: AtomicU32,
    treble: AtomicU32,
    volume: AtomicU32,
    overall: AtomicU32,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            bass: AtomicU32::new(0),
            mid: AtomicU32::new(0),
            treble: AtomicU32::new(0),
            volume: AtomicU32::new(0),
            overall: AtomicU32::new(0),
        }
    }

    pub fn store(&self, m: AudioMetrics) {
        let m = m.clamped();
        self.seq.fetch_add(1, Ordering::Release); // odd => write in progress
        self.bass.store(m.bass.to_bits(), Ordering::Relaxed);
        self.mid.store(m.mid.to_bits(), Ordering::Relaxed);
        self.treble.store(m.treble.to_bits(), Ordering::Relaxed);
        self.volume.store(m.volume.to_bits(), Ordering::Relaxed);
        self.overall.store(m.overall.to_bits(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    pub fn load(&self) -> AudioMetrics {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                continue;
            }
            let m = AudioMetrics {
                bass: f32::from_bits(self.bass.load(Ordering::Relaxed)),
                mid: f32::from_bits(self.mid.load(Ordering::Relaxed)),
                treble: f32::from_bits(self.treble.load(Ordering::Relaxed)),
                volume: f32::from_bits(self.volume.load(Ordering::Relaxed)),
                overall: f32::from_bits(self.overall.load(Ordering::Relaxed)),
            };
            let v2 = self.seq.load(Ordering::Acquire);
            if v1 == v2 {
                return m;
            }
        }
    }
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed analysis window; hop keeps latency low without starving the FFT.
pub const FFT_WINDOW: usize = 1024;
const FFT_HOP: usize = 256;

/// Band split over the magnitude array, ascending frequency:
/// bass [0, 0.10), mid [0.10, 0.40), treble [0.40, 1.0).
const BASS_END: f32 = 0.10;
const MID_END: f32 = 0.40;

// Full-scale reference for Hann-windowed magnitudes. A 0 dBFS sine lands
// near n/4; using n/8 keeps typical program material lively, and the
// clamp guarantees the [0,1] law either way.
fn magnitude_full_scale(half: usize) -> f32 {
    (half as f32 / 4.0).max(1.0)
}

/// Derive one metrics snapshot from a magnitude array and the matching
/// time-domain window. Pure; exposed for the analysis test suite.
pub fn compute_metrics(mags: &[f32], window: &[f32]) -> AudioMetrics {
    if mags.is_empty() {
        return AudioMetrics::default();
    }
    let half = mags.len();
    let full_scale = magnitude_full_scale(half);

    let bass_end = ((half as f32 * BASS_END) as usize).max(1);
    let mid_end = ((half as f32 * MID_END) as usize).max(bass_end + 1).min(half);

    let band_mean = |range: std::ops::Range<usize>| -> f32 {
        let count = range.len().max(1) as f32;
        let sum: f32 = mags[range].iter().sum();
        (sum / count / full_scale).clamp(0.0, 1.0)
    };

    let bass = band_mean(0..bass_end);
    let mid = band_mean(bass_end..mid_end);
    let treble = band_mean(mid_end..half);

    // Mean absolute deviation from the zero midpoint, scaled so a
    // full-scale sine reads ~1.0.
    let volume = if window.is_empty() {
        0.0
    } else {
        let mad = window.iter().map(|s| s.abs()).sum::<f32>() / window.len() as f32;
        (mad * PI / 2.0).clamp(0.0, 1.0)
    };

    let overall = ((bass + mid + treble) / 3.0).clamp(0.0, 1.0);

    AudioMetrics { bass, mid, treble, volume, overall }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

struct CaptureBackend {
    // Stream must stay alive for the duration of the capture.
    _stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    analyzer: Option<thread::JoinHandle<()>>,
}

impl Drop for CaptureBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer.take() {
            let _ = h.join();
        }
    }
}

/// Converts a live audio source into normalized band metrics. Construction
/// never fails; without a connected backend `sample()` returns zeros so
/// presets render silently instead of crashing.
pub struct AudioPipeline {
    metrics: Arc<AtomicMetrics>,
    backend: Option<CaptureBackend>,
}

impl AudioPipeline {
    pub fn new() -> Self {
        Self { metrics: Arc::new(AtomicMetrics::new()), backend: None }
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// Best-effort, idempotent-safe connect. `AudioSourceKind::None` leaves
    /// the pipeline unconnected on purpose; a capture failure reports
    /// `AudioUnavailable` and leaves metrics at zero.
    pub fn connect(
        &mut self,
        source: AudioSourceKind,
        device_query: Option<&str>,
    ) -> Result<(), EngineError> {
        if self.backend.is_some() || source == AudioSourceKind::None {
            return Ok(());
        }
        match start_capture(device_query, Arc::clone(&self.metrics)) {
            Ok(backend) => {
                self.backend = Some(backend);
                Ok(())
            }
            Err(e) => {
                log::warn!("audio connect failed, metrics stay zero: {e:#}");
                Err(EngineError::AudioUnavailable { reason: format!("{e:#}") })
            }
        }
    }

    /// Non-blocking snapshot of the most recent analysis frame.
    pub fn sample(&self) -> AudioMetrics {
        self.metrics.load()
    }

    pub fn metrics_handle(&self) -> Arc<AtomicMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Default for AudioPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn start_capture(
    device_query: Option<&str>,
    metrics: Arc<AtomicMetrics>,
) -> anyhow::Result<CaptureBackend> {
    let host = cpal::default_host();
    let device = select_input_device(&host, device_query)?;
    let supported = device.default_input_config().context("get default input config")?;
    let sample_rate_hz = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.clone().into();

    let rb = HeapRb::<f32>::new((sample_rate_hz as usize).saturating_mul(4));
    let (mut prod, mut cons) = rb.split();

    let stop = Arc::new(AtomicBool::new(false));
    let stop_for_thread = Arc::clone(&stop);

    let err_fn = |err| log::warn!("audio stream error: {err}");

    let stream = match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        fmt => anyhow::bail!("unsupported sample format: {fmt:?}"),
    };

    stream.play().context("start input stream")?;

    let analyzer = thread::spawn(move || analyze_loop(&mut cons, &stop_for_thread, &metrics));

    Ok(CaptureBackend { _stream: stream, stop, analyzer: Some(analyzer) })
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    if let Some(want) = device_query.map(|s| s.to_lowercase()) {
        if let Some(dev) = devices.iter().find(|d| {
            d.name().map(|n| n.to_lowercase().contains(&want)).unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        anyhow::bail!("no input device matching: {want}");
    }

    host.default_input_device()
        .ok_or_else(|| anyhow::anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels.max(1)) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels.max(1) as f32;
        let _ = prod.try_push(mono);
    }
}

fn analyze_loop(cons: &mut ringbuf::HeapCons<f32>, stop: &AtomicBool, metrics: &AtomicMetrics) {
    let n = FFT_WINDOW;
    let hop = FFT_HOP;

    let mut scratch = vec![0.0f32; n];
    let mut linear = vec![0.0f32; n];
    let mut write_pos = 0usize;
    let mut filled = 0usize;
    let mut since_last = 0usize;

    let hann = (0..n)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (n as f32)).cos())
        .collect::<Vec<_>>();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut fft_buf = vec![Complex { re: 0.0, im: 0.0 }; n];
    let mut mags = vec![0.0f32; n / 2];

    let mut smoothed = AudioMetrics::default();

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            scratch[write_pos] = s;
            write_pos = (write_pos + 1) % n;
            if filled < n {
                filled += 1;
            }
            since_last += 1;
            if filled == n && since_last >= hop {
                since_last = 0;

                for (i, dst) in linear.iter_mut().enumerate() {
                    *dst = scratch[(write_pos + i) % n];
                }
                for (i, c) in fft_buf.iter_mut().enumerate() {
                    c.re = linear[i] * hann[i];
                    c.im = 0.0;
                }
                fft.process(&mut fft_buf);
                for (i, m) in mags.iter_mut().enumerate() {
                    let c = fft_buf[i];
                    *m = (c.re * c.re + c.im * c.im).sqrt();
                }

                let raw = compute_metrics(&mags, &linear);
                smoothed = AudioMetrics {
                    bass: smoothed.bass * 0.8 + raw.bass * 0.2,
                    mid: smoothed.mid * 0.8 + raw.mid * 0.2,
                    treble: smoothed.treble * 0.8 + raw.treble * 0.2,
                    volume: smoothed.volume * 0.8 + raw.volume * 0.2,
                    overall: smoothed.overall * 0.8 + raw.overall * 0.2,
                };
                metrics.store(smoothed);
            }
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
