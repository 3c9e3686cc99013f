//! End-to-end checks on the analysis math: synthesized signals through a
//! real FFT into `compute_metrics`, verifying the band policy and the
//! clamping law.

use pulseviz::audio::{compute_metrics, FFT_WINDOW};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::TAU;

fn sine(freq_bins: f32, n: usize) -> Vec<f32> {
    (0..n).map(|i| (TAU * freq_bins * i as f32 / n as f32).sin()).collect()
}

/// Hann window + forward FFT, returning (magnitudes, windowed samples) the
/// way the live analyzer feeds `compute_metrics`.
fn spectrum_of(signal: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = signal.len();
    let windowed: Vec<f32> = signal
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 - 0.5 * (TAU * i as f32 / (n - 1) as f32).cos();
            s * w
        })
        .collect();
    let mut buf: Vec<Complex<f32>> = windowed.iter().map(|&s| Complex::new(s, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buf);
    let mags = buf[..n / 2].iter().map(|c| c.norm()).collect();
    (mags, windowed)
}

fn in_unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

#[test]
fn silence_yields_all_zero_metrics() {
    let m = compute_metrics(&vec![0.0; FFT_WINDOW / 2], &vec![0.0; FFT_WINDOW]);
    assert!(m.is_silent(), "silence must produce zero metrics, got {m:?}");
}

#[test]
fn empty_spectrum_is_handled() {
    let m = compute_metrics(&[], &[]);
    assert!(m.is_silent());
}

#[test]
fn low_frequency_tone_lands_in_bass() {
    let (mags, windowed) = spectrum_of(&sine(10.0, FFT_WINDOW));
    let m = compute_metrics(&mags, &windowed);
    assert!(m.bass > m.mid, "bass {} should beat mid {}", m.bass, m.mid);
    assert!(m.bass > m.treble, "bass {} should beat treble {}", m.bass, m.treble);
    assert!(m.bass > 0.05, "a clean tone must register: {m:?}");
}

#[test]
fn midrange_tone_lands_in_mid() {
    // Half = 512 bins; the mid band spans [51, 204).
    let (mags, windowed) = spectrum_of(&sine(120.0, FFT_WINDOW));
    let m = compute_metrics(&mags, &windowed);
    assert!(m.mid > m.bass && m.mid > m.treble, "mid should dominate: {m:?}");
}

#[test]
fn high_frequency_tone_lands_in_treble() {
    let (mags, windowed) = spectrum_of(&sine(350.0, FFT_WINDOW));
    let m = compute_metrics(&mags, &windowed);
    assert!(m.treble > m.bass && m.treble > m.mid, "treble should dominate: {m:?}");
}

#[test]
fn every_field_respects_the_unit_clamp_under_extreme_input() {
    let mags = vec![1e12; FFT_WINDOW / 2];
    let windowed = vec![1e6; FFT_WINDOW];
    let m = compute_metrics(&mags, &windowed);
    for (name, v) in [
        ("bass", m.bass),
        ("mid", m.mid),
        ("treble", m.treble),
        ("volume", m.volume),
        ("overall", m.overall),
    ] {
        assert!(in_unit(v), "{name} escaped [0,1]: {v}");
    }
    assert_eq!(m.volume, 1.0, "an absurd signal should pin volume at the clamp");
}

#[test]
fn overall_is_the_mean_of_the_three_bands() {
    let (mags, windowed) = spectrum_of(&sine(60.0, FFT_WINDOW));
    let m = compute_metrics(&mags, &windowed);
    let expected = (m.bass + m.mid + m.treble) / 3.0;
    assert!((m.overall - expected).abs() < 1e-6, "{} vs {expected}", m.overall);
}

#[test]
fn full_scale_sine_reads_near_full_volume() {
    // Mean |sin| is 2/pi; the pi/2 scale maps that to 1.0. Pass the raw
    // signal as the time-domain window to isolate the volume rule.
    let signal = sine(50.0, FFT_WINDOW);
    let (mags, _) = spectrum_of(&signal);
    let m = compute_metrics(&mags, &signal);
    assert!(m.volume > 0.9, "full-scale sine should read near 1.0: {}", m.volume);
}
