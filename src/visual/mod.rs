pub mod presets;

use crate::audio::AudioMetrics;
use crate::capability::CapabilityReport;
use crate::error::EngineError;
use crate::registry::{Bindings, EffectFamily};
use crate::surface::PixelContext;
use std::path::PathBuf;

/// Everything a render entry may capture at construction. Metrics are NOT
/// here; they arrive explicitly on every render call.
pub struct PresetEnv {
    pub seed: u64,
    pub caps: CapabilityReport,
    pub tiles_file: Option<PathBuf>,
}

pub type PresetCtor = fn(&PresetEnv) -> Box<dyn Preset>;

/// A render entry: owns its per-preset state (trails, pools, phase tables)
/// and draws one frame per call. State persists across preset switches; the
/// scheduler keeps instances alive and only notifies on resize.
pub trait Preset {
    fn name(&self) -> &str;

    fn family(&self) -> EffectFamily;

    /// Draw one frame at virtual time `t` from the given metrics snapshot.
    /// Must produce a valid frame for all-zero metrics. An error here is
    /// isolated by the scheduler; it never stops the animation.
    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        metrics: &AudioMetrics,
    ) -> Result<(), EngineError>;

    /// Surface size changed; drop anything surface-sized.
    fn on_resize(&mut self, _w: usize, _h: usize) {}
}

/// Family map for the ten built-in entries.
pub fn builtin_bindings() -> Bindings {
    let mut b = Bindings::new();
    b.register(EffectFamily::Waveform, presets::waveform_ctor);
    b.register(EffectFamily::Bars, presets::bars_ctor);
    b.register(EffectFamily::Plasma, presets::plasma_ctor);
    b.register(EffectFamily::Spirograph, presets::spirograph_ctor);
    b.register(EffectFamily::FlowField, presets::flowfield_ctor);
    b.register(EffectFamily::MatrixRain, presets::matrixrain_ctor);
    b.register(EffectFamily::Particles, presets::particles_ctor);
    b.register(EffectFamily::Starfield, presets::starfield_ctor);
    b.register(EffectFamily::KaleidoTunnel, presets::kaleidotunnel_ctor);
    b.register(EffectFamily::Collage, presets::collage_ctor);
    b
}

/// Neutral pulsing disc painted whenever the active preset fails. Keeps the
/// screen alive without depending on any preset state.
pub fn render_fallback_pulse(ctx: &mut PixelContext, t: f32, metrics: &AudioMetrics) {
    let (w, h) = (ctx.width(), ctx.height());
    if w == 0 || h == 0 {
        return;
    }
    ctx.fade(0.35);
    let pulse = 0.5 + 0.5 * (t * 2.0).sin();
    let energy = metrics.overall.clamp(0.0, 1.0);
    let radius = (w.min(h) as f32) * (0.12 + 0.10 * pulse + 0.15 * energy);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let shade = (90.0 + 120.0 * pulse) as u8;
    let rgb = [shade, shade / 2, (160.0 + 60.0 * energy) as u8];
    let r2 = radius * radius;
    let r = radius.ceil() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx * dx + dy * dy) as f32 > r2 {
                continue;
            }
            let (px, py) = (cx as i32 + dx, cy as i32 + dy);
            if px >= 0 && py >= 0 {
                ctx.put(px as usize, py as usize, rgb);
            }
        }
    }
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h as usize % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_pulse_paints_on_zero_metrics() {
        let mut ctx = PixelContext::new(64, 48);
        render_fallback_pulse(&mut ctx, 0.25, &AudioMetrics::default());
        let lit: u32 = ctx.pixels().iter().map(|&v| v as u32).sum();
        assert!(lit > 64 * 48, "fallback must visibly paint");
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), [0, 0, 255]);
    }
}
