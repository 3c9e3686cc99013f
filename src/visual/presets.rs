//! The ten built-in render entries, one per effect family.
//!
//! Every entry must draw a sensible frame when the metrics snapshot is all
//! zero; silence renders as a calm baseline, never a blank screen or an
//! error.

use super::{hsv_to_rgb, Preset, PresetEnv};
use crate::assets::{placeholder_tile, Tile, TileLibrary, TilePoll};
use crate::audio::AudioMetrics;
use crate::effects::feedback::EchoParams;
use crate::effects::prng::hash_noise;
use crate::effects::{
    DeterministicPrng, Emitter, FeedbackCompositor, ParticleSystem, ShaderPipeline, ShaderProgram,
    Uniforms,
};
use crate::error::EngineError;
use crate::registry::EffectFamily;
use crate::surface::PixelContext;

fn uniforms(t: f32, m: &AudioMetrics, w: usize, h: usize) -> Uniforms {
    Uniforms {
        time: t,
        bass: m.bass,
        mid: m.mid,
        treble: m.treble,
        volume: m.volume,
        width: w as f32,
        height: h as f32,
    }
}

// ---------------------------------------------------------------- waveform

pub struct PulseWave {
    phase_seed: u32,
}

pub fn waveform_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    Box::new(PulseWave { phase_seed: env.seed as u32 })
}

impl Preset for PulseWave {
    fn name(&self) -> &str {
        "Pulse Wave"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Waveform
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        ctx.fade(0.18);
        let mid_y = h as f32 / 2.0;
        // Silence keeps a visible carrier wave; audio scales it up.
        let amp = mid_y * (0.15 + 0.65 * (m.bass * 0.7 + m.volume * 0.3));
        for x in 0..w {
            let fx = x as f32 / w.max(1) as f32;
            let carrier = (fx * std::f32::consts::TAU * 3.0 + t * 2.2).sin();
            let ripple = (fx * std::f32::consts::TAU * 11.0 - t * 5.0).sin() * m.treble;
            let jitter = (hash_noise(fx, t.floor(), self.phase_seed) - 0.5) * m.mid * 0.4;
            let y = mid_y + (carrier * 0.8 + ripple * 0.3 + jitter) * amp;
            let hue = 0.55 + fx * 0.25 + m.mid * 0.1;
            let rgb = hsv_to_rgb(hue, 0.8, 0.5 + 0.5 * m.volume.max(0.3));
            let yi = y.clamp(0.0, h.saturating_sub(1) as f32) as usize;
            ctx.put(x, yi, rgb);
            if yi + 1 < h {
                ctx.put(x, yi + 1, rgb);
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------- bars

pub struct SpectrumTowers {
    seed: u32,
    smoothed: Vec<f32>,
}

pub fn bars_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    Box::new(SpectrumTowers { seed: env.seed as u32, smoothed: Vec::new() })
}

impl Preset for SpectrumTowers {
    fn name(&self) -> &str {
        "Spectrum Towers"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Bars
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        ctx.clear();
        let bars = (w / 4).clamp(4, 48);
        if self.smoothed.len() != bars {
            self.smoothed = vec![0.0; bars];
        }
        let bar_w = w / bars;
        for b in 0..bars {
            let pos = b as f32 / (bars - 1).max(1) as f32;
            // Interpolate the three bands across the row.
            let band = if pos < 0.5 {
                m.bass * (1.0 - pos * 2.0) + m.mid * (pos * 2.0)
            } else {
                m.mid * (2.0 - pos * 2.0) + m.treble * (pos * 2.0 - 1.0)
            };
            let shimmer = hash_noise(pos * 7.0, t * 0.8, self.seed) * 0.12;
            let target = (band + shimmer + 0.04).clamp(0.0, 1.0);
            // Fast attack, slow release.
            let s = &mut self.smoothed[b];
            *s = if target > *s { target } else { *s * 0.88 + target * 0.12 };

            let height = ((*s * h as f32) as usize).clamp(1, h);
            let x0 = b * bar_w;
            for y in 0..height {
                let frac = y as f32 / h as f32;
                let rgb = hsv_to_rgb(0.33 - frac * 0.33, 0.9, 0.35 + 0.65 * frac.max(*s * 0.5));
                ctx.fill_rect(x0, h - 1 - y, bar_w.saturating_sub(1).max(1), 1, rgb);
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------------ plasma

fn plasma_kernel(u: &Uniforms, x: f32, y: f32) -> [f32; 3] {
    let t = u.time;
    let v = (x * 3.0 + t).sin()
        + (y * 4.0 - t * 1.3).sin()
        + ((x * x + y * y).sqrt() * (5.0 + u.bass * 6.0) - t * 2.0).sin()
        + ((x + y) * (2.5 + u.mid * 4.0) + t * 0.7).sin();
    let v = v / 4.0;
    [
        (0.5 + 0.5 * (std::f32::consts::PI * v).sin()).powf(1.2),
        0.5 + 0.5 * (std::f32::consts::PI * v + 2.1 + u.treble * 2.0).sin(),
        0.5 + 0.5 * (std::f32::consts::PI * v + 4.2).sin(),
    ]
}

fn plasma_fallback(u: &Uniforms, x: f32, y: f32) -> [f32; 3] {
    // Cheaper two-term version for the 2D path.
    let v = ((x * 3.0 + u.time).sin() + (y * 3.0 - u.time).sin()) * 0.5;
    let b = 0.5 + 0.5 * v;
    [b * (0.4 + u.bass * 0.6), b * 0.3, b]
}

pub struct PlasmaStorm {
    pipeline: ShaderPipeline,
}

pub fn plasma_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    let program = ShaderProgram {
        name: "plasma_storm",
        entry: "plasma_main",
        uniforms: &["time", "bass", "mid", "treble"],
        kernel: plasma_kernel,
    };
    Box::new(PlasmaStorm { pipeline: ShaderPipeline::new(program, plasma_fallback, &env.caps) })
}

impl Preset for PlasmaStorm {
    fn name(&self) -> &str {
        "Plasma Storm"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Plasma
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        self.pipeline.ensure_size(w, h);
        let u = uniforms(t, m, w, h);
        let frame = self.pipeline.render(&u);
        ctx.blit(frame);
        Ok(())
    }

    fn on_resize(&mut self, w: usize, h: usize) {
        self.pipeline.ensure_size(w, h);
    }
}

// -------------------------------------------------------------- spirograph

pub struct SpirographBloom {
    ratio: f32,
    pen: f32,
    hue0: f32,
}

pub fn spirograph_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    let mut rng = DeterministicPrng::with_seed(env.seed).fork(0x5159);
    Box::new(SpirographBloom {
        ratio: rng.range_f32(2.0, 6.0).round(),
        pen: rng.range_f32(0.4, 0.9),
        hue0: rng.next_f32(),
    })
}

impl Preset for SpirographBloom {
    fn name(&self) -> &str {
        "Spirograph Bloom"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Spirograph
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        ctx.fade(0.06);
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let scale = w.min(h) as f32 * (0.30 + 0.15 * m.bass);
        let k = self.ratio + (m.mid * 3.0).round();
        let steps = 420;
        let window = 1.4 + m.volume * 2.0;
        for i in 0..steps {
            let u = t * 0.35 + (i as f32 / steps as f32) * window;
            let x = ((k - 1.0) * u).cos() + self.pen * ((k - 1.0) * u * k).cos();
            let y = ((k - 1.0) * u).sin() - self.pen * ((k - 1.0) * u * k).sin();
            let px = cx + x * scale * 0.5;
            let py = cy + y * scale * 0.5;
            if px < 0.0 || py < 0.0 {
                continue;
            }
            let hue = self.hue0 + u * 0.05 + m.treble * 0.2;
            let fadein = i as f32 / steps as f32;
            ctx.add(px as usize, py as usize, hsv_to_rgb(hue, 0.75, 0.25 + 0.6 * fadein));
        }
        Ok(())
    }
}

// --------------------------------------------------------------- flowfield

pub struct LiquidEcho {
    fb: FeedbackCompositor,
    seeds: Vec<(f32, f32)>,
    rng: DeterministicPrng,
    noise_seed: u32,
}

pub fn flowfield_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    Box::new(LiquidEcho {
        fb: FeedbackCompositor::new(0, 0),
        seeds: Vec::new(),
        rng: DeterministicPrng::with_seed(env.seed).fork(0xF10),
        noise_seed: env.seed as u32 ^ 0x00A1,
    })
}

impl Preset for LiquidEcho {
    fn name(&self) -> &str {
        "Liquid Echo"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::FlowField
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        self.fb.ensure_size(w, h);
        if self.seeds.len() != 64 {
            self.seeds = (0..64)
                .map(|_| (self.rng.range_f32(0.0, w as f32), self.rng.range_f32(0.0, h as f32)))
                .collect();
        }

        self.fb.step(EchoParams {
            decay: 0.93,
            zoom: 1.008 + m.bass * 0.02,
            rotation: (m.mid - 0.05) * 0.06,
        });

        let drift = 1.0 + m.volume * 4.0;
        for i in 0..self.seeds.len() {
            let (x, y) = self.seeds[i];
            let angle = hash_noise(x / w.max(1) as f32 * 4.0, y / h.max(1) as f32 * 4.0, self.noise_seed)
                * std::f32::consts::TAU
                + t * 0.3;
            let nx = (x + angle.cos() * drift).rem_euclid(w.max(1) as f32);
            let ny = (y + angle.sin() * drift).rem_euclid(h.max(1) as f32);
            self.seeds[i] = (nx, ny);
            let hue = 0.5 + angle / std::f32::consts::TAU * 0.2 + m.treble * 0.15;
            self.fb.deposit(nx as usize, ny as usize, hsv_to_rgb(hue, 0.7, 0.8));
        }

        ctx.blit(self.fb.frame());
        Ok(())
    }

    fn on_resize(&mut self, w: usize, h: usize) {
        self.fb.ensure_size(w, h);
        self.seeds.clear();
    }
}

// -------------------------------------------------------------- matrixrain

pub struct GlyphRain {
    heads: Vec<f32>,
    seed: u32,
}

pub fn matrixrain_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    Box::new(GlyphRain { heads: Vec::new(), seed: env.seed as u32 ^ 0x4D52 })
}

impl Preset for GlyphRain {
    fn name(&self) -> &str {
        "Glyph Rain"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::MatrixRain
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        ctx.fade(0.12);
        if self.heads.len() != w {
            // Deterministic per-column start offsets so a resize does not
            // synchronize all the drops.
            self.heads = (0..w)
                .map(|x| hash_noise(x as f32, 0.0, self.seed) * h as f32)
                .collect();
        }
        let hf = h as f32;
        for x in 0..w {
            let col_speed = 0.4 + 1.2 * hash_noise(x as f32, 1.7, self.seed);
            let speed = col_speed * (0.35 + m.treble * 1.4 + m.volume * 0.5) * hf * 0.02;
            self.heads[x] = (self.heads[x] + speed).rem_euclid(hf + 24.0);
            let head = self.heads[x];
            let trail = 8.0 + m.mid * 24.0;
            for d in 0..trail as usize {
                let y = head - d as f32;
                if y < 0.0 || y >= hf {
                    continue;
                }
                let bright = 1.0 - d as f32 / trail;
                let flicker = hash_noise(x as f32, (y + t * 7.0).floor(), self.seed);
                let g = (bright * (140.0 + 110.0 * flicker)) as u8;
                let rgb = if d == 0 { [210, 255, 210] } else { [(g / 5), g, (g / 3)] };
                ctx.put(x, y as usize, rgb);
            }
        }
        Ok(())
    }

    fn on_resize(&mut self, _w: usize, _h: usize) {
        self.heads.clear();
    }
}

// --------------------------------------------------------------- particles

pub struct EmberBurst {
    system: ParticleSystem,
    rng: DeterministicPrng,
    last_t: f32,
}

pub fn particles_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    Box::new(EmberBurst {
        system: ParticleSystem::new(2048),
        rng: DeterministicPrng::with_seed(env.seed).fork(0xE4B),
        last_t: 0.0,
    })
}

impl Preset for EmberBurst {
    fn name(&self) -> &str {
        "Ember Burst"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Particles
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        let dt = (t - self.last_t).clamp(0.0, 0.1);
        self.last_t = t;
        ctx.fade(0.22);

        let hearth = Emitter {
            x: w as f32 / 2.0,
            y: h as f32 * 0.9,
            rate: 10.0,
            speed: h as f32 * 0.5,
            life: 1.6,
            size: 1.5 + m.bass * 2.0,
            color: [255, 150, 40],
        };
        // Idle embers keep the hearth visibly lit.
        self.system.emit(&hearth, (0.12 + m.bass).min(1.0), &mut self.rng);

        if m.treble > 0.4 {
            let spark = Emitter {
                x: self.rng.range_f32(0.2, 0.8) * w as f32,
                y: h as f32 * 0.5,
                rate: 14.0,
                speed: h as f32 * 0.3,
                life: 0.7,
                size: 1.0,
                color: [180, 220, 255],
            };
            self.system.emit(&spark, m.treble, &mut self.rng);
        }

        self.system.update(dt.max(1.0 / 120.0), h as f32 * 0.25);
        self.system.draw(ctx);
        Ok(())
    }
}

// --------------------------------------------------------------- starfield

struct Star {
    x: f32,
    y: f32,
    z: f32,
}

pub struct Starfall {
    stars: Vec<Star>,
    rng: DeterministicPrng,
    last_t: f32,
}

pub fn starfield_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    let mut rng = DeterministicPrng::with_seed(env.seed).fork(0x57A2);
    let stars = (0..200)
        .map(|_| Star {
            x: rng.range_f32(-1.0, 1.0),
            y: rng.range_f32(-1.0, 1.0),
            z: rng.range_f32(0.05, 1.0),
        })
        .collect();
    Box::new(Starfall { stars, rng, last_t: 0.0 })
}

impl Preset for Starfall {
    fn name(&self) -> &str {
        "Starfall"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Starfield
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        let dt = (t - self.last_t).clamp(0.0, 0.1).max(1.0 / 120.0);
        self.last_t = t;
        ctx.fade(0.3);
        let speed = 0.25 + m.volume * 1.8 + m.bass * 0.8;
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        for s in &mut self.stars {
            s.z -= speed * dt * 0.4;
            if s.z <= 0.02 {
                s.x = self.rng.range_f32(-1.0, 1.0);
                s.y = self.rng.range_f32(-1.0, 1.0);
                s.z = 1.0;
            }
            let px = cx + s.x / s.z * cx * 0.9;
            let py = cy + s.y / s.z * cy * 0.9;
            if px < 0.0 || py < 0.0 || px >= w as f32 || py >= h as f32 {
                continue;
            }
            let depth = (1.0 - s.z).clamp(0.0, 1.0);
            let b = (70.0 + 185.0 * depth) as u8;
            let tint = (m.treble * 80.0) as u8;
            ctx.put(px as usize, py as usize, [b, b, b.saturating_add(tint)]);
        }
        Ok(())
    }
}

// ------------------------------------------------------------ kaleidotunnel

fn tunnel_kernel(u: &Uniforms, x: f32, y: f32) -> [f32; 3] {
    let r = (x * x + y * y).sqrt().max(1e-3);
    let mut a = y.atan2(x);
    // Six-fold mirror wedge.
    let wedge = std::f32::consts::TAU / 6.0;
    a = (a.rem_euclid(wedge) - wedge / 2.0).abs();
    let depth = 1.0 / r + u.time * (1.2 + u.bass * 2.0);
    let rings = (depth * 3.0).sin() * 0.5 + 0.5;
    let spokes = (a * (10.0 + u.mid * 20.0) + u.time).sin() * 0.5 + 0.5;
    let glow = (1.0 - r).clamp(0.0, 1.0) * (0.3 + u.volume * 0.7);
    [
        rings * 0.7 + glow * 0.3,
        rings * spokes * 0.6 + u.treble * 0.3,
        spokes * 0.8 + glow * 0.2,
    ]
}

fn tunnel_fallback(u: &Uniforms, x: f32, y: f32) -> [f32; 3] {
    let r = (x * x + y * y).sqrt().max(1e-3);
    let rings = ((1.0 / r + u.time * 1.2) * 3.0).sin() * 0.5 + 0.5;
    [rings * 0.6, rings * 0.3, rings * 0.8]
}

pub struct MirrorTunnel {
    pipeline: ShaderPipeline,
}

pub fn kaleidotunnel_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    let program = ShaderProgram {
        name: "mirror_tunnel",
        entry: "tunnel_main",
        uniforms: &["time", "bass", "mid", "treble", "volume"],
        kernel: tunnel_kernel,
    };
    Box::new(MirrorTunnel { pipeline: ShaderPipeline::new(program, tunnel_fallback, &env.caps) })
}

impl Preset for MirrorTunnel {
    fn name(&self) -> &str {
        "Mirror Tunnel"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::KaleidoTunnel
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        self.pipeline.ensure_size(w, h);
        let u = uniforms(t, m, w, h);
        let frame = self.pipeline.render(&u);
        ctx.blit(frame);
        Ok(())
    }

    fn on_resize(&mut self, w: usize, h: usize) {
        self.pipeline.ensure_size(w, h);
    }
}

// ----------------------------------------------------------------- collage

pub struct TileDrift {
    library: TileLibrary,
    placeholder: Tile,
    rng_seed: u64,
}

pub fn collage_ctor(env: &PresetEnv) -> Box<dyn Preset> {
    let library = match &env.tiles_file {
        Some(path) => TileLibrary::load_async(path.clone()),
        None => TileLibrary::resolved(default_tiles(env.seed)),
    };
    Box::new(TileDrift { library, placeholder: placeholder_tile(), rng_seed: env.seed })
}

fn default_tiles(seed: u64) -> Vec<Tile> {
    let mut rng = DeterministicPrng::with_seed(seed).fork(0x711E);
    (0..6)
        .map(|i| {
            let hue = rng.next_f32();
            let top = hsv_to_rgb(hue, 0.7, 0.8);
            let bottom = hsv_to_rgb(hue + 0.12, 0.7, 0.3);
            let mut t = placeholder_tile();
            t.name = format!("gen{i}");
            for y in 0..t.h {
                let f = y as f32 / (t.h - 1) as f32;
                for x in 0..t.w {
                    let p = (y * t.w + x) * 4;
                    for c in 0..3 {
                        t.pixels[p + c] =
                            (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * f) as u8;
                    }
                }
            }
            t
        })
        .collect()
}

impl Preset for TileDrift {
    fn name(&self) -> &str {
        "Tile Drift"
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Collage
    }

    fn render(
        &mut self,
        ctx: &mut PixelContext,
        t: f32,
        m: &AudioMetrics,
    ) -> Result<(), EngineError> {
        let (w, h) = (ctx.width(), ctx.height());
        ctx.clear();

        let placeholder = std::slice::from_ref(&self.placeholder);
        let tiles: &[Tile] = match self.library.poll() {
            TilePoll::Ready(tiles) if !tiles.is_empty() => tiles,
            // Loading or failed: the placeholder keeps the grid moving.
            _ => placeholder,
        };

        let cell = (w.min(h) / 5).clamp(8, 64);
        let speed = cell as f32 * (0.4 + m.volume * 2.0);
        let rows = h / cell + 2;
        let cols = w / cell + 2;
        for row in 0..rows {
            // Alternate drift direction per row; bass widens the sway.
            let dir = if row % 2 == 0 { 1.0 } else { -1.0 };
            let row_jitter = hash_noise(row as f32, 3.3, self.rng_seed as u32);
            let offset = (t * speed * dir * (0.5 + row_jitter) + (1.0 + m.bass) * 10.0)
                .rem_euclid(cell as f32);
            for col in 0..cols {
                let pick = (crate::effects::mix32(
                    (row as u32) << 16 | col as u32 ^ self.rng_seed as u32,
                ) as usize)
                    % tiles.len();
                let tile = &tiles[pick];
                let x0 = (col * cell) as f32 - offset;
                let y0 = (row * cell) as f32;
                draw_tile(ctx, tile, x0 as i32, y0 as i32, cell);
            }
        }
        Ok(())
    }
}

fn draw_tile(ctx: &mut PixelContext, tile: &Tile, x0: i32, y0: i32, cell: usize) {
    for dy in 0..cell {
        for dx in 0..cell {
            let px = x0 + dx as i32;
            let py = y0 + dy as i32;
            if px < 0 || py < 0 {
                continue;
            }
            let sx = dx * tile.w / cell;
            let sy = dy * tile.h / cell;
            let i = (sy * tile.w + sx) * 4;
            if i + 2 < tile.pixels.len() {
                ctx.put(
                    px as usize,
                    py as usize,
                    [tile.pixels[i], tile.pixels[i + 1], tile.pixels[i + 2]],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::probe_runtime;
    use crate::config::{EngineMode, RendererMode};
    use crate::registry::{Bindings, EffectFamily};

    fn env() -> PresetEnv {
        PresetEnv {
            seed: 99,
            caps: probe_runtime(EngineMode::Cpu, RendererMode::Ascii, false),
            tiles_file: None,
        }
    }

    fn frame_energy(ctx: &PixelContext) -> u64 {
        ctx.pixels()
            .chunks_exact(4)
            .map(|px| px[0] as u64 + px[1] as u64 + px[2] as u64)
            .sum()
    }

    #[test]
    fn every_family_renders_on_silence() {
        let bindings = Bindings::default();
        let env = env();
        for family in EffectFamily::ALL {
            let ctor = bindings.get(family).expect("family bound");
            let mut preset = ctor(&env);
            let mut ctx = PixelContext::new(96, 64);
            let silence = AudioMetrics::default();
            for step in 0..30 {
                preset
                    .render(&mut ctx, step as f32 / 30.0, &silence)
                    .unwrap_or_else(|e| panic!("{family} failed on silence: {e}"));
            }
            assert!(
                frame_energy(&ctx) > 0,
                "{family} drew a black frame on silence"
            );
        }
    }

    #[test]
    fn resize_between_frames_is_survivable() {
        let bindings = Bindings::default();
        let env = env();
        for family in EffectFamily::ALL {
            let ctor = bindings.get(family).expect("family bound");
            let mut preset = ctor(&env);
            let mut ctx = PixelContext::new(64, 48);
            let m = AudioMetrics { bass: 0.5, mid: 0.5, treble: 0.5, volume: 0.5, overall: 0.5 };
            preset.render(&mut ctx, 0.1, &m).expect("first frame");
            ctx.resize(40, 90);
            preset.on_resize(40, 90);
            preset.render(&mut ctx, 0.2, &m).expect("frame after resize");
        }
    }

    #[test]
    fn collage_paints_placeholder_while_loading() {
        let env = PresetEnv {
            seed: 5,
            caps: probe_runtime(EngineMode::Cpu, RendererMode::Ascii, false),
            tiles_file: Some(std::path::PathBuf::from("/nonexistent/tiles.conf")),
        };
        let mut preset = collage_ctor(&env);
        let mut ctx = PixelContext::new(80, 60);
        preset.render(&mut ctx, 0.0, &AudioMetrics::default()).expect("placeholder frame");
        assert!(frame_energy(&ctx) > 0, "placeholder grid must be visible");
    }

    #[test]
    fn same_seed_gives_identical_spirograph_frames() {
        let env = env();
        let m = AudioMetrics::default();
        let mut a = spirograph_ctor(&env);
        let mut b = spirograph_ctor(&env);
        let mut ca = PixelContext::new(64, 64);
        let mut cb = PixelContext::new(64, 64);
        a.render(&mut ca, 0.5, &m).expect("render a");
        b.render(&mut cb, 0.5, &m).expect("render b");
        assert_eq!(ca.pixels(), cb.pixels());
    }
}
