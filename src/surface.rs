use crate::error::EngineError;
use std::io::IsTerminal;

/// How the surface should be obtained. Mirrors the search order of the
/// acquisition chain: explicit dimensions win, then the live terminal,
/// then well-known environment hints, then headless fallback creation.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub explicit: Option<(usize, usize)>,
    pub allow_terminal_probe: bool,
    pub allow_env_probe: bool,
    /// `None` disables headless creation entirely, making acquisition
    /// failable when no terminal is present.
    pub fallback_size: Option<(usize, usize)>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            explicit: None,
            allow_terminal_probe: true,
            allow_env_probe: true,
            fallback_size: Some((160, 96)),
        }
    }
}

/// Minimum usable surface; anything smaller cannot hold a frame plus HUD.
pub const MIN_WIDTH: usize = 4;
pub const MIN_HEIGHT: usize = 2;

pub struct SurfaceManager;

impl SurfaceManager {
    /// Walk the acquisition chain and return the first usable surface.
    /// Each failing step falls through to the next; if every step fails the
    /// engine must not start.
    pub fn acquire(cfg: &SurfaceConfig) -> Result<SurfaceHandle, EngineError> {
        let mut attempted = Vec::new();

        if let Some((w, h)) = cfg.explicit {
            if w >= MIN_WIDTH && h >= MIN_HEIGHT {
                return Ok(SurfaceHandle::new(w, h, SurfaceOrigin::Explicit));
            }
            attempted.push(format!("explicit {w}x{h} (below {MIN_WIDTH}x{MIN_HEIGHT})"));
        }

        if cfg.allow_terminal_probe {
            match terminal_pixel_size() {
                Some((w, h)) if w >= MIN_WIDTH && h >= MIN_HEIGHT => {
                    return Ok(SurfaceHandle::new(w, h, SurfaceOrigin::Terminal));
                }
                Some((w, h)) => attempted.push(format!("terminal {w}x{h} (too small)")),
                None => attempted.push("terminal (no tty)".to_string()),
            }
        }

        if cfg.allow_env_probe {
            match env_pixel_size() {
                Some((w, h)) if w >= MIN_WIDTH && h >= MIN_HEIGHT => {
                    return Ok(SurfaceHandle::new(w, h, SurfaceOrigin::Environment));
                }
                Some((w, h)) => attempted.push(format!("env {w}x{h} (too small)")),
                None => attempted.push("env COLUMNS/LINES (unset)".to_string()),
            }
        }

        if let Some((w, h)) = cfg.fallback_size {
            if w >= MIN_WIDTH && h >= MIN_HEIGHT {
                return Ok(SurfaceHandle::new(w, h, SurfaceOrigin::Fallback));
            }
            attempted.push(format!("fallback {w}x{h} (below {MIN_WIDTH}x{MIN_HEIGHT})"));
        } else {
            attempted.push("fallback (disabled)".to_string());
        }

        Err(EngineError::NoSurfaceAvailable { attempted })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOrigin {
    Explicit,
    Terminal,
    Environment,
    Fallback,
}

fn terminal_pixel_size() -> Option<(usize, usize)> {
    if !std::io::stdout().is_terminal() {
        return None;
    }
    let (cols, rows) = crossterm::terminal::size().ok()?;
    // Half-block cells carry two pixels vertically.
    Some((cols as usize, (rows as usize).saturating_mul(2)))
}

fn env_pixel_size() -> Option<(usize, usize)> {
    let cols = std::env::var("COLUMNS").ok()?.trim().parse::<usize>().ok()?;
    let lines = std::env::var("LINES").ok()?.trim().parse::<usize>().ok()?;
    Some((cols, lines.saturating_mul(2)))
}

/// Exclusive owner of the drawing context. Width/height change across the
/// handle's lifetime; renderers re-read them every tick.
#[derive(Debug)]
pub struct SurfaceHandle {
    ctx: PixelContext,
    origin: SurfaceOrigin,
}

impl SurfaceHandle {
    fn new(w: usize, h: usize, origin: SurfaceOrigin) -> Self {
        Self { ctx: PixelContext::new(w, h), origin }
    }

    pub fn origin(&self) -> SurfaceOrigin {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.ctx.width()
    }

    pub fn height(&self) -> usize {
        self.ctx.height()
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.ctx.resize(w, h);
    }

    pub fn context(&mut self) -> &mut PixelContext {
        &mut self.ctx
    }

    pub fn pixels(&self) -> &[u8] {
        self.ctx.pixels()
    }
}

/// RGBA8 draw target shared by every render entry point.
#[derive(Debug)]
pub struct PixelContext {
    buf: Vec<u8>,
    w: usize,
    h: usize,
}

impl PixelContext {
    pub fn new(w: usize, h: usize) -> Self {
        let mut ctx = Self { buf: Vec::new(), w: 0, h: 0 };
        ctx.resize(w, h);
        ctx
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.buf.clear();
        self.buf.resize(n, 0);
    }

    pub fn pixels(&self) -> &[u8] {
        &self.buf
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub fn clear(&mut self) {
        self.buf.fill(0);
        for px in self.buf.chunks_exact_mut(4) {
            px[3] = 255;
        }
    }

    /// Low-alpha black overlay; the trail convention most presets use
    /// instead of a hard clear.
    pub fn fade(&mut self, alpha: f32) {
        let keep = (1.0 - alpha.clamp(0.0, 1.0)).max(0.0);
        for px in self.buf.chunks_exact_mut(4) {
            px[0] = (px[0] as f32 * keep) as u8;
            px[1] = (px[1] as f32 * keep) as u8;
            px[2] = (px[2] as f32 * keep) as u8;
            px[3] = 255;
        }
    }

    pub fn put(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = (y * self.w + x) * 4;
        self.buf[i] = rgb[0];
        self.buf[i + 1] = rgb[1];
        self.buf[i + 2] = rgb[2];
        self.buf[i + 3] = 255;
    }

    /// Saturating additive blend, the glow idiom for particles.
    pub fn add(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = (y * self.w + x) * 4;
        self.buf[i] = self.buf[i].saturating_add(rgb[0]);
        self.buf[i + 1] = self.buf[i + 1].saturating_add(rgb[1]);
        self.buf[i + 2] = self.buf[i + 2].saturating_add(rgb[2]);
        self.buf[i + 3] = 255;
    }

    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        if x >= self.w || y >= self.h {
            return [0, 0, 0];
        }
        let i = (y * self.w + x) * 4;
        [self.buf[i], self.buf[i + 1], self.buf[i + 2]]
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, rw: usize, rh: usize, rgb: [u8; 3]) {
        let x1 = (x + rw).min(self.w);
        let y1 = (y + rh).min(self.h);
        for py in y.min(self.h)..y1 {
            for px in x.min(self.w)..x1 {
                let i = (py * self.w + px) * 4;
                self.buf[i] = rgb[0];
                self.buf[i + 1] = rgb[1];
                self.buf[i + 2] = rgb[2];
                self.buf[i + 3] = 255;
            }
        }
    }

    /// Bilinear sample in centered normalized coordinates (x, y in [-1, 1]);
    /// out-of-range reads return black.
    pub fn sample(&self, nx: f32, ny: f32) -> [u8; 3] {
        sample_rgb(&self.buf, self.w, self.h, nx, ny)
    }

    /// Copy another buffer of identical dimensions over this context.
    pub fn blit(&mut self, src: &[u8]) {
        if src.len() == self.buf.len() {
            self.buf.copy_from_slice(src);
        }
    }
}

/// Bilinear RGB sample from a raw RGBA frame in centered coordinates.
pub fn sample_rgb(buf: &[u8], w: usize, h: usize, nx: f32, ny: f32) -> [u8; 3] {
    if w == 0 || h == 0 || buf.len() < w * h * 4 {
        return [0, 0, 0];
    }
    let fx = (nx * 0.5 + 0.5) * (w as f32 - 1.0);
    let fy = (ny * 0.5 + 0.5) * (h as f32 - 1.0);
    if !fx.is_finite() || !fy.is_finite() || fx < 0.0 || fy < 0.0 {
        return [0, 0, 0];
    }
    let x0 = fx as usize;
    let y0 = fy as usize;
    if x0 >= w || y0 >= h {
        return [0, 0, 0];
    }
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let at = |x: usize, y: usize, c: usize| buf[(y * w + x) * 4 + c] as f32;
    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - tx) + at(x1, y0, c) * tx;
        let bot = at(x0, y1, c) * (1.0 - tx) + at(x1, y1, c) * tx;
        *slot = (top * (1.0 - ty) + bot * ty) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_creation_succeeds_without_terminal() {
        let cfg = SurfaceConfig {
            explicit: None,
            allow_terminal_probe: false,
            allow_env_probe: false,
            fallback_size: Some((80, 48)),
        };
        let handle = SurfaceManager::acquire(&cfg).expect("fallback surface");
        assert_eq!(handle.origin(), SurfaceOrigin::Fallback);
        assert_eq!((handle.width(), handle.height()), (80, 48));
    }

    #[test]
    fn acquisition_fails_when_every_step_is_exhausted() {
        let cfg = SurfaceConfig {
            explicit: Some((1, 1)),
            allow_terminal_probe: false,
            allow_env_probe: false,
            fallback_size: None,
        };
        let err = SurfaceManager::acquire(&cfg).expect_err("must fail");
        assert!(matches!(err, EngineError::NoSurfaceAvailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn undersized_explicit_falls_through_to_fallback() {
        let cfg = SurfaceConfig {
            explicit: Some((2, 1)),
            allow_terminal_probe: false,
            allow_env_probe: false,
            fallback_size: Some((64, 32)),
        };
        let handle = SurfaceManager::acquire(&cfg).expect("fallback surface");
        assert_eq!(handle.origin(), SurfaceOrigin::Fallback);
    }

    #[test]
    fn fade_darkens_without_touching_alpha() {
        let mut ctx = PixelContext::new(4, 4);
        ctx.put(1, 1, [200, 100, 40]);
        ctx.fade(0.5);
        let px = ctx.get(1, 1);
        assert_eq!(px, [100, 50, 20]);
    }
}
