use crate::surface::sample_rgb;

/// Ping-pong echo compositor: each step re-samples the previous frame with
/// decay, a slight zoom toward center, and a rotation proportional to audio
/// energy, producing persistent trails. Buffers are surface-sized and are
/// recreated, never reused, when the surface size changes.
pub struct FeedbackCompositor {
    front: Vec<u8>,
    back: Vec<u8>,
    w: usize,
    h: usize,
    generation: u64,
}

/// Per-step transform parameters; callers derive these from metrics.
#[derive(Debug, Clone, Copy)]
pub struct EchoParams {
    /// Opacity carried over from the previous frame, [0, 1].
    pub decay: f32,
    /// Scale-down factor per step (1.0 = none); values slightly above 1
    /// pull trails toward the center.
    pub zoom: f32,
    /// Radians per step; usually scaled by audio energy.
    pub rotation: f32,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self { decay: 0.92, zoom: 1.015, rotation: 0.0 }
    }
}

impl FeedbackCompositor {
    pub fn new(w: usize, h: usize) -> Self {
        let n = w.saturating_mul(h).saturating_mul(4);
        Self { front: vec![0; n], back: vec![0; n], w, h, generation: 0 }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Bumped every time the buffers are reallocated; tests use this to
    /// verify resize recreates rather than reuses.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop and recreate both buffers if the surface size changed.
    pub fn ensure_size(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        let n = w.saturating_mul(h).saturating_mul(4);
        self.front = vec![0; n];
        self.back = vec![0; n];
        self.w = w;
        self.h = h;
        self.generation += 1;
    }

    /// Echo the previous frame into the working buffer and swap.
    pub fn step(&mut self, params: EchoParams) {
        if self.w == 0 || self.h == 0 {
            return;
        }
        let decay = params.decay.clamp(0.0, 1.0);
        let zoom = params.zoom.max(0.01);
        let (sin_r, cos_r) = params.rotation.sin_cos();

        for y in 0..self.h {
            let ny = (y as f32 / self.h as f32) * 2.0 - 1.0;
            for x in 0..self.w {
                let nx = (x as f32 / self.w as f32) * 2.0 - 1.0;
                // Inverse transform: rotate back, zoom out.
                let rx = (nx * cos_r + ny * sin_r) * zoom;
                let ry = (-nx * sin_r + ny * cos_r) * zoom;
                let rgb = sample_rgb(&self.front, self.w, self.h, rx, ry);
                let i = (y * self.w + x) * 4;
                self.back[i] = (rgb[0] as f32 * decay) as u8;
                self.back[i + 1] = (rgb[1] as f32 * decay) as u8;
                self.back[i + 2] = (rgb[2] as f32 * decay) as u8;
                self.back[i + 3] = 255;
            }
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Additively stamp a pixel into the current frame.
    pub fn deposit(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = (y * self.w + x) * 4;
        self.front[i] = self.front[i].saturating_add(rgb[0]);
        self.front[i + 1] = self.front[i + 1].saturating_add(rgb[1]);
        self.front[i + 2] = self.front[i + 2].saturating_add(rgb[2]);
        self.front[i + 3] = 255;
    }

    pub fn frame(&self) -> &[u8] {
        &self.front
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_recreates_buffers() {
        let mut fb = FeedbackCompositor::new(32, 32);
        assert_eq!(fb.generation(), 0);
        fb.ensure_size(32, 32);
        assert_eq!(fb.generation(), 0, "same size must not reallocate");
        fb.ensure_size(64, 32);
        assert_eq!(fb.generation(), 1);
        assert_eq!(fb.frame().len(), 64 * 32 * 4);
    }

    #[test]
    fn decay_fades_deposits_over_steps() {
        let mut fb = FeedbackCompositor::new(16, 16);
        fb.deposit(8, 8, [255, 255, 255]);
        let initial: u32 = fb.frame().iter().map(|&v| v as u32).sum();
        for _ in 0..12 {
            fb.step(EchoParams { decay: 0.7, zoom: 1.0, rotation: 0.0 });
        }
        let after: u32 = fb.frame().iter().map(|&v| v as u32).sum();
        assert!(after < initial, "echo trails must decay ({after} !< {initial})");
    }

    #[test]
    fn rotation_moves_energy_off_axis() {
        let mut fb = FeedbackCompositor::new(33, 33);
        // Stamp off-center so rotation visibly relocates it.
        fb.deposit(28, 16, [255, 0, 0]);
        fb.step(EchoParams { decay: 1.0, zoom: 1.0, rotation: std::f32::consts::FRAC_PI_2 });
        let frame = fb.frame();
        let at = |x: usize, y: usize| frame[(y * 33 + x) * 4] as u32;
        let stayed = at(28, 16);
        let moved: u32 = (0..33)
            .flat_map(|y| (0..33).map(move |x| (x, y)))
            .filter(|&(x, y)| (x, y) != (28, 16))
            .map(|(x, y)| at(x, y))
            .sum();
        assert!(moved > stayed, "rotation should relocate deposited energy");
    }
}
