/// Seeded stream for reproducible "randomness": pan/zoom/rotation plans,
/// glyph picks, particle jitter. Two streams built from the same seed
/// produce bit-identical sequences.
pub struct DeterministicPrng {
    rng: fastrand::Rng,
    seed: u64,
}

impl DeterministicPrng {
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: fastrand::Rng::with_seed(seed), seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent stream; derived deterministically from the
    /// parent seed and a stream label.
    pub fn fork(&self, label: u64) -> Self {
        Self::with_seed(self.seed ^ label.rotate_left(17).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.rng.u32(..)
    }

    pub fn next_f32(&mut self) -> f32 {
        self.rng.f32()
    }

    /// Uniform in [lo, hi).
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.rng.f32()
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.rng.usize(..len)
        }
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.f32() < p.clamp(0.0, 1.0)
    }
}

/// Stateless 32-bit mix-and-shift hash for coordinate noise; same inputs,
/// same output, no stream state consumed.
pub fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}

/// Coordinate noise in [0, 1) from a 2D lattice point and a seed.
pub fn hash_noise(x: f32, y: f32, seed: u32) -> f32 {
    let xi = (x * 1024.0) as i32 as u32;
    let yi = (y * 1024.0) as i32 as u32;
    let h = mix32(xi ^ mix32(yi ^ seed));
    (h >> 8) as f32 / (1u32 << 24) as f32
}
