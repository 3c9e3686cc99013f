use crate::effects::prng::DeterministicPrng;
use crate::surface::PixelContext;

/// Pool entity: position and velocity in pixel space, life in seconds,
/// size in pixels. Pruned once life or size drops under the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub size: f32,
    pub color: [u8; 3],
}

const PRUNE_EPS: f32 = 0.05;

/// Audio-driven spawn source: spawn count scales with the routed band
/// energy each update.
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    pub x: f32,
    pub y: f32,
    /// Particles per update at full band energy.
    pub rate: f32,
    pub speed: f32,
    pub life: f32,
    pub size: f32,
    pub color: [u8; 3],
}

pub struct ParticleSystem {
    pool: Vec<Particle>,
    capacity: usize,
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self { pool: Vec::with_capacity(capacity.min(4096)), capacity }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// Spawn from an emitter scaled by band energy in [0, 1].
    pub fn emit(&mut self, emitter: &Emitter, energy: f32, rng: &mut DeterministicPrng) {
        let count = (emitter.rate * energy.clamp(0.0, 1.0)).round() as usize;
        for _ in 0..count {
            if self.pool.len() >= self.capacity {
                break;
            }
            let angle = rng.range_f32(0.0, std::f32::consts::TAU);
            let speed = emitter.speed * rng.range_f32(0.35, 1.0);
            self.pool.push(Particle {
                x: emitter.x,
                y: emitter.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed - emitter.speed * 0.4,
                life: emitter.life * rng.range_f32(0.6, 1.0),
                size: emitter.size * rng.range_f32(0.5, 1.0),
                color: emitter.color,
            });
        }
    }

    /// Integrate, decay, and prune dead entities.
    pub fn update(&mut self, dt: f32, gravity: f32) {
        for p in &mut self.pool {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.vy += gravity * dt;
            p.life -= dt;
            p.size *= 1.0 - 0.6 * dt;
        }
        self.pool.retain(|p| p.life > PRUNE_EPS && p.size > PRUNE_EPS);
    }

    /// Additive-blend glow draw into the shared context.
    pub fn draw(&self, ctx: &mut PixelContext) {
        for p in &self.pool {
            let brightness = (p.life.min(1.0)).clamp(0.0, 1.0);
            let rgb = [
                (p.color[0] as f32 * brightness) as u8,
                (p.color[1] as f32 * brightness) as u8,
                (p.color[2] as f32 * brightness) as u8,
            ];
            let r = p.size.max(0.5) as i32;
            let cx = p.x as i32;
            let cy = p.y as i32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let (px, py) = (cx + dx, cy + dy);
                    if px >= 0 && py >= 0 {
                        ctx.add(px as usize, py as usize, rgb);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_emitter() -> Emitter {
        Emitter { x: 20.0, y: 20.0, rate: 8.0, speed: 30.0, life: 1.0, size: 2.0, color: [255, 160, 40] }
    }

    #[test]
    fn spawn_count_scales_with_energy() {
        let mut rng = DeterministicPrng::with_seed(1);
        let mut quiet = ParticleSystem::new(256);
        quiet.emit(&test_emitter(), 0.0, &mut rng);
        assert_eq!(quiet.len(), 0);

        let mut loud = ParticleSystem::new(256);
        loud.emit(&test_emitter(), 1.0, &mut rng);
        assert_eq!(loud.len(), 8);
    }

    #[test]
    fn particles_are_pruned_when_life_expires() {
        let mut rng = DeterministicPrng::with_seed(2);
        let mut sys = ParticleSystem::new(256);
        sys.emit(&test_emitter(), 1.0, &mut rng);
        assert!(!sys.is_empty());
        for _ in 0..120 {
            sys.update(1.0 / 30.0, 9.8);
        }
        assert!(sys.is_empty(), "all particles should be pruned after their lifetime");
    }

    #[test]
    fn pool_capacity_is_respected() {
        let mut rng = DeterministicPrng::with_seed(3);
        let mut sys = ParticleSystem::new(5);
        for _ in 0..10 {
            sys.emit(&test_emitter(), 1.0, &mut rng);
        }
        assert!(sys.len() <= 5);
    }

    #[test]
    fn draw_uses_additive_blending() {
        let mut rng = DeterministicPrng::with_seed(4);
        let mut sys = ParticleSystem::new(64);
        sys.emit(&test_emitter(), 1.0, &mut rng);

        let mut ctx = PixelContext::new(40, 40);
        sys.draw(&mut ctx);
        sys.draw(&mut ctx);
        let glow: u32 = ctx.pixels().iter().map(|&v| v as u32).sum();
        assert!(glow > 0, "drawing live particles must touch pixels");
    }
}
