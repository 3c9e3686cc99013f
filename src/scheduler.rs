use crate::audio::AudioMetrics;
use crate::registry::PresetRegistry;
use crate::surface::SurfaceHandle;
use crate::visual::{render_fallback_pulse, Preset, PresetEnv};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// By-value snapshot for the HUD; never a live reference into the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub frame: u64,
    pub preset_name: String,
    pub preset_index: usize,
    pub preset_count: usize,
    pub note: String,
}

/// Drives the animation: one fixed virtual-clock step per tick, one frame
/// per step. A failing render entry is isolated per tick; the scheduler
/// paints the neutral fallback and keeps running.
pub struct AnimationScheduler {
    registry: PresetRegistry,
    env: PresetEnv,
    /// Lazy per-preset state, keyed by registry index. Instances persist
    /// across preset switches so trails and pools survive a round trip.
    instances: HashMap<usize, Box<dyn Preset>>,
    state: SchedulerState,
    frame: u64,
    dt: f32,
    last_size: Option<(usize, usize)>,
    last_error: Option<String>,
}

impl AnimationScheduler {
    pub fn new(registry: PresetRegistry, env: PresetEnv, fps: u32) -> Self {
        Self {
            registry,
            env,
            instances: HashMap::new(),
            state: SchedulerState::Idle,
            frame: 0,
            dt: 1.0 / fps.max(1) as f32,
            last_size: None,
            last_error: None,
        }
    }

    /// Idle -> Running. Starting an already-running scheduler is a no-op.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Running {
            log::debug!("start ignored: already running");
            return;
        }
        log::info!("animation started ({} presets, dt={:.4}s)", self.registry.len(), self.dt);
        self.state = SchedulerState::Running;
    }

    /// Always safe, takes effect before the next tick, idempotent.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            log::info!("animation stopped at frame {}", self.frame);
        }
        self.state = SchedulerState::Idle;
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Virtual clock: advances by exactly dt per tick regardless of wall
    /// time, so a dropped frame slows the animation instead of jumping it.
    pub fn virtual_time(&self) -> f32 {
        self.frame as f32 * self.dt
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    pub fn next_preset(&mut self) {
        self.registry.advance(1);
    }

    pub fn prev_preset(&mut self) {
        self.registry.advance(-1);
    }

    pub fn select_preset(&mut self, index: usize) {
        self.registry.select(index);
    }

    /// Render one frame into the surface. Returns false without touching
    /// the surface when idle.
    pub fn tick(&mut self, surface: &mut SurfaceHandle, metrics: &AudioMetrics) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }

        let size = (surface.width(), surface.height());
        if self.last_size.is_some() && self.last_size != Some(size) {
            for preset in self.instances.values_mut() {
                preset.on_resize(size.0, size.1);
            }
        }
        self.last_size = Some(size);

        let t = self.virtual_time();
        let m = metrics.clamped();
        let index = self.registry.current_index();

        let result = match self.instance_for(index) {
            Ok(()) => {
                // Entry exists after instance_for; render with isolation.
                match self.instances.get_mut(&index) {
                    Some(preset) => preset.render(surface.context(), t, &m),
                    None => Ok(()),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            let name = self.registry.current().name.clone();
            log::warn!("preset '{name}' failed at frame {}: {e}", self.frame);
            self.last_error = Some(format!("{name}: {e}"));
            render_fallback_pulse(surface.context(), t, &m);
        } else {
            self.last_error = None;
        }

        self.frame += 1;
        true
    }

    fn instance_for(&mut self, index: usize) -> Result<(), crate::error::EngineError> {
        if self.instances.contains_key(&index) {
            return Ok(());
        }
        let ctor = self.registry.resolve(&self.registry.current().kind)?;
        let mut preset = ctor(&self.env);
        if let Some((w, h)) = self.last_size {
            preset.on_resize(w, h);
        }
        log::debug!("instantiated preset '{}' (index {index})", preset.name());
        self.instances.insert(index, preset);
        Ok(())
    }

    pub fn status(&self) -> SchedulerStatus {
        let reg = self.registry.status();
        SchedulerStatus {
            state: self.state,
            frame: self.frame,
            preset_name: reg.preset_name,
            preset_index: reg.preset_index,
            preset_count: reg.preset_count,
            note: match &self.last_error {
                Some(e) => format!("{} ({e})", reg.status),
                None => reg.status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::probe_runtime;
    use crate::config::{EngineMode, RendererMode};
    use crate::manifest::PresetDef;
    use crate::registry::{Bindings, PresetSource};
    use crate::surface::{SurfaceConfig, SurfaceManager};

    fn test_env() -> PresetEnv {
        PresetEnv {
            seed: 11,
            caps: probe_runtime(EngineMode::Cpu, RendererMode::Ascii, false),
            tiles_file: None,
        }
    }

    fn test_surface() -> SurfaceHandle {
        let cfg = SurfaceConfig {
            explicit: Some((64, 48)),
            allow_terminal_probe: false,
            allow_env_probe: false,
            fallback_size: None,
        };
        SurfaceManager::acquire(&cfg).expect("explicit surface")
    }

    fn scheduler_with(defs: Vec<PresetDef>) -> AnimationScheduler {
        let registry = PresetRegistry::load(PresetSource::Supplied(defs), Bindings::default());
        AnimationScheduler::new(registry, test_env(), 60)
    }

    #[test]
    fn idle_scheduler_does_not_tick() {
        let mut sched = scheduler_with(vec![PresetDef::new("w", "waveform", "")]);
        let mut surface = test_surface();
        assert!(!sched.tick(&mut surface, &AudioMetrics::default()));
        assert_eq!(sched.frame(), 0);
    }

    #[test]
    fn double_start_is_a_noop_and_stop_is_idempotent() {
        let mut sched = scheduler_with(vec![PresetDef::new("w", "waveform", "")]);
        sched.start();
        sched.start();
        assert!(sched.is_running());
        sched.stop();
        sched.stop();
        assert!(!sched.is_running());
        sched.start();
        assert!(sched.is_running());
    }

    #[test]
    fn virtual_clock_advances_by_fixed_step() {
        let mut sched = scheduler_with(vec![PresetDef::new("w", "waveform", "")]);
        let mut surface = test_surface();
        sched.start();
        for _ in 0..90 {
            sched.tick(&mut surface, &AudioMetrics::default());
        }
        assert_eq!(sched.frame(), 90);
        assert!((sched.virtual_time() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn unresolvable_kind_paints_fallback_and_keeps_running() {
        let mut sched = scheduler_with(vec![PresetDef::new("ghost", "unknownKind", "")]);
        let mut surface = test_surface();
        sched.start();
        for _ in 0..100 {
            assert!(sched.tick(&mut surface, &AudioMetrics::default()));
        }
        assert!(sched.is_running(), "failures must never stop the animation");
        assert!(sched.last_error().is_some());
        let lit: u64 = surface.pixels().iter().map(|&v| v as u64).sum();
        assert!(lit > 0, "fallback pulse must be painted on failure");
    }

    #[test]
    fn preset_state_persists_across_switches() {
        let mut sched = scheduler_with(vec![
            PresetDef::new("a", "waveform", ""),
            PresetDef::new("b", "bars", ""),
        ]);
        let mut surface = test_surface();
        sched.start();
        sched.tick(&mut surface, &AudioMetrics::default());
        assert_eq!(sched.instances.len(), 1);
        sched.next_preset();
        sched.tick(&mut surface, &AudioMetrics::default());
        assert_eq!(sched.instances.len(), 2, "second preset instantiated lazily");
        sched.prev_preset();
        sched.tick(&mut surface, &AudioMetrics::default());
        assert_eq!(sched.instances.len(), 2, "round trip reuses the live instance");
    }

    #[test]
    fn status_reports_ready_even_while_a_preset_fails() {
        let mut sched = scheduler_with(vec![PresetDef::new("ghost", "unknownKind", "")]);
        let mut surface = test_surface();
        sched.start();
        sched.tick(&mut surface, &AudioMetrics::default());
        let status = sched.status();
        assert_eq!(status.state, SchedulerState::Running);
        assert!(status.note.starts_with("Ready"), "engine stays usable: {}", status.note);
    }
}
