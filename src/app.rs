use crate::audio::AudioPipeline;
use crate::capability::probe_runtime;
use crate::config::Config;
use crate::registry::{Bindings, PresetRegistry, PresetSource};
use crate::render::create_renderer;
use crate::scheduler::AnimationScheduler;
use crate::surface::{SurfaceConfig, SurfaceManager};
use crate::terminal::TerminalGuard;
use crate::visual::PresetEnv;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::io::{stdout, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub fn run(cfg: Config) -> Result<()> {
    let caps = probe_runtime(cfg.engine, cfg.renderer, cfg.auto_probe);

    let surface_cfg = SurfaceConfig {
        explicit: cfg.surface_width.zip(cfg.surface_height),
        ..SurfaceConfig::default()
    };
    let mut surface =
        SurfaceManager::acquire(&surface_cfg).context("no drawing surface could be acquired")?;
    log::info!(
        "surface {}x{} ({:?})",
        surface.width(),
        surface.height(),
        surface.origin()
    );

    // Audio failure is never fatal; the engine animates on zero metrics.
    let mut audio = AudioPipeline::new();
    let _ = audio.connect(cfg.source, cfg.device.as_deref());

    let bindings = Bindings::default();
    bindings
        .validate_complete()
        .context("a built-in effect family has no render entry")?;
    let source = match &cfg.presets_file {
        Some(path) => PresetSource::File(Path::new(path)),
        None => PresetSource::Builtin,
    };
    let mut registry = PresetRegistry::load(source, bindings);
    if let Some(query) = &cfg.preset {
        registry.select_by_query(query);
    }

    let seed = cfg.seed.unwrap_or_else(|| fastrand::u64(..));
    log::info!("seed {seed}");
    let env = PresetEnv {
        seed,
        caps: caps.clone(),
        tiles_file: cfg.tiles_file.as_ref().map(PathBuf::from),
    };

    let mut scheduler = AnimationScheduler::new(registry, env, cfg.fps);
    let mut renderer = create_renderer(caps.renderer, cfg.sync_updates);

    let interactive = stdout().is_terminal();
    let _guard = if interactive { TerminalGuard::enter()? } else { TerminalGuard::detached() };

    let mut out = BufWriter::new(stdout());
    let frame_budget = Duration::from_secs_f64(1.0 / cfg.fps.max(1) as f64);
    scheduler.start();

    'frames: loop {
        let frame_start = Instant::now();

        while interactive && event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(key, &mut scheduler) {
                        break 'frames;
                    }
                }
                Event::Resize(cols, rows) => {
                    // Half-block cells carry two pixels vertically.
                    let (w, h) = (cols as usize, rows.saturating_sub(1) as usize * 2);
                    if w > 0 && h > 0 && cfg.surface_width.is_none() {
                        surface.resize(w, h);
                    }
                }
                _ => {}
            }
        }

        let metrics = audio.sample();
        if scheduler.tick(&mut surface, &metrics) {
            let status = scheduler.status();
            let hud = format!(
                " {} [{}/{}] | {} | cap {} | {}fps ",
                status.preset_name,
                status.preset_index + 1,
                status.preset_count,
                status.note,
                caps.status_label(),
                cfg.fps,
            );
            renderer.present(
                &mut out,
                surface.pixels(),
                surface.width(),
                surface.height(),
                &hud,
            )?;
        }
        out.flush()?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            std::thread::sleep(frame_budget - elapsed);
        }
    }

    scheduler.stop();
    Ok(())
}

/// Returns true when the app should quit.
fn handle_key(key: KeyEvent, scheduler: &mut AnimationScheduler) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('n') | KeyCode::Right => scheduler.next_preset(),
        KeyCode::Char('p') | KeyCode::Left => scheduler.prev_preset(),
        KeyCode::Char(' ') => {
            if scheduler.is_running() {
                scheduler.stop();
            } else {
                scheduler.start();
            }
        }
        KeyCode::Char(c @ '0'..='9') => {
            let index = c as usize - '0' as usize;
            // 1..9 pick presets one-based; 0 is the tenth slot.
            let index = if index == 0 { 9 } else { index - 1 };
            scheduler.select_preset(index);
        }
        _ => {}
    }
    false
}
