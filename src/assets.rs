use crate::error::EngineError;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// A small RGBA image used by the collage preset.
#[derive(Debug, Clone)]
pub struct Tile {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

const TILE_SIZE: usize = 48;

/// Result of a non-blocking poll on the loader.
pub enum TilePoll<'a> {
    NotReady,
    Ready(&'a [Tile]),
    Failed(&'a EngineError),
}

enum LoadState {
    Pending,
    Ready(Vec<Tile>),
    Failed(EngineError),
}

/// Loads tile definitions off the render thread. Rendering never waits on
/// this: callers poll each tick and draw a placeholder until tiles arrive.
/// Dropping the library while a load is in flight simply discards the
/// result when the channel closes.
pub struct TileLibrary {
    rx: mpsc::Receiver<Result<Vec<Tile>, EngineError>>,
    state: LoadState,
}

impl TileLibrary {
    pub fn load_async(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("tile-loader".into())
            .spawn(move || {
                let result = load_tiles(&path);
                // Receiver may already be gone; a stale result is dropped.
                let _ = tx.send(result);
            })
            .ok();
        Self { rx, state: LoadState::Pending }
    }

    /// Build an already-resolved library; used when no tiles file is given.
    pub fn resolved(tiles: Vec<Tile>) -> Self {
        let (_tx, rx) = mpsc::channel();
        Self { rx, state: LoadState::Ready(tiles) }
    }

    /// Non-blocking: drains at most one loader message and reports state.
    pub fn poll(&mut self) -> TilePoll<'_> {
        if matches!(self.state, LoadState::Pending) {
            match self.rx.try_recv() {
                Ok(Ok(tiles)) => {
                    log::info!("tile library ready: {} tiles", tiles.len());
                    self.state = LoadState::Ready(tiles);
                }
                Ok(Err(e)) => {
                    log::warn!("tile library failed: {e}; collage will use the placeholder");
                    self.state = LoadState::Failed(e);
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.state = LoadState::Failed(EngineError::AssetLoadFailure {
                        path: "<detached>".to_string(),
                        message: "loader thread exited without a result".to_string(),
                    });
                }
            }
        }
        match &self.state {
            LoadState::Pending => TilePoll::NotReady,
            LoadState::Ready(tiles) => TilePoll::Ready(tiles),
            LoadState::Failed(e) => TilePoll::Failed(e),
        }
    }
}

/// Flat checkerboard stand-in drawn while tiles are loading or failed.
pub fn placeholder_tile() -> Tile {
    let mut pixels = vec![0u8; TILE_SIZE * TILE_SIZE * 4];
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let on = ((x / 8) + (y / 8)) % 2 == 0;
            let v = if on { 70 } else { 30 };
            let i = (y * TILE_SIZE + x) * 4;
            pixels[i] = v;
            pixels[i + 1] = v;
            pixels[i + 2] = v + 20;
            pixels[i + 3] = 255;
        }
    }
    Tile { name: "placeholder".to_string(), w: TILE_SIZE, h: TILE_SIZE, pixels }
}

/// Tile manifests are `name = #RRGGBB` or `name = #RRGGBB..#RRGGBB`
/// (vertical gradient). Comments (#) and blank lines are skipped.
fn load_tiles(path: &Path) -> Result<Vec<Tile>, EngineError> {
    let text = std::fs::read_to_string(path).map_err(|e| EngineError::AssetLoadFailure {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_tiles(&text).map_err(|message| EngineError::AssetLoadFailure {
        path: path.display().to_string(),
        message,
    })
}

fn parse_tiles(text: &str) -> Result<Vec<Tile>, String> {
    let mut tiles = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, spec) = line
            .split_once('=')
            .ok_or_else(|| format!("line {}: expected name = color", lineno + 1))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("line {}: empty tile name", lineno + 1));
        }
        let spec = spec.trim();
        let (top, bottom) = match spec.split_once("..") {
            Some((a, b)) => (parse_color(a.trim(), lineno)?, parse_color(b.trim(), lineno)?),
            None => {
                let c = parse_color(spec, lineno)?;
                (c, c)
            }
        };
        tiles.push(gradient_tile(name, top, bottom));
    }
    if tiles.is_empty() {
        return Err("no tile definitions found".to_string());
    }
    Ok(tiles)
}

fn parse_color(s: &str, lineno: usize) -> Result<[u8; 3], String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("line {}: bad color '{s}'", lineno + 1));
    }
    let v = u32::from_str_radix(hex, 16).map_err(|e| format!("line {}: {e}", lineno + 1))?;
    Ok([(v >> 16) as u8, (v >> 8) as u8, v as u8])
}

fn gradient_tile(name: &str, top: [u8; 3], bottom: [u8; 3]) -> Tile {
    let mut pixels = vec![0u8; TILE_SIZE * TILE_SIZE * 4];
    for y in 0..TILE_SIZE {
        let t = y as f32 / (TILE_SIZE - 1) as f32;
        let row = [
            (top[0] as f32 + (bottom[0] as f32 - top[0] as f32) * t) as u8,
            (top[1] as f32 + (bottom[1] as f32 - top[1] as f32) * t) as u8,
            (top[2] as f32 + (bottom[2] as f32 - top[2] as f32) * t) as u8,
        ];
        for x in 0..TILE_SIZE {
            let i = (y * TILE_SIZE + x) * 4;
            pixels[i] = row[0];
            pixels[i + 1] = row[1];
            pixels[i + 2] = row[2];
            pixels[i + 3] = 255;
        }
    }
    Tile { name: name.to_string(), w: TILE_SIZE, h: TILE_SIZE, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn manifest_parses_solids_and_gradients() {
        let tiles = parse_tiles("# palette\na = #FF0000\nb = #000000..#FFFFFF\n").expect("parse");
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].pixels[0], 255);
        assert_eq!(tiles[1].name, "b");
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        assert!(parse_tiles("a = #12GG34\n").is_err());
        assert!(parse_tiles("\n# only comments\n").is_err());
    }

    #[test]
    fn missing_file_surfaces_asset_failure() {
        let mut lib = TileLibrary::load_async(PathBuf::from("/nonexistent/tiles.conf"));
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            match lib.poll() {
                TilePoll::Failed(e) => {
                    assert!(matches!(e, EngineError::AssetLoadFailure { .. }));
                    break;
                }
                TilePoll::Ready(_) => panic!("load of a missing file cannot succeed"),
                TilePoll::NotReady => {
                    assert!(std::time::Instant::now() < deadline, "loader never reported");
                    thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    #[test]
    fn resolved_library_is_immediately_ready() {
        let mut lib = TileLibrary::resolved(vec![placeholder_tile()]);
        assert!(matches!(lib.poll(), TilePoll::Ready(tiles) if tiles.len() == 1));
    }
}
