pub mod ascii;
pub mod halfblock;

use crate::config::RendererMode;
use std::io::{self, Write};

pub use ascii::AsciiRenderer;
pub use halfblock::HalfBlockRenderer;

/// Presents a finished RGBA frame plus one HUD line on a terminal. The
/// frame buffer is always width*height*4 bytes; renderers re-read the
/// dimensions every call because the surface can resize between frames.
pub trait Renderer {
    fn present(
        &mut self,
        out: &mut dyn Write,
        pixels: &[u8],
        w: usize,
        h: usize,
        hud: &str,
    ) -> io::Result<()>;
}

pub fn create_renderer(mode: RendererMode, sync_updates: bool) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new(sync_updates)),
        RendererMode::Ascii => Box::new(AsciiRenderer::new(sync_updates)),
    }
}

/// Relative luminance approximation, integer-weighted.
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
}

pub(crate) fn clip_hud(hud: &str, width: usize) -> String {
    hud.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_orders_primaries_by_weight() {
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
        assert!(luma(255, 0, 0) > luma(0, 0, 255));
        assert_eq!(luma(0, 0, 0), 0);
    }

    #[test]
    fn hud_is_clipped_to_terminal_width() {
        assert_eq!(clip_hud("abcdef", 4), "abcd");
        assert_eq!(clip_hud("ab", 4), "ab");
    }
}
