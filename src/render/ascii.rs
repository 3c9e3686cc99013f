use super::{clip_hud, luma, Renderer};
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate};
use crossterm::QueueableCommand;
use std::io::{self, Write};

const RAMP: &[u8] = b" .:-=+*#%@";

/// Monochrome fallback for terminals without truecolor. Two vertical
/// pixels collapse into one character chosen from a brightness ramp.
pub struct AsciiRenderer {
    sync_updates: bool,
    line: String,
}

impl AsciiRenderer {
    pub fn new(sync_updates: bool) -> Self {
        Self { sync_updates, line: String::new() }
    }
}

impl Renderer for AsciiRenderer {
    fn present(
        &mut self,
        out: &mut dyn Write,
        pixels: &[u8],
        w: usize,
        h: usize,
        hud: &str,
    ) -> io::Result<()> {
        if w == 0 || h == 0 || pixels.len() < w * h * 4 {
            return Ok(());
        }
        if self.sync_updates {
            out.queue(BeginSynchronizedUpdate)?;
        }

        let rows = h / 2;
        for row in 0..rows {
            self.line.clear();
            for x in 0..w {
                let i0 = (row * 2 * w + x) * 4;
                let i1 = if row * 2 + 1 < h { ((row * 2 + 1) * w + x) * 4 } else { i0 };
                let top = luma(pixels[i0], pixels[i0 + 1], pixels[i0 + 2]) as u32;
                let bot = luma(pixels[i1], pixels[i1 + 1], pixels[i1 + 2]) as u32;
                let v = ((top + bot) / 2) as usize;
                let idx = v * (RAMP.len() - 1) / 255;
                self.line.push(RAMP[idx] as char);
            }
            out.queue(MoveTo(0, row as u16))?;
            out.queue(Print(&self.line))?;
        }

        out.queue(MoveTo(0, rows as u16))?;
        out.queue(Print(clip_hud(hud, w)))?;
        if self.sync_updates {
            out.queue(EndSynchronizedUpdate)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_frames_use_dense_ramp_chars() {
        let mut r = AsciiRenderer::new(false);
        let w = 6;
        let h = 4;
        let pixels = vec![255u8; w * h * 4];
        let mut buf = Vec::new();
        r.present(&mut buf, &pixels, w, h, "").expect("present");
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains('@'), "full-white frame should hit the top of the ramp");
        assert!(!text.contains('\u{2580}'), "ascii renderer must not emit half blocks");
    }

    #[test]
    fn black_frames_render_as_spaces() {
        let mut r = AsciiRenderer::new(false);
        let w = 6;
        let h = 4;
        let pixels = vec![0u8; w * h * 4];
        let mut buf = Vec::new();
        r.present(&mut buf, &pixels, w, h, "status").expect("present");
        let text = String::from_utf8_lossy(&buf);
        assert!(!text.contains('@'));
        assert!(text.contains("status"));
    }
}
