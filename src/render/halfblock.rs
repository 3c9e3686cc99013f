use super::{clip_hud, Renderer};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate};
use crossterm::QueueableCommand;
use std::io::{self, Write};

/// Truecolor renderer: each cell is U+2580 with the top pixel as the
/// foreground color and the bottom pixel as the background, doubling the
/// vertical resolution of the terminal grid.
pub struct HalfBlockRenderer {
    sync_updates: bool,
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl HalfBlockRenderer {
    pub fn new(sync_updates: bool) -> Self {
        Self { sync_updates, last_fg: None, last_bg: None }
    }

    fn px(pixels: &[u8], w: usize, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * w + x) * 4;
        (pixels[i], pixels[i + 1], pixels[i + 2])
    }
}

impl Renderer for HalfBlockRenderer {
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
        out.queue(MoveTo(0, 0))?;
        self.last_fg = None;
        self.last_bg = None;

        let rows = h / 2;
        for row in 0..rows {
            out.queue(MoveTo(0, row as u16))?;
            for x in 0..w {
                let top = Self::px(pixels, w, x, row * 2);
                let bot = if row * 2 + 1 < h {
                    Self::px(pixels, w, x, row * 2 + 1)
                } else {
                    (0, 0, 0)
                };
                // Only emit color escapes when the run changes.
                if self.last_fg != Some(top) {
                    out.queue(SetForegroundColor(Color::Rgb { r: top.0, g: top.1, b: top.2 }))?;
                    self.last_fg = Some(top);
                }
                if self.last_bg != Some(bot) {
                    out.queue(SetBackgroundColor(Color::Rgb { r: bot.0, g: bot.1, b: bot.2 }))?;
                    self.last_bg = Some(bot);
                }
                out.queue(Print('\u{2580}'))?;
            }
        }

        out.queue(ResetColor)?;
        out.queue(MoveTo(0, rows as u16))?;
        out.queue(Print(clip_hud(hud, w)))?;
        if self.sync_updates {
            out.queue(EndSynchronizedUpdate)?;
        }
        out.flush()
    }
}
