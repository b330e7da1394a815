/// Terminal I/O: mounting the terminal and presenting frames.
///
/// The games draw in logical pixels onto a `PixelBuffer`; this module scales
/// that buffer to the terminal, packs two pixel rows into each character
/// cell with `▀`, and prints text spans over the top.

use std::io::Write;

use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Print},
    terminal, ExecutableCommand, QueueableCommand,
};

use crusader_arcade::error::SurfaceError;
use crusader_arcade::geometry::Rect;
use crusader_arcade::render::{Color, Fill, PixelBuffer, Surface, TextAlign, BLACK};

const MIN_COLS: u16 = 40;
const MIN_ROWS: u16 = 15;

// ── Mount guard ──────────────────────────────────────────────────────────────

/// Owns the terminal for the lifetime of a game.  Dropping it releases raw
/// mode, the alternate screen and mouse capture.
pub struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    pub fn mount<W: Write>(out: &mut W) -> Result<Self, SurfaceError> {
        let (cols, rows) = terminal::size()
            .map_err(|e| SurfaceError::Unavailable(format!("no terminal: {e}")))?;
        check_size(cols, rows)?;

        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;
        out.execute(EnableMouseCapture)?;

        // Key-release events let held keys stop cleanly; terminals without
        // the kitty protocol fall back to hold-window expiry.
        let keyboard_enhanced = out
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .is_ok();

        Ok(TerminalGuard { keyboard_enhanced })
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = std::io::stdout();
        if self.keyboard_enhanced {
            let _ = out.execute(PopKeyboardEnhancementFlags);
        }
        let _ = out.execute(DisableMouseCapture);
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn check_size(cols: u16, rows: u16) -> Result<(), SurfaceError> {
    if cols < MIN_COLS || rows < MIN_ROWS {
        return Err(SurfaceError::TooSmall {
            cols,
            rows,
            min_cols: MIN_COLS,
            min_rows: MIN_ROWS,
        });
    }
    Ok(())
}

// ── Terminal surface ─────────────────────────────────────────────────────────

pub struct TerminalSurface<W: Write> {
    out: W,
    buffer: PixelBuffer,
    logical_width: f32,
    logical_height: f32,
    /// Terminal cell of the buffer's top-left corner.
    origin: (u16, u16),
    /// Pixels per logical unit (same on both axes).
    scale: f32,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, logical_width: f32, logical_height: f32) -> Result<Self, SurfaceError> {
        let (cols, rows) = terminal::size()?;
        let mut surface = TerminalSurface {
            out,
            buffer: PixelBuffer::new(1, 1),
            logical_width,
            logical_height,
            origin: (0, 0),
            scale: 1.0,
        };
        surface.resize(cols, rows)?;
        Ok(surface)
    }

    /// Refit the buffer to a new terminal size, keeping the aspect ratio.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), SurfaceError> {
        check_size(cols, rows)?;
        let max_w = cols as f32;
        let max_h = rows as f32 * 2.0;
        let scale = (max_w / self.logical_width).min(max_h / self.logical_height);
        let pixel_w = ((self.logical_width * scale).floor() as usize).max(1);
        // Even height so every cell row holds a full pixel pair.
        let pixel_h = (((self.logical_height * scale).floor() as usize) & !1).max(2);

        self.scale = scale;
        self.buffer = PixelBuffer::scaled(self.logical_width, self.logical_height, pixel_w, pixel_h);
        self.origin = (
            (cols.saturating_sub(pixel_w as u16)) / 2,
            (rows.saturating_sub((pixel_h / 2) as u16)) / 2,
        );
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }

    /// Logical coordinates under a terminal cell, if the cell is on the surface.
    pub fn to_logical(&self, col: u16, row: u16) -> Option<(f32, f32)> {
        let px = col.checked_sub(self.origin.0)? as f32 + 0.5;
        let py = (row.checked_sub(self.origin.1)? as f32 + 0.5) * 2.0;
        if px >= self.buffer.pixel_width() as f32 || py >= self.buffer.pixel_height() as f32 {
            return None;
        }
        Some((px / self.scale, py / self.scale))
    }

    fn to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            self.origin.0 as i32 + (x * self.scale).round() as i32,
            self.origin.1 as i32 + (y * self.scale / 2.0).round() as i32,
        )
    }
}

fn term_color(c: Color) -> style::Color {
    style::Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn width(&self) -> f32 {
        self.logical_width
    }

    fn height(&self) -> f32 {
        self.logical_height
    }

    fn clear(&mut self, color: Color) {
        self.buffer.clear(color);
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        self.buffer.fill_rect(rect, fill);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.buffer.stroke_rect(rect, color, line_width);
    }

    fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Color) {
        self.buffer.fill_triangle(points, color);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        self.buffer.fill_circle(cx, cy, radius, color);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Color) {
        self.buffer.fill_text(text, x, y, align, color);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let width = self.buffer.pixel_width();
        let cell_rows = self.buffer.pixel_height() / 2;

        for row in 0..cell_rows {
            self.out
                .queue(cursor::MoveTo(self.origin.0, self.origin.1 + row as u16))?;
            let mut current: Option<(Color, Color)> = None;
            for col in 0..width {
                let top = self.buffer.pixel(col, row * 2).unwrap_or(BLACK);
                let bottom = self.buffer.pixel(col, row * 2 + 1).unwrap_or(BLACK);
                if current != Some((top, bottom)) {
                    self.out.queue(style::SetForegroundColor(term_color(top)))?;
                    self.out.queue(style::SetBackgroundColor(term_color(bottom)))?;
                    current = Some((top, bottom));
                }
                self.out.queue(Print('▀'))?;
            }
        }

        // Text over the pixels, on the colour already underneath it.
        let max_col = self.origin.0 as i32 + width as i32;
        for span in self.buffer.texts() {
            let len = span.text.chars().count() as i32;
            let (col, row) = self.to_cell(span.x, span.y);
            let start = match span.align {
                TextAlign::Left => col,
                TextAlign::Center => col - len / 2,
                TextAlign::Right => col - len,
            }
            .max(self.origin.0 as i32);
            let row = row.clamp(self.origin.1 as i32, self.origin.1 as i32 + cell_rows as i32 - 1);
            let visible: String = span
                .text
                .chars()
                .take((max_col - start).max(0) as usize)
                .collect();
            let under = self
                .buffer
                .sample(span.x, span.y)
                .unwrap_or(BLACK);
            self.out.queue(cursor::MoveTo(start as u16, row as u16))?;
            self.out.queue(style::SetBackgroundColor(term_color(under)))?;
            self.out.queue(style::SetForegroundColor(term_color(span.color)))?;
            self.out.queue(Print(visible))?;
        }

        self.out.queue(style::ResetColor)?;
        self.out.flush()?;
        Ok(())
    }
}
