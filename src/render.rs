/// Rendering layer: the immediate-mode drawing surface and the shooter's
/// render step.
///
/// Render functions take an immutable view of the game state and never
/// mutate it; they only translate state into drawing calls.  Presenting the
/// finished frame is the caller's job.

use crate::config::GameConfig;
use crate::entities::{Bomber, Enemy, EnemyKind, GameState};
use crate::error::SurfaceError;
use crate::geometry::Rect;

// ── Colours ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Same colour with alpha scaled by `factor` in `[0, 1]`.
    pub fn faded(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Color { a, ..self }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Source-over blend of `self` onto an opaque `dst`.
    pub fn over(self, dst: Color) -> Color {
        if self.a == 255 {
            return Color { a: 255, ..self };
        }
        let alpha = self.a as f32 / 255.0;
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        Color::rgb(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
    }
}

pub const BLACK: Color = Color::rgb(0, 0, 0);
pub const WHITE: Color = Color::rgb(255, 255, 255);

const C_HUD: Color = WHITE;
const C_HUD_POWER: Color = Color::rgb(0, 255, 255);
const C_DIVIDER: Color = Color::rgb(60, 60, 60);
const C_PLAYER: Color = Color::rgb(0, 255, 136);
const C_BULLET: Color = Color::rgb(255, 255, 0);
const C_ENEMY_BULLET: Color = Color::rgb(255, 68, 68);
const C_BOMB: Color = Color::rgb(255, 136, 0);
const C_POWER_UP: Color = Color::rgb(0, 255, 255);
const C_REGULAR_TOP: Color = Color::rgb(255, 105, 180);
const C_REGULAR_BOTTOM: Color = Color::rgb(138, 43, 226);
const C_SHIELD_TOP: Color = Color::rgb(79, 195, 247);
const C_SHIELD_BOTTOM: Color = Color::rgb(21, 101, 192);
const C_FACE: Color = Color::rgba(0, 0, 0, 110);
const C_SHIELD_RING: Color = Color::rgb(0, 255, 255);
const C_BOMBER: Color = WHITE;
const C_BOMBER_INSET: Color = Color::rgb(51, 51, 51);
const C_EXPLOSION: Color = Color::rgba(255, 140, 0, 200);
const C_PANEL: Color = Color::rgba(0, 0, 0, 200);
const C_TITLE: Color = Color::rgb(255, 105, 180);
const C_HINT: Color = Color::rgb(160, 160, 160);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Top-to-bottom gradient.
    Vertical { top: Color, bottom: Color },
    /// Top-left to bottom-right gradient.
    Diagonal { from: Color, to: Color },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

// ── Surface ──────────────────────────────────────────────────────────────────

/// An immediate-mode 2D drawing surface in logical coordinates.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, fill: Fill);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);
    fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Color);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
    /// `y` is the text baseline row.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Color);
    /// Push the finished frame to wherever it is displayed.
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
    pub color: Color,
}

/// Software rasteriser.  Drawing happens in logical coordinates which are
/// scaled onto a (usually smaller) pixel grid.  Text is kept as spans for
/// the presenter to lay out.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    logical_width: f32,
    logical_height: f32,
    pixel_width: usize,
    pixel_height: usize,
    pixels: Vec<Color>,
    texts: Vec<TextSpan>,
}

impl PixelBuffer {
    /// One pixel per logical unit.
    pub fn new(width: usize, height: usize) -> Self {
        Self::scaled(width as f32, height as f32, width, height)
    }

    pub fn scaled(
        logical_width: f32,
        logical_height: f32,
        pixel_width: usize,
        pixel_height: usize,
    ) -> Self {
        PixelBuffer {
            logical_width,
            logical_height,
            pixel_width,
            pixel_height,
            pixels: vec![BLACK; pixel_width * pixel_height],
            texts: Vec::new(),
        }
    }

    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> usize {
        self.pixel_height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.pixel_width && y < self.pixel_height).then(|| self.pixels[y * self.pixel_width + x])
    }

    /// Colour under a logical coordinate.
    pub fn sample(&self, x: f32, y: f32) -> Option<Color> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (sx, sy) = self.scale();
        self.pixel((x * sx) as usize, (y * sy) as usize)
    }

    pub fn texts(&self) -> &[TextSpan] {
        &self.texts
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.text.contains(needle))
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.pixel_width as f32 / self.logical_width,
            self.pixel_height as f32 / self.logical_height,
        )
    }

    /// Pixel span covering the logical interval `[start, end)`; never empty
    /// for a positive-length interval that lies on the grid.
    fn span(start: f32, end: f32, scale: f32, limit: usize) -> (usize, usize) {
        let lo = (start * scale).round().max(0.0);
        let mut hi = (end * scale).round().min(limit as f32);
        if hi <= lo && end > start && lo < limit as f32 {
            hi = lo + 1.0;
        }
        (lo as usize, hi.max(lo) as usize)
    }

    fn blend(&mut self, x: usize, y: usize, color: Color) {
        let index = y * self.pixel_width + x;
        self.pixels[index] = color.over(self.pixels[index]);
    }

    /// Visit every pixel whose centre, mapped back to logical space, passes
    /// `inside`, within the logical bounding box given.
    fn fill_where(
        &mut self,
        bounds: Rect,
        color: Color,
        inside: impl Fn(f32, f32) -> bool,
    ) {
        let (sx, sy) = self.scale();
        let (x0, x1) = Self::span(bounds.x, bounds.right(), sx, self.pixel_width);
        let (y0, y1) = Self::span(bounds.y, bounds.bottom(), sy, self.pixel_height);
        for py in y0..y1 {
            for px in x0..x1 {
                let lx = (px as f32 + 0.5) / sx;
                let ly = (py as f32 + 0.5) / sy;
                if inside(lx, ly) {
                    self.blend(px, py, color);
                }
            }
        }
    }
}

impl Surface for PixelBuffer {
    fn width(&self) -> f32 {
        self.logical_width
    }

    fn height(&self) -> f32 {
        self.logical_height
    }

    fn clear(&mut self, color: Color) {
        let opaque = Color { a: 255, ..color };
        self.pixels.iter_mut().for_each(|p| *p = opaque);
        self.texts.clear();
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        let (sx, sy) = self.scale();
        let (x0, x1) = Self::span(rect.x, rect.right(), sx, self.pixel_width);
        let (y0, y1) = Self::span(rect.y, rect.bottom(), sy, self.pixel_height);
        let w = (x1.saturating_sub(x0)).max(1) as f32;
        let h = (y1.saturating_sub(y0)).max(1) as f32;
        for py in y0..y1 {
            for px in x0..x1 {
                let color = match fill {
                    Fill::Solid(c) => c,
                    Fill::Vertical { top, bottom } => top.lerp(bottom, (py - y0) as f32 / h),
                    Fill::Diagonal { from, to } => {
                        from.lerp(to, ((px - x0) as f32 + (py - y0) as f32) / (w + h))
                    }
                };
                self.blend(px, py, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        let lw = line_width.max(0.0);
        let fill = Fill::Solid(color);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, lw), fill);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - lw, rect.width, lw), fill);
        self.fill_rect(Rect::new(rect.x, rect.y + lw, lw, rect.height - 2.0 * lw), fill);
        self.fill_rect(
            Rect::new(rect.right() - lw, rect.y + lw, lw, rect.height - 2.0 * lw),
            fill,
        );
    }

    fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Color) {
        let [a, b, c] = points;
        let min_x = a.0.min(b.0).min(c.0);
        let max_x = a.0.max(b.0).max(c.0);
        let min_y = a.1.min(b.1).min(c.1);
        let max_y = a.1.max(b.1).max(c.1);
        let edge = |p: (f32, f32), q: (f32, f32), x: f32, y: f32| {
            (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
        };
        self.fill_where(
            Rect::new(min_x, min_y, max_x - min_x, max_y - min_y),
            color,
            |x, y| {
                let e0 = edge(a, b, x, y);
                let e1 = edge(b, c, x, y);
                let e2 = edge(c, a, x, y);
                (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
            },
        );
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        self.fill_where(
            Rect::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0),
            color,
            |x, y| (x - cx) * (x - cx) + (y - cy) * (y - cy) <= r2,
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Color) {
        self.texts.push(TextSpan {
            text: text.to_string(),
            x,
            y,
            align,
            color,
        });
    }
}

// ── Shooter render step ──────────────────────────────────────────────────────

/// Draw one complete frame of the shooter.
pub fn render(surface: &mut impl Surface, state: &GameState, config: &GameConfig) {
    surface.clear(BLACK);

    draw_hud(surface, state, config);

    if !state.game_over {
        draw_player(surface, state);
    }
    if let Some(explosion) = &state.explosion {
        surface.fill_circle(
            explosion.x,
            explosion.y,
            explosion.radius,
            C_EXPLOSION.faded(explosion.alpha),
        );
    }

    for bullet in state.bullets.active_bullets() {
        surface.fill_rect(rect_of(bullet), Fill::Solid(C_BULLET));
    }
    for bullet in &state.enemy_bullets {
        surface.fill_rect(rect_of(bullet), Fill::Solid(C_ENEMY_BULLET));
    }
    for bomb in &state.bomber_bombs {
        surface.fill_rect(rect_of(bomb), Fill::Solid(C_BOMB));
    }
    for power_up in &state.power_ups {
        surface.fill_rect(rect_of(&power_up.body), Fill::Solid(C_POWER_UP));
    }

    for enemy in &state.enemies {
        draw_enemy(surface, enemy);
    }
    for bomber in &state.bombers {
        draw_bomber(surface, bomber);
    }
}

fn rect_of(body: &crate::entities::GameObject) -> Rect {
    Rect::new(body.x, body.y, body.width, body.height)
}

fn draw_hud(surface: &mut impl Surface, state: &GameState, config: &GameConfig) {
    let baseline = config.top_bar_height * 0.65;
    surface.fill_text(
        &format!("Score: {}", state.score),
        10.0,
        baseline,
        TextAlign::Left,
        C_HUD,
    );
    surface.fill_text(
        &format!("Level: {}", state.level),
        config.width - 10.0,
        baseline,
        TextAlign::Right,
        C_HUD,
    );
    if state.player.power_up.is_some() {
        surface.fill_text(
            &format!("Double Bullets: {}s", state.player.power_up_remaining.ceil() as u32),
            config.width / 2.0,
            baseline,
            TextAlign::Center,
            C_HUD_POWER,
        );
    }
    surface.fill_rect(
        Rect::new(0.0, config.top_bar_height - 1.0, config.width, 1.0),
        Fill::Solid(C_DIVIDER),
    );
}

fn draw_player(surface: &mut impl Surface, state: &GameState) {
    let p = &state.player;
    surface.fill_triangle(
        [
            (p.x + p.width / 2.0, p.y),
            (p.x, p.y + p.height),
            (p.x + p.width, p.y + p.height),
        ],
        C_PLAYER,
    );
}

fn draw_enemy(surface: &mut impl Surface, enemy: &Enemy) {
    let rect = rect_of(&enemy.body);
    let fill = match enemy.kind {
        EnemyKind::Regular => Fill::Vertical {
            top: C_REGULAR_TOP,
            bottom: C_REGULAR_BOTTOM,
        },
        EnemyKind::Shield => Fill::Vertical {
            top: C_SHIELD_TOP,
            bottom: C_SHIELD_BOTTOM,
        },
    };
    surface.fill_rect(rect, fill);

    // Face: two eyes and a mouth.
    let w = rect.width;
    let h = rect.height;
    let face = Fill::Solid(C_FACE);
    surface.fill_rect(Rect::new(rect.x + w * 0.2, rect.y + h * 0.25, w * 0.2, h * 0.2), face);
    surface.fill_rect(Rect::new(rect.x + w * 0.6, rect.y + h * 0.25, w * 0.2, h * 0.2), face);
    surface.fill_rect(Rect::new(rect.x + w * 0.25, rect.y + h * 0.65, w * 0.5, h * 0.15), face);

    if enemy.shield_active {
        surface.stroke_rect(
            Rect::new(rect.x - 3.0, rect.y - 3.0, w + 6.0, h + 6.0),
            C_SHIELD_RING,
            2.0,
        );
    }
}

fn draw_bomber(surface: &mut impl Surface, bomber: &Bomber) {
    let rect = rect_of(&bomber.body);
    surface.fill_rect(rect, Fill::Solid(C_BOMBER));
    let inset = Fill::Solid(C_BOMBER_INSET);
    let w = rect.width;
    let h = rect.height;
    surface.fill_rect(Rect::new(rect.x + w * 0.15, rect.y + h * 0.3, w * 0.2, h * 0.4), inset);
    surface.fill_rect(Rect::new(rect.x + w * 0.65, rect.y + h * 0.3, w * 0.2, h * 0.4), inset);
}

// ── Overlays ─────────────────────────────────────────────────────────────────

/// Screens drawn on top of the playfield, chosen by the driver's phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    None,
    Start,
    LevelBanner { level: u32 },
    EndScreen { score: u32, bonus: u32, level: u32 },
}

pub fn render_overlay(surface: &mut impl Surface, overlay: Overlay) {
    let w = surface.width();
    let h = surface.height();
    let cx = w / 2.0;
    let cy = h / 2.0;

    match overlay {
        Overlay::None => {}
        Overlay::Start => {
            draw_panel(surface);
            surface.fill_text("SPACE INVADERS", cx, cy - 60.0, TextAlign::Center, C_TITLE);
            surface.fill_text("Press ENTER to start", cx, cy, TextAlign::Center, WHITE);
            surface.fill_text(
                "<- -> / A D : Move   SPACE / click : Fire   Q : Quit",
                cx,
                cy + 50.0,
                TextAlign::Center,
                C_HINT,
            );
        }
        Overlay::LevelBanner { level } => {
            surface.fill_text(&format!("LEVEL {level}"), cx, cy, TextAlign::Center, C_TITLE);
        }
        Overlay::EndScreen { score, bonus, level } => {
            draw_panel(surface);
            surface.fill_text("GAME OVER", cx, cy - 90.0, TextAlign::Center, C_ENEMY_BULLET);
            surface.fill_text(
                &format!("Score: {score}   Level: {level}"),
                cx,
                cy - 40.0,
                TextAlign::Center,
                WHITE,
            );
            surface.fill_text(
                &format!("Accuracy bonus: {bonus}   Total: {}", score + bonus),
                cx,
                cy - 10.0,
                TextAlign::Center,
                C_BULLET,
            );
            surface.fill_text(
                "Share: [1] Twitter  [2] LinkedIn  [3] Facebook",
                cx,
                cy + 40.0,
                TextAlign::Center,
                C_HUD_POWER,
            );
            surface.fill_text("R : Play again   Q : Quit", cx, cy + 70.0, TextAlign::Center, C_HINT);
        }
    }
}

fn draw_panel(surface: &mut impl Surface) {
    let w = surface.width();
    let h = surface.height();
    surface.fill_rect(
        Rect::new(w * 0.1, h * 0.25, w * 0.8, h * 0.5),
        Fill::Solid(C_PANEL),
    );
}
