/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Fade the persistent sky buffer (this produces the motion trails),
///      then rasterize shells and particles into it
///   2. Compose the sky into the `front` cell buffer as half-blocks
///      (each terminal cell holds two vertically stacked pixels)
///   3. Composite the overlay placards (greeting, emojis, photos) on top
///   4. Compare each cell with `back` (previous frame) and emit terminal
///      commands only for cells that changed, batched with `queue!`
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::firework::SHELL_RADIUS;
use crate::domain::particle::PARTICLE_RADIUS;
use crate::sim::scene::{SceneState, Viewport};
use crate::sim::stage::VisualKind;
use crate::ui::overlay::{OverlayStage, Placard};

/// Canvas units per sky pixel (one pixel = one half-block).
const UNITS_PER_PIXEL: f32 = 8.0;

/// Sky fade per frame — the sole trail mechanism. Equivalent to painting
/// a 20%-alpha black rectangle over the whole canvas.
const TRAIL_FADE: f32 = 0.8;

/// Intensities below this are treated as fully dark.
const DARK_FLOOR: f32 = 0.02;

type Rgb = (u8, u8, u8);

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16], // up to 16 bytes (supports ZWJ emoji sequences)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // true = this char occupies 2 terminal columns
    cont: bool, // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Night sky. Explicit black so trails blend against a known base.
    const BASE_BG: Color = Color::Rgb { r: 0, g: 0, b: 0 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = bg;
        cell
    }

    /// Create a wide cell from a multi-codepoint string (e.g. ZWJ emoji).
    fn from_str_wide(s: &str, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let bytes = s.as_bytes();
        let len = bytes.len().min(16);
        cell.ch[..len].copy_from_slice(&bytes[..len]);
        cell.ch_len = len as u8;
        cell.fg = fg;
        cell.bg = bg;
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let mut cx = x;
        for ch in s.chars() {
            if cx >= 0 && (cx as usize) < self.width {
                self.set(cx as usize, y as usize, Cell::from_char(ch, fg, bg));
            }
            cx += 1;
        }
    }
}

// ── Color helpers ──

/// Darken toward black: intensity 0 = black, 1 = full color.
fn scale(color: Rgb, intensity: f32) -> Rgb {
    let k = intensity.clamp(0.0, 1.0);
    (
        (color.0 as f32 * k) as u8,
        (color.1 as f32 * k) as u8,
        (color.2 as f32 * k) as u8,
    )
}

/// Linear blend from `a` to `b`.
fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    (
        (a.0 as f32 * (1.0 - t) + b.0 as f32 * t) as u8,
        (a.1 as f32 * (1.0 - t) + b.1 as f32 * t) as u8,
        (a.2 as f32 * (1.0 - t) + b.2 as f32 * t) as u8,
    )
}

fn rgb_color(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

fn color_rgb(c: Color) -> Rgb {
    match c {
        Color::Rgb { r, g, b } => (r, g, b),
        _ => (0, 0, 0),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Persistent glow buffer, term_w × term_h·2 pixels. Survives frames
    /// so the per-frame fade leaves trails.
    sky: Vec<(f32, Rgb)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            sky: Vec::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.apply_size(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Current terminal dimensions as a scene viewport.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            cols: self.term_w as u16,
            rows: self.term_h as u16,
        }
    }

    fn apply_size(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.sky = vec![(0.0, (0, 0, 0)); w * h * 2];
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, scene: &mut SceneState, overlay: &OverlayStage) -> io::Result<()> {
        // Detect terminal resize. The drawable surface changes going
        // forward; placards and in-flight shells are not repositioned.
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.apply_size(tw as usize, th as usize);
            scene.view = self.viewport();
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        self.fade_sky();
        self.raster_fireworks(scene);

        self.front.clear();
        self.compose_sky();
        self.compose_overlay(overlay);
        if scene.replay_offered {
            self.compose_replay_hint();
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Sky: fade + rasterize ──

    fn fade_sky(&mut self) {
        for px in &mut self.sky {
            px.0 *= TRAIL_FADE;
            if px.0 < DARK_FLOOR {
                *px = (0.0, (0, 0, 0));
            }
        }
    }

    /// Max-blend one pixel into the sky.
    fn plot(&mut self, px: i32, py: i32, intensity: f32, color: Rgb) {
        if px < 0 || py < 0 || px >= self.term_w as i32 || py >= (self.term_h * 2) as i32 {
            return;
        }
        let idx = py as usize * self.term_w + px as usize;
        if intensity > self.sky[idx].0 {
            self.sky[idx] = (intensity, color);
        }
    }

    /// A dot of the given radius (canvas units). Radii under a pixel light
    /// only their own pixel; larger ones spill a soft glow into the four
    /// neighbors.
    fn plot_dot(&mut self, x: f32, y: f32, radius: f32, intensity: f32, color: Rgb) {
        let px = (x / UNITS_PER_PIXEL).floor() as i32;
        let py = (y / UNITS_PER_PIXEL).floor() as i32;
        self.plot(px, py, intensity, color);
        if radius / UNITS_PER_PIXEL >= 0.75 {
            let glow = intensity * 0.45;
            self.plot(px - 1, py, glow, color);
            self.plot(px + 1, py, glow, color);
            self.plot(px, py - 1, glow, color);
            self.plot(px, py + 1, glow, color);
        }
    }

    fn raster_fireworks(&mut self, scene: &SceneState) {
        for fw in &scene.fireworks {
            let color = fw.color.to_rgb();
            if !fw.exploded {
                self.plot_dot(fw.x, fw.y, SHELL_RADIUS, 1.0, color);
            } else {
                for p in &fw.particles {
                    if p.alpha <= 0.0 {
                        continue;
                    }
                    self.plot_dot(p.x, p.y, PARTICLE_RADIUS, p.alpha.min(1.0), p.color.to_rgb());
                }
            }
        }
    }

    /// Pack pixel pairs into half-block cells: bg = upper pixel, fg = lower.
    fn compose_sky(&mut self) {
        for y in 0..self.term_h {
            for x in 0..self.term_w {
                let (ti, tc) = self.sky[(y * 2) * self.term_w + x];
                let (bi, bc) = self.sky[(y * 2 + 1) * self.term_w + x];
                if ti <= 0.0 && bi <= 0.0 {
                    continue; // stays BLANK
                }
                let cell = Cell::from_char(
                    '▄',
                    rgb_color(scale(bc, bi)),
                    rgb_color(scale(tc, ti)),
                );
                self.front.set(x, y, cell);
            }
        }
    }

    // ── Overlay placards ──

    fn compose_overlay(&mut self, overlay: &OverlayStage) {
        for placard in overlay.placards() {
            if !placard.visible {
                continue;
            }
            match &placard.kind {
                VisualKind::Greeting(text) => self.draw_greeting(placard, text),
                VisualKind::Emoji(glyph) => self.draw_emoji(placard, glyph),
                VisualKind::Photo(label) => {
                    // Fully transparent photos let the fireworks through.
                    if placard.opacity > 0.01 {
                        self.draw_photo(placard, label);
                    }
                }
            }
        }
    }

    /// Banner text over the sky, keeping each cell's background so the
    /// trails stay visible behind the letters.
    fn put_text_over(&mut self, x: i32, y: i32, s: &str, fg: Rgb) {
        if y < 0 || y >= self.term_h as i32 {
            return;
        }
        let mut cx = x;
        for ch in s.chars() {
            if cx >= 0 && (cx as usize) < self.term_w {
                let under = self.front.get(cx as usize, y as usize).bg;
                self.front
                    .set(cx as usize, y as usize, Cell::from_char(ch, rgb_color(fg), under));
            }
            cx += 1;
        }
    }

    fn draw_greeting(&mut self, p: &Placard, text: &str) {
        let fg = if p.emphasis {
            (255, 214, 90) // revealed: warm gold
        } else {
            (150, 150, 160)
        };
        self.put_text_over(p.col, p.row, text, fg);
    }

    /// Emoji hop one row up while bouncing.
    fn draw_emoji(&mut self, p: &Placard, glyph: &str) {
        let row = if p.emphasis { p.row - 1 } else { p.row };
        if row < 0 || row >= self.term_h as i32 || p.col < 0 {
            return;
        }
        let x = p.col as usize;
        if x + 1 >= self.term_w {
            return;
        }
        let under = self.front.get(x, row as usize).bg;
        self.front
            .set(x, row as usize, Cell::from_str_wide(glyph, Color::White, under));
        self.front.set(x + 1, row as usize, Cell::WIDE_CONT);
    }

    /// A bordered placard, alpha-blended over the sky by its opacity.
    fn draw_photo(&mut self, p: &Placard, label: &str) {
        let a = p.opacity.clamp(0.0, 1.0);
        let frame_fg = scale((255, 220, 180), a);
        let fill = (70, 52, 34);
        let w = p.width as i32;
        let h = p.height as i32;

        for r in 0..h {
            let y = p.row + r;
            if y < 0 || y >= self.term_h as i32 {
                continue;
            }
            for c in 0..w {
                let x = p.col + c;
                if x < 0 || x >= self.term_w as i32 {
                    continue;
                }
                let ch = match (r, c) {
                    (0, 0) => '┌',
                    (0, cc) if cc == w - 1 => '┐',
                    (rr, 0) if rr == h - 1 => '└',
                    (rr, cc) if rr == h - 1 && cc == w - 1 => '┘',
                    (0, _) => '─',
                    (rr, _) if rr == h - 1 => '─',
                    (_, 0) => '│',
                    (_, cc) if cc == w - 1 => '│',
                    _ => ' ',
                };
                let under = color_rgb(self.front.get(x as usize, y as usize).bg);
                let bg = mix(under, fill, a * 0.55);
                self.front.set(
                    x as usize,
                    y as usize,
                    Cell::from_char(ch, rgb_color(frame_fg), rgb_color(bg)),
                );
            }
        }

        // Label centered on the middle row, over the interior fill.
        let label_row = p.row + h / 2;
        let label_col = p.col + (w - label.chars().count() as i32) / 2;
        if label_row > p.row && label_row < p.row + h - 1 {
            self.put_text_over(label_col, label_row, label, scale((255, 235, 200), a));
        }
    }

    fn compose_replay_hint(&mut self) {
        let hint = " [R] Replay   [Q] Quit ";
        let x = (self.term_w as i32 - hint.chars().count() as i32) / 2;
        let y = self.term_h as i32 - 1;
        self.front
            .put_str(x, y, hint, Color::White, Cell::BASE_BG);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        queue!(
            self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
                x += if cell.wide { 2 } else { 1 };
            }
        }

        self.writer.flush()
    }
}
