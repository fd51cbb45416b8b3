//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ sim hand: open @ 0.50,0.50                                  │
//! │                                                            │
//! │                 ·  ·   *  ·                                │
//! │              ·   · ▲ ·   ·      projected objects,         │
//! │                ·  ▲▲▲  ·        far to near                │
//! │                  ▲▲▲▲▲                                     │
//! │                                                            │
//! │ status bar: scene / camera / gesture / hand / focus        │
//! │ last action                                                │
//! │ key legend                                                 │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The visualizer is the scene's [`RenderSink`]: transforms are buffered
//! during the frame and projected in [`Visualizer::present`].

use std::time::{Duration, Instant};

use glam::{Vec2, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::warn;
use tree_motion::{PopulationKind, RenderSink};

use crate::app::PointerInput;
use crate::gesture::GestureLabel;
use crate::tracker::SimHandle;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 960;
pub const WIN_H:     usize = 640;
const STATUS_H:      usize = 54;
const STATUS_Y:      usize = WIN_H - STATUS_H;
const FOCAL:         f32   = WIN_H as f32 * 0.9;
const NEAR:          f32   = 0.1;
/// World units to pixels for an object of scale 1 at depth 1.
const SPRITE_SIZE:   f32   = 0.12;
const BG_COLOR:      u32   = 0xFF0B1026;
const TEXT_BG:       u32   = 0xFF16213E;
const TEXT_COLOR:    u32   = 0xFFEEEEEE;
const DIM_TEXT:      u32   = 0xFF888888;
const GOLD:          u32   = 0xFFFFD700;
/// Palm movement per frame while an arrow key is held.
const PALM_STEP:     f32   = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Screen position and depth of `p` seen from `eye` looking at `look_at`.
/// `None` behind the near plane.
pub fn project(eye: Vec3, look_at: Vec3, p: Vec3) -> Option<(Vec2, f32)> {
    let forward = (look_at - eye).normalize_or_zero();
    if forward == Vec3::ZERO {
        return None;
    }
    let right = forward.cross(Vec3::Y).normalize_or_zero();
    let up = right.cross(forward);

    let d = p - eye;
    let z = d.dot(forward);
    if !(z > NEAR) {
        return None;
    }
    let sx = WIN_W as f32 * 0.5 + d.dot(right) * FOCAL / z;
    let sy = STATUS_Y as f32 * 0.5 - d.dot(up) * FOCAL / z;
    Some((Vec2::new(sx, sy), z))
}

fn sprite_color(kind: PopulationKind, index: usize) -> u32 {
    match kind {
        PopulationKind::Needles => {
            const GREENS: [u32; 3] = [0xFF1E6B3A, 0xFF2E8B57, 0xFF3CB371];
            GREENS[index % GREENS.len()]
        }
        PopulationKind::Ornaments => {
            const BAUBLES: [u32; 4] = [0xFFD62828, GOLD, 0xFF4D96FF, 0xFFC0C0C0];
            BAUBLES[index % BAUBLES.len()]
        }
        PopulationKind::Ribbon     => 0xFFF4C430,
        PopulationKind::PhotoCards => 0xFFF5F0E6,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Double-click detection
// ════════════════════════════════════════════════════════════════════════════

/// Two presses within `window` make a double-click; the pair is consumed so
/// a third press starts over.
#[derive(Clone, Debug)]
pub struct ClickDetector {
    window: Duration,
    last:   Option<Instant>,
}

impl ClickDetector {
    pub fn new(window_ms: u64) -> Self {
        ClickDetector { window: Duration::from_millis(window_ms), last: None }
    }

    pub fn press(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.saturating_duration_since(prev) <= self.window => {
                self.last = None;
                true
            }
            _ => {
                self.last = Some(now);
                false
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Simulated hand
// ════════════════════════════════════════════════════════════════════════════

struct SimHand {
    handle:  SimHandle,
    label:   GestureLabel,
    palm:    Vec2,
    visible: bool,
}

impl SimHand {
    /// Push one camera frame, but only while a tracker is listening.
    fn stream(&self) {
        if !self.handle.is_streaming() {
            return;
        }
        if self.visible {
            self.handle.show(self.label, self.palm);
        } else {
            self.handle.hide();
        }
    }

    fn describe(&self) -> String {
        if self.visible {
            format!("sim hand: {} @ {:.2},{:.2}", self.label.name(), self.palm.x, self.palm.y)
        } else {
            "sim hand: hidden".to_string()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

struct Sprite {
    kind:  PopulationKind,
    index: usize,
    pos:   Vec3,
    scale: f32,
}

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    sprites:    Vec<Sprite>,
    eye:        Vec3,
    look_at:    Vec3,
    sim:        Option<SimHand>,
    clicks:     ClickDetector,
    mouse_down: bool,
    drag_x:     Option<f32>,
}

impl Visualizer {
    pub fn new(sim: Option<SimHandle>, double_click_ms: u64) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Gesture Tree",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.set_target_fps(60);

        Ok(Visualizer {
            window,
            buf:        vec![BG_COLOR; WIN_W * WIN_H],
            sprites:    Vec::new(),
            eye:        Vec3::new(0.0, 0.0, 1.0),
            look_at:    Vec3::ZERO,
            sim:        sim.map(|handle| SimHand {
                handle,
                label:   GestureLabel::Open,
                palm:    Vec2::splat(0.5),
                visible: false,
            }),
            clicks:     ClickDetector::new(double_click_ms),
            mouse_down: false,
            drag_x:     None,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll mouse and keyboard. Pointer intents are appended to `out`;
    /// simulated hand keys update the sim hand and stream a frame.
    /// Returns false when the window should close.
    pub fn poll_input(&mut self, out: &mut Vec<PointerInput>) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);

        if one_shot(&self.window, Key::Q) || one_shot(&self.window, Key::Escape) {
            return false;
        }
        if one_shot(&self.window, Key::C) {
            out.push(PointerInput::RequestCamera);
        }
        if one_shot(&self.window, Key::R) {
            out.push(PointerInput::ReleaseCamera);
        }

        // ── mouse: double-click and drag ──────────────────────────────────
        let down = self.window.get_mouse_down(MouseButton::Left);
        let pos = self.window.get_mouse_pos(MouseMode::Discard);
        if down && !self.mouse_down && self.clicks.press(Instant::now()) {
            out.push(PointerInput::DoubleClick);
        }
        match (down, pos) {
            (true, Some((x, _))) => {
                if let Some(prev) = self.drag_x {
                    let dx = x - prev;
                    if dx != 0.0 {
                        out.push(PointerInput::Drag { dx });
                    }
                }
                self.drag_x = Some(x);
            }
            _ => self.drag_x = None,
        }
        self.mouse_down = down;

        // ── simulated hand ────────────────────────────────────────────────
        if let Some(sim) = self.sim.as_mut() {
            let w = &self.window;
            let picks = [
                (Key::Key1, GestureLabel::Fist),
                (Key::Key2, GestureLabel::Open),
                (Key::Key3, GestureLabel::Pinch),
                (Key::Key4, GestureLabel::Pointing),
                (Key::Key0, GestureLabel::None),
            ];
            for (key, label) in picks {
                if one_shot(w, key) {
                    sim.label = label;
                    sim.visible = true;
                }
            }
            if one_shot(w, Key::H) {
                sim.visible = !sim.visible;
            }

            let mut step = Vec2::ZERO;
            if w.is_key_down(Key::Left)  { step.x -= PALM_STEP; }
            if w.is_key_down(Key::Right) { step.x += PALM_STEP; }
            if w.is_key_down(Key::Up)    { step.y -= PALM_STEP; }
            if w.is_key_down(Key::Down)  { step.y += PALM_STEP; }
            // the camera mirrors x, so move the image-space palm the other way
            step.x = -step.x;
            sim.palm = (sim.palm + step).clamp(Vec2::splat(0.15), Vec2::splat(0.85));

            sim.stream();
        }

        true
    }

    /// Draw the buffered frame and the status bar.
    pub fn present(&mut self, hud: &str, status: &str) {
        self.buf.fill(BG_COLOR);

        // ── objects, far to near ──────────────────────────────────────────
        let (eye, look_at) = (self.eye, self.look_at);
        let mut projected: Vec<(Vec2, f32, f32, PopulationKind, usize)> = self
            .sprites
            .iter()
            .filter_map(|s| {
                let (at, depth) = project(eye, look_at, s.pos)?;
                let size = (s.scale * SPRITE_SIZE * FOCAL / depth).clamp(1.0, 80.0);
                Some((at, depth, size, s.kind, s.index))
            })
            .collect();
        projected.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (at, _, size, kind, index) in projected {
            let half = size * 0.5;
            let x = (at.x - half).round() as isize;
            let y = (at.y - half).round() as isize;
            let s = size.round().max(1.0) as usize;
            self.fill_rect_clipped(x, y, s, s, sprite_color(kind, index));
            if kind == PopulationKind::PhotoCards && s >= 4 {
                self.draw_border_clipped(x, y, s, s, GOLD);
            }
        }

        // ── sim hand ──────────────────────────────────────────────────────
        if let Some(line) = self.sim.as_ref().map(SimHand::describe) {
            self.draw_text(&line, 10, 10, DIM_TEXT, 2);
        }

        // ── status bar ────────────────────────────────────────────────────
        self.fill_rect_clipped(0, STATUS_Y as isize, WIN_W, STATUS_H, TEXT_BG);
        self.draw_text(hud, 10, STATUS_Y + 6, TEXT_COLOR, 2);
        self.draw_text(status, 10, STATUS_Y + 24, GOLD, 1);
        self.draw_text(
            "dbl-click=toggle  drag=orbit  C=camera  R=release  1-4,0=sim hand  H=hide  arrows=move  Q=quit",
            10, WIN_H - 10, DIM_TEXT, 1,
        );

        if let Err(e) = self.window.update_with_buffer(&self.buf, WIN_W, WIN_H) {
            warn!(error = %e, "frame dropped");
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect_clipped(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        let x0 = x.clamp(0, WIN_W as isize) as usize;
        let y0 = y.clamp(0, WIN_H as isize) as usize;
        let x1 = (x + w as isize).clamp(x0 as isize, WIN_W as isize) as usize;
        let y1 = (y + h as isize).clamp(y0 as isize, WIN_H as isize) as usize;
        for row in y0..y1 {
            self.buf[row * WIN_W + x0..row * WIN_W + x1].fill(color);
        }
    }

    fn draw_border_clipped(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        let (w, h) = (w as isize, h as isize);
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    /// 3×5 bitmap text, each font pixel drawn as a `px`×`px` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32, px: usize) {
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * px > WIN_W { break; }
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits & (1 << (14 - (row * 3 + col))) != 0 {
                        let gx = (cx + col * px) as isize;
                        let gy = (y + row * px) as isize;
                        self.fill_rect_clipped(gx, gy, px, px, color);
                    }
                }
            }
            cx += 4 * px;
        }
    }
}

impl RenderSink for Visualizer {
    fn begin_frame(&mut self) {
        self.sprites.clear();
    }

    fn set_transform(&mut self, kind: PopulationKind, index: usize, position: Vec3, scale: f32) {
        self.sprites.push(Sprite { kind, index, pos: position, scale });
    }

    fn set_viewpoint(&mut self, eye: Vec3, look_at: Vec3) {
        self.eye = eye;
        self.look_at = look_at;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font, rows packed top to bottom into the low 15 bits
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> u16 {
    match c.to_ascii_lowercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'a' => 0b111_101_111_101_101,
        'b' => 0b110_101_110_101_110,
        'c' => 0b111_100_100_100_111,
        'd' => 0b110_101_101_101_110,
        'e' => 0b111_100_111_100_111,
        'f' => 0b111_100_111_100_100,
        'g' => 0b111_100_101_101_111,
        'h' => 0b101_101_111_101_101,
        'i' => 0b111_010_010_010_111,
        'j' => 0b001_001_001_101_111,
        'k' => 0b101_101_110_101_101,
        'l' => 0b100_100_100_100_111,
        'm' => 0b101_111_101_101_101,
        'n' => 0b111_101_101_101_101,
        'o' => 0b111_101_101_101_111,
        'p' => 0b111_101_111_100_100,
        'q' => 0b111_101_101_111_001,
        'r' => 0b110_101_110_101_101,
        's' => 0b111_100_111_001_111,
        't' => 0b111_010_010_010_010,
        'u' => 0b101_101_101_101_111,
        'v' => 0b101_101_101_010_010,
        'w' => 0b101_101_101_111_101,
        'x' => 0b101_101_010_101_101,
        'y' => 0b101_101_111_010_010,
        'z' => 0b111_001_010_100_111,
        '/' => 0b001_001_010_100_100,
        '-' | '—' => 0b000_000_111_000_000,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '=' => 0b000_111_000_111_000,
        '+' => 0b000_010_111_010_000,
        '@' => 0b111_101_111_100_111,
        '…' => 0b000_000_000_000_101,
        ' ' => 0,
        _   => 0b000_000_010_000_000,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
