//! Frontend-facing application wrapper for the Triton machine.
//!
//! Implements the shared `App` trait so a windowed frontend can drive the
//! emulator: one `update` per frame runs the cycle budget and repaints the
//! RGB frame (text screen, LED row, tape indicator, winking cursor), and
//! key events are mapped through the Triton key table. The app also owns
//! the panel keys: F1 reset, F2 clear-screen interrupt, F3 initialise
//! interrupt, F4 pause and F9 quit.

use triton_common::{App, Color, Key};

use crate::font::{FontRom, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::keymap;
use crate::machine::{TritonMachine, FRAME_RATE_HZ};
use crate::sound::Beeper;
use crate::tape::TapeStatus;
use crate::vdu::{VDU_CELLS, VDU_COLS};

/// Logical frame size: the 512x384 text area plus a 30-pixel status strip.
pub const SCREEN_WIDTH: usize = 512;
pub const SCREEN_HEIGHT: usize = 414;
pub const SCREEN_SCALE: u32 = 2;

const LED_RADIUS: usize = 7;
const LED_SPACING: usize = 15;
const LED_LEFT: usize = 15;
const LED_TOP: usize = 396;

const TAPE_LEFT: usize = 462;
const TAPE_TOP: usize = 386;
const TAPE_W: usize = 45;
const TAPE_H: usize = 30;

const LED_ON: Color = Color::new_rgb(250, 0, 0);
const LED_OFF: Color = Color::new_rgb(50, 0, 0);

pub struct TritonApp {
    pub machine: TritonMachine,
    font: FontRom,
    beeper: Option<Beeper>,
    should_exit: bool,
    paused: bool,
    shifted: bool,
    ctrl: bool,
    cursor_count: u32,
    cursor_on: bool,
}

impl TritonApp {
    pub fn new(machine: TritonMachine, font: FontRom) -> Self {
        Self {
            machine,
            font,
            beeper: None,
            should_exit: false,
            paused: false,
            shifted: false,
            ctrl: false,
            cursor_count: 0,
            cursor_on: true,
        }
    }

    /// Track the modifier keys the Triton key table needs; returns true
    /// when the event was a modifier.
    fn track_modifiers(&mut self, key: Key, is_down: bool) -> bool {
        match key {
            Key::LShift | Key::RShift => {
                self.shifted = is_down;
                true
            }
            Key::LCtrl | Key::RCtrl => {
                self.ctrl = is_down;
                true
            }
            _ => false,
        }
    }

    fn render(&self, screen: &mut [u8]) {
        debug_assert_eq!(screen.len(), SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        screen.fill(0);

        // Text cells through the character generator.
        for cell in 0..VDU_CELLS {
            let glyph = self.machine.video_cell(cell);
            let cell_x = (cell % VDU_COLS) * GLYPH_WIDTH;
            let cell_y = (cell / VDU_COLS) * GLYPH_HEIGHT;
            for row in 0..GLYPH_HEIGHT {
                let bits = self.font.glyph_row(glyph, row);
                if bits == 0 {
                    continue;
                }
                for col in 0..GLYPH_WIDTH {
                    if bits & (0x80 >> col) != 0 {
                        put_pixel(screen, cell_x + col, cell_y + row, Color::WHITE);
                    }
                }
            }
        }

        // LED row; a zero bit in the latch lights its LED.
        let leds = self.machine.led_buffer();
        for i in 0..8 {
            let lit = leds & (0x80 >> i) == 0;
            let cx = LED_LEFT + i * LED_SPACING + LED_RADIUS;
            let cy = LED_TOP + LED_RADIUS;
            fill_circle(screen, cx, cy, LED_RADIUS, if lit { LED_ON } else { LED_OFF });
        }

        // Tape indicator panel, one colour per deck state.
        let tape_color = if !self.machine.tape_relay() {
            Color::new_rgb(60, 60, 60)
        } else {
            match self.machine.tape_status() {
                TapeStatus::Idle => Color::YELLOW,
                TapeStatus::Reading => Color::GREEN,
                TapeStatus::Writing => Color::RED,
            }
        };
        fill_rect(screen, TAPE_LEFT, TAPE_TOP, TAPE_W, TAPE_H, tape_color);

        // Cursor: an 8x2 bar at the cell base, winking at 2 Hz.
        if self.cursor_on {
            let cursor = self.machine.cursor_position();
            let x = (cursor % VDU_COLS) * GLYPH_WIDTH;
            let y = (cursor / VDU_COLS) * GLYPH_HEIGHT + 18;
            fill_rect(screen, x, y, GLYPH_WIDTH, 2, Color::WHITE);
        }
    }
}

impl App for TritonApp {
    fn init(&mut self) {
        log::info!("Triton init");
        if self.beeper.is_none() {
            self.beeper = Beeper::new();
        }
    }

    fn update(&mut self, screen: &mut [u8]) {
        if !self.paused {
            self.machine.step_frame();

            // Cursor has a 2 Hz "winking" frequency.
            self.cursor_count += 1;
            if self.cursor_count > FRAME_RATE_HZ / 4 {
                self.cursor_on = !self.cursor_on;
                self.cursor_count = 0;
            }
        }

        self.render(screen);

        if let Some(beeper) = &self.beeper {
            beeper.set_active(!self.paused && self.machine.oscillator());
        }
    }

    fn handle_key_event(&mut self, key: Key, is_down: bool) {
        if self.track_modifiers(key, is_down) {
            return;
        }

        if is_down {
            match key {
                Key::F1 => {
                    self.machine.reset_button();
                    return;
                }
                Key::F2 => {
                    self.machine.push_button(1);
                    return;
                }
                Key::F3 => {
                    self.machine.push_button(2);
                    return;
                }
                Key::F4 => {
                    self.paused = !self.paused;
                    return;
                }
                Key::F9 => {
                    self.should_exit = true;
                    return;
                }
                _ => {}
            }
        }

        // Unmapped keys leave the latch untouched.
        if let Some(code) = keymap::map(key, self.shifted, self.ctrl) {
            self.machine.key_event(code, is_down);
        }
    }

    fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn exit(&mut self) {
        log::info!("Triton exit");
    }

    fn width(&self) -> u32 {
        SCREEN_WIDTH as u32
    }

    fn height(&self) -> u32 {
        SCREEN_HEIGHT as u32
    }

    fn scale(&self) -> u32 {
        SCREEN_SCALE
    }

    fn title(&self) -> String {
        "Transam Triton".to_string()
    }
}

fn put_pixel(screen: &mut [u8], x: usize, y: usize, color: Color) {
    if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
        return;
    }
    let idx = (y * SCREEN_WIDTH + x) * 3;
    screen[idx] = color.r;
    screen[idx + 1] = color.g;
    screen[idx + 2] = color.b;
}

fn fill_rect(screen: &mut [u8], x: usize, y: usize, w: usize, h: usize, color: Color) {
    for dy in 0..h {
        for dx in 0..w {
            put_pixel(screen, x + dx, y + dy, color);
        }
    }
}

fn fill_circle(screen: &mut [u8], cx: usize, cy: usize, r: usize, color: Color) {
    let r = r as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                let x = cx as i32 + dx;
                let y = cy as i32 + dy;
                if x >= 0 && y >= 0 {
                    put_pixel(screen, x as usize, y as usize, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TritonApp, SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::font::{FontRom, FONT_LEN, GLYPH_HEIGHT};
    use crate::machine::TritonMachine;
    use crate::tape::MemoryTape;
    use triton_common::{App, Key};

    fn app() -> TritonApp {
        // A font where every glyph's first row is its own index, so the
        // frame buffer can be checked cheaply.
        let mut image = vec![0u8; FONT_LEN];
        for glyph in 0..128 {
            image[glyph * GLYPH_HEIGHT] = 0x80;
        }
        let font = FontRom::from_bytes(&image).unwrap();
        let machine = TritonMachine::with_tape(Box::new(MemoryTape::new()));
        TritonApp::new(machine, font)
    }

    #[test]
    fn function_keys_never_reach_the_key_latch() {
        let mut app = app();
        app.machine.cpu.interrupts_enabled = true;
        app.machine.cpu.sp = 0x2000;
        app.handle_key_event(Key::F2, true);
        assert_eq!(app.machine.cpu.pc, 0x0008);
        assert_eq!(app.machine.bus.io.key_buffer, 0);
    }

    #[test]
    fn modifiers_change_the_mapped_code() {
        let mut app = app();
        app.handle_key_event(Key::LShift, true);
        app.handle_key_event(Key::A, true);
        assert_eq!(app.machine.bus.io.key_buffer, 0x41 | 0x80);
        app.handle_key_event(Key::A, false);
        assert_eq!(app.machine.bus.io.key_buffer, 0x41);
        app.handle_key_event(Key::LShift, false);
        app.handle_key_event(Key::A, true);
        assert_eq!(app.machine.bus.io.key_buffer, 0x61 | 0x80);
    }

    #[test]
    fn unmapped_key_leaves_latch_alone() {
        let mut app = app();
        app.handle_key_event(Key::A, true);
        app.handle_key_event(Key::None, true);
        assert_eq!(app.machine.bus.io.key_buffer, 0x61 | 0x80);
    }

    #[test]
    fn pause_stops_the_cpu_but_still_renders() {
        let mut app = app();
        app.handle_key_event(Key::F4, true);
        let mut screen = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3];
        let pc_before = app.machine.cpu.pc;
        app.update(&mut screen);
        assert_eq!(app.machine.cpu.pc, pc_before, "paused CPU must not run");
        // The LED row is painted even while paused (dim red, not black).
        assert!(screen.iter().any(|&b| b != 0));
        app.handle_key_event(Key::F4, true);
        app.update(&mut screen);
        assert_ne!(app.machine.cpu.pc, pc_before);
    }

    #[test]
    fn f9_requests_exit() {
        let mut app = app();
        assert!(!app.should_exit());
        app.handle_key_event(Key::F9, true);
        assert!(app.should_exit());
    }
}
