//! SDL2 presentation layer.
//!
//! Owns the window, the event pump and the frame limiter, and drives
//! anything implementing the shared `App` trait. The frontend knows
//! nothing about the machine: it hands the app an RGB24 buffer once per
//! frame and forwards logical key events, dropping them while the window
//! is out of focus.

use std::time::{Duration, Instant};

use anyhow::Result;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use typed_builder::TypedBuilder;

pub use sdl2;
pub use triton_common::App;
use triton_common::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB24,
}

#[derive(TypedBuilder)]
pub struct SdlInitInfo {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub title: String,
    #[builder(default = PixelFormat::RGB24)]
    pub pixel_format: PixelFormat,
    /// Wall-clock frame period; 40 ms for the Triton's 25 Hz display.
    #[builder(default = Duration::from_millis(40))]
    pub frame_period: Duration,
}

pub struct SdlContext;

impl SdlContext {
    pub fn run(sdl_init_info: SdlInitInfo, mut app: impl App) -> Result<()> {
        let SdlInitInfo {
            width,
            height,
            scale,
            title,
            pixel_format,
            frame_period,
        } = sdl_init_info;

        let sdl_context = sdl2::init().map_err(anyhow::Error::msg)?;
        let video_subsystem = sdl_context.video().map_err(anyhow::Error::msg)?;
        let window = video_subsystem
            .window(&title, width * scale, height * scale)
            .position_centered()
            .build()?;
        let mut canvas = window.into_canvas().build()?;
        canvas
            .set_scale(scale as f32, scale as f32)
            .map_err(anyhow::Error::msg)?;
        let creator = canvas.texture_creator();
        let mut texture = creator.create_texture_streaming(
            map_pixel_format(pixel_format),
            width,
            height,
        )?;

        let color_size = map_pixel_format_size(pixel_format);
        let mut screen_state = vec![0u8; (width * height * color_size) as usize];
        let mut event_pump = sdl_context.event_pump().map_err(anyhow::Error::msg)?;
        let mut in_focus = true;
        let mut last_frame = Instant::now();

        app.init();
        loop {
            if app.should_exit() {
                app.exit();
                break;
            }

            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        app.exit();
                        return Ok(());
                    }
                    Event::Window { win_event, .. } => match win_event {
                        WindowEvent::FocusGained => in_focus = true,
                        WindowEvent::FocusLost => in_focus = false,
                        _ => {}
                    },
                    Event::KeyDown {
                        keycode: Some(keycode),
                        repeat: false,
                        ..
                    } if in_focus => {
                        app.handle_key_event(map_keycode(keycode), true);
                    }
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } if in_focus => {
                        app.handle_key_event(map_keycode(keycode), false);
                    }
                    _ => {}
                }
            }

            app.update(&mut screen_state);

            texture.update(None, &screen_state, (width * color_size) as usize)?;
            canvas.clear();
            canvas
                .copy(&texture, None, None)
                .map_err(anyhow::Error::msg)?;
            canvas.present();

            // Hold the display to its frame period.
            let elapsed = last_frame.elapsed();
            if elapsed < frame_period {
                std::thread::sleep(frame_period - elapsed);
            }
            last_frame = Instant::now();
        }

        Ok(())
    }
}

pub fn map_pixel_format(pixel_format: PixelFormat) -> PixelFormatEnum {
    match pixel_format {
        PixelFormat::RGB24 => PixelFormatEnum::RGB24,
    }
}

pub fn map_pixel_format_size(pixel_format: PixelFormat) -> u32 {
    match pixel_format {
        PixelFormat::RGB24 => 3,
    }
}

pub fn map_keycode(keycode: Keycode) -> Key {
    match keycode {
        Keycode::A => Key::A,
        Keycode::B => Key::B,
        Keycode::C => Key::C,
        Keycode::D => Key::D,
        Keycode::E => Key::E,
        Keycode::F => Key::F,
        Keycode::G => Key::G,
        Keycode::H => Key::H,
        Keycode::I => Key::I,
        Keycode::J => Key::J,
        Keycode::K => Key::K,
        Keycode::L => Key::L,
        Keycode::M => Key::M,
        Keycode::N => Key::N,
        Keycode::O => Key::O,
        Keycode::P => Key::P,
        Keycode::Q => Key::Q,
        Keycode::R => Key::R,
        Keycode::S => Key::S,
        Keycode::T => Key::T,
        Keycode::U => Key::U,
        Keycode::V => Key::V,
        Keycode::W => Key::W,
        Keycode::X => Key::X,
        Keycode::Y => Key::Y,
        Keycode::Z => Key::Z,
        Keycode::Num0 => Key::Num0,
        Keycode::Num1 => Key::Num1,
        Keycode::Num2 => Key::Num2,
        Keycode::Num3 => Key::Num3,
        Keycode::Num4 => Key::Num4,
        Keycode::Num5 => Key::Num5,
        Keycode::Num6 => Key::Num6,
        Keycode::Num7 => Key::Num7,
        Keycode::Num8 => Key::Num8,
        Keycode::Num9 => Key::Num9,
        Keycode::LeftBracket => Key::LBracket,
        Keycode::RightBracket => Key::RBracket,
        Keycode::Semicolon => Key::Semicolon,
        Keycode::Comma => Key::Comma,
        Keycode::Period => Key::Period,
        Keycode::Quote => Key::Quote,
        Keycode::Slash => Key::Slash,
        Keycode::Backslash => Key::Backslash,
        Keycode::Equals => Key::Equal,
        Keycode::Minus => Key::Hyphen,
        Keycode::Escape => Key::Escape,
        Keycode::Space => Key::Space,
        Keycode::Return => Key::Return,
        Keycode::Backspace => Key::Backspace,
        Keycode::Left => Key::Left,
        Keycode::Right => Key::Right,
        Keycode::Up => Key::Up,
        Keycode::Down => Key::Down,
        Keycode::F1 => Key::F1,
        Keycode::F2 => Key::F2,
        Keycode::F3 => Key::F3,
        Keycode::F4 => Key::F4,
        Keycode::F9 => Key::F9,
        Keycode::LShift => Key::LShift,
        Keycode::RShift => Key::RShift,
        Keycode::LCtrl => Key::LCtrl,
        Keycode::RCtrl => Key::RCtrl,
        _ => Key::None,
    }
}
