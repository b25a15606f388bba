//! Window front end: winit event loop, pixels surface, keyboard to pad 1,
//! mouse to a light gun in port 2.

use std::error::Error;
use std::time::{Duration, Instant};

use cyclenes::console::Console;
use cyclenes::controller::{Button, Port};
use cyclenes::ppu::{NES_HEIGHT, NES_WIDTH};
use pixels::{Pixels, SurfaceTexture};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const SCALE: u32 = 3;

/// ~60.1 Hz NTSC.
const FRAME_DURATION: Duration = Duration::from_micros(16_639);

pub fn run(console: Console) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(console);
    event_loop.run_app(&mut app)?;
    info!(frames = app.console.frame_count(), "window closed");
    Ok(())
}

fn map_key(key: KeyCode) -> Option<Button> {
    Some(match key {
        KeyCode::KeyX => Button::A,
        KeyCode::KeyZ => Button::B,
        KeyCode::ShiftRight | KeyCode::Backspace => Button::Select,
        KeyCode::Enter => Button::Start,
        KeyCode::ArrowUp => Button::Up,
        KeyCode::ArrowDown => Button::Down,
        KeyCode::ArrowLeft => Button::Left,
        KeyCode::ArrowRight => Button::Right,
        _ => return None,
    })
}

struct App {
    console: Console,
    window: Option<&'static Window>,
    pixels: Option<Pixels<'static>>,
    last_frame_time: Instant,
}

impl App {
    fn new(console: Console) -> Self {
        Self {
            console,
            window: None,
            pixels: None,
            last_frame_time: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::F5 && pressed {
            self.console.reset();
            return;
        }
        let Some(button) = map_key(key) else {
            return;
        };
        if let Some(pad) = self.console.input_mut(0).and_then(Port::as_controller_mut) {
            pad.set_button(button, pressed);
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        let Some(window) = self.window else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let x = position.x / f64::from(size.width) * NES_WIDTH as f64;
        let y = position.y / f64::from(size.height) * NES_HEIGHT as f64;
        let target = (x >= 0.0 && y >= 0.0 && x < NES_WIDTH as f64 && y < NES_HEIGHT as f64)
            .then_some((x as u16, y as u16));
        if let Some(gun) = self.console.input_mut(1).and_then(Port::as_zapper_mut) {
            gun.aim(target);
        }
    }

    fn handle_trigger(&mut self, pulled: bool) {
        if let Some(gun) = self.console.input_mut(1).and_then(Port::as_zapper_mut) {
            gun.set_trigger(pulled);
        }
    }

    fn run_frame(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            self.console.step_frame();
            return;
        };
        let target = pixels.frame_mut();
        self.console.run_frame(&mut |frame: &[u32]| {
            for (dst, &argb) in target.chunks_exact_mut(4).zip(frame) {
                let [_, r, g, b] = argb.to_be_bytes();
                dst.copy_from_slice(&[r, g, b, 0xFF]);
            }
        });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = winit::dpi::LogicalSize::new(NES_WIDTH as u32 * SCALE, NES_HEIGHT as u32 * SCALE);
        let attrs = WindowAttributes::default()
            .with_title("cyclenes")
            .with_inner_size(size)
            .with_resizable(false);

        let window = match event_loop.create_window(attrs) {
            Ok(window) => window,
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let window: &'static Window = Box::leak(Box::new(window));
        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, window);
        match Pixels::new(NES_WIDTH as u32, NES_HEIGHT as u32, surface) {
            Ok(pixels) => self.pixels = Some(pixels),
            Err(e) => {
                error!("failed to create pixel surface: {e}");
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if key == KeyCode::Escape && pressed {
                        event_loop.exit();
                        return;
                    }
                    self.handle_key(key, pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position),
            WindowEvent::CursorLeft { .. } => {
                if let Some(gun) = self.console.input_mut(1).and_then(Port::as_zapper_mut) {
                    gun.aim(None);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.handle_trigger(state == ElementState::Pressed),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if now.duration_since(self.last_frame_time) >= FRAME_DURATION {
                    self.run_frame();
                    self.last_frame_time = now;
                }
                if let Some(pixels) = self.pixels.as_ref() {
                    if let Err(e) = pixels.render() {
                        error!("render failed: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window {
            window.request_redraw();
        }
    }
}
