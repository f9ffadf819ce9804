// Window host: a minifb window that shows the flame and turns mouse/keyboard
// state into input events.
// Left mouse lights the fire, right mouse puts it out, ESC quits, S saves a PNG.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::draw::{draw_crosshair, draw_text_5x7};
use crate::driver::{CancelToken, Host};
use crate::error::Error;
use crate::input::{InputAdapter, InputState, PointerButton};
use crate::snapshot::save_png;
use crate::types::FrameBuffer;

/// Prints/returns frames per second once per second.
struct FpsCounter {
    since: Instant,
    frames: u32,
    text: String,
}

impl FpsCounter {
    fn new() -> Self {
        Self { since: Instant::now(), frames: 0, text: String::from("FPS: 0.0") }
    }

    fn frame(&mut self) {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            println!("FPS: {:.1}", fps);
            self.text = format!("FPS: {:.1}", fps);
            self.frames = 0;
            self.since = Instant::now();
        }
    }
}

pub struct WindowHost {
    window: Window,
    size: (usize, usize),
    mouse: Option<(f32, f32)>,
    left_was_down: bool,
    right_was_down: bool,
    hud: bool,
    crosshair: bool,
    overlay: FrameBuffer, // frame copy the HUD/crosshair are drawn onto
    snapshot: PathBuf,
    fps: FpsCounter,
    quit: CancelToken, // ESC cancels the frame loop
}

impl WindowHost {
    /// Resizable window; failure here is fatal to startup.
    /// ESC cancels `quit`, which the driver checks before every frame.
    pub fn new(title: &str, width: usize, height: usize, quit: CancelToken) -> Result<Self, Error> {
        let opts = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, opts)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self {
            window,
            size: (width, height),
            mouse: None,
            left_was_down: false,
            right_was_down: false,
            hud: false,
            crosshair: false,
            overlay: FrameBuffer::new(0, 0),
            snapshot: PathBuf::from("flame.png"),
            fps: FpsCounter::new(),
            quit,
        })
    }

    pub fn with_overlays(mut self, hud: bool, crosshair: bool) -> Self {
        self.hud = hud;
        self.crosshair = crosshair;
        self
    }

    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot = path;
        self
    }

    fn draw_overlays(&mut self, frame: &FrameBuffer, input: &InputState) {
        self.overlay.clone_from(frame);
        if self.crosshair {
            let p = input.pointer();
            let cx = (p.x * frame.width as f32) as i32;
            let cy = (p.y * frame.height as f32) as i32;
            draw_crosshair(&mut self.overlay, cx, cy, 12, 0x00_FF_CC_33);
        }
        if self.hud {
            let state = if input.is_active() { "ACTIVE" } else { "IDLE" };
            let text = format!("{} | {}", state, self.fps.text);
            draw_text_5x7(&mut self.overlay, 8, 8, &text, 0x00_FF_FF_FF);
        }
    }
}

impl Host for WindowHost {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn pump(&mut self, input: &mut dyn InputAdapter) {
        if self.window.is_key_down(Key::Escape) {
            self.quit.cancel();
        }

        let size = self.window.get_size();
        if size != self.size && size.0 > 0 && size.1 > 0 {
            self.size = size;
            input.on_resize(size.0, size.1);
        }

        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            if self.mouse != Some((mx, my)) {
                self.mouse = Some((mx, my));
                input.on_move(mx / w, my / h);
            }
        }

        // presses are edges, not levels
        let left = self.window.get_mouse_down(MouseButton::Left);
        if left && !self.left_was_down {
            input.on_press(PointerButton::Primary);
        }
        self.left_was_down = left;

        let right = self.window.get_mouse_down(MouseButton::Right);
        if right && !self.right_was_down {
            input.on_press(PointerButton::Secondary);
        }
        self.right_was_down = right;
    }

    fn present(&mut self, frame: &FrameBuffer, input: &InputState) -> Result<(), Error> {
        if self.window.is_key_pressed(Key::S, KeyRepeat::No) {
            match save_png(frame, &self.snapshot) {
                Ok(()) => eprintln!("saved {}", self.snapshot.display()),
                Err(e) => eprintln!("{e}"),
            }
        }

        self.fps.frame();

        let shown = if self.hud || self.crosshair {
            self.draw_overlays(frame, input);
            &self.overlay
        } else {
            frame
        };
        self.window
            .update_with_buffer(&shown.pixels, shown.width, shown.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }
}
