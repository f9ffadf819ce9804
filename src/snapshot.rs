// PNG snapshots of the presented frame, and the off-screen host used by --headless.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::driver::Host;
use crate::error::Error;
use crate::input::{InputAdapter, InputState};
use crate::types::FrameBuffer;

/// Write a 0x00RRGGBB frame as an RGB PNG.
pub fn save_png(frame: &FrameBuffer, path: &Path) -> Result<(), Error> {
    let img = RgbImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let px = frame.pixels[y as usize * frame.width + x as usize];
        Rgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8])
    });
    img.save(path)
        .map_err(|e| Error::Snapshot(format!("{}: {e}", path.display())))
}

/// Runs a fixed number of frames with no window and keeps the last one.
/// Scripted as a single touch at the centre: down on the first frame, and
/// up again after `hold` frames if one is set.
pub struct OffscreenHost {
    frames: usize,
    hold: Option<usize>,
    presented: usize,
    last: Option<FrameBuffer>,
}

impl OffscreenHost {
    pub fn new(frames: usize) -> Self {
        Self { frames, hold: None, presented: 0, last: None }
    }

    pub fn with_hold(mut self, hold: Option<usize>) -> Self {
        self.hold = hold;
        self
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last.as_ref()
    }
}

impl Host for OffscreenHost {
    fn is_open(&self) -> bool {
        self.presented < self.frames
    }

    fn pump(&mut self, input: &mut dyn InputAdapter) {
        if self.presented == 0 {
            input.on_touch_start(0.5, 0.5);
        }
        if self.hold == Some(self.presented) {
            input.on_touch_end();
        }
    }

    fn present(&mut self, frame: &FrameBuffer, _input: &InputState) -> Result<(), Error> {
        self.last = Some(frame.clone());
        self.presented += 1;
        Ok(())
    }
}
