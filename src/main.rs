// What you SEE:
// • A flame fills the window and follows your mouse.
// • Left Mouse: feed the fire. Right Mouse: let it die down.
// • --variant inertia: the flame streams behind fast pointer motion.
// • S saves a PNG of the current frame. ESC quits.
// • --headless renders N frames off-screen and writes the PNG instead.

mod bloom;
mod clock;
mod config;
mod cue;
mod draw;
mod driver;
mod error;
mod field;
mod input;
mod noise;
mod physics;
mod render;
mod snapshot;
mod types;
mod window;

use clap::Parser;

use bloom::{Bloom, PostProcess};
use clock::FrameClock;
use config::Args;
use cue::{CueSink, LogCue, SilentCue};
use driver::{CancelToken, FrameDriver};
use error::Error;
use snapshot::{save_png, OffscreenHost};
use window::WindowHost;

fn main() -> Result<(), Error> {
    let cfg = Args::parse().into_config()?;

    /* --- Collaborators ---
       Visual: bloom makes the core glow; the cue only reports play/pause. */
    let post: Box<dyn PostProcess> = Box::new(Bloom::new(cfg.bloom.clone()));
    let cue: Box<dyn CueSink> =
        if cfg.mute { Box::new(SilentCue) } else { Box::new(LogCue::stderr()) };

    let (w, h, res) = (cfg.driver.width, cfg.driver.height, cfg.driver.sim_res);
    let mut driver = FrameDriver::new(cfg.driver, post, cue);
    let token = CancelToken::new();

    if cfg.headless {
        /* --- Off-screen: fixed timestep, pointer held at the centre --- */
        let mut host = OffscreenHost::new(cfg.frames).with_hold(cfg.hold);
        let mut clock = FrameClock::fixed(cfg.dt);
        eprintln!("rendering {} frames of {w}x{h} (grid {res}) off-screen", cfg.frames);
        driver.run(&mut host, &mut clock, &token)?;

        match host.last_frame() {
            Some(frame) => {
                save_png(frame, &cfg.snapshot)?;
                eprintln!("saved {}", cfg.snapshot.display());
            }
            None => eprintln!("no frames rendered; nothing saved"),
        }
        return Ok(());
    }

    /* --- Window: driven by the display refresh --- */
    let mut host = WindowHost::new("Flame", w, h, token.clone())?
        .with_overlays(cfg.hud, cfg.crosshair)
        .with_snapshot_path(cfg.snapshot);
    let mut clock = FrameClock::realtime();
    eprintln!("flame running at {w}x{h} (grid {res})");
    eprintln!("LMB: feed  RMB: starve  S: snapshot  ESC: quit");
    driver.run(&mut host, &mut clock, &token)
}
