// Command line flags -> validated configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::bloom::BloomSettings;
use crate::driver::DriverConfig;
use crate::error::Error;
use crate::field::EdgeMode;
use crate::physics::PhysicsParams;
use crate::render::RenderParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Fire on at load, tight fuel disc
    Classic,
    /// Fire off until pressed, wider disc, flame streams behind fast motion
    Inertia,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Edge {
    Clamp,
    Wrap,
}

#[derive(Parser, Debug)]
#[command(name = "flame-canvas", about = "Interactive flame that follows the pointer")]
pub struct Args {
    /// window width in pixels
    #[arg(long, default_value_t = 960)]
    pub width: usize,

    /// window height in pixels
    #[arg(long, default_value_t = 540)]
    pub height: usize,

    /// side of the heat grid (independent of the window)
    #[arg(long, default_value_t = 512)]
    pub sim_res: usize,

    #[arg(long, value_enum, default_value_t = Variant::Classic)]
    pub variant: Variant,

    /// fuel disc radius (uv units); defaults per variant
    #[arg(long)]
    pub radius: Option<f32>,

    /// start with the fire lit
    #[arg(long, conflicts_with = "start_idle")]
    pub start_active: bool,

    /// start with the fire out
    #[arg(long)]
    pub start_idle: bool,

    /// how the field is sampled past its borders
    #[arg(long, value_enum, default_value_t = Edge::Clamp)]
    pub edge: Edge,

    #[arg(long, default_value_t = 2.5)]
    pub bloom_intensity: f32,

    #[arg(long, default_value_t = 0.15)]
    pub bloom_threshold: f32,

    #[arg(long, default_value_t = 0.85)]
    pub bloom_radius: f32,

    /// skip the glow stage
    #[arg(long)]
    pub no_bloom: bool,

    /// show state + FPS in the corner
    #[arg(long)]
    pub hud: bool,

    /// draw a crosshair at the pointer
    #[arg(long)]
    pub crosshair: bool,

    /// no audio cues
    #[arg(long)]
    pub mute: bool,

    /// render off-screen and write a PNG instead of opening a window
    #[arg(long)]
    pub headless: bool,

    /// frames to simulate in headless mode
    #[arg(long, default_value_t = 120)]
    pub frames: usize,

    /// headless: lift the touch after this many frames so the flame burns out
    #[arg(long)]
    pub hold: Option<usize>,

    /// fixed timestep for headless mode (seconds)
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// where snapshots go (headless output, or `S` in the window)
    #[arg(long, default_value = "flame.png")]
    pub snapshot: PathBuf,
}

/// Everything main needs, already range-checked.
#[derive(Clone, Debug)]
pub struct FlameConfig {
    pub driver: DriverConfig,
    pub bloom: BloomSettings,
    pub hud: bool,
    pub crosshair: bool,
    pub mute: bool,
    pub headless: bool,
    pub frames: usize,
    pub hold: Option<usize>,
    pub dt: f32,
    pub snapshot: PathBuf,
}

impl Args {
    pub fn into_config(self) -> Result<FlameConfig, Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!("window {}x{} has no area", self.width, self.height)));
        }
        if self.sim_res < 2 {
            return Err(Error::Config(format!("sim-res {} is too small", self.sim_res)));
        }
        if !(self.dt > 0.0) {
            return Err(Error::Config(format!("dt must be positive, got {}", self.dt)));
        }

        let inertia = self.variant == Variant::Inertia;
        let radius = self.radius.unwrap_or(if inertia { 0.068 } else { 0.05 });
        if !(radius > 0.0 && radius < 1.0) {
            return Err(Error::Config(format!("radius {radius} must be in (0, 1)")));
        }
        if self.bloom_intensity < 0.0 || self.bloom_radius < 0.0 {
            return Err(Error::Config("bloom intensity/radius must not be negative".into()));
        }

        let start_active = if self.start_active {
            true
        } else if self.start_idle {
            false
        } else {
            !inertia
        };

        let edge = match self.edge {
            Edge::Clamp => EdgeMode::Clamp,
            Edge::Wrap => EdgeMode::Wrap,
        };

        let physics =
            PhysicsParams { fuel_radius: radius, inertia, edge, ..PhysicsParams::default() };
        let render = RenderParams { edge, ..RenderParams::default() };
        let bloom = BloomSettings {
            intensity: if self.no_bloom { 0.0 } else { self.bloom_intensity },
            threshold: self.bloom_threshold,
            radius: self.bloom_radius,
            ..BloomSettings::default()
        };

        Ok(FlameConfig {
            driver: DriverConfig {
                sim_res: self.sim_res,
                width: self.width,
                height: self.height,
                start_active,
                physics,
                render,
            },
            bloom,
            hud: self.hud,
            crosshair: self.crosshair,
            mute: self.mute,
            headless: self.headless,
            frames: self.frames,
            hold: self.hold,
            dt: self.dt,
            snapshot: self.snapshot,
        })
    }
}
