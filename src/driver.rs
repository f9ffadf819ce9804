// Frame driver: the only owner of cross-component state.
// Per tick: input -> velocity -> physics -> swap -> colour -> post -> present.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use crate::bloom::PostProcess;
use crate::clock::FrameClock;
use crate::cue::CueSink;
use crate::error::Error;
use crate::input::{input_channel, InputAdapter, InputEvent, InputQueue, InputState, Transition};
use crate::physics::{PhysicsParams, Simulation, StepInput};
use crate::render::{render, RenderParams};
use crate::types::{FrameBuffer, HdrImage};

/// Shared stop flag, checked before every tick.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The display side: a window, or an off-screen sink.
pub trait Host {
    fn is_open(&self) -> bool;
    /// Forward whatever native input arrived since the last frame.
    fn pump(&mut self, input: &mut dyn InputAdapter);
    fn present(&mut self, frame: &FrameBuffer, input: &InputState) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub sim_res: usize,      // heat grid side, independent of the window
    pub width: usize,        // initial viewport
    pub height: usize,
    pub start_active: bool,  // fire on at load
    pub physics: PhysicsParams,
    pub render: RenderParams,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sim_res: 512,
            width: 960,
            height: 540,
            start_active: true,
            physics: PhysicsParams::default(),
            render: RenderParams::default(),
        }
    }
}

pub struct FrameDriver {
    sim: Option<Simulation>, // None once shut down
    input: InputState,
    events: Receiver<InputEvent>,
    queue: InputQueue,
    render: RenderParams,
    post: Box<dyn PostProcess>,
    cue: Box<dyn CueSink>,
    hdr: HdrImage,
    frame: FrameBuffer,
    frames: u64,
}

impl FrameDriver {
    pub fn new(cfg: DriverConfig, post: Box<dyn PostProcess>, cue: Box<dyn CueSink>) -> Self {
        let (queue, events) = input_channel();
        let input = InputState::new(cfg.start_active, cfg.width, cfg.height);
        let (w, h) = input.viewport();
        Self {
            sim: Some(Simulation::new(cfg.sim_res, cfg.physics)),
            input,
            events,
            queue,
            render: cfg.render,
            post,
            cue,
            hdr: HdrImage::new(w, h),
            frame: FrameBuffer::new(w, h),
            frames: 0,
        }
    }

    /// A sender for hosts to feed input through.
    pub fn input_queue(&self) -> InputQueue {
        self.queue.clone()
    }

    /// One frame at simulation time `time`. No-op after shutdown.
    pub fn tick(&mut self, time: f32) -> Result<(), Error> {
        let Some(sim) = self.sim.as_mut() else {
            return Ok(());
        };

        for t in self.input.drain(&self.events) {
            match t {
                Transition::Began => {
                    if let Err(e) = self.cue.begin() {
                        eprintln!("{e} (ignored)");
                    }
                }
                Transition::Ended => {
                    if let Err(e) = self.cue.end() {
                        eprintln!("{e} (ignored)");
                    }
                }
                Transition::Resized => {
                    // display buffers only; the heat grid never changes size
                    let (w, h) = self.input.viewport();
                    self.hdr = HdrImage::new(w, h);
                    self.frame = FrameBuffer::new(w, h);
                }
            }
        }

        /* a) velocity (inertia flame only) */
        if sim.params().inertia {
            self.input.update_velocity();
        }

        /* b+c) physics into the back buffer, then swap */
        let step = StepInput {
            pointer: self.input.physics_pointer(),
            activation: self.input.activation(),
            velocity: self.input.velocity(),
            time,
            aspect: self.input.aspect(),
        };
        sim.advance(&step)?;

        /* d) colour pass from the new front */
        render(sim.field(), &mut self.hdr, time, &self.render);

        /* e) hand off to post-processing */
        self.post.apply(&self.hdr, &mut self.frame)?;

        self.frames += 1;
        Ok(())
    }

    /// Tick until the host closes or the token is cancelled, then shut down.
    pub fn run(
        &mut self,
        host: &mut dyn Host,
        clock: &mut FrameClock,
        token: &CancelToken,
    ) -> Result<(), Error> {
        let result = self.run_frames(host, clock, token);
        self.shutdown();
        result
    }

    fn run_frames(
        &mut self,
        host: &mut dyn Host,
        clock: &mut FrameClock,
        token: &CancelToken,
    ) -> Result<(), Error> {
        let mut queue = self.input_queue();
        while !token.is_cancelled() && host.is_open() {
            host.pump(&mut queue);
            let time = clock.tick();
            self.tick(time)?;
            host.present(&self.frame, &self.input)?;
        }
        Ok(())
    }

    /// Ordered release: stop the cue, then drop both field buffers.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.sim.is_none() {
            return;
        }
        if let Err(e) = self.cue.end() {
            eprintln!("{e} (ignored)");
        }
        self.sim = None;
        eprintln!("flame stopped after {} frames", self.frames);
    }
}

#[cfg(test)]
impl FrameDriver {
    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.sim.as_ref()
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn hdr(&self) -> &HdrImage {
        &self.hdr
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
