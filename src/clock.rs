// Simulation time: monotonic seconds since the first frame.

use std::time::Instant;

pub enum FrameClock {
    /// Wall clock; whatever the display refresh gives us.
    Realtime { start: Option<Instant> },
    /// Deterministic steps of `dt` seconds (headless runs, tests).
    Fixed { dt: f32, frame: u64 },
}

impl FrameClock {
    pub fn realtime() -> Self {
        FrameClock::Realtime { start: None }
    }

    pub fn fixed(dt: f32) -> Self {
        FrameClock::Fixed { dt, frame: 0 }
    }

    /// Time for the frame about to be drawn. The first call returns 0.
    pub fn tick(&mut self) -> f32 {
        match self {
            FrameClock::Realtime { start } => {
                let t0 = *start.get_or_insert_with(Instant::now);
                t0.elapsed().as_secs_f32()
            }
            FrameClock::Fixed { dt, frame } => {
                let t = *frame as f32 * *dt;
                *frame += 1;
                t
            }
        }
    }
}
