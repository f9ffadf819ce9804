// Audio cue collaborator: told when the fire lights and when it goes out.
// Visual: nothing. Audible: the campfire loop starts/stops (in a real audio backend).

use std::io::{self, Write};

use crate::error::Error;

/// Receives begin/end signals keyed to activation transitions.
/// Errors are reported back but the driver only logs them.
pub trait CueSink {
    fn begin(&mut self) -> Result<(), Error>;
    fn end(&mut self) -> Result<(), Error>;
}

/// No audio at all (`--mute`).
pub struct SilentCue;

impl CueSink for SilentCue {
    fn begin(&mut self) -> Result<(), Error> {
        Ok(())
    }
    fn end(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Stands in for a looping track: tracks play/pause and reports each change
/// as one line on `out` (stderr in the binary).
pub struct LogCue<W: Write> {
    out: W,
    playing: bool,
}

impl<W: Write> LogCue<W> {
    pub fn new(out: W) -> Self {
        Self { out, playing: false }
    }

    fn report(&mut self, what: &str) -> Result<(), Error> {
        writeln!(self.out, "[cue] fire loop: {what}")
            .map_err(|e| Error::Cue(format!("{what}: {e}")))
    }
}

impl<W: Write> CueSink for LogCue<W> {
    fn begin(&mut self) -> Result<(), Error> {
        if self.playing {
            return Ok(());
        }
        self.playing = true;
        self.report("play")
    }

    fn end(&mut self) -> Result<(), Error> {
        if !self.playing {
            return Ok(());
        }
        self.playing = false;
        self.report("pause")
    }
}

impl LogCue<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}
