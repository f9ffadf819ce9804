// A tiny error type so we don't rely on anyhow/thiserror.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // Creating the window failed (startup-fatal)
    WindowUpdate(String), // Pushing a frame to the window failed
    Snapshot(String),     // Encoding/writing a PNG snapshot failed
    Config(String),       // A command line value is out of range
    Cue(String),          // Audio cue rejected (logged, never fatal)
    Buffer(String),       // Two buffers handed to a pass disagree on size
}

impl Display for Error {
    // This decides how the error is printed to your console.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::Snapshot(s) => write!(f, "Snapshot error: {s}"),
            Error::Config(s) => write!(f, "Config error: {s}"),
            Error::Cue(s) => write!(f, "Audio cue error: {s}"),
            Error::Buffer(s) => write!(f, "Buffer error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
