//! Error types
//!
//! A single error enum covers the whole engine. Probe failures never show up
//! here: they are recovered inside the probe by substituting the fallback
//! bitrate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the broadcast engine
#[derive(Error, Debug)]
pub enum Error {
    /// A requested file or effect does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// `start` called while a pipeline is already feeding the broadcaster
    #[error("playback already running")]
    AlreadyPlaying,

    /// An operation that needs a live pipeline was called while idle or stopped
    #[error("no playback in progress")]
    NotPlaying,

    /// The external audio tool could not be launched
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A pipeline stage could not be wired (missing stdio handle, vanished task)
    #[error("pipeline error: {0}")]
    Pipe(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::NotFound("the song boom was not found".into());
        assert_eq!(err.to_string(), "not found: the song boom was not found");
        assert!(err.is_not_found());

        let err = Error::Spawn {
            program: PathBuf::from("sox"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.to_string(), "failed to spawn sox: No such file");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
