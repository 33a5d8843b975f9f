use std::io;
use std::path::PathBuf;

use crate::image::{Step, TimestampError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid compressed stream: {0}")]
    Decompression(String),

    #[error("archive ended before the trailer entry (truncated archive)")]
    Truncated,

    #[error("invalid cpio header: {0}")]
    InvalidHeader(String),

    #[error("the trailer entry cannot be written as a regular entry")]
    TrailerEntry,

    #[error("entry {name:?} declared {expected} bytes but {actual} were written")]
    ShortBody {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("entry {name:?} is {size} bytes, larger than cpio can represent")]
    EntryTooLarge { name: String, size: u64 },

    #[error("entry {0:?} would be written more than once")]
    DuplicateEntry(String),

    #[error("unknown compressor type {0:?} - supported types: gzip, none")]
    UnknownCompressorType(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The pipeline step an error was raised in, if it came out of [`crate::run`].
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub(crate) trait ResultExt<T> {
    /// Attribute a failure to a pipeline step.
    fn at(self, step: Step) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn at(self, step: Step) -> Result<T, Error> {
        self.map_err(|e| Error::Step {
            step,
            source: Box::new(e.into()),
        })
    }
}
