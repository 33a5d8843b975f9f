mod append;
mod compressor;
mod config;
mod cpio;
mod pipeline;
mod reader;
mod timestamp;
mod transcode;
mod writer;

pub use append::append;

pub use compressor::*;

pub use config::*;

pub use cpio::{Decoder, Encoder, Entry, EntryType, Header, TRAILER_NAME};

pub use pipeline::*;

pub use reader::*;

pub use timestamp::*;

pub use transcode::{CopySummary, copy};

pub use writer::*;
