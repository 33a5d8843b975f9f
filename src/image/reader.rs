use std::io::BufRead;

use super::compressor::{CompressionType, Decompressor};
use super::cpio::{Decoder, Entry};
use crate::errors::*;

/// Pull-based source of entries from a compressed image.
///
/// Owns the decompression and decode layers; the byte source itself stays
/// with the caller and is handed back by [`ImageReader::close`].
pub struct ImageReader<R: BufRead> {
    decoder: Decoder<Decompressor<R>>,
}

impl<R: BufRead> ImageReader<R> {
    /// Fails with [`Error::Decompression`] if `source` does not look like a `compression` stream.
    pub fn new(source: R, compression: CompressionType) -> Result<Self, Error> {
        let decompressor = Decompressor::new(source, compression)?;
        Ok(Self {
            decoder: Decoder::new(decompressor),
        })
    }

    /// Returns the next entry, or `None` once the trailer has been reached.
    ///
    /// Decode failures, including running out of data before the trailer,
    /// are errors and never show up as `None`.
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_, Decompressor<R>>>, Error> {
        self.decoder.next_entry()
    }

    /// Tear down the decode and decompression layers, returning the byte source.
    pub fn close(self) -> Result<R, Error> {
        Ok(self.decoder.into_inner().into_inner())
    }
}
