use std::io::{self, BufRead, Read, Write};

use crate::constants::GZIP_MAGIC;
use crate::errors::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum CompressionType {
    None,
    #[default]
    Gzip,
}

impl std::str::FromStr for CompressionType {
    type Err = Error;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "gzip" => Ok(CompressionType::Gzip),
            "none" => Ok(CompressionType::None),
            _ => Err(Error::UnknownCompressorType(raw.to_string())),
        }
    }
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionType::None => f.write_str("none"),
            CompressionType::Gzip => f.write_str("gzip"),
        }
    }
}

/// Compression type plus level, as used on the write side.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionDetails {
    None,
    Gzip(u32),
}

impl CompressionDetails {
    pub fn compression_type(&self) -> CompressionType {
        match self {
            Self::None => CompressionType::None,
            Self::Gzip(_) => CompressionType::Gzip,
        }
    }
}

impl Default for CompressionDetails {
    fn default() -> Self {
        CompressionType::default().into()
    }
}

impl From<CompressionType> for CompressionDetails {
    fn from(value: CompressionType) -> Self {
        match value {
            CompressionType::None => CompressionDetails::None,
            CompressionType::Gzip => {
                CompressionDetails::Gzip(flate2::Compression::default().level())
            }
        }
    }
}

/// Write side of the compression layer.
///
/// Buffers arbitrarily; nothing is guaranteed to reach the inner writer
/// before [`Compressor::finish_compression`].
pub enum Compressor<W: Write> {
    None(W),
    Gzip(flate2::write::GzEncoder<W>),
}

impl<W: Write> Compressor<W> {
    pub fn new(inner: W, details: CompressionDetails) -> Self {
        match details {
            CompressionDetails::None => Compressor::None(inner),
            CompressionDetails::Gzip(level) => Compressor::Gzip(flate2::write::GzEncoder::new(
                inner,
                flate2::Compression::new(level),
            )),
        }
    }

    /// Flush everything, write the compression footer and return the inner writer.
    pub fn finish_compression(self) -> Result<W, Error> {
        match self {
            Compressor::None(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Compressor::Gzip(encoder) => Ok(encoder.finish()?),
        }
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, content: &[u8]) -> Result<usize, io::Error> {
        match self {
            Compressor::None(inner) => inner.write(content),
            Compressor::Gzip(encoder) => encoder.write(content),
        }
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        match self {
            Compressor::None(inner) => inner.flush(),
            Compressor::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Read side of the compression layer.
pub enum Decompressor<R: BufRead> {
    None(R),
    Gzip(flate2::bufread::MultiGzDecoder<R>),
}

impl<R: BufRead> Decompressor<R> {
    /// Wrap `inner`, checking up front that it starts like a stream of the given type.
    ///
    /// Concatenated gzip members are decoded as a single stream.
    pub fn new(mut inner: R, compression: CompressionType) -> Result<Self, Error> {
        match compression {
            CompressionType::None => Ok(Decompressor::None(inner)),
            CompressionType::Gzip => {
                let head = inner.fill_buf()?;
                let plausible = if head.len() >= GZIP_MAGIC.len() {
                    head.starts_with(&GZIP_MAGIC)
                } else {
                    !head.is_empty() && GZIP_MAGIC.starts_with(head)
                };
                if !plausible {
                    return Err(Error::Decompression(if head.is_empty() {
                        "empty input".to_string()
                    } else {
                        "missing gzip magic".to_string()
                    }));
                }
                Ok(Decompressor::Gzip(flate2::bufread::MultiGzDecoder::new(
                    inner,
                )))
            }
        }
    }

    pub fn into_inner(self) -> R {
        match self {
            Decompressor::None(inner) => inner,
            Decompressor::Gzip(decoder) => decoder.into_inner(),
        }
    }
}

impl<R: BufRead> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decompressor::None(inner) => inner.read(buf),
            Decompressor::Gzip(decoder) => decoder.read(buf),
        }
    }
}
