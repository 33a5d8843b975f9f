use std::io::{self, Write};

use super::compressor::{CompressionDetails, Compressor};
use super::cpio::{Encoder, Header};
use crate::errors::*;

/// Push-based sink of entries into a compressed image.
///
/// The codec layer sits on top of the compression layer and both are owned
/// here. Nothing is complete until [`ImageWriter::close`] has run: the trailer
/// is only written, and compressed output only flushed, at that point.
pub struct ImageWriter<W: Write> {
    encoder: Encoder<Compressor<W>>,
}

impl<W: Write> ImageWriter<W> {
    pub fn new(sink: W, compression: CompressionDetails) -> Self {
        Self {
            encoder: Encoder::new(Compressor::new(sink, compression)),
        }
    }

    /// Start a new entry. Its body is then written through the [`Write`] impl.
    pub fn write_header(&mut self, header: &Header) -> Result<(), Error> {
        self.encoder.write_header(header)
    }

    /// Finalize the image and return the sink.
    ///
    /// The codec is finished first (trailer, padding) and the compressor
    /// second. The other way round the trailer would land after the end of
    /// the compressed stream and the image would not decode.
    pub fn close(self) -> Result<W, Error> {
        let compressor = self.encoder.finish()?;
        compressor.finish_compression()
    }
}

impl<W: Write> Write for ImageWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CompressionType;
    use crate::tests::read_image;

    #[test]
    fn test_close_order_matters() -> Result<(), Box<dyn std::error::Error>> {
        let header = Header::regular("etc/foo", 0o644, 4);

        let mut writer = ImageWriter::new(Vec::new(), CompressionDetails::Gzip(6));
        writer.write_header(&header)?;
        writer.write_all(b"test")?;
        let good = writer.close()?;
        let entries = read_image(&good, CompressionType::Gzip)?;
        assert_eq!(entries, vec![(header.clone(), b"test".to_vec())]);

        // compression closed before the codec writes its trailer
        let mut encoder = Encoder::new(Compressor::new(
            Vec::new(),
            CompressionDetails::Gzip(6),
        ));
        encoder.write_header(&header)?;
        encoder.write_all(b"test")?;
        let compressed = encoder.into_inner_unfinished().finish_compression()?;
        let bad = Encoder::new(compressed).finish()?;

        assert!(read_image(&bad, CompressionType::Gzip).is_err());
        Ok(())
    }

    #[test]
    fn test_unclosed_writer_is_not_an_image() -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = ImageWriter::new(Vec::new(), CompressionDetails::None);
        writer.write_header(&Header::directory("etc", 0o755))?;
        writer.flush()?;
        let partial = writer.encoder.into_inner_unfinished().finish_compression()?;

        assert!(matches!(
            read_image(&partial, CompressionType::None),
            Err(Error::Truncated)
        ));
        Ok(())
    }

    #[test]
    fn test_empty_image_is_trailer_only() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = ImageWriter::new(Vec::new(), CompressionDetails::Gzip(9)).close()?;
        assert!(read_image(&bytes, CompressionType::Gzip)?.is_empty());
        Ok(())
    }
}
