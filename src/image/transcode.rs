use std::io::{self, BufRead, Write};

use super::{ImageReader, ImageWriter};
use crate::constants::ROOT_ENTRY_NAME;
use crate::errors::*;

/// What [`copy`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopySummary {
    /// Entries written to the destination.
    pub copied: usize,
    /// Entries dropped, i.e. the root `.` directory.
    pub skipped: usize,
    /// Body bytes written to the destination.
    pub bytes: u64,
}

/// Reproduce every entry of `src` on `dst`, except the root `.` directory.
///
/// Stops at the trailer of `src`; the trailer of `dst` is left to
/// [`ImageWriter::close`]. Only one entry is in flight at any time.
pub fn copy<R: BufRead, W: Write>(
    dst: &mut ImageWriter<W>,
    src: &mut ImageReader<R>,
) -> Result<CopySummary, Error> {
    let mut summary = CopySummary::default();

    while let Some(mut entry) = src.next_entry()? {
        let header = entry.header().clone();

        if header.is_dir() {
            if header.name() == ROOT_ENTRY_NAME {
                log::trace!("skipping root entry");
                summary.skipped += 1;
                continue;
            }
            dst.write_header(&header)?;
            log::debug!("copied directory {}", header.name());
            summary.copied += 1;
            continue;
        }

        dst.write_header(&header)?;
        // a body cut short fails the read with UnexpectedEof
        let actual = io::copy(&mut entry, dst)?;
        log::debug!("copied {} ({} bytes)", header.name(), actual);
        summary.copied += 1;
        summary.bytes += actual;
    }

    Ok(summary)
}
