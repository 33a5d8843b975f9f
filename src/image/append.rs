use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use super::{Header, ImageWriter, Timestamp};
use crate::constants::{DIRECTORY_PERMISSIONS, FILE_PERMISSIONS};
use crate::errors::*;

impl<W: Write> ImageWriter<W> {
    /// Add an empty directory entry.
    pub fn write_dir(&mut self, name: &str, mtime: Timestamp) -> Result<(), Error> {
        let header = Header::directory(name, DIRECTORY_PERMISSIONS).mtime(mtime.into());
        self.write_header(&header)
    }

    /// Add the contents of the file at `path` as a regular file entry named `name`.
    ///
    /// Returns the number of body bytes written.
    pub fn write_file(&mut self, path: &Path, name: &str, mtime: Timestamp) -> Result<u64, Error> {
        let read_error = |source: io::Error| Error::ReadFile {
            path: path.to_owned(),
            source,
        };
        let file = File::open(path).map_err(read_error)?;
        let len = file.metadata().map_err(read_error)?.len();
        let file_size = u32::try_from(len).map_err(|_| Error::EntryTooLarge {
            name: name.to_owned(),
            size: len,
        })?;

        let header = Header::regular(name, FILE_PERMISSIONS, file_size).mtime(mtime.into());
        self.write_header(&header)?;
        let written = io::copy(&mut file.take(len), self)?;
        if written != len {
            return Err(Error::ShortBody {
                name: name.to_owned(),
                expected: len,
                actual: written,
            });
        }
        Ok(written)
    }
}

/// Write `directories`, in order, followed by the file at `path` as `target`.
///
/// Entries get `mtime` set to now, or to `source_date` when that is earlier.
/// Path nesting is not checked: `directories` must list parents before
/// children. Returns the number of entries written.
pub fn append<W: Write, S: AsRef<str>>(
    dst: &mut ImageWriter<W>,
    directories: &[S],
    path: &Path,
    target: &str,
    source_date: Option<Timestamp>,
) -> Result<usize, Error> {
    let mut names = HashSet::with_capacity(directories.len() + 1);
    for name in directories.iter().map(|d| d.as_ref()).chain([target]) {
        if !names.insert(name) {
            return Err(Error::DuplicateEntry(name.to_owned()));
        }
    }

    let mtime = Timestamp::clamped_now(source_date)?;
    for dir in directories {
        dst.write_dir(dir.as_ref(), mtime)?;
        log::debug!("added directory {}", dir.as_ref());
    }
    let bytes = dst.write_file(path, target, mtime)?;
    log::debug!("added {} from {} ({} bytes)", target, path.display(), bytes);

    Ok(directories.len() + 1)
}
