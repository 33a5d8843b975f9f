//! Read/write `newc` (SVR4) format archives.

// The framing code in this file is derived from the `cpio` crate by Jonathan Creekmore
// (https://github.com/jcreekmore/cpio-rs) under the MIT license.
//
//     MIT License
//
//     Copyright (c) 2016 Jonathan Creekmore
//
//     Permission is hereby granted, free of charge, to any person obtaining a copy of this software
//     and associated documentation files (the "Software"),  to deal in the Software without restriction,
//     including without limitation the rights to use, copy, modify, merge, publish, distribute,
//     sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
//     furnished to do so, subject to the following conditions:
//
//     The above copyright notice and this permission notice shall be included in all copies or
//     substantial portions of the Software.
//
//     THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
//     BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,  FITNESS FOR A PARTICULAR PURPOSE AND
//     NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
//     DAMAGES OR OTHER  LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
//     FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS  IN THE SOFTWARE.
//
// Unlike upstream, entries are pulled from a single long-lived `Decoder` and pushed into a single
// `Encoder`, so that body accounting and padding can never be skipped by a caller.

use std::io::{self, Read, Write};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::errors::*;

const HEADER_LEN: usize = 110; // 6 byte magic + 104 bytes for metadata

const MAGIC_NUMBER_NEWASCII: &[u8] = b"070701";
const MAGIC_NUMBER_NEWCRC: &[u8] = b"070702";

const MAX_NAME_LEN: usize = 4096;

/// Name of the sentinel entry closing every archive.
pub const TRAILER_NAME: &str = "TRAILER!!!";

/// File type bits of an entry's mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum EntryType {
    Fifo = 0o010000,
    Char = 0o020000,
    Directory = 0o040000,
    Block = 0o060000,
    Regular = 0o100000,
    NetworkSpecial = 0o110000,
    Symlink = 0o120000,
    Socket = 0o140000,
}

impl EntryType {
    pub const MASK: u32 = 0o170000;

    /// Extract the file type from a full inode mode, if it names a known type.
    pub fn from_mode(mode: u32) -> Option<Self> {
        Self::from_u32(mode & Self::MASK)
    }
}

impl From<EntryType> for u32 {
    fn from(t: EntryType) -> u32 {
        t as u32
    }
}

/// Metadata about one entry of an archive.
///
/// Every `newc` field is kept so that an entry read from one archive can be
/// written into another without losing anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    name: String,
    ino: u32,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    mtime: u32,
    file_size: u32,
    dev_major: u32,
    dev_minor: u32,
    rdev_major: u32,
    rdev_minor: u32,
    checksum: Option<u32>,
}

fn pad(len: usize) -> Option<Vec<u8>> {
    // pad out to a multiple of 4 bytes
    let overhang = len % 4;
    if overhang != 0 {
        let repeat = 4 - overhang;
        Some(vec![0u8; repeat])
    } else {
        None
    }
}

fn read_hex_u32<R: Read>(reader: &mut R) -> Result<u32, Error> {
    let mut bytes = [0u8; 8];
    read_framing(reader, &mut bytes)?;
    let string = std::str::from_utf8(&bytes)
        .map_err(|_| Error::InvalidHeader("field is not valid utf-8".to_string()))?;
    u32::from_str_radix(string, 16)
        .map_err(|_| Error::InvalidHeader(format!("field {string:?} is not a hex u32")))
}

/// Read bytes that must be present for the archive to be well formed.
fn read_framing<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated,
        _ => Error::Io(e),
    })
}

impl Header {
    /// Create the metadata for one entry. All numeric fields start at zero
    /// except `nlink`, which starts at one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 0,
            file_size: 0,
            dev_major: 0,
            dev_minor: 0,
            rdev_major: 0,
            rdev_minor: 0,
            checksum: None,
        }
    }

    /// A directory entry with the given permission bits.
    pub fn directory(name: impl Into<String>, permissions: u32) -> Self {
        Self::new(name)
            .mode(permissions)
            .nlink(2)
            .set_mode_file_type(EntryType::Directory)
    }

    /// A regular file entry with the given permission bits and body length.
    pub fn regular(name: impl Into<String>, permissions: u32, file_size: u32) -> Self {
        Self::new(name)
            .mode(permissions)
            .file_size(file_size)
            .set_mode_file_type(EntryType::Regular)
    }

    /// The sentinel entry that closes an archive.
    pub(crate) fn trailer() -> Self {
        Self::new(TRAILER_NAME)
    }

    pub fn ino(mut self, ino: u32) -> Self {
        self.ino = ino;
        self
    }

    /// Set the full inode mode, file type bits included.
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = gid;
        self
    }

    pub fn nlink(mut self, nlink: u32) -> Self {
        self.nlink = nlink;
        self
    }

    pub fn mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn file_size(mut self, file_size: u32) -> Self {
        self.file_size = file_size;
        self
    }

    /// Replace the file type bits of the mode, keeping the permission bits.
    pub fn set_mode_file_type(mut self, file_type: EntryType) -> Self {
        self.mode &= !EntryType::MASK;
        self.mode |= u32::from(file_type);
        self
    }

    /// Returns the name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full inode mode, file type bits included.
    pub fn get_mode(&self) -> u32 {
        self.mode
    }

    /// Returns the permission bits of the mode.
    pub fn permissions(&self) -> u32 {
        self.mode & !EntryType::MASK
    }

    /// Returns the file type encoded in the mode, `None` for the trailer and unknown types.
    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type() == Some(EntryType::Directory)
    }

    pub fn get_ino(&self) -> u32 {
        self.ino
    }

    pub fn get_uid(&self) -> u32 {
        self.uid
    }

    pub fn get_gid(&self) -> u32 {
        self.gid
    }

    pub fn get_nlink(&self) -> u32 {
        self.nlink
    }

    pub fn get_mtime(&self) -> u32 {
        self.mtime
    }

    /// Returns the exact length of the entry body, in bytes.
    pub fn get_file_size(&self) -> u32 {
        self.file_size
    }

    /// Returns the checksum of an entry read from a "crc" archive.
    ///
    /// The checksum is calculated by summing the bytes in the file and taking the least
    /// significant 32 bits. Entries of "new ascii" archives carry none.
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    /// Returns true if this is a trailer entry.
    pub fn is_trailer(&self) -> bool {
        self.name == TRAILER_NAME
    }

    /// Parse one header, including the name and the padding after it.
    fn read<R: Read>(inner: &mut R) -> Result<Self, Error> {
        // char    c_magic[6];
        let mut magic = [0u8; 6];
        read_framing(inner, &mut magic)?;
        let crc = match magic.as_slice() {
            MAGIC_NUMBER_NEWASCII => false,
            MAGIC_NUMBER_NEWCRC => true,
            other => {
                return Err(Error::InvalidHeader(format!(
                    "invalid magic number {:?}",
                    String::from_utf8_lossy(other)
                )));
            }
        };

        // char    c_ino[8];
        let ino = read_hex_u32(inner)?;
        // char    c_mode[8];
        let mode = read_hex_u32(inner)?;
        // char    c_uid[8];
        let uid = read_hex_u32(inner)?;
        // char    c_gid[8];
        let gid = read_hex_u32(inner)?;
        // char    c_nlink[8];
        let nlink = read_hex_u32(inner)?;
        // char    c_mtime[8];
        let mtime = read_hex_u32(inner)?;
        // char    c_filesize[8];
        let file_size = read_hex_u32(inner)?;
        // char    c_devmajor[8];
        let dev_major = read_hex_u32(inner)?;
        // char    c_devminor[8];
        let dev_minor = read_hex_u32(inner)?;
        // char    c_rdevmajor[8];
        let rdev_major = read_hex_u32(inner)?;
        // char    c_rdevminor[8];
        let rdev_minor = read_hex_u32(inner)?;
        // char    c_namesize[8];
        let name_len = read_hex_u32(inner)? as usize;
        // char    c_checksum[8];
        let checksum = read_hex_u32(inner)?;

        // NUL-terminated name with length `name_len` (including NUL byte).
        if name_len > MAX_NAME_LEN {
            return Err(Error::InvalidHeader("entry name is too long".to_string()));
        }
        let mut name_bytes = vec![0u8; name_len];
        read_framing(inner, &mut name_bytes)?;
        if name_bytes.last() != Some(&0) {
            return Err(Error::InvalidHeader(
                "entry name was not NUL-terminated".to_string(),
            ));
        }
        name_bytes.pop();
        // dracut-cpio sometimes pads the name to the next filesystem block.
        // See https://github.com/dracutdevs/dracut/commit/a9c67046
        while name_bytes.last() == Some(&0) {
            name_bytes.pop();
        }
        let name = String::from_utf8(name_bytes)
            .map_err(|_| Error::InvalidHeader("entry name was not valid UTF-8".to_string()))?;

        if let Some(mut padding) = pad(HEADER_LEN + name_len) {
            read_framing(inner, &mut padding)?;
        }

        Ok(Header {
            name,
            ino,
            mode,
            uid,
            gid,
            nlink,
            mtime,
            file_size,
            dev_major,
            dev_minor,
            rdev_major,
            rdev_minor,
            checksum: crc.then_some(checksum),
        })
    }

    /// Serialize the header, name and name padding included.
    fn to_bytes(&self) -> Vec<u8> {
        let name_len = self.name.len() + 1;
        let mut header = Vec::with_capacity(HEADER_LEN + name_len + 3);

        // char    c_magic[6];
        if self.checksum.is_some() {
            header.extend(MAGIC_NUMBER_NEWCRC);
        } else {
            header.extend(MAGIC_NUMBER_NEWASCII);
        }
        for field in [
            self.ino,
            self.mode,
            self.uid,
            self.gid,
            self.nlink,
            self.mtime,
            self.file_size,
            self.dev_major,
            self.dev_minor,
            self.rdev_major,
            self.rdev_minor,
            name_len as u32,
            self.checksum.unwrap_or(0),
        ] {
            header.extend(format!("{:08x}", field).as_bytes());
        }

        header.extend(self.name.as_bytes());
        header.push(0u8);

        if let Some(pad) = pad(HEADER_LEN + name_len) {
            header.extend(pad);
        }

        header
    }
}

/// Pulls entries out of an archive, one at a time.
pub struct Decoder<R> {
    inner: R,
    remaining: u64,
    padding: usize,
    finished: bool,
}

/// One entry of an archive being decoded. Reading from it yields the entry body.
pub struct Entry<'a, R> {
    header: Header,
    decoder: &'a mut Decoder<R>,
}

impl<R: Read> Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            padding: 0,
            finished: false,
        }
    }

    /// Advance to the next entry, skipping whatever is left of the previous body.
    ///
    /// Returns `Ok(None)` once the trailer has been read, and keeps doing so afterwards.
    /// Running out of input before the trailer is an [`Error::Truncated`].
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_, R>>, Error> {
        if self.finished {
            return Ok(None);
        }
        self.skip_body()?;

        let header = Header::read(&mut self.inner)?;
        if header.is_trailer() {
            self.finished = true;
            return Ok(None);
        }
        self.remaining = u64::from(header.file_size);
        self.padding = pad(header.file_size as usize).map_or(0, |p| p.len());
        Ok(Some(Entry {
            header,
            decoder: self,
        }))
    }

    /// Returns the underlying reader, positioned wherever decoding stopped.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn skip_body(&mut self) -> Result<(), Error> {
        if self.remaining > 0 {
            let skipped = io::copy(
                &mut self.inner.by_ref().take(self.remaining),
                &mut io::sink(),
            )?;
            if skipped != self.remaining {
                return Err(Error::Truncated);
            }
            self.remaining = 0;
        }
        if self.padding > 0 {
            let mut padding = vec![0u8; self.padding];
            read_framing(&mut self.inner, &mut padding)?;
            self.padding = 0;
        }
        Ok(())
    }

    fn read_body(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        if limit == 0 {
            return Ok(0);
        }
        let num_bytes = self.inner.read(&mut buf[..limit])?;
        if num_bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive ended inside an entry body",
            ));
        }
        self.remaining -= num_bytes as u64;
        Ok(num_bytes)
    }
}

impl<R> Entry<'_, R> {
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl<R: Read> Read for Entry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read_body(buf)
    }
}

/// Body accounting for the entry currently being written.
struct OpenEntry {
    name: String,
    file_size: u32,
    written: u32,
}

/// Pushes entries into an archive. [`Encoder::finish`] writes the trailer.
pub struct Encoder<W: Write> {
    inner: W,
    current: Option<OpenEntry>,
}

impl<W: Write> Encoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            current: None,
        }
    }

    /// Start a new entry. The previous entry must have received its whole body.
    pub fn write_header(&mut self, header: &Header) -> Result<(), Error> {
        if header.is_trailer() {
            return Err(Error::TrailerEntry);
        }
        self.close_entry()?;
        self.inner.write_all(&header.to_bytes())?;
        self.current = Some(OpenEntry {
            name: header.name.clone(),
            file_size: header.file_size,
            written: 0,
        });
        Ok(())
    }

    /// Close the last entry, write the trailer and flush, returning the underlying writer.
    pub fn finish(mut self) -> Result<W, Error> {
        self.close_entry()?;
        self.inner.write_all(&Header::trailer().to_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Give up the underlying writer without writing a trailer.
    #[cfg(test)]
    pub(crate) fn into_inner_unfinished(self) -> W {
        self.inner
    }

    fn close_entry(&mut self) -> Result<(), Error> {
        if let Some(entry) = self.current.take() {
            if entry.written != entry.file_size {
                return Err(Error::ShortBody {
                    name: entry.name,
                    expected: u64::from(entry.file_size),
                    actual: u64::from(entry.written),
                });
            }
            if let Some(pad) = pad(entry.file_size as usize) {
                self.inner.write_all(&pad)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(entry) = self.current.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no entry header has been written",
            ));
        };
        if u64::from(entry.written) + buf.len() as u64 > u64::from(entry.file_size) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "trying to write more than the {} bytes declared for {:?}",
                    entry.file_size, entry.name
                ),
            ));
        }
        let n = self.inner.write(buf)?;
        entry.written += n as u32;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
