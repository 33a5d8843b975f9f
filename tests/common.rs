#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use cpic::{CompressionDetails, CompressionType, Header, ImageReader, ImageWriter};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// An entry as it is seen in a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub name: String,
    pub dir: bool,
    pub mode: u32,
    pub size: u32,
    pub body: Vec<u8>,
}

pub fn dir(name: &str) -> Seen {
    Seen {
        name: name.to_owned(),
        dir: true,
        mode: 0o755,
        size: 0,
        body: Vec::new(),
    }
}

pub fn file(name: &str, mode: u32, body: &str) -> Seen {
    Seen {
        name: name.to_owned(),
        dir: false,
        mode,
        size: body.len() as u32,
        body: body.as_bytes().to_vec(),
    }
}

/// The PXE image used throughout the tests: the root marker, `etc` and `etc/foo`.
pub fn pxe_entries() -> Vec<(Header, &'static str)> {
    vec![
        (Header::directory(".", 0o755), ""),
        (Header::directory("etc", 0o755), ""),
        (Header::regular("etc/foo", 0o644, 4), "test"),
    ]
}

pub fn encode(entries: &[(Header, &str)]) -> Result<Vec<u8>, cpic::Error> {
    let mut writer = ImageWriter::new(Vec::new(), CompressionDetails::default());
    for (header, body) in entries {
        writer.write_header(header)?;
        writer.write_all(body.as_bytes())?;
    }
    writer.close()
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Seen>, cpic::Error> {
    let mut reader = ImageReader::new(bytes, CompressionType::Gzip)?;
    let mut seen = Vec::new();
    while let Some(mut entry) = reader.next_entry()? {
        let mut body = Vec::new();
        entry.read_to_end(&mut body)?;
        let header = entry.header();
        seen.push(Seen {
            name: header.name().to_owned(),
            dir: header.is_dir(),
            mode: header.permissions(),
            size: header.get_file_size(),
            body,
        });
    }
    reader.close()?;
    Ok(seen)
}

pub fn decode_file(path: &Path) -> Result<Vec<Seen>, Box<dyn std::error::Error>> {
    Ok(decode(&std::fs::read(path)?)?)
}

/// Write the PXE image and a `cloud-config.yml` holding "abc" into `dir`.
pub fn write_fixture(dir: &Path) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();
    let image = dir.join("coreos_production_pxe_image.cpio.gz");
    std::fs::write(&image, encode(&pxe_entries())?)?;
    let config = dir.join("cloud-config.yml");
    std::fs::write(&config, "abc")?;
    Ok((image, config))
}
