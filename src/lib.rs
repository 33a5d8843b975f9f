//! # cpic
//!
//! Creates an OEM CoreOS PXE image by copying a source PXE image (a
//! gzip-compressed `newc` cpio archive) into a new one, together with a
//! `cloud-config.yml` placed at `usr/share/oem/cloud-config.yml`.
//!
//! Entries of the source image are carried over unchanged, in order, except
//! for the root `.` directory. The injected directories and file follow them.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = cpic::Config::new("coreos_production_pxe_image.cpio.gz")
//!     .config_file("cloud-config.yml")
//!     .output("oem_pxe_image.cpio.gz");
//! let report = cpic::run(&config)?;
//! println!("wrote {}", report.output.display());
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks are usable on their own:
//!
//! ```rust
//! use std::io::Write;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = cpic::ImageWriter::new(Vec::new(), cpic::CompressionDetails::default());
//! writer.write_header(&cpic::Header::directory("etc", 0o755))?;
//! writer.write_header(&cpic::Header::regular("etc/hostname", 0o644, 5))?;
//! writer.write_all(b"coreo")?;
//! let image = writer.close()?;
//!
//! let mut reader = cpic::ImageReader::new(image.as_slice(), cpic::CompressionType::Gzip)?;
//! let mut names = Vec::new();
//! while let Some(entry) = reader.next_entry()? {
//!     names.push(entry.header().name().to_owned());
//! }
//! assert_eq!(names, ["etc", "etc/hostname"]);
//! # Ok(())
//! # }
//! ```

#![allow(unknown_lints, clippy::uninlined_format_args)]

mod errors;
pub use crate::errors::*;

pub mod constants;

mod image;
pub use crate::image::*;

#[cfg(test)]
mod tests;
