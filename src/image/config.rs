use std::path::{Path, PathBuf};

use super::{CompressionDetails, Timestamp};
use crate::constants::{DEFAULT_CONFIG_PATH, OEM_CONFIG_TARGET, OEM_DIRECTORIES};

/// Everything a single [`run`](super::run) needs to know.
///
/// Built once at the edge of the program and handed to the pipeline.
///
/// ```
/// let config = cpic::Config::new("/srv/pxe/coreos_production_pxe_image.cpio.gz")
///     .config_file("/etc/coreos/cloud-config.yml")
///     .source_date(cpic::Timestamp(1_600_000_000));
/// assert_eq!(
///     config.get_output(),
///     std::path::Path::new("coreos_production_pxe_image.cpio.gz")
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    source: PathBuf,
    output: PathBuf,
    config_file: PathBuf,
    temp_dir: Option<PathBuf>,
    compression: CompressionDetails,
    source_date: Option<Timestamp>,
    oem_directories: Vec<String>,
    oem_target: String,
}

impl Config {
    /// Repackage the image at `source`.
    ///
    /// The output defaults to the file name of `source` in the current
    /// directory, so an image that already lives there is replaced.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| source.clone());
        Self {
            source,
            output,
            config_file: PathBuf::from(DEFAULT_CONFIG_PATH),
            temp_dir: None,
            compression: CompressionDetails::default(),
            source_date: None,
            oem_directories: OEM_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            oem_target: OEM_CONFIG_TARGET.to_owned(),
        }
    }

    /// Where the new image is published.
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// The file copied into the image.
    pub fn config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
        self.config_file = config_file.into();
        self
    }

    /// Directory the image is assembled in before being renamed into place.
    ///
    /// Must be on the same filesystem as the output for the rename to succeed.
    pub fn temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Compression of the source image, and of the new one.
    pub fn compression(mut self, compression: impl Into<CompressionDetails>) -> Self {
        self.compression = compression.into();
        self
    }

    /// Set source date, used to clamp the modification time of injected entries.
    ///
    /// `t` is number of seconds since the UNIX Epoch.
    pub fn source_date(mut self, t: impl Into<Timestamp>) -> Self {
        self.source_date = Some(t.into());
        self
    }

    /// Directories written ahead of the config file, parents first.
    pub fn oem_directories<S: AsRef<str>>(mut self, dirs: impl IntoIterator<Item = S>) -> Self {
        self.oem_directories = dirs.into_iter().map(|d| d.as_ref().to_owned()).collect();
        self
    }

    /// Name of the config file inside the image.
    pub fn oem_target(mut self, target: impl AsRef<str>) -> Self {
        self.oem_target = target.as_ref().to_owned();
        self
    }

    pub fn get_source(&self) -> &Path {
        &self.source
    }

    pub fn get_output(&self) -> &Path {
        &self.output
    }

    pub fn get_config_file(&self) -> &Path {
        &self.config_file
    }

    /// The configured temp directory, else the directory of the output.
    pub fn get_temp_dir(&self) -> PathBuf {
        match (&self.temp_dir, self.output.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_owned(),
            _ => PathBuf::from("."),
        }
    }

    pub fn get_compression(&self) -> CompressionDetails {
        self.compression
    }

    pub fn get_source_date(&self) -> Option<Timestamp> {
        self.source_date
    }

    pub fn get_oem_directories(&self) -> &[String] {
        &self.oem_directories
    }

    pub fn get_oem_target(&self) -> &str {
        &self.oem_target
    }
}
