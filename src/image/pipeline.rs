use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use super::{Config, CopySummary, ImageReader, ImageWriter, append, transcode};
use crate::errors::*;

/// Stages of [`run`], in the order they happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    OpenSource,
    OpenReader,
    OpenTempSink,
    OpenWriter,
    Transcode,
    Append,
    CloseWriter,
    CloseReader,
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::OpenSource => "opening the source image",
            Step::OpenReader => "reading the source image",
            Step::OpenTempSink => "creating the temporary image",
            Step::OpenWriter => "starting the new image",
            Step::Transcode => "copying the source image",
            Step::Append => "adding the config file",
            Step::CloseWriter => "finishing the new image",
            Step::CloseReader => "closing the source image",
            Step::Publish => "moving the new image into place",
        };
        f.write_str(s)
    }
}

/// Outcome of a successful [`run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Where the new image was published.
    pub output: PathBuf,
    /// Entries carried over from the source image.
    pub copied: CopySummary,
    /// Entries added after the source entries.
    pub appended: usize,
}

/// Build the new image and publish it at the output path.
///
/// The image is assembled in a temporary file which is only renamed over the
/// output once it is complete, so the output path either keeps its previous
/// contents or holds the full new image. On any failure the temporary file
/// is removed again.
pub fn run(config: &Config) -> Result<Report, Error> {
    let source_path = config.get_source();
    let compression = config.get_compression();

    log::debug!("{}: {}", Step::OpenSource, source_path.display());
    let source = File::open(source_path)
        .map_err(|source| Error::ReadFile {
            path: source_path.to_owned(),
            source,
        })
        .at(Step::OpenSource)?;

    log::debug!("{}: {}", Step::OpenReader, compression.compression_type());
    let reader = ImageReader::new(BufReader::new(source), compression.compression_type())
        .at(Step::OpenReader)?;

    let temp_dir = config.get_temp_dir();
    log::debug!("{} in {}", Step::OpenTempSink, temp_dir.display());
    let temp = tempfile::Builder::new()
        .prefix(".cpic-")
        .suffix(".tmp")
        .tempfile_in(&temp_dir)
        .at(Step::OpenTempSink)?;

    let temp_path = temp.path().to_owned();
    let result = assemble(config, reader, temp);
    if result.is_err() {
        log::warn!("discarding temporary image {}", temp_path.display());
    }
    result
}

/// Everything from [`Step::OpenWriter`] on. Dropping `temp` removes it.
fn assemble<R: BufRead>(
    config: &Config,
    mut reader: ImageReader<R>,
    temp: NamedTempFile,
) -> Result<Report, Error> {
    log::debug!("{}: {}", Step::OpenWriter, temp.path().display());
    let mut writer = ImageWriter::new(temp, config.get_compression());

    log::debug!("{}", Step::Transcode);
    let copied = transcode::copy(&mut writer, &mut reader).at(Step::Transcode)?;
    log::info!(
        "copied {} entries ({} bytes) from {}, skipped {}",
        copied.copied,
        copied.bytes,
        config.get_source().display(),
        copied.skipped
    );

    log::debug!("{}: {}", Step::Append, config.get_config_file().display());
    let appended = append::append(
        &mut writer,
        config.get_oem_directories(),
        config.get_config_file(),
        config.get_oem_target(),
        config.get_source_date(),
    )
    .at(Step::Append)?;

    log::debug!("{}", Step::CloseWriter);
    let temp = writer.close().at(Step::CloseWriter)?;
    temp.as_file().sync_all().at(Step::CloseWriter)?;

    log::debug!("{}", Step::CloseReader);
    drop(reader.close().at(Step::CloseReader)?);

    let output = config.get_output().to_owned();
    log::debug!("{}: {}", Step::Publish, output.display());
    // the temp file comes back inside the error; drop it here so it is unlinked
    temp.persist(&output).map_err(|e| e.error).at(Step::Publish)?;

    log::info!("wrote {} with {} added entries", output.display(), appended);
    Ok(Report {
        output,
        copied,
        appended,
    })
}
