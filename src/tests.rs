use super::*;
use std::io::{Read, Write};
use std::path::Path;

use pretty_assertions::assert_eq;

/// Encode `entries` into an image held in memory.
pub(crate) fn write_image(
    compression: CompressionDetails,
    entries: &[(Header, &str)],
) -> Result<Vec<u8>, Error> {
    let mut writer = ImageWriter::new(Vec::new(), compression);
    for (header, body) in entries {
        writer.write_header(header)?;
        writer.write_all(body.as_bytes())?;
    }
    writer.close()
}

/// Decode every entry of an image, bodies included.
pub(crate) fn read_image(
    bytes: &[u8],
    compression: CompressionType,
) -> Result<Vec<(Header, Vec<u8>)>, Error> {
    let mut reader = ImageReader::new(bytes, compression)?;
    let mut entries = Vec::new();
    while let Some(mut entry) = reader.next_entry()? {
        let mut body = Vec::new();
        entry.read_to_end(&mut body)?;
        entries.push((entry.header().clone(), body));
    }
    reader.close()?;
    Ok(entries)
}

fn names_and_bodies(path: &Path) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(read_image(&bytes, CompressionType::Gzip)?
        .into_iter()
        .map(|(h, body)| {
            let body = String::from_utf8_lossy(&body).into_owned();
            (h.name().to_owned(), body)
        })
        .collect())
}

/// A source image holding `.`, `etc` and `etc/foo` ("test"), plus a config file holding "abc".
fn fixture(dir: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();
    let source = dir.join("coreos_production_pxe_image.cpio.gz");
    let image = write_image(
        CompressionDetails::default(),
        &[
            (Header::directory(".", 0o755), ""),
            (Header::directory("etc", 0o755), ""),
            (Header::regular("etc/foo", 0o644, 4), "test"),
        ],
    )?;
    std::fs::write(&source, image)?;

    let config_file = dir.join("cloud-config.yml");
    std::fs::write(&config_file, "abc")?;

    Ok(Config::new(source)
        .config_file(config_file)
        .output(dir.join("oem.cpio.gz")))
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(n, b)| (n.to_string(), b.to_string()))
        .collect()
}

#[test]
fn test_run_appends_after_source_entries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?;

    let report = run(&config)?;

    assert_eq!(report.output, dir.path().join("oem.cpio.gz"));
    assert_eq!(report.copied.copied, 2);
    assert_eq!(report.copied.skipped, 1);
    assert_eq!(report.appended, 4);
    assert_eq!(
        names_and_bodies(&report.output)?,
        pairs(&[
            ("etc", ""),
            ("etc/foo", "test"),
            ("usr", ""),
            ("usr/share", ""),
            ("usr/share/oem", ""),
            ("usr/share/oem/cloud-config.yml", "abc"),
        ])
    );
    Ok(())
}

#[test]
fn test_run_without_injection_only_drops_root() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?
        .oem_directories(Vec::<String>::new())
        .oem_target("etc/bar");

    run(&config)?;

    assert_eq!(
        names_and_bodies(config.get_output())?,
        pairs(&[("etc", ""), ("etc/foo", "test"), ("etc/bar", "abc")])
    );
    Ok(())
}

#[test]
fn test_run_missing_config_leaves_output_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?.config_file(dir.path().join("missing.yml"));

    let err = run(&config).unwrap_err();
    assert_eq!(err.step(), Some(Step::Append));
    assert!(!config.get_output().exists());

    std::fs::write(config.get_output(), "previous")?;
    assert!(run(&config).is_err());
    assert_eq!(std::fs::read_to_string(config.get_output())?, "previous");
    Ok(())
}

#[test]
fn test_run_failure_removes_temp_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let scratch = tempfile::tempdir()?;
    let config = fixture(dir.path())?
        .config_file(dir.path().join("missing.yml"))
        .temp_dir(scratch.path());

    assert!(run(&config).is_err());
    assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_run_failed_rename_removes_temp_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let scratch = tempfile::tempdir()?;
    // a non-empty directory cannot be replaced by a rename
    let occupied = dir.path().join("occupied");
    std::fs::create_dir(&occupied)?;
    std::fs::write(occupied.join("keep"), "keep")?;
    let config = fixture(dir.path())?
        .output(&occupied)
        .temp_dir(scratch.path());

    let err = run(&config).unwrap_err();
    assert_eq!(err.step(), Some(Step::Publish));
    assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
    assert!(occupied.join("keep").exists());
    assert!(err.to_string().starts_with("moving the new image into place failed: "));
    Ok(())
}

#[test]
fn test_run_rejects_non_gzip_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?;
    std::fs::write(config.get_source(), "not an image")?;

    let err = run(&config).unwrap_err();
    assert_eq!(err.step(), Some(Step::OpenReader));
    assert!(!config.get_output().exists());
    Ok(())
}

#[test]
fn test_run_missing_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?;
    std::fs::remove_file(config.get_source())?;

    let err = run(&config).unwrap_err();
    assert_eq!(err.step(), Some(Step::OpenSource));
    Ok(())
}

#[test]
fn test_run_replaces_source_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = fixture(dir.path())?;
    let config = config.clone().output(config.get_source());

    run(&config)?;

    let names: Vec<_> = names_and_bodies(config.get_source())?
        .into_iter()
        .map(|(n, _)| n)
        .collect();
    assert_eq!(names.len(), 6);
    assert_eq!(names[..2], ["etc", "etc/foo"]);
    // only the published image is left next to the config file
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 2);
    Ok(())
}
