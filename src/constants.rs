//! Fixed values used when building an OEM image.

/// Name of the configuration payload looked up when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "cloud-config.yml";

/// Where the configuration payload ends up inside the image.
pub const OEM_CONFIG_TARGET: &str = "usr/share/oem/cloud-config.yml";

/// Directories created ahead of the configuration payload, parents first.
pub const OEM_DIRECTORIES: [&str; 3] = ["usr", "usr/share", "usr/share/oem"];

/// Permission bits of injected directories.
pub const DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Permission bits of the injected configuration file.
pub const FILE_PERMISSIONS: u32 = 0o644;

/// Name of the root self-reference entry some encoders emit.
pub const ROOT_ENTRY_NAME: &str = ".";

/// Two-byte magic at the start of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
