//! Command line entry point for cpic.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cpic::{CompressionDetails, CompressionType, Config, Timestamp};

const HELP: &str = "\
cpic creates an OEM CoreOS PXE image by copying the source PXE
image along with the CoreOS cloud-config.yml into a new PXE image.

The -o flag specifies the output file name. If not specified, the
output file name depends on the arguments and derives from the name
of the source PXE image. If the source PXE image is in the current
working directory it will be overwritten.

The -c flag specifies the cloud-config file name. If not specified,
the cloud-config file name will be set to \"cloud-config.yml\". The
cloud-config file must exist.";

#[derive(Parser, Debug)]
#[command(
    name = "cpic",
    version,
    about = "Create an OEM CoreOS PXE image",
    long_about = HELP,
    override_usage = "cpic [-c cloud-config] [-o output] coreos_production_pxe_image.cpio.gz"
)]
struct Args {
    /// Source PXE image (gzip-compressed cpio).
    image: PathBuf,

    /// CoreOS cloud config path.
    #[arg(short = 'c', long = "config", default_value = cpic::constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write output to file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory to assemble the image in. Defaults to the directory of the output.
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Compression of the source and output images (gzip, none).
    #[arg(long, default_value_t = CompressionType::Gzip)]
    compression: CompressionType,

    /// Gzip compression level (0-9). Not allowed with `--compression none`.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Clamp the modification time of added entries to this UNIX timestamp.
    #[arg(long, env = "SOURCE_DATE_EPOCH")]
    source_date_epoch: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<Config, cpic::Error> {
        let compression = match (self.compression, self.level) {
            (CompressionType::Gzip, Some(level)) => CompressionDetails::Gzip(level),
            (compression, _) => compression.into(),
        };

        let mut config = Config::new(self.image)
            .config_file(self.config)
            .compression(compression);
        if let Some(output) = self.output {
            config = config.output(output);
        }
        if let Some(temp_dir) = self.temp_dir {
            config = config.temp_dir(temp_dir);
        }
        if let Some(epoch) = self.source_date_epoch {
            config = config.source_date(Timestamp::try_from(epoch)?);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.compression == CompressionType::None && args.level.is_some() {
        Args::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--level cannot be used with --compression none",
            )
            .exit();
    }
    let result = args.into_config().and_then(|config| cpic::run(&config));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cpic: {}", e);
            ExitCode::FAILURE
        }
    }
}
