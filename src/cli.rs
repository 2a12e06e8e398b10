//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, ValueEnum};
use crate::config::{BenchmarkConfig, ConfigFile};
use crate::util::units::{kib_to_bytes, mib_to_bytes, parse_timeout};
use crate::{MammothError, Result};

/// Test sequential I/O performance by reading and writing to TARGET.
///
/// The contents of TARGET will be destroyed.
#[derive(Parser, Debug)]
#[command(name = "mammothbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// File or block device to benchmark (must already exist)
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Perform read tests only (default: read and write)
    #[arg(short = 'r')]
    pub read_only: bool,

    /// Perform write tests only (default: read and write)
    #[arg(short = 'w')]
    pub write_only: bool,

    /// Start the sweep at this block size in kilobytes (default 0.5)
    #[arg(short = 'f', value_name = "KB")]
    pub from_kb: Option<f64>,

    /// End the sweep at this block size in kilobytes (default 8192)
    #[arg(short = 't', value_name = "KB")]
    pub to_kb: Option<f64>,

    /// Target length of data to read/write during each test in megabytes (default 512)
    #[arg(short = 's', value_name = "MB")]
    pub volume_mb: Option<u64>,

    /// Maximum time for each test to reach the target length (default 5 seconds)
    #[arg(short = 'd', value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE", env = "MAMMOTHBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Go through the page cache (for filesystems that reject direct I/O)
    #[arg(long)]
    pub buffered: bool,

    /// Direct-I/O alignment of the target in bytes (default 512)
    #[arg(long, value_name = "BYTES")]
    pub alignment: Option<u64>,

    /// Verbose diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    /// The config file named with `--config`, or the one at the standard
    /// location if it exists
    pub fn load_config_file(&self) -> Result<Option<ConfigFile>> {
        match &self.config {
            Some(path) => ConfigFile::load(path).map(Some),
            None => ConfigFile::load_default(),
        }
    }

    /// Layer defaults, the config file and these flags into a validated
    /// configuration
    pub fn resolve(&self, file: Option<&ConfigFile>) -> Result<BenchmarkConfig> {
        let mut config = BenchmarkConfig::new(&self.target);
        if let Some(file) = file {
            config = file.apply(config)?;
        }

        if let Some(kb) = self.from_kb {
            config.from_block_size = kib_to_bytes(kb).map_err(MammothError::ConfigError)?;
        }
        if let Some(kb) = self.to_kb {
            config.to_block_size = kib_to_bytes(kb).map_err(MammothError::ConfigError)?;
        }
        if let Some(mb) = self.volume_mb {
            config.volume = mib_to_bytes(mb).map_err(MammothError::ConfigError)?;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if self.read_only {
            config.write_enabled = false;
        }
        if self.write_only {
            config.read_enabled = false;
        }
        if let Some(alignment) = self.alignment {
            config.alignment = alignment;
        }
        if self.buffered {
            config.direct_io = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mammothbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["/dev/sdb"]).resolve(None).unwrap();
        assert_eq!(config, BenchmarkConfig::new("/dev/sdb"));
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["-r", "-f", "0.5", "-t", "4", "-s", "16", "-d", "3", "disk.img"]);
        let config = cli.resolve(None).unwrap();

        assert_eq!(config.target, PathBuf::from("disk.img"));
        assert!(!config.write_enabled);
        assert!(config.read_enabled);
        assert_eq!(config.from_block_size, 512);
        assert_eq!(config.to_block_size, 4096);
        assert_eq!(config.volume, 16 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_write_only_and_extras() {
        let cli = parse(&[
            "-w", "--buffered", "--alignment", "4096", "-f", "4", "-d", "1m", "--format", "json",
            "disk.img",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);

        let config = cli.resolve(None).unwrap();
        assert!(config.write_enabled);
        assert!(!config.read_enabled);
        assert!(!config.direct_io);
        assert_eq!(config.alignment, 4096);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = ConfigFile {
            from_kb: Some(8.0),
            to_kb: Some(64.0),
            volume_mb: Some(32),
            ..ConfigFile::default()
        };
        let config = parse(&["-t", "16", "disk.img"]).resolve(Some(&file)).unwrap();

        assert_eq!(config.from_block_size, 8 * 1024);
        assert_eq!(config.to_block_size, 16 * 1024);
        assert_eq!(config.volume, 32 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&["-f", "8", "-t", "4", "disk.img"]).resolve(None).is_err());
        assert!(parse(&["-f", "0.3", "disk.img"]).resolve(None).is_err());
        assert!(parse(&["-s", "0", "disk.img"]).resolve(None).is_err());

        let args = ["mammothbench", "-d", "never", "disk.img"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["mammothbench"]).is_err());
    }
}
