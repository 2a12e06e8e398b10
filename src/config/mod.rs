//! Configuration management module
//!
//! The resolved, immutable [`BenchmarkConfig`] for a run and the optional
//! TOML file that supplies defaults beneath the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::{MammothError, Result, APP_NAME, CONFIG_FILE, DEFAULT_ALIGNMENT, MIB};
use crate::bench::BlockSizeSweep;
use crate::util::units::{kib_to_bytes, mib_to_bytes, parse_timeout};

/// Benchmark configuration structure containing all test parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkConfig {
    /// File or block device under test
    pub target: PathBuf,
    /// First block size of the sweep (in bytes)
    pub from_block_size: u64,
    /// Last block size of the sweep (in bytes, inclusive)
    pub to_block_size: u64,
    /// Data volume each phase aims to move (in bytes)
    pub volume: u64,
    /// Upper bound on the duration of each phase
    #[serde(rename = "timeout_secs", with = "crate::models::result::duration_secs")]
    pub timeout: Duration,
    /// Run the write phase
    pub write_enabled: bool,
    /// Run the read phase
    pub read_enabled: bool,
    /// Minimum direct-I/O granularity of the target (in bytes)
    pub alignment: u64,
    /// Bypass the page cache
    pub direct_io: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::new(),
            from_block_size: 512,
            to_block_size: 8 * MIB,
            volume: 512 * MIB,
            timeout: Duration::from_secs(5),
            write_enabled: true,
            read_enabled: true,
            alignment: DEFAULT_ALIGNMENT as u64,
            direct_io: true,
        }
    }
}

impl BenchmarkConfig {
    /// Create a configuration with default values for the given target
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.target.as_os_str().is_empty() {
            return Err(MammothError::ConfigError("No target path given".to_string()));
        }

        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            return Err(MammothError::ConfigError(format!(
                "Alignment must be a power of 2: {}",
                self.alignment
            )));
        }

        for (name, size) in [("Starting", self.from_block_size), ("Ending", self.to_block_size)] {
            if size == 0 {
                return Err(MammothError::ConfigError(format!(
                    "{} block size must be greater than 0",
                    name
                )));
            }
            if size % self.alignment != 0 {
                return Err(MammothError::ConfigError(format!(
                    "{} block size {} is not a multiple of the {} byte alignment",
                    name, size, self.alignment
                )));
            }
        }

        if self.from_block_size > self.to_block_size {
            return Err(MammothError::ConfigError(format!(
                "Starting block size {} exceeds ending block size {}",
                self.from_block_size, self.to_block_size
            )));
        }

        if usize::try_from(self.to_block_size).is_err() {
            return Err(MammothError::ConfigError(format!(
                "Ending block size {} does not fit in memory",
                self.to_block_size
            )));
        }

        if self.volume == 0 {
            return Err(MammothError::ConfigError(
                "Volume must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(MammothError::ConfigError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Blocks a phase must complete at `block_size` to reach the volume
    pub fn target_blocks(&self, block_size: u64) -> u64 {
        self.volume / block_size
    }

    /// Block sizes visited by the sweep
    pub fn block_sizes(&self) -> BlockSizeSweep {
        BlockSizeSweep::new(self.from_block_size, self.to_block_size)
    }

    /// Set the target path
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the block size range (bytes)
    pub fn with_block_sizes(mut self, from: u64, to: u64) -> Self {
        self.from_block_size = from;
        self.to_block_size = to;
        self
    }

    /// Set the per-phase volume (bytes)
    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    /// Set the per-phase timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the write phase
    pub fn with_write(mut self, enabled: bool) -> Self {
        self.write_enabled = enabled;
        self
    }

    /// Enable or disable the read phase
    pub fn with_read(mut self, enabled: bool) -> Self {
        self.read_enabled = enabled;
        self
    }

    /// Set the direct-I/O alignment (bytes)
    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }

    /// Choose direct or buffered I/O
    pub fn with_direct_io(mut self, direct_io: bool) -> Self {
        self.direct_io = direct_io;
        self
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/mammothbench/mammothbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MammothError::ConfigError(
                "Unable to determine config directory".to_string()
            ))?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

/// On-disk configuration; every field is optional and overrides the default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Starting block size in kilobytes
    pub from_kb: Option<f64>,
    /// Ending block size in kilobytes
    pub to_kb: Option<f64>,
    /// Per-phase volume in megabytes
    pub volume_mb: Option<u64>,
    /// Per-phase timeout, seconds or a humantime string
    pub timeout: Option<TimeoutSetting>,
    pub write: Option<bool>,
    pub read: Option<bool>,
    pub alignment: Option<u64>,
    pub direct_io: Option<bool>,
}

/// A timeout written either as a number of seconds or as `"1m 30s"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSetting {
    Seconds(f64),
    Text(String),
}

impl TimeoutSetting {
    pub fn to_duration(&self) -> Result<Duration> {
        let parsed = match self {
            TimeoutSetting::Seconds(secs) => parse_timeout(&secs.to_string()),
            TimeoutSetting::Text(text) => parse_timeout(text),
        };
        parsed.map_err(MammothError::ConfigError)
    }
}

impl ConfigFile {
    /// Load a configuration file from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| MammothError::ConfigError(
                format!("Failed to read config file {}: {}", path.display(), e)
            ))?;

        toml::from_str(&content)
            .map_err(|e| MammothError::ConfigError(
                format!("Failed to parse config file {}: {}", path.display(), e)
            ))
    }

    /// Load the file at the standard location, if there is one
    pub fn load_default() -> Result<Option<Self>> {
        let path = match BenchmarkConfig::config_file_path() {
            Ok(path) => path,
            Err(e) => {
                debug!("No config directory: {}", e);
                return Ok(None);
            }
        };

        if !path.exists() {
            return Ok(None);
        }

        debug!("Loading config file {}", path.display());
        Self::load(&path).map(Some)
    }

    /// Overlay the values present in this file on top of `config`
    pub fn apply(&self, mut config: BenchmarkConfig) -> Result<BenchmarkConfig> {
        if let Some(kb) = self.from_kb {
            config.from_block_size = kib_to_bytes(kb).map_err(MammothError::ConfigError)?;
        }
        if let Some(kb) = self.to_kb {
            config.to_block_size = kib_to_bytes(kb).map_err(MammothError::ConfigError)?;
        }
        if let Some(mb) = self.volume_mb {
            config.volume = mib_to_bytes(mb).map_err(MammothError::ConfigError)?;
        }
        if let Some(timeout) = &self.timeout {
            config.timeout = timeout.to_duration()?;
        }
        if let Some(write) = self.write {
            config.write_enabled = write;
        }
        if let Some(read) = self.read {
            config.read_enabled = read;
        }
        if let Some(alignment) = self.alignment {
            config.alignment = alignment;
        }
        if let Some(direct_io) = self.direct_io {
            config.direct_io = direct_io;
        }
        Ok(config)
    }
}
