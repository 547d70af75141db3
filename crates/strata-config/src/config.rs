//! Generator configuration with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";
const APP_NAME: &str = "strata";

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk / cluster grid dimensions.
    pub grid: GridConfig,
    /// Height function constants.
    pub noise: NoiseConfig,
    /// Worker pool sizing.
    pub dispatch: DispatchConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Dimensions of the sample → chunk → cluster hierarchy.
///
/// `chunk_world_size` is the single world-scale value shared by the density
/// and heightmap generators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Voxel samples along one edge of a density chunk.
    pub chunk_voxel_dim: u32,
    /// Heightmap samples along one edge of a chunk. Must be at least 2.
    pub noise_samples_per_dim: u32,
    /// Chunks along one edge of a cluster.
    pub cluster_dim: u32,
    /// Side length of a chunk in world units.
    pub chunk_world_size: f32,
    /// Largest absolute chunk coordinate accepted on any axis.
    pub max_chunk_coord: i32,
}

/// Constants of the fractal value-noise height function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// World seed. Zero keeps the unshifted reference field.
    pub seed: u64,
    /// Multiplier applied to world positions before sampling noise.
    pub domain_scale: f32,
    /// Multiplier applied to the fbm sum to produce world-unit heights.
    pub amplitude: f32,
    /// Number of fbm octaves.
    pub octaves: u32,
    /// Amplitude of the first octave.
    pub octave_amplitude: f32,
    /// Frequency of the first octave.
    pub octave_frequency: f32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves.
    pub gain: f32,
}

/// Thread pool and background queue sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker threads for parallel dispatch (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Maximum batches queued on the background generator.
    pub max_queued_batches: usize,
    /// Capacity of the completed-batch channel.
    pub result_capacity: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to the log directory.
    pub log_to_file: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            chunk_voxel_dim: 32,
            noise_samples_per_dim: 9,
            cluster_dim: 5,
            chunk_world_size: 50.0,
            max_chunk_coord: i16::MAX as i32,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            domain_scale: 0.01,
            amplitude: 100.0,
            octaves: 4,
            octave_amplitude: 0.5,
            octave_frequency: 1.0,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            max_queued_batches: 16,
            result_capacity: 32,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

/// Platform configuration directory for Strata (`<config_dir>/strata`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
