//! Command-line overrides for the generator configuration.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Configuration overrides accepted on the command line.
///
/// CLI values override settings loaded from `config.ron`. Binaries flatten
/// this into their own parser.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Side length of a chunk in world units.
    #[arg(long)]
    pub chunk_world_size: Option<f32>,

    /// Heightmap samples along one edge of a chunk.
    #[arg(long)]
    pub samples_per_dim: Option<u32>,

    /// Chunks along one edge of a cluster.
    #[arg(long)]
    pub cluster_dim: Option<u32>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads (0 = one per available core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(size) = args.chunk_world_size {
            self.grid.chunk_world_size = size;
        }
        if let Some(n) = args.samples_per_dim {
            self.grid.noise_samples_per_dim = n;
        }
        if let Some(dim) = args.cluster_dim {
            self.grid.cluster_dim = dim;
        }
        if let Some(seed) = args.seed {
            self.noise.seed = seed;
        }
        if let Some(threads) = args.threads {
            self.dispatch.worker_threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            chunk_world_size: Some(12.0),
            seed: Some(111),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.grid.chunk_world_size, 12.0);
        assert_eq!(config.noise.seed, 111);
        // Non-overridden fields retain defaults
        assert_eq!(config.grid.noise_samples_per_dim, 9);
        assert_eq!(config.grid.cluster_dim, 5);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }
}
