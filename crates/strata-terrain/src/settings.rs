//! Conversion from the persisted configuration into validated generator settings.

use strata_config::{GridConfig, NoiseConfig};
use strata_coords::{ChunkGrid, GridError};

use crate::terrain_noise::NoiseParams;

/// Validate the `grid` config section.
pub fn grid_from_config(config: &GridConfig) -> Result<ChunkGrid, GridError> {
    ChunkGrid::new(
        config.chunk_voxel_dim,
        config.noise_samples_per_dim,
        config.cluster_dim,
        config.chunk_world_size,
    )?
    .with_max_chunk_coord(config.max_chunk_coord)
}

impl From<&NoiseConfig> for NoiseParams {
    fn from(config: &NoiseConfig) -> Self {
        Self {
            seed: config.seed,
            domain_scale: config.domain_scale,
            amplitude: config.amplitude,
            octaves: config.octaves,
            octave_amplitude: config.octave_amplitude,
            octave_frequency: config.octave_frequency,
            lacunarity: config.lacunarity,
            gain: config.gain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_default_grid() {
        let grid = grid_from_config(&GridConfig::default()).unwrap();
        assert_eq!(grid, ChunkGrid::default());
    }

    #[test]
    fn test_default_noise_config_matches_params() {
        assert_eq!(NoiseParams::from(&NoiseConfig::default()), NoiseParams::default());
    }

    #[test]
    fn test_invalid_grid_config_rejected() {
        let config = GridConfig {
            chunk_world_size: -1.0,
            ..Default::default()
        };
        assert_eq!(
            grid_from_config(&config),
            Err(GridError::InvalidWorldSize(-1.0))
        );

        let config = GridConfig {
            max_chunk_coord: -5,
            ..Default::default()
        };
        assert_eq!(grid_from_config(&config), Err(GridError::InvalidCoordLimit(-5)));
    }
}
