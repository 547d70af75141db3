//! Configuration system for the Strata terrain generator.
//!
//! Provides the generator tunables (grid dimensions, noise constants, worker pool
//! sizing) as settings that persist to disk as RON files. Supports CLI overrides
//! via clap, hot-reload detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DispatchConfig, GridConfig, NoiseConfig, default_config_dir,
};
pub use error::ConfigError;
