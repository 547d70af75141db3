//! Command-line front end for the terrain generator.
//!
//! Loads `config.ron`, applies command-line overrides, generates a batch of
//! cluster heightmaps (and optionally one density chunk) and prints a summary.
//!
//! Run with: `cargo run -p strata-gen -- --cluster 0,0 --cluster 5,0`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::{IVec2, IVec3};
use strata_config::{CliArgs, Config, ConfigError, default_config_dir};
use strata_terrain::{
    AsyncBatchGenerator, BatchDispatcher, GenerationError, HeightBatch, heights_contain_surface,
};
use thiserror::Error;
use tracing::{info, warn};

/// CLI arguments for the generator binary.
#[derive(Parser, Debug)]
#[command(name = "strata-gen", about = "Generate terrain heightmaps and density fields")]
struct GenArgs {
    /// Lower-corner chunk of a cluster to generate, as `X,Z`. Repeatable.
    #[arg(long = "cluster", value_parser = parse_ivec2, default_value = "0,0")]
    clusters: Vec<IVec2>,

    /// Also generate the density field of this chunk, as `X,Y,Z`.
    #[arg(long, value_parser = parse_ivec3)]
    density: Option<IVec3>,

    /// Fill the density chunk from the terrain heightmap instead of the ramp.
    #[arg(long, requires = "density")]
    terrain: bool,

    /// Submit the batch through the background queue instead of blocking.
    #[arg(long)]
    background: bool,

    #[command(flatten)]
    overrides: CliArgs,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("background generation timed out")]
    Timeout,
}

fn parse_ivec2(s: &str) -> Result<IVec2, String> {
    match parse_ints(s)?.as_slice() {
        &[x, z] => Ok(IVec2::new(x, z)),
        _ => Err(format!("expected X,Z but got `{s}`")),
    }
}

fn parse_ivec3(s: &str) -> Result<IVec3, String> {
    match parse_ints(s)?.as_slice() {
        &[x, y, z] => Ok(IVec3::new(x, y, z)),
        _ => Err(format!("expected X,Y,Z but got `{s}`")),
    }
}

fn parse_ints(s: &str) -> Result<Vec<i32>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| format!("invalid coordinate `{part}`: {e}"))
        })
        .collect()
}

fn load_config(overrides: &CliArgs) -> Result<(Config, PathBuf), AppError> {
    let config_dir = match &overrides.config {
        Some(dir) => dir.clone(),
        None => default_config_dir()?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(overrides);
    Ok((config, config_dir))
}

fn generate_in_background(
    dispatcher: Arc<BatchDispatcher>,
    config: &Config,
    clusters: Vec<IVec2>,
) -> Result<HeightBatch, AppError> {
    let generator = AsyncBatchGenerator::from_config(dispatcher, &config.dispatch)?;
    let id = generator.submit(clusters)?;

    let deadline = Instant::now() + Duration::from_secs(60);
    while Instant::now() < deadline {
        if let Some(done) = generator.drain_results().into_iter().find(|b| b.id == id) {
            info!(us = done.generation_time_us, "background batch finished");
            return Ok(done.result?);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    generator.cancel(id);
    Err(AppError::Timeout)
}

fn print_summary(batch: &HeightBatch, dispatcher: &BatchDispatcher) {
    let grid = dispatcher.grid();
    let chunk_size = grid.chunk_world_size();
    for (i, &lower) in batch.clusters().iter().enumerate() {
        let Ok(heights) = batch.cluster_heights(i) else {
            continue;
        };
        let (min, max) = heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            });
        let surface_chunks = heights
            .chunks_exact(grid.samples_per_chunk() as usize)
            .filter(|chunk| heights_contain_surface(0.0, chunk_size, chunk))
            .count();
        println!(
            "cluster {lower}: heights [{min:.2}, {max:.2}], {surface_chunks}/{} chunks cross y=[0, {chunk_size})",
            grid.chunks_per_cluster()
        );
    }
    println!(
        "{} clusters, {} chunks, {} samples",
        batch.clusters().len(),
        batch.demultiplex().len(),
        batch.heights().len()
    );
}

fn run(args: GenArgs) -> Result<(), AppError> {
    let (config, config_dir) = load_config(&args.overrides)?;
    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(log_dir.as_path()), Some(&config));
    info!(config_dir = %config_dir.display(), "Strata terrain generator");

    let dispatcher = Arc::new(BatchDispatcher::from_config(&config)?);
    info!(
        threads = dispatcher.worker_threads(),
        seed = config.noise.seed,
        "dispatcher ready"
    );

    let start = Instant::now();
    let batch = if args.background {
        generate_in_background(Arc::clone(&dispatcher), &config, args.clusters)?
    } else {
        dispatcher.generate_batch_heights(&args.clusters)?
    };
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "heights generated");
    print_summary(&batch, &dispatcher);

    if let Some(chunk) = args.density {
        let origin = dispatcher.grid().chunk_origin_3d(chunk);
        let density = if args.terrain {
            dispatcher.generate_terrain_density(origin)?
        } else {
            dispatcher.generate_chunk_density(origin)?
        };
        println!(
            "density chunk {chunk}: {} voxels, surface: {}, uniform: {}",
            density.densities.len(),
            density.has_surface(),
            density.is_uniform()
        );
    }
    Ok(())
}

fn main() {
    let args = GenArgs::parse();
    if let Err(e) = run(args) {
        warn!("generation failed: {e}");
        eprintln!("strata-gen: {e}");
        std::process::exit(1);
    }
}
