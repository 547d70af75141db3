//! Parallel dispatch of heightmap and density requests over a worker pool.
//!
//! A dispatch validates its request and output buffer up front, then hands every
//! chunk slot of the buffer to the pool as a disjoint mutable slice. Work-items do
//! not communicate, so the only synchronization is the join at the end of the
//! dispatch. Once validation passes the dispatch cannot fail.

use std::time::Instant;

use glam::{IVec2, IVec3, Vec2, Vec3};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::{FxHashMap, FxHashSet};
use strata_config::Config;
use strata_coords::ChunkGrid;
use tracing::{debug, warn};

use crate::density::{
    ChunkDensity, DensityFieldGenerator, DensityFunction, MaterialId, RampDensity, check_origin,
};
use crate::error::GenerationError;
use crate::heightfield::HeightfieldDensity;
use crate::heightmap::{HeightLayout, HeightRequest, HeightmapGenerator};
use crate::settings::grid_from_config;
use crate::terrain_noise::{NoiseParams, TerrainNoise};

/// Heights for a batch of clusters, laid out `cluster × chunk × sample`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightBatch {
    grid: ChunkGrid,
    clusters: Vec<IVec2>,
    heights: Vec<f32>,
}

impl HeightBatch {
    /// Lower-corner chunks of the clusters, in output order.
    pub fn clusters(&self) -> &[IVec2] {
        &self.clusters
    }

    /// The flat output buffer.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn into_heights(self) -> Vec<f32> {
        self.heights
    }

    pub fn layout(&self) -> HeightLayout {
        HeightLayout::batch(&self.grid, self.clusters.len() as u32)
    }

    /// Heights of all chunks of the `cluster`-th requested cluster.
    pub fn cluster_heights(&self, cluster: usize) -> Result<&[f32], GenerationError> {
        self.layout().cluster_slice(&self.heights, cluster)
    }

    /// Heights of chunk slot `chunk_in_cluster` of the `cluster`-th requested cluster.
    pub fn chunk_heights(
        &self,
        cluster: usize,
        chunk_in_cluster: usize,
    ) -> Result<&[f32], GenerationError> {
        self.layout()
            .chunk_slice(&self.heights, cluster, chunk_in_cluster)
    }

    /// Split the buffer into one height array per chunk coordinate.
    ///
    /// Chunks shared by overlapping clusters appear once; their heights are
    /// identical in every slot that holds them.
    pub fn demultiplex(&self) -> FxHashMap<IVec2, Box<[f32]>> {
        let layout = self.layout();
        let mut chunks = FxHashMap::default();
        chunks.reserve(layout.chunk_count());
        for (slot, heights) in self
            .heights
            .chunks_exact(layout.samples_per_chunk())
            .enumerate()
        {
            let cluster = self.clusters[slot / layout.chunks_per_cluster()];
            let chunk = self
                .grid
                .cluster_chunk(cluster, (slot % layout.chunks_per_cluster()) as u32);
            chunks.insert(chunk, heights.into());
        }
        chunks
    }
}

/// Runs generation requests on a dedicated worker pool.
pub struct BatchDispatcher<F = RampDensity> {
    heightmap: HeightmapGenerator,
    density: DensityFieldGenerator<F>,
    pool: ThreadPool,
}

impl BatchDispatcher<RampDensity> {
    /// Dispatcher with the placeholder density field.
    ///
    /// `worker_threads == 0` sizes the pool to the number of logical CPUs.
    pub fn new(
        grid: ChunkGrid,
        noise: NoiseParams,
        worker_threads: usize,
    ) -> Result<Self, GenerationError> {
        Self::with_density_function(grid, noise, worker_threads, RampDensity)
    }

    /// Build a dispatcher from the `grid`, `noise` and `dispatch` config sections.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let grid = grid_from_config(&config.grid)?;
        Self::new(
            grid,
            NoiseParams::from(&config.noise),
            config.dispatch.worker_threads,
        )
    }
}

impl<F: DensityFunction> BatchDispatcher<F> {
    /// Dispatcher with a custom density function.
    pub fn with_density_function(
        grid: ChunkGrid,
        noise: NoiseParams,
        worker_threads: usize,
        function: F,
    ) -> Result<Self, GenerationError> {
        let threads = if worker_threads == 0 {
            num_cpus::get()
        } else {
            worker_threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("strata-dispatch-{i}"))
            .build()
            .map_err(|e| GenerationError::ThreadPool(e.to_string()))?;
        debug!(threads, ?grid, "batch dispatcher ready");

        Ok(Self {
            heightmap: HeightmapGenerator::new(grid, TerrainNoise::new(noise)),
            density: DensityFieldGenerator::with_function(grid, function),
            pool,
        })
    }

    pub fn grid(&self) -> &ChunkGrid {
        self.heightmap.grid()
    }

    pub fn heightmap(&self) -> &HeightmapGenerator {
        &self.heightmap
    }

    pub fn density(&self) -> &DensityFieldGenerator<F> {
        &self.density
    }

    /// Number of worker threads in the pool.
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    // -- heightmaps ---------------------------------------------------------

    /// Heights of the chunk whose lower corner is `chunk_origin`.
    pub fn generate_chunk_heights(&self, chunk_origin: Vec2) -> Result<Vec<f32>, GenerationError> {
        let mut heights = vec![0.0; self.grid().samples_per_chunk() as usize];
        self.generate_chunk_heights_into(chunk_origin, &mut heights)?;
        Ok(heights)
    }

    /// Like [`generate_chunk_heights`](Self::generate_chunk_heights) into a
    /// caller-owned buffer of exactly `samples_per_chunk` elements.
    pub fn generate_chunk_heights_into(
        &self,
        chunk_origin: Vec2,
        out: &mut [f32],
    ) -> Result<(), GenerationError> {
        check_origin(chunk_origin.extend(0.0))
            .inspect_err(|e| warn!("rejected chunk: {e}"))?;
        let request = HeightRequest::Chunk {
            origin: chunk_origin,
        };
        self.dispatch_heights(&request, out)
    }

    /// Heights of every chunk of the cluster whose lower-corner chunk is `lower_chunk`.
    pub fn generate_cluster_heights(&self, lower_chunk: IVec2) -> Result<Vec<f32>, GenerationError> {
        let mut heights = vec![0.0; self.grid().samples_per_cluster() as usize];
        self.generate_cluster_heights_into(lower_chunk, &mut heights)?;
        Ok(heights)
    }

    /// Like [`generate_cluster_heights`](Self::generate_cluster_heights) into a
    /// caller-owned buffer of exactly `samples_per_cluster` elements.
    pub fn generate_cluster_heights_into(
        &self,
        lower_chunk: IVec2,
        out: &mut [f32],
    ) -> Result<(), GenerationError> {
        self.check_cluster(lower_chunk)
            .inspect_err(|e| warn!("rejected cluster: {e}"))?;
        self.dispatch_heights(&HeightRequest::Cluster { lower_chunk }, out)
    }

    /// Heights of many clusters in one dispatch.
    pub fn generate_batch_heights(&self, clusters: &[IVec2]) -> Result<HeightBatch, GenerationError> {
        let layout = HeightLayout::batch(self.grid(), clusters.len() as u32);
        let mut heights = vec![0.0; layout.len()];
        self.generate_batch_heights_into(clusters, &mut heights)?;
        Ok(HeightBatch {
            grid: *self.grid(),
            clusters: clusters.to_vec(),
            heights,
        })
    }

    /// Like [`generate_batch_heights`](Self::generate_batch_heights) into a
    /// caller-owned buffer of exactly `clusters.len() × samples_per_cluster` elements.
    pub fn generate_batch_heights_into(
        &self,
        clusters: &[IVec2],
        out: &mut [f32],
    ) -> Result<(), GenerationError> {
        self.validate_clusters(clusters)
            .inspect_err(|e| warn!("rejected batch: {e}"))?;
        self.dispatch_heights(&HeightRequest::Batch { clusters }, out)
    }

    /// Check a cluster list without generating anything.
    pub fn validate_clusters(&self, clusters: &[IVec2]) -> Result<(), GenerationError> {
        if clusters.is_empty() {
            return Err(GenerationError::EmptyBatch);
        }
        let mut seen = FxHashSet::default();
        for &cluster in clusters {
            self.check_cluster(cluster)?;
            if !seen.insert(cluster) {
                return Err(GenerationError::DuplicateCluster(cluster));
            }
        }
        Ok(())
    }

    fn check_cluster(&self, lower_chunk: IVec2) -> Result<(), GenerationError> {
        if self.grid().contains_cluster(lower_chunk) {
            Ok(())
        } else {
            Err(GenerationError::CoordOutOfRange {
                coord: lower_chunk.to_string(),
                limit: self.grid().max_chunk_coord(),
            })
        }
    }

    fn dispatch_heights(
        &self,
        request: &HeightRequest<'_>,
        out: &mut [f32],
    ) -> Result<(), GenerationError> {
        let layout = request.layout(self.grid());
        layout
            .check_buffer(out.len())
            .inspect_err(|e| warn!("rejected height buffer: {e}"))?;

        let start = Instant::now();
        let chunks_per_cluster = layout.chunks_per_cluster();
        self.pool.install(|| {
            out.par_chunks_mut(layout.samples_per_chunk())
                .enumerate()
                .for_each(|(slot, heights)| {
                    self.heightmap.run_chunk_slot(
                        request,
                        (slot / chunks_per_cluster) as u32,
                        (slot % chunks_per_cluster) as u32,
                        heights,
                    );
                });
        });
        debug!(
            chunks = layout.chunk_count(),
            samples = layout.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "heightmap dispatch complete"
        );
        Ok(())
    }

    // -- density ------------------------------------------------------------

    /// Density and material field of the chunk whose lower corner is `chunk_origin`.
    pub fn generate_chunk_density(&self, chunk_origin: Vec3) -> Result<ChunkDensity, GenerationError> {
        let len = self.grid().voxels_per_chunk() as usize;
        let mut densities = vec![0; len].into_boxed_slice();
        let mut materials = vec![MaterialId::EMPTY; len].into_boxed_slice();
        self.generate_chunk_density_into(chunk_origin, &mut densities, &mut materials)?;
        Ok(ChunkDensity {
            densities,
            materials,
        })
    }

    /// Fill caller-owned density and material buffers, one z-slab per task.
    pub fn generate_chunk_density_into(
        &self,
        chunk_origin: Vec3,
        densities: &mut [i32],
        materials: &mut [MaterialId],
    ) -> Result<(), GenerationError> {
        self.fill_density(&self.density, chunk_origin, densities, materials)
    }

    /// Surface-distance density of the chunk at `chunk_origin`, driven by this
    /// dispatcher's height function instead of the configured density function.
    pub fn generate_terrain_density(
        &self,
        chunk_origin: Vec3,
    ) -> Result<ChunkDensity, GenerationError> {
        let field =
            HeightfieldDensity::from_noise(self.grid(), self.heightmap.noise(), chunk_origin)?;
        let generator = DensityFieldGenerator::with_function(*self.grid(), field);

        let len = self.grid().voxels_per_chunk() as usize;
        let mut densities = vec![0; len].into_boxed_slice();
        let mut materials = vec![MaterialId::EMPTY; len].into_boxed_slice();
        self.fill_density(&generator, chunk_origin, &mut densities, &mut materials)?;
        Ok(ChunkDensity {
            densities,
            materials,
        })
    }

    fn fill_density<G: DensityFunction>(
        &self,
        generator: &DensityFieldGenerator<G>,
        chunk_origin: Vec3,
        densities: &mut [i32],
        materials: &mut [MaterialId],
    ) -> Result<(), GenerationError> {
        check_origin(chunk_origin).inspect_err(|e| warn!("rejected chunk: {e}"))?;
        let expected = self.grid().voxels_per_chunk() as usize;
        for actual in [densities.len(), materials.len()] {
            if actual != expected {
                let err = GenerationError::BufferSizeMismatch { expected, actual };
                warn!("rejected density buffer: {err}");
                return Err(err);
            }
        }

        let start = Instant::now();
        let dim = self.grid().chunk_voxel_dim() as usize;
        let slab = dim * dim;
        self.pool.install(|| {
            densities
                .par_chunks_mut(slab)
                .zip(materials.par_chunks_mut(slab))
                .enumerate()
                .for_each(|(z, (densities, materials))| {
                    let first = (z * slab) as u32;
                    for index in first..first + slab as u32 {
                        generator.write_sample(chunk_origin, index, first, densities, materials);
                    }
                });
        });
        debug!(
            voxels = expected,
            elapsed_us = start.elapsed().as_micros() as u64,
            "density dispatch complete"
        );
        Ok(())
    }

    /// Density fields for many chunks, one chunk per task, in request order.
    pub fn generate_density_batch(
        &self,
        chunks: &[IVec3],
    ) -> Result<Vec<(IVec3, ChunkDensity)>, GenerationError> {
        if chunks.is_empty() {
            warn!("rejected density batch: empty");
            return Err(GenerationError::EmptyBatch);
        }
        let grid = *self.grid();
        if let Some(chunk) = chunks.iter().find(|&&c| !grid.contains_chunk_3d(c)) {
            let err = GenerationError::CoordOutOfRange {
                coord: chunk.to_string(),
                limit: grid.max_chunk_coord(),
            };
            warn!("rejected density batch: {err}");
            return Err(err);
        }

        let start = Instant::now();
        let result = self.pool.install(|| {
            chunks
                .par_iter()
                .map(|&chunk| {
                    self.density
                        .generate_chunk(grid.chunk_origin_3d(chunk))
                        .map(|density| (chunk, density))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        debug!(
            chunks = chunks.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "density batch complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> BatchDispatcher {
        BatchDispatcher::new(ChunkGrid::default(), NoiseParams::default(), 4).unwrap()
    }

    #[test]
    fn test_chunk_scenario_origin_zero() {
        let dispatcher = dispatcher();
        let heights = dispatcher.generate_chunk_heights(Vec2::ZERO).unwrap();
        let noise = dispatcher.heightmap().noise();

        assert_eq!(heights.len(), 81);
        assert_eq!(heights[0], noise.height(Vec2::ZERO));
        assert_eq!(heights[80], noise.height(Vec2::new(50.0, 50.0)));
        assert_eq!(heights[4 * 9 + 4], noise.height(Vec2::new(25.0, 25.0)));
        for h in &heights {
            assert!(h.is_finite() && (0.0..=100.0).contains(h), "height {h} out of range");
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dispatcher = dispatcher();
        let clusters = [IVec2::new(-5, 0), IVec2::new(10, 20), IVec2::new(0, -5)];
        let parallel = dispatcher.generate_batch_heights(&clusters).unwrap();

        let mut sequential = vec![0.0; parallel.heights().len()];
        dispatcher
            .heightmap()
            .fill(&HeightRequest::Batch { clusters: &clusters }, &mut sequential)
            .unwrap();
        assert_eq!(parallel.heights(), sequential.as_slice());
    }

    #[test]
    fn test_cluster_slot_matches_chunk_path() {
        let dispatcher = dispatcher();
        let cluster = dispatcher.generate_cluster_heights(IVec2::new(2, 3)).unwrap();
        let origin = dispatcher.grid().chunk_origin(IVec2::new(3, 4));
        let chunk = dispatcher.generate_chunk_heights(origin).unwrap();
        assert_eq!(&cluster[6 * 81..7 * 81], chunk.as_slice());
    }

    #[test]
    fn test_batch_of_one_equals_cluster() {
        let dispatcher = dispatcher();
        let lower = IVec2::new(-40, 15);
        let batch = dispatcher.generate_batch_heights(&[lower]).unwrap();
        let cluster = dispatcher.generate_cluster_heights(lower).unwrap();
        assert_eq!(batch.heights(), cluster.as_slice());
    }

    #[test]
    fn test_batch_entries_match_individual_clusters() {
        let dispatcher = dispatcher();
        let clusters = [IVec2::new(0, 0), IVec2::new(5, 0), IVec2::new(100, -100)];
        let batch = dispatcher.generate_batch_heights(&clusters).unwrap();
        for (i, &lower) in clusters.iter().enumerate() {
            let single = dispatcher.generate_cluster_heights(lower).unwrap();
            assert_eq!(
                batch.cluster_heights(i).unwrap(),
                single.as_slice(),
                "batch entry {i} differs from its single-cluster dispatch"
            );
        }
    }

    #[test]
    fn test_adjacent_clusters_share_edges() {
        let dispatcher = dispatcher();
        let batch = dispatcher
            .generate_batch_heights(&[IVec2::new(0, 0), IVec2::new(5, 0)])
            .unwrap();
        // Slot 4 is the +x edge chunk of the first cluster, slot 0 the -x edge of the second.
        let left = batch.chunk_heights(0, 4).unwrap();
        let right = batch.chunk_heights(1, 0).unwrap();
        for row in 0..9 {
            assert_eq!(left[row * 9 + 8], right[row * 9]);
        }
    }

    #[test]
    fn test_out_of_range_cluster_index_rejected() {
        let dispatcher = dispatcher();
        let clusters: Vec<IVec2> = (0..5).map(|i| IVec2::new(i * 5, 0)).collect();
        let batch = dispatcher.generate_batch_heights(&clusters).unwrap();
        assert!(batch.chunk_heights(4, 24).is_ok());
        assert!(matches!(
            batch.chunk_heights(5, 0),
            Err(GenerationError::OutOfRange { index: 5, len: 5, .. })
        ));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let dispatcher = dispatcher();
        assert!(matches!(
            dispatcher.generate_batch_heights(&[]),
            Err(GenerationError::EmptyBatch)
        ));
        assert!(matches!(
            dispatcher.generate_density_batch(&[]),
            Err(GenerationError::EmptyBatch)
        ));
    }

    #[test]
    fn test_duplicate_cluster_rejected() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .generate_batch_heights(&[IVec2::new(1, 1), IVec2::new(6, 1), IVec2::new(1, 1)])
            .unwrap_err();
        assert!(matches!(err, GenerationError::DuplicateCluster(c) if c == IVec2::new(1, 1)));
    }

    #[test]
    fn test_coordinates_beyond_limit_rejected() {
        let grid = ChunkGrid::default().with_max_chunk_coord(10).unwrap();
        let dispatcher = BatchDispatcher::new(grid, NoiseParams::default(), 1).unwrap();
        assert!(dispatcher.generate_cluster_heights(IVec2::new(6, 6)).is_ok());
        assert!(matches!(
            dispatcher.generate_cluster_heights(IVec2::new(7, 0)),
            Err(GenerationError::CoordOutOfRange { limit: 10, .. })
        ));
        assert!(matches!(
            dispatcher.generate_density_batch(&[IVec3::new(0, 11, 0)]),
            Err(GenerationError::CoordOutOfRange { .. })
        ));
    }

    #[test]
    fn test_buffer_mismatch_rejected_before_work() {
        let dispatcher = dispatcher();
        let mut out = vec![-1.0; 2024];
        let err = dispatcher
            .generate_cluster_heights_into(IVec2::ZERO, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::BufferSizeMismatch {
                expected: 2025,
                actual: 2024
            }
        ));
        assert!(out.iter().all(|&h| h == -1.0), "buffer must be untouched");
    }

    #[test]
    fn test_non_finite_origin_rejected() {
        let dispatcher = dispatcher();
        assert!(matches!(
            dispatcher.generate_chunk_heights(Vec2::new(0.0, f32::INFINITY)),
            Err(GenerationError::NonFiniteOrigin(_))
        ));
    }

    #[test]
    fn test_demultiplex_keys_and_values() {
        let dispatcher = dispatcher();
        let clusters = [IVec2::new(0, 0), IVec2::new(-5, 10)];
        let batch = dispatcher.generate_batch_heights(&clusters).unwrap();
        let chunks = batch.demultiplex();

        assert_eq!(chunks.len(), 50);
        let coord = IVec2::new(-4, 12);
        let expected = dispatcher
            .generate_chunk_heights(dispatcher.grid().chunk_origin(coord))
            .unwrap();
        assert_eq!(chunks[&coord].as_ref(), expected.as_slice());
    }

    #[test]
    fn test_overlapping_clusters_agree() {
        let dispatcher = dispatcher();
        let batch = dispatcher
            .generate_batch_heights(&[IVec2::new(0, 0), IVec2::new(2, 0)])
            .unwrap();
        // Chunk (3, 0) is slot 3 of the first cluster and slot 1 of the second.
        assert_eq!(batch.chunk_heights(0, 3).unwrap(), batch.chunk_heights(1, 1).unwrap());
        assert_eq!(batch.demultiplex().len(), 35);
    }

    #[test]
    fn test_parallel_density_matches_sequential() {
        let grid = ChunkGrid::new(8, 9, 5, 50.0).unwrap();
        let dispatcher = BatchDispatcher::with_density_function(
            grid,
            NoiseParams::default(),
            3,
            |index: u32, pos: Vec3| crate::density::DensitySample {
                density: (pos.y - 60.0) as i32 + index as i32 % 3,
                material: MaterialId::GRASS,
            },
        )
        .unwrap();
        let origin = Vec3::new(50.0, 50.0, -100.0);
        let parallel = dispatcher.generate_chunk_density(origin).unwrap();
        let sequential = dispatcher.density().generate_chunk(origin).unwrap();
        assert_eq!(parallel, sequential);
        assert!(parallel.has_surface());
    }

    #[test]
    fn test_default_density_chunk_is_ramp() {
        let dispatcher = dispatcher();
        let chunk = dispatcher.generate_chunk_density(Vec3::ZERO).unwrap();
        assert_eq!(chunk.densities.len(), 32_768);
        assert_eq!(chunk.densities[12_345], 12_346);
        assert_eq!(chunk.materials[32_767], MaterialId::DIRT);
    }

    #[test]
    fn test_terrain_density_matches_sequential_heightfield() {
        let grid = ChunkGrid::new(16, 9, 5, 50.0).unwrap();
        let dispatcher = BatchDispatcher::new(grid, NoiseParams::default(), 3).unwrap();
        let origin = grid.chunk_origin_3d(IVec3::new(2, 0, -1));

        let parallel = dispatcher.generate_terrain_density(origin).unwrap();
        let field =
            HeightfieldDensity::from_noise(&grid, dispatcher.heightmap().noise(), origin).unwrap();
        let sequential = DensityFieldGenerator::with_function(grid, field)
            .generate_chunk(origin)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_terrain_density_columns_use_chunk_heights() {
        let grid = ChunkGrid::new(9, 9, 5, 48.0).unwrap();
        let dispatcher = BatchDispatcher::new(grid, NoiseParams::default(), 2).unwrap();
        let origin = Vec3::new(48.0, 0.0, 96.0);
        let heights = dispatcher
            .generate_chunk_heights(Vec2::new(origin.x, origin.z))
            .unwrap();
        let chunk = dispatcher.generate_terrain_density(origin).unwrap();

        // With equal voxel and sample grids every column sits on a height sample.
        let spacing = grid.voxel_spacing();
        for (column, &height) in heights.iter().enumerate() {
            let (x, z) = (column % 9, column / 9);
            for y in 0..9 {
                let world_y = y as f32 * spacing;
                let index = z * 81 + y * 9 + x;
                let expected = crate::heightfield::quantize_distance(world_y - height) as i32;
                assert_eq!(chunk.densities[index], expected, "column {column}, layer {y}");
            }
        }
    }

    #[test]
    fn test_density_batch_preserves_order() {
        let grid = ChunkGrid::new(4, 9, 5, 50.0).unwrap();
        let dispatcher = BatchDispatcher::new(grid, NoiseParams::default(), 2).unwrap();
        let chunks = [IVec3::new(1, 0, 0), IVec3::new(-3, 2, 7), IVec3::new(0, 0, 0)];
        let batch = dispatcher.generate_density_batch(&chunks).unwrap();
        let coords: Vec<IVec3> = batch.iter().map(|(c, _)| *c).collect();
        assert_eq!(coords, chunks);
        assert!(batch.iter().all(|(_, d)| d.densities.len() == 64));
    }

    #[test]
    fn test_from_config_uses_grid_and_threads() {
        let mut config = Config::default();
        config.grid.noise_samples_per_dim = 5;
        config.dispatch.worker_threads = 2;
        let dispatcher = BatchDispatcher::from_config(&config).unwrap();
        assert_eq!(dispatcher.grid().samples_per_chunk(), 25);
        assert_eq!(dispatcher.worker_threads(), 2);

        config.grid.noise_samples_per_dim = 1;
        assert!(matches!(
            BatchDispatcher::from_config(&config),
            Err(GenerationError::Grid(_))
        ));
    }
}
