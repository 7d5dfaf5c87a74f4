use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use glam::{Mat4, Vec3};
use log::debug;

use crate::job_queue::JobPool;
use crate::limits::{DEFAULT_VIEW_DISTANCE, unload_distance};
use crate::math::aabb::Aabb;
use crate::math::frustum::Frustum;
use crate::registry::TerrainGenerator;
use crate::voxels::chunk::{CHUNK_SIZE, Chunk, ChunkState};
use crate::voxels::coord::{ChunkPos, WorldPos};
use crate::voxels::neighbor_access::NeighborAccess;
use crate::world_map::ChunkMap;
use crate::world_stats::CHUNKS_BY_STATE;

struct TerrainJob {
    pos: ChunkPos,
    generation_id: u64,
}

struct DecorationJob {
    pos: ChunkPos,
    generation_id: u64,
}

struct Inner<G: TerrainGenerator> {
    chunks: Arc<ChunkMap>,
    generator: Arc<G>,
    decoration_locks: Mutex<HashSet<ChunkPos, ahash::RandomState>>,
    last_player_center: Mutex<Vec3>,
    terrain_pool: JobPool<TerrainJob>,
    decoration_pool: JobPool<DecorationJob>,
}

/// Chunk lifecycle state machine, view-distance streaming, and the dual
/// terrain/decoration worker pools (spec section 4.3).
pub struct ChunkManager<G: TerrainGenerator + 'static> {
    inner: Arc<Inner<G>>,
    view_distance: AtomicI32,
    frustum: Mutex<Frustum>,
}

impl<G: TerrainGenerator + 'static> ChunkManager<G> {
    pub fn new(num_threads: usize, chunks: Arc<ChunkMap>, generator: Arc<G>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner<G>>| {
            let terrain_weak = weak.clone();
            let decoration_weak = weak.clone();

            Inner {
                chunks,
                generator,
                decoration_locks: Mutex::new(HashSet::default()),
                last_player_center: Mutex::new(Vec3::ZERO),
                terrain_pool: JobPool::new(num_threads, move |job: TerrainJob| {
                    if let Some(inner) = terrain_weak.upgrade() {
                        handle_terrain_job(&inner, job);
                    }
                }),
                decoration_pool: JobPool::new(num_threads, move |job: DecorationJob| {
                    if let Some(inner) = decoration_weak.upgrade() {
                        handle_decoration_job(&inner, job);
                    }
                }),
            }
        });

        ChunkManager {
            inner,
            view_distance: AtomicI32::new(DEFAULT_VIEW_DISTANCE),
            frustum: Mutex::new(Frustum::default()),
        }
    }

    pub fn set_view_distance(&self, view_distance: i32) {
        self.view_distance.store(view_distance, Ordering::Relaxed);
    }

    pub fn view_distance(&self) -> i32 {
        self.view_distance.load(Ordering::Relaxed)
    }

    pub fn chunks(&self) -> &Arc<ChunkMap> {
        &self.inner.chunks
    }

    /// Requests/evicts chunks around `player_pos` (spec section 4.3,
    /// `updateStreaming`).
    #[profiling::function]
    pub fn update_streaming(&self, player_pos: WorldPos) {
        let player_chunk = player_pos.to_chunk_pos();
        *self.inner.last_player_center.lock().unwrap() = player_chunk.center();

        let view_distance = self.view_distance();
        let unload_distance = unload_distance(view_distance);

        let mut requested = 0u32;
        for dz in -view_distance..=view_distance {
            for dy in -view_distance..=view_distance {
                let wy = player_chunk.y() + dy;
                if wy < 0 {
                    continue;
                }
                for dx in -view_distance..=view_distance {
                    let pos = ChunkPos::new(player_chunk.x() + dx, wy, player_chunk.z() + dz);
                    if !self.inner.chunks.contains(pos) {
                        self.request_chunk(pos);
                        requested += 1;
                    }
                }
            }
        }

        let stale = self.inner.chunks.positions_beyond(player_chunk, unload_distance);
        let evicted = stale.len();
        for pos in stale {
            if let Some(chunk) = self.inner.chunks.remove(pos) {
                chunk.bump_generation_id();
                CHUNKS_BY_STATE.decrement(chunk.state());
            }
        }

        if requested > 0 || evicted > 0 {
            debug!("streaming: +{requested} -{evicted} chunks around {player_chunk:?}");
        }
    }

    fn request_chunk(&self, pos: ChunkPos) {
        let chunk = Arc::new(Chunk::new(pos));
        chunk.bump_generation_id();
        chunk.set_state(ChunkState::TerrainPending);
        CHUNKS_BY_STATE.increment(ChunkState::TerrainPending);
        let generation_id = chunk.generation_id();
        self.inner.chunks.insert(pos, chunk);

        let distance = pos.center().distance(*self.inner.last_player_center.lock().unwrap());
        self.inner
            .terrain_pool
            .submit(TerrainJob { pos, generation_id }, distance);
    }

    /// When a mutation inside a READY chunk crosses its boundary (spec
    /// section 4.4), mark the six axial neighbors dirty -- or, for any not
    /// yet READY but already at DECOR_DONE or later, demote them back to
    /// DECOR_DONE so they re-enter meshing cleanly (see DESIGN.md).
    pub fn rebuild_neighbors(&self, center: ChunkPos) {
        for neighbor_pos in center.neighbors_6() {
            if let Some(chunk) = self.inner.chunks.get_arc(neighbor_pos) {
                match chunk.state() {
                    ChunkState::Ready => chunk.set_dirty(true),
                    state if state >= ChunkState::DecorDone => {
                        chunk.set_state(ChunkState::DecorDone);
                    }
                    _ => {}
                }
            }
        }
    }

    pub fn update_frustum(&self, view_projection: Mat4) {
        let inverse = view_projection.inverse();
        *self.frustum.lock().unwrap() = Frustum::from_inverse_view_projection(&inverse);
    }

    /// Every chunk in state READY whose AABB passes the frustum test (spec
    /// section 4.3, `getRenderableChunks`).
    pub fn renderable_chunks(&self) -> Vec<ChunkPos> {
        let frustum = *self.frustum.lock().unwrap();
        self.inner
            .chunks
            .iter()
            .filter(|entry| entry.value().state() == ChunkState::Ready)
            .filter(|entry| {
                let origin = entry.key().origin().0.as_vec3();
                let aabb = Aabb::new(origin, origin + Vec3::splat(CHUNK_SIZE as f32));
                frustum.intersects_aabb(&aabb)
            })
            .map(|entry| *entry.key())
            .collect()
    }

    /// True iff every chunk in the 3x3x3 block around `center` is fully
    /// generated (or tolerably absent below y=0). A convenience query for
    /// callers like spawn-point selection; not load-bearing for the core
    /// loop (see DESIGN.md).
    pub fn is_area_ready(&self, center: ChunkPos) -> bool {
        center.neighbors_3x3x3().iter().all(|pos| {
            if pos.y() < 0 {
                return true;
            }
            matches!(
                self.inner.chunks.get_arc(*pos),
                Some(chunk) if chunk.state().is_fully_generated()
            )
        })
    }
}

fn can_decorate<G: TerrainGenerator>(inner: &Inner<G>, pos: ChunkPos) -> bool {
    pos.neighbors_3x3x3().iter().all(|neighbor_pos| {
        if neighbor_pos.y() < 0 {
            return true;
        }
        matches!(
            inner.chunks.get_arc(*neighbor_pos),
            Some(chunk) if chunk.state() >= ChunkState::TerrainDone
        )
    })
}

fn try_queue_decoration<G: TerrainGenerator>(inner: &Arc<Inner<G>>, pos: ChunkPos) {
    let Some(chunk) = inner.chunks.get_arc(pos) else {
        return;
    };
    if chunk.state() != ChunkState::TerrainDone {
        return;
    }
    if !can_decorate(inner, pos) {
        return;
    }
    if !chunk.try_transition(ChunkState::TerrainDone, ChunkState::DecorPending) {
        return;
    }
    CHUNKS_BY_STATE.transition(ChunkState::TerrainDone, ChunkState::DecorPending);

    let generation_id = chunk.generation_id();
    let distance = pos.center().distance(*inner.last_player_center.lock().unwrap());
    inner
        .decoration_pool
        .submit(DecorationJob { pos, generation_id }, distance);
}

fn try_acquire_decoration_lock<G: TerrainGenerator>(inner: &Inner<G>, center: ChunkPos) -> bool {
    let positions = center.neighbors_3x3x3();
    let mut locks = inner.decoration_locks.lock().unwrap();
    if positions.iter().any(|pos| locks.contains(pos)) {
        return false;
    }
    for pos in positions {
        locks.insert(pos);
    }
    true
}

fn release_decoration_lock<G: TerrainGenerator>(inner: &Inner<G>, center: ChunkPos) {
    let mut locks = inner.decoration_locks.lock().unwrap();
    for pos in center.neighbors_3x3x3() {
        locks.remove(&pos);
    }
}

fn handle_terrain_job<G: TerrainGenerator>(inner: &Arc<Inner<G>>, job: TerrainJob) {
    let Some(chunk) = inner.chunks.get_arc(job.pos) else {
        return;
    };
    if chunk.generation_id() != job.generation_id {
        return;
    }
    if !chunk.try_transition(ChunkState::TerrainPending, ChunkState::TerrainGenerating) {
        return;
    }
    CHUNKS_BY_STATE.transition(ChunkState::TerrainPending, ChunkState::TerrainGenerating);

    inner.generator.generate(&chunk);

    chunk.set_state(ChunkState::TerrainDone);
    CHUNKS_BY_STATE.transition(ChunkState::TerrainGenerating, ChunkState::TerrainDone);

    for neighbor_pos in job.pos.neighbors_3x3x3() {
        try_queue_decoration(inner, neighbor_pos);
    }
}

fn handle_decoration_job<G: TerrainGenerator>(inner: &Arc<Inner<G>>, job: DecorationJob) {
    let Some(chunk) = inner.chunks.get_arc(job.pos) else {
        return;
    };
    if chunk.generation_id() != job.generation_id {
        return;
    }

    if !try_acquire_decoration_lock(inner, job.pos) {
        chunk.set_state(ChunkState::TerrainDone);
        CHUNKS_BY_STATE.transition(ChunkState::DecorPending, ChunkState::TerrainDone);
        try_queue_decoration(inner, job.pos);
        return;
    }

    chunk.set_state(ChunkState::DecorGenerating);
    CHUNKS_BY_STATE.transition(ChunkState::DecorPending, ChunkState::DecorGenerating);

    let mut neighbors = NeighborAccess::new(job.pos, |pos| inner.chunks.get_arc(pos));
    if !neighbors.all_neighbors_ready() {
        chunk.set_state(ChunkState::TerrainDone);
        CHUNKS_BY_STATE.transition(ChunkState::DecorGenerating, ChunkState::TerrainDone);
        release_decoration_lock(inner, job.pos);
        try_queue_decoration(inner, job.pos);
        return;
    }

    inner.generator.decorate(&chunk, &mut neighbors);

    chunk.set_state(ChunkState::DecorDone);
    CHUNKS_BY_STATE.transition(ChunkState::DecorGenerating, ChunkState::DecorDone);
    release_decoration_lock(inner, job.pos);
    chunk.finalize_generation();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::material::Material;

    struct FlatGenerator;

    impl TerrainGenerator for FlatGenerator {
        fn generate(&self, chunk: &Chunk) {
            chunk.fill_direct(
                crate::voxels::coord::BlockPos::new(0, 0, 0),
                crate::voxels::coord::BlockPos::new(15, 0, 15),
                Material::pack(1, 0),
            );
        }

        fn decorate(&self, _chunk: &Chunk, _neighbors: &mut NeighborAccess) {}
    }

    fn manager() -> ChunkManager<FlatGenerator> {
        ChunkManager::new(2, Arc::new(ChunkMap::new()), Arc::new(FlatGenerator))
    }

    #[test]
    fn stale_terrain_job_is_dropped_after_eviction() {
        let manager = manager();
        let pos = ChunkPos::new(0, 0, 0);
        manager.request_chunk(pos);
        // Evict before the job can plausibly run.
        if let Some(chunk) = manager.inner.chunks.remove(pos) {
            chunk.bump_generation_id();
        }
        assert!(!manager.inner.chunks.contains(pos));
    }

    #[test]
    fn streaming_fills_a_full_cube_when_player_chunk_y_is_above_view_distance() {
        let manager = manager();
        manager.set_view_distance(2);
        // Player sits at chunk y = 2 so the -2..=2 range never crosses below
        // zero, matching the scenario's 5x5x5 = 125 expectation exactly.
        let player_pos = ChunkPos::new(0, 2, 0).origin();
        manager.update_streaming(player_pos);
        assert_eq!(manager.inner.chunks.len(), 125);
    }

    #[test]
    fn streaming_evicts_beyond_unload_distance() {
        let manager = manager();
        manager.set_view_distance(2);
        let player_pos = ChunkPos::new(0, 2, 0).origin();
        manager.update_streaming(player_pos);

        let moved_pos = ChunkPos::new(4, 2, 0).origin();
        manager.update_streaming(moved_pos);

        // unload_distance = 4; chunks with |Δx| > 4 from (4,2,0) must be gone.
        assert!(!manager.inner.chunks.contains(ChunkPos::new(-1, 2, 0)));
    }

    #[test]
    fn decoration_lock_rejects_overlapping_regions() {
        let inner = manager().inner;
        let a = ChunkPos::new(0, 0, 0);
        let b = ChunkPos::new(1, 0, 0);
        assert!(try_acquire_decoration_lock(&inner, a));
        assert!(!try_acquire_decoration_lock(&inner, b));
        release_decoration_lock(&inner, a);
        assert!(try_acquire_decoration_lock(&inner, b));
    }
}
