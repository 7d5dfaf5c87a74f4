use std::sync::Arc;

use crate::voxels::chunk::{Chunk, ChunkState};
use crate::voxels::coord::{ChunkPos, WorldPos};
use crate::voxels::material::Material;

/// Transient view over a chunk and its 26 neighbors, used by the decoration
/// pass so prefab placement can spill across chunk boundaries without the
/// generator worrying about chunk edges.
///
/// Grounded on `NeighborAccess.h`/`.cpp`: captures pointers to all 27 chunks
/// up front, tracks which ones were actually touched, and defers marking
/// them dirty until the decoration job commits.
pub struct NeighborAccess {
    center: ChunkPos,
    positions: [ChunkPos; 27],
    chunks: [Option<Arc<Chunk>>; 27],
    modified: [bool; 27],
}

impl NeighborAccess {
    pub fn new(center: ChunkPos, lookup: impl Fn(ChunkPos) -> Option<Arc<Chunk>>) -> Self {
        let positions = center.neighbors_3x3x3();
        let chunks = std::array::from_fn(|i| lookup(positions[i]));
        NeighborAccess {
            center,
            positions,
            chunks,
            modified: [false; 27],
        }
    }

    #[inline]
    fn offset_index(dx: i32, dy: i32, dz: i32) -> usize {
        ((dx + 1) + 3 * ((dy + 1) + 3 * (dz + 1))) as usize
    }

    fn chunk_at(&self, chunk_pos: ChunkPos) -> Option<(&Arc<Chunk>, usize)> {
        let d = chunk_pos - self.center;
        if d.x().abs() > 1 || d.y().abs() > 1 || d.z().abs() > 1 {
            return None;
        }
        let idx = Self::offset_index(d.x(), d.y(), d.z());
        self.chunks[idx].as_ref().map(|c| (c, idx))
    }

    /// True iff every non-null neighbor has state `>= TerrainDone`, and no
    /// missing neighbor is required: a missing neighbor is tolerated only
    /// where its chunk `y < 0` (spec section 4.2). Neighbors don't need to be
    /// past decoration themselves -- requiring that would be circular, since
    /// a chunk only enters decoration once its own neighbors clear this bar.
    pub fn all_neighbors_ready(&self) -> bool {
        self.chunks.iter().enumerate().all(|(i, c)| match c {
            Some(chunk) => chunk.state() >= ChunkState::TerrainDone,
            None => self.positions[i].y() < 0,
        })
    }

    pub fn get_block(&self, world_pos: WorldPos) -> Material {
        match self.chunk_at(world_pos.to_chunk_pos()) {
            Some((chunk, _)) => chunk.get_block(world_pos.to_block_pos()),
            None => Material::AIR,
        }
    }

    /// Writes directly into the target chunk's buffers (both halves), bypassing
    /// the staged-write protocol -- valid here because decoration jobs are the
    /// sole writer for every chunk they hold a lock on.
    pub fn set_block(&mut self, world_pos: WorldPos, material: Material) {
        if let Some((chunk, idx)) = self.chunk_at(world_pos.to_chunk_pos()) {
            chunk.set_block_direct(world_pos.to_block_pos(), material);
            self.modified[idx] = true;
        }
    }

    /// Flags every chunk actually touched by `set_block` as dirty, so the
    /// mesh pipeline knows to remesh it. Called once after decoration for
    /// this neighborhood completes.
    pub fn mark_dirty_chunks(&self) {
        for (i, chunk) in self.chunks.iter().enumerate() {
            if self.modified[i] {
                if let Some(chunk) = chunk {
                    chunk.set_dirty(true);
                }
            }
        }
    }

    pub fn center(&self) -> ChunkPos {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::coord::BlockPos;
    use std::collections::HashMap;

    fn make_chunks(center: ChunkPos) -> HashMap<ChunkPos, Arc<Chunk>> {
        center
            .neighbors_3x3x3()
            .into_iter()
            .map(|pos| (pos, Arc::new(Chunk::new(pos))))
            .collect()
    }

    #[test]
    fn not_ready_when_a_required_neighbor_is_missing() {
        let center = ChunkPos::new(0, 0, 0);
        let mut chunks = make_chunks(center);
        for chunk in chunks.values() {
            chunk.set_state(crate::voxels::chunk::ChunkState::TerrainDone);
        }
        // (1,1,1) has y=1, so it is a required neighbor, not one tolerated
        // as absent below the world floor.
        chunks.remove(&ChunkPos::new(1, 1, 1));
        let access = NeighborAccess::new(center, |p| chunks.get(&p).cloned());
        assert!(!access.all_neighbors_ready());
    }

    #[test]
    fn ready_when_a_missing_neighbor_is_below_the_world_floor() {
        let center = ChunkPos::new(0, 0, 0);
        let mut chunks = make_chunks(center);
        for chunk in chunks.values() {
            chunk.set_state(crate::voxels::chunk::ChunkState::TerrainDone);
        }
        // Every neighbor with y=-1 is never created by streaming; their
        // absence must not block decoration.
        chunks.retain(|pos, _| pos.y() >= 0);
        let access = NeighborAccess::new(center, |p| chunks.get(&p).cloned());
        assert!(access.all_neighbors_ready());
    }

    #[test]
    fn ready_requires_terrain_done_but_not_decor_done() {
        let center = ChunkPos::new(0, 0, 0);
        let chunks = make_chunks(center);
        for chunk in chunks.values() {
            chunk.set_state(crate::voxels::chunk::ChunkState::TerrainDone);
        }
        let access = NeighborAccess::new(center, |p| chunks.get(&p).cloned());
        assert!(access.all_neighbors_ready());
    }

    #[test]
    fn set_block_spills_into_neighbor_and_marks_it_dirty() {
        use crate::voxels::chunk::ChunkState;

        let center = ChunkPos::new(0, 0, 0);
        let chunks = make_chunks(center);
        for chunk in chunks.values() {
            chunk.set_state(ChunkState::DecorDone);
        }
        let mut access = NeighborAccess::new(center, |p| chunks.get(&p).cloned());
        assert!(access.all_neighbors_ready());

        let world_pos = ChunkPos::new(1, 0, 0).origin() + WorldPos::new(0, 0, 0);
        access.set_block(world_pos, Material::pack(7, 0));
        access.mark_dirty_chunks();

        let neighbor = &chunks[&ChunkPos::new(1, 0, 0)];
        assert!(neighbor.is_dirty());
        assert_eq!(neighbor.get_block(BlockPos::new(0, 0, 0)).block_id(), 7);
    }
}
