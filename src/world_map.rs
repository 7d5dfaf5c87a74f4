use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::one::Ref;

use crate::voxels::chunk::Chunk;
use crate::voxels::coord::ChunkPos;

/// The chunk map (spec section 4.3): "protected by a reader-writer lock,
/// writer only during insertion or eviction". `DashMap`'s sharded locking
/// gives the same many-readers/short-writer discipline without a single
/// global lock, matching how the teacher stores its `World::chunks`.
#[derive(Default)]
pub struct ChunkMap {
    chunks: DashMap<ChunkPos, Arc<Chunk>, ahash::RandomState>,
}

impl ChunkMap {
    pub fn new() -> Self {
        ChunkMap {
            chunks: DashMap::default(),
        }
    }

    pub fn get(&self, pos: ChunkPos) -> Option<Ref<'_, ChunkPos, Arc<Chunk>, ahash::RandomState>> {
        self.chunks.get(&pos)
    }

    pub fn get_arc(&self, pos: ChunkPos) -> Option<Arc<Chunk>> {
        self.chunks.get(&pos).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn insert(&self, pos: ChunkPos, chunk: Arc<Chunk>) {
        self.chunks.insert(pos, chunk);
    }

    pub fn remove(&self, pos: ChunkPos) -> Option<Arc<Chunk>> {
        self.chunks.remove(&pos).map(|(_, chunk)| chunk)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> dashmap::iter::Iter<'_, ChunkPos, Arc<Chunk>, ahash::RandomState> {
        self.chunks.iter()
    }

    /// Positions currently loaded whose Chebyshev distance to `center`
    /// exceeds `unload_distance` -- candidates for eviction in
    /// `updateStreaming` (spec section 4.3, step 3).
    pub fn positions_beyond(&self, center: ChunkPos, unload_distance: i32) -> Vec<ChunkPos> {
        self.chunks
            .iter()
            .map(|entry| *entry.key())
            .filter(|pos| center.chebyshev_distance(*pos) > unload_distance)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let map = ChunkMap::new();
        let pos = ChunkPos::new(1, 2, 3);
        map.insert(pos, Arc::new(Chunk::new(pos)));
        assert!(map.contains(pos));
        assert_eq!(map.get_arc(pos).unwrap().position, pos);
    }

    #[test]
    fn positions_beyond_filters_by_chebyshev_distance() {
        let map = ChunkMap::new();
        let near = ChunkPos::new(1, 0, 0);
        let far = ChunkPos::new(10, 0, 0);
        map.insert(near, Arc::new(Chunk::new(near)));
        map.insert(far, Arc::new(Chunk::new(far)));

        let beyond = map.positions_beyond(ChunkPos::new(0, 0, 0), 4);
        assert_eq!(beyond, vec![far]);
    }
}
