use std::sync::{
    LazyLock,
    atomic::{AtomicU32, Ordering},
};

use crate::voxels::chunk::ChunkState;

pub static CHUNKS_BY_STATE: LazyLock<ChunksByState> = LazyLock::new(ChunksByState::default);

/// Per-[`ChunkState`] live counters, for instrumentation (`profiling`
/// overlays, log lines) rather than control flow.
#[derive(Debug, Default)]
pub struct ChunksByState([AtomicU32; ChunkState::TOTAL_STATES]);

impl ChunksByState {
    pub fn increment(&self, state: ChunkState) {
        self.0[state as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement(&self, state: ChunkState) {
        self.0[state as usize].fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self, state: ChunkState) -> u32 {
        self.0[state as usize].load(Ordering::Relaxed)
    }

    pub fn transition(&self, from: ChunkState, to: ChunkState) {
        self.decrement(from);
        self.increment(to);
    }
}

#[derive(Default)]
pub struct WorldStatistics {
    pub total_chunks: usize,
    pub approximate_memory_usage_bytes: usize,
}

impl WorldStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_moves_the_count_between_buckets() {
        let stats = ChunksByState::default();
        stats.increment(ChunkState::TerrainPending);
        assert_eq!(stats.get(ChunkState::TerrainPending), 1);
        stats.transition(ChunkState::TerrainPending, ChunkState::TerrainGenerating);
        assert_eq!(stats.get(ChunkState::TerrainPending), 0);
        assert_eq!(stats.get(ChunkState::TerrainGenerating), 1);
    }
}
