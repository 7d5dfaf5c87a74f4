use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use crate::voxels::coord::{BlockPos, ChunkPos, local_coords_to_index};
use crate::voxels::material::Material;

pub const CHUNK_SIZE: u8 = 16;
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE as usize).pow(3);

pub type BlockStorage = [Material; CHUNK_VOLUME];

/// Lifecycle state of a [`Chunk`], driven by [`crate::chunk_manager::ChunkManager`].
///
/// States are ordered so that `state >= TerrainDone` means "terrain pass
/// complete" and `state >= DecorDone` means "fully generated", matching the
/// `hasTerrainComplete`/`isFullyGenerated` helpers in the original
/// `ChunkState.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChunkState {
    Unloaded = 0,
    TerrainPending = 1,
    TerrainGenerating = 2,
    TerrainDone = 3,
    DecorPending = 4,
    DecorGenerating = 5,
    DecorDone = 6,
    Meshing = 7,
    Meshed = 8,
    Ready = 9,
}

impl ChunkState {
    pub const TOTAL_STATES: usize = 10;

    #[inline]
    pub fn has_terrain_complete(self) -> bool {
        self >= ChunkState::TerrainDone
    }

    #[inline]
    pub fn is_fully_generated(self) -> bool {
        self >= ChunkState::DecorDone
    }

    #[inline]
    const fn from_u8(value: u8) -> ChunkState {
        match value {
            0 => ChunkState::Unloaded,
            1 => ChunkState::TerrainPending,
            2 => ChunkState::TerrainGenerating,
            3 => ChunkState::TerrainDone,
            4 => ChunkState::DecorPending,
            5 => ChunkState::DecorGenerating,
            6 => ChunkState::DecorDone,
            7 => ChunkState::Meshing,
            8 => ChunkState::Meshed,
            _ => ChunkState::Ready,
        }
    }
}

/// Atomic cell for [`ChunkState`], since the state transitions concurrently
/// from terrain/decoration/mesh worker threads.
#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: ChunkState) -> Self {
        StateCell(AtomicU8::new(state as u8))
    }

    fn load(&self) -> ChunkState {
        ChunkState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: ChunkState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Atomically transitions `from -> to`, returning whether it happened.
    /// Used as the single cancellation/race-safety check: any job that loses
    /// this compare-exchange (e.g. a stale job fighting an eviction-driven
    /// reset) simply does nothing further.
    fn try_transition(&self, from: ChunkState, to: ChunkState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Double-buffered block storage for one 16^3 chunk, with a lock-free
/// snapshot protocol (spec section 4.1).
///
/// # Safety
///
/// `buffers[i]` is read by any number of concurrent readers while
/// `read_index == i`, and written by at most one writer while
/// `write_index == 1 - read_index`. [`ChunkManager`](crate::chunk_manager::ChunkManager)
/// and [`NeighborAccess`](crate::voxels::neighbor_access::NeighborAccess) are
/// the only callers that mutate a chunk, and both honor the single-writer
/// discipline from spec section 5 (a chunk's terrain job and decoration job
/// never run concurrently, and decoration jobs mutually exclude via
/// `decoration_locks`). That discipline is what makes the `unsafe impl Sync`
/// below sound; `Chunk` itself enforces only the reader side of the
/// protocol.
pub struct Chunk {
    pub position: ChunkPos,
    buffers: [UnsafeCell<BlockStorage>; 2],
    read_index: AtomicU8,
    active_readers: AtomicU32,
    pending_swap: AtomicBool,
    state: StateCell,
    generation_id: AtomicU64,
    dirty: AtomicBool,
}

// SAFETY: see the struct doc comment. Interior mutability is confined to the
// write-buffer half of the double-buffer protocol, which only ever has one
// writer at a time by construction of the calling code.
unsafe impl Sync for Chunk {}

impl Chunk {
    pub fn new(position: ChunkPos) -> Self {
        Chunk {
            position,
            buffers: [
                UnsafeCell::new([Material::AIR; CHUNK_VOLUME]),
                UnsafeCell::new([Material::AIR; CHUNK_VOLUME]),
            ],
            read_index: AtomicU8::new(0),
            active_readers: AtomicU32::new(0),
            pending_swap: AtomicBool::new(false),
            state: StateCell::new(ChunkState::Unloaded),
            generation_id: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    fn read_buffer(&self, index: u8) -> &BlockStorage {
        // SAFETY: readers only ever dereference the buffer identified by
        // `read_index`, which the writer never touches while readers are
        // registered in `active_readers` (enforced by `swap_buffers`).
        unsafe { &*self.buffers[index as usize].get() }
    }

    #[inline]
    fn write_buffer_mut(&self, index: u8) -> &mut BlockStorage {
        // SAFETY: only called by the single writer permitted to be active
        // for this chunk at a time (see struct doc comment).
        unsafe { &mut *self.buffers[index as usize].get() }
    }

    #[inline]
    fn write_index(&self) -> u8 {
        1 - self.read_index.load(Ordering::Acquire)
    }

    // --- reader operations -------------------------------------------------

    pub fn get_block(&self, pos: BlockPos) -> Material {
        let guard = self.begin_read();
        let value = guard.buffer()[pos.to_index()];
        drop(guard);
        value
    }

    pub fn is_air(&self, pos: BlockPos) -> bool {
        self.get_block(pos).is_air()
    }

    /// Atomic copy of the entire read buffer (spec section 4.1, "snapshot
    /// protocol"). This is the only way mesh workers observe block data.
    #[profiling::function]
    pub fn get_block_snapshot(&self) -> BlockStorage {
        let guard = self.begin_read();
        *guard.buffer()
    }

    fn begin_read(&self) -> ReadGuard<'_> {
        loop {
            let index = self.read_index.load(Ordering::Acquire);
            self.active_readers.fetch_add(1, Ordering::AcqRel);
            if self.read_index.load(Ordering::Acquire) == index {
                return ReadGuard { chunk: self, index };
            }
            // A swap raced us: back out and retry. Bounded by however many
            // swaps are concurrently in flight, which is cooperative.
            self.active_readers.fetch_sub(1, Ordering::AcqRel);
        }
    }

    // --- staged writer operations -------------------------------------------

    /// Stages a write into the write buffer; invisible to readers until
    /// [`Chunk::swap_buffers`] succeeds.
    pub fn set_block(&self, pos: BlockPos, material: Material) {
        let index = self.write_index();
        self.write_buffer_mut(index)[pos.to_index()] = material;
        self.pending_swap.store(true, Ordering::Release);
    }

    pub fn fill(&self, from: BlockPos, to: BlockPos, material: Material) {
        let index = self.write_index();
        let buffer = self.write_buffer_mut(index);
        for_each_in_box(from, to, |pos| {
            buffer[pos.to_index()] = material;
        });
        self.pending_swap.store(true, Ordering::Release);
    }

    // --- direct writer operations (terrain generation only) ----------------

    /// Writes both buffers directly, bypassing staging. Only valid when no
    /// readers exist for this chunk, i.e. during terrain generation or
    /// decoration (spec section 4.1: "used by terrain-generation only").
    pub fn set_block_direct(&self, pos: BlockPos, material: Material) {
        let idx = pos.to_index();
        self.write_buffer_mut(0)[idx] = material;
        self.write_buffer_mut(1)[idx] = material;
    }

    pub fn fill_direct(&self, from: BlockPos, to: BlockPos, material: Material) {
        for_each_in_box(from, to, |pos| {
            self.set_block_direct(pos, material);
        });
    }

    /// Replaces the entire write-readable pair directly (used by terrain
    /// generators that build a full chunk's worth of blocks off-buffer and
    /// then commit it in one shot).
    pub fn fill_all_direct(&self, data: &BlockStorage) {
        *self.write_buffer_mut(0) = *data;
        *self.write_buffer_mut(1) = *data;
    }

    // --- swap protocol -------------------------------------------------------

    /// Publishes the staged write buffer, if any (spec section 4.1, "swap
    /// protocol"). Spins until any in-flight readers of the old buffer have
    /// finished, then flips `read_index` and syncs the new write buffer so
    /// the next staged write starts from current truth.
    pub fn swap_buffers(&self) -> bool {
        if !self.pending_swap.swap(false, Ordering::AcqRel) {
            return false;
        }

        while self.active_readers.load(Ordering::Acquire) != 0 {
            std::hint::spin_loop();
        }

        let old_read = self.read_index.load(Ordering::Acquire);
        let new_read = 1 - old_read;
        self.read_index.store(new_read, Ordering::Release);

        // Copy the newly-readable buffer into the other one so the next
        // staged write starts from current truth.
        let snapshot = *self.read_buffer(new_read);
        *self.write_buffer_mut(old_read) = snapshot;

        true
    }

    pub fn has_pending_swap(&self) -> bool {
        self.pending_swap.load(Ordering::Acquire)
    }

    /// Publishes any pending staged write. Called once decoration finishes
    /// for a chunk, so the decorated terrain becomes visible to readers
    /// before the chunk proceeds to meshing.
    pub fn finalize_generation(&self) {
        self.swap_buffers();
    }

    // --- lifecycle/state -----------------------------------------------------

    pub fn state(&self) -> ChunkState {
        self.state.load()
    }

    pub fn set_state(&self, state: ChunkState) {
        self.state.store(state);
    }

    pub fn try_transition(&self, from: ChunkState, to: ChunkState) -> bool {
        self.state.try_transition(from, to)
    }

    pub fn generation_id(&self) -> u64 {
        self.generation_id.load(Ordering::Acquire)
    }

    pub fn bump_generation_id(&self) -> u64 {
        self.generation_id.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }
}

struct ReadGuard<'a> {
    chunk: &'a Chunk,
    index: u8,
}

impl ReadGuard<'_> {
    fn buffer(&self) -> &BlockStorage {
        self.chunk.read_buffer(self.index)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.chunk.active_readers.fetch_sub(1, Ordering::AcqRel);
    }
}

fn for_each_in_box(from: BlockPos, to: BlockPos, mut f: impl FnMut(BlockPos)) {
    for z in from.z()..=to.z() {
        for y in from.y()..=to.y() {
            for x in from.x()..=to.x() {
                f(BlockPos::new(x, y, z));
            }
        }
    }
}

/// Reference implementation check for the index formula quoted in the spec:
/// `i = lx + S*(ly + S*lz)`.
#[inline]
pub fn block_index(x: u8, y: u8, z: u8) -> usize {
    local_coords_to_index(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn chunk() -> Chunk {
        Chunk::new(ChunkPos::new(0, 0, 0))
    }

    #[test]
    fn s1_place_then_read() {
        let c = chunk();
        let pos = BlockPos::new(2, 3, 4);
        c.set_block(pos, Material::pack(5, 0));
        assert!(c.swap_buffers());
        assert_eq!(c.get_block(pos).block_id(), 5);
    }

    #[test]
    fn swap_without_pending_write_returns_false() {
        let c = chunk();
        assert!(!c.swap_buffers());
    }

    #[test]
    fn staged_write_invisible_until_swap() {
        let c = chunk();
        let pos = BlockPos::new(0, 0, 0);
        c.set_block(pos, Material::pack(9, 0));
        // Not yet visible.
        assert!(c.get_block(pos).is_air());
        c.swap_buffers();
        assert_eq!(c.get_block(pos).block_id(), 9);
    }

    #[test]
    fn direct_write_is_immediately_visible() {
        let c = chunk();
        let pos = BlockPos::new(1, 1, 1);
        c.set_block_direct(pos, Material::pack(3, 0));
        assert_eq!(c.get_block(pos).block_id(), 3);
    }

    #[test]
    fn snapshot_never_returns_torn_state() {
        let c = Arc::new(chunk());
        c.set_block_direct(BlockPos::new(0, 0, 0), Material::pack(1, 0));

        let writer = {
            let c = c.clone();
            thread::spawn(move || {
                for i in 0..200u16 {
                    c.set_block(BlockPos::new(0, 0, 0), Material::pack(1 + (i % 2), 0));
                    c.swap_buffers();
                }
            })
        };

        let reader = {
            let c = c.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let snap = c.get_block_snapshot();
                    let v = snap[BlockPos::new(0, 0, 0).to_index()].block_id();
                    assert!(v == 1 || v == 2);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn generation_id_is_monotone() {
        let c = chunk();
        let a = c.bump_generation_id();
        let b = c.bump_generation_id();
        assert!(b > a);
    }

    #[test]
    fn state_transition_fails_on_mismatch() {
        let c = chunk();
        assert!(!c.try_transition(ChunkState::TerrainDone, ChunkState::DecorPending));
        assert!(c.try_transition(ChunkState::Unloaded, ChunkState::TerrainPending));
    }
}
