use std::ops::{Add, Sub};

use glam::{IVec3, U8Vec3, Vec3};

use crate::voxels::chunk::CHUNK_SIZE;

/// A position of a block within a chunk, each axis in `[0, CHUNK_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos(pub U8Vec3);

impl BlockPos {
    #[inline(always)]
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE);
        BlockPos(U8Vec3 { x, y, z })
    }

    #[inline(always)]
    pub fn x(&self) -> u8 {
        self.0.x
    }

    #[inline(always)]
    pub fn y(&self) -> u8 {
        self.0.y
    }

    #[inline(always)]
    pub fn z(&self) -> u8 {
        self.0.z
    }

    /// `i = lx + S*(ly + S*lz)`.
    #[inline(always)]
    pub fn to_index(self) -> usize {
        local_coords_to_index(self.0.x, self.0.y, self.0.z)
    }

    #[inline(always)]
    pub fn from_index(index: usize) -> Self {
        let (x, y, z) = index_to_local_coords(index);
        BlockPos::new(x, y, z)
    }
}

#[inline(always)]
pub fn local_coords_to_index(lx: u8, ly: u8, lz: u8) -> usize {
    let s = CHUNK_SIZE as usize;
    lx as usize + s * (ly as usize + s * lz as usize)
}

#[inline(always)]
pub fn index_to_local_coords(index: usize) -> (u8, u8, u8) {
    let s = CHUNK_SIZE as usize;
    let x = index % s;
    let y = (index / s) % s;
    let z = index / (s * s);
    (x as u8, y as u8, z as u8)
}

/// Identifies a chunk in chunk space (world coordinates divided by
/// `CHUNK_SIZE`, floored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos(pub IVec3);

impl ChunkPos {
    #[inline(always)]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkPos(IVec3 { x, y, z })
    }

    #[inline(always)]
    pub fn x(&self) -> i32 {
        self.0.x
    }

    #[inline(always)]
    pub fn y(&self) -> i32 {
        self.0.y
    }

    #[inline(always)]
    pub fn z(&self) -> i32 {
        self.0.z
    }

    #[inline(always)]
    pub fn origin(&self) -> WorldPos {
        WorldPos(self.0 * IVec3::splat(CHUNK_SIZE as i32))
    }

    #[inline(always)]
    pub fn center(&self) -> Vec3 {
        self.origin().0.as_vec3() + Vec3::splat(CHUNK_SIZE as f32 * 0.5)
    }

    #[inline(always)]
    pub fn chebyshev_distance(&self, other: ChunkPos) -> i32 {
        let d = (self.0 - other.0).abs();
        d.x.max(d.y).max(d.z)
    }

    pub fn neighbors_3x3x3(&self) -> [ChunkPos; 27] {
        let mut out = [ChunkPos::default(); 27];
        let mut i = 0;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    out[i] = ChunkPos(self.0 + IVec3::new(dx, dy, dz));
                    i += 1;
                }
            }
        }
        out
    }

    pub fn neighbors_6(&self) -> [ChunkPos; 6] {
        [
            ChunkPos(self.0 + IVec3::new(1, 0, 0)),
            ChunkPos(self.0 + IVec3::new(-1, 0, 0)),
            ChunkPos(self.0 + IVec3::new(0, 1, 0)),
            ChunkPos(self.0 + IVec3::new(0, -1, 0)),
            ChunkPos(self.0 + IVec3::new(0, 0, 1)),
            ChunkPos(self.0 + IVec3::new(0, 0, -1)),
        ]
    }
}

impl Add for ChunkPos {
    type Output = ChunkPos;
    #[inline(always)]
    fn add(self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0 + other.0)
    }
}

impl Sub for ChunkPos {
    type Output = ChunkPos;
    #[inline(always)]
    fn sub(self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0 - other.0)
    }
}

/// A position of a block in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldPos(pub IVec3);

impl WorldPos {
    #[inline(always)]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        WorldPos(IVec3 { x, y, z })
    }

    /// `ChunkPos = (wx>>4, wy>>4, wz>>4)`, equivalently floor-division by
    /// `CHUNK_SIZE` (arithmetic shift on a two's-complement integer).
    #[inline(always)]
    pub fn to_chunk_pos(&self) -> ChunkPos {
        ChunkPos(self.0.div_euclid(IVec3::splat(CHUNK_SIZE as i32)))
    }

    /// `BlockPos = (wx&15, wy&15, wz&15)`.
    #[inline(always)]
    pub fn to_block_pos(&self) -> BlockPos {
        let mask = CHUNK_SIZE as i32 - 1;
        let local = self.0 & IVec3::splat(mask);
        BlockPos::new(local.x as u8, local.y as u8, local.z as u8)
    }

    #[inline(always)]
    pub fn from_chunk_and_block(chunk: ChunkPos, block: BlockPos) -> Self {
        chunk.origin() + WorldPos(block.0.as_ivec3())
    }
}

impl Add for WorldPos {
    type Output = WorldPos;
    #[inline(always)]
    fn add(self, other: WorldPos) -> WorldPos {
        WorldPos(self.0 + other.0)
    }
}

impl Sub for WorldPos {
    type Output = WorldPos;
    #[inline(always)]
    fn sub(self, other: WorldPos) -> WorldPos {
        WorldPos(self.0 - other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_index_bijection() {
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                for z in 0..CHUNK_SIZE {
                    let idx = local_coords_to_index(x, y, z);
                    assert_eq!(index_to_local_coords(idx), (x, y, z));
                }
            }
        }
    }

    #[test]
    fn world_to_chunk_and_block_decomposition() {
        let wp = WorldPos::new(33, -1, 16);
        assert_eq!(wp.to_chunk_pos(), ChunkPos::new(2, -1, 1));
        assert_eq!(wp.to_block_pos(), BlockPos::new(1, 15, 0));
    }

    #[test]
    fn chebyshev_distance_matches_manual() {
        let a = ChunkPos::new(0, 0, 0);
        let b = ChunkPos::new(3, -5, 1);
        assert_eq!(a.chebyshev_distance(b), 5);
    }
}
