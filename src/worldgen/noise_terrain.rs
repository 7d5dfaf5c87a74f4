use glam::DVec2;
use noise::{NoiseFn, SuperSimplex};

use crate::registry::TerrainGenerator;
use crate::voxels::chunk::{CHUNK_SIZE, Chunk};
use crate::voxels::coord::{BlockPos, WorldPos};
use crate::voxels::material::Material;
use crate::voxels::neighbor_access::NeighborAccess;

pub const BLOCK_AIR: u16 = 0;
pub const BLOCK_DIRT: u16 = 1;
pub const BLOCK_GRASS: u16 = 2;
pub const BLOCK_LOG: u16 = 3;

const TRUNK_HEIGHT: i32 = 4;

/// Heightmap-based example [`TerrainGenerator`], grounded on the teacher's
/// `NoiseWorldGenerator`. `generate` lays down a dirt/grass column per
/// surface height; `decorate` plants simple single-column trees whose
/// topmost log block straddles whichever neighbor chunk the column's
/// surface happens to sit nearest, exercising [`NeighborAccess`] spill.
pub struct NoiseTerrainGenerator {
    noise: SuperSimplex,
}

impl NoiseTerrainGenerator {
    pub fn new(seed: u32) -> Self {
        NoiseTerrainGenerator {
            noise: SuperSimplex::new(seed),
        }
    }

    fn surface_height(&self, world_x: i32, world_z: i32) -> i32 {
        let pos = DVec2::new(world_x as f64, world_z as f64) * 0.01;
        (self.noise.get(pos.to_array()) * 32.0) as i32
    }

    fn is_tree_column(world_x: i32, world_z: i32) -> bool {
        world_x.rem_euclid(7) == 0 && world_z.rem_euclid(7) == 0
    }
}

impl TerrainGenerator for NoiseTerrainGenerator {
    fn generate(&self, chunk: &Chunk) {
        let origin = chunk.position.origin();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let world_x = origin.0.x + x as i32;
                let world_z = origin.0.z + z as i32;
                let height = self.surface_height(world_x, world_z);

                for y in 0..CHUNK_SIZE {
                    let world_y = origin.0.y + y as i32;
                    let material = if world_y < height {
                        Material::pack(BLOCK_DIRT, 0)
                    } else if world_y == height {
                        Material::pack(BLOCK_GRASS, 0)
                    } else {
                        Material::AIR
                    };

                    if !material.is_air() {
                        chunk.set_block_direct(BlockPos::new(x, y, z), material);
                    }
                }
            }
        }
    }

    fn decorate(&self, chunk: &Chunk, neighbors: &mut NeighborAccess) {
        let origin = chunk.position.origin();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let world_x = origin.0.x + x as i32;
                let world_z = origin.0.z + z as i32;
                if !Self::is_tree_column(world_x, world_z) {
                    continue;
                }

                let height = self.surface_height(world_x, world_z);
                for dy in 1..=TRUNK_HEIGHT {
                    let world_pos = WorldPos::new(world_x, height + dy, world_z);
                    neighbors.set_block(world_pos, Material::pack(BLOCK_LOG, 0));
                }
            }
        }

        neighbors.mark_dirty_chunks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::coord::ChunkPos;

    #[test]
    fn generate_is_deterministic_for_a_fixed_seed() {
        let generator = NoiseTerrainGenerator::new(42);
        let a = Chunk::new(ChunkPos::new(0, 0, 0));
        let b = Chunk::new(ChunkPos::new(0, 0, 0));
        generator.generate(&a);
        generator.generate(&b);
        assert_eq!(a.get_block_snapshot(), b.get_block_snapshot());
    }

    #[test]
    fn generate_never_writes_above_ground_as_solid() {
        let generator = NoiseTerrainGenerator::new(7);
        let chunk = Chunk::new(ChunkPos::new(3, 5, -2));
        generator.generate(&chunk);
        let top = chunk.get_block(BlockPos::new(0, CHUNK_SIZE - 1, 0));
        // At y=5 chunks (world y 80+), well above any plausible noise
        // height, the column should be air.
        assert!(top.is_air());
    }
}
