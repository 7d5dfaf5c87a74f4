use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::chunk_manager::ChunkManager;
use crate::mesh::pipeline::{ChunkMeshPipeline, MeshUploader};
use crate::registry::{BlockRegistry, TerrainGenerator, TextureRegistry};
use crate::voxels::coord::{BlockPos, ChunkPos, WorldPos};
use crate::voxels::material::Material;
use crate::world_map::ChunkMap;

/// Top-level facade wiring [`ChunkManager`] and [`ChunkMeshPipeline`]
/// together behind the public surface spec section 6 describes (`setBlock`,
/// `getBlock`, `isAir`, `updateStreaming`, `updateFrustum`,
/// `scheduleMeshing`, `updateMeshUploads`, `getRenderableChunks`).
pub struct World<G: TerrainGenerator + 'static, U: MeshUploader + 'static> {
    chunks: Arc<ChunkMap>,
    manager: ChunkManager<G>,
    mesh_pipeline: ChunkMeshPipeline<U>,
    block_registry: Arc<dyn BlockRegistry>,
}

impl<G: TerrainGenerator + 'static, U: MeshUploader + 'static> World<G, U> {
    pub fn new(
        terrain_threads: usize,
        mesh_threads: usize,
        generator: G,
        uploader: U,
        block_registry: Arc<dyn BlockRegistry>,
        texture_registry: Arc<dyn TextureRegistry>,
    ) -> Self {
        let chunks = Arc::new(ChunkMap::new());
        let manager = ChunkManager::new(terrain_threads, chunks.clone(), Arc::new(generator));
        let mesh_pipeline = ChunkMeshPipeline::new(
            mesh_threads,
            uploader,
            chunks.clone(),
            block_registry.clone(),
            texture_registry,
        );

        World {
            chunks,
            manager,
            mesh_pipeline,
            block_registry,
        }
    }

    /// Staged world-level write (spec section 6): resolves the chunk,
    /// writes, marks it dirty, and asks the manager to remark neighbors if
    /// the edit touches a face of the 16^3 chunk.
    pub fn set_block(&self, pos: WorldPos, material: Material) {
        let chunk_pos = pos.to_chunk_pos();
        let Some(chunk) = self.chunks.get_arc(chunk_pos) else {
            // Out-of-range world writes are dropped (spec section 7): the
            // caller learns nothing, since editing outside the loaded world
            // is physically impossible for the player.
            return;
        };

        let block_pos = pos.to_block_pos();
        chunk.set_block(block_pos, material);
        if !chunk.swap_buffers() {
            return;
        }
        chunk.set_dirty(true);

        if touches_chunk_face(block_pos) {
            self.manager.rebuild_neighbors(chunk_pos);
        }
    }

    pub fn get_block(&self, pos: WorldPos) -> Material {
        match self.chunks.get_arc(pos.to_chunk_pos()) {
            Some(chunk) => chunk.get_block(pos.to_block_pos()),
            None => Material::AIR,
        }
    }

    pub fn is_air(&self, pos: WorldPos) -> bool {
        self.get_block(pos).is_air()
    }

    pub fn update_streaming(&self, player_pos: WorldPos) {
        self.manager.update_streaming(player_pos);
    }

    pub fn update_frustum(&self, view_projection: Mat4) {
        self.manager.update_frustum(view_projection);
    }

    pub fn schedule_meshing(&self, player_pos: WorldPos) {
        let player_chunk_center = player_pos.to_chunk_pos().center();
        self.mesh_pipeline
            .schedule_meshing(&self.chunks, player_chunk_center);
    }

    pub fn update_mesh_uploads(&self) {
        self.mesh_pipeline.update_mesh_uploads(&self.chunks);
    }

    pub fn renderable_chunks(&self) -> Vec<ChunkPos> {
        self.manager.renderable_chunks()
    }

    pub fn render(&self, renderable: &[ChunkPos], draw: impl FnMut(ChunkPos, U::Handle, u32)) {
        self.mesh_pipeline.render(renderable, draw);
    }

    pub fn is_area_ready(&self, center: ChunkPos) -> bool {
        self.manager.is_area_ready(center)
    }

    pub fn set_view_distance(&self, view_distance: i32) {
        self.manager.set_view_distance(view_distance);
    }

    pub fn block_registry(&self) -> &Arc<dyn BlockRegistry> {
        &self.block_registry
    }
}

fn touches_chunk_face(pos: BlockPos) -> bool {
    use crate::voxels::chunk::CHUNK_SIZE;
    let last = CHUNK_SIZE - 1;
    pos.x() == 0 || pos.x() == last || pos.y() == 0 || pos.y() == last || pos.z() == 0 || pos.z() == last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_chunk_face_detects_every_boundary_axis() {
        assert!(touches_chunk_face(BlockPos::new(0, 5, 5)));
        assert!(touches_chunk_face(BlockPos::new(15, 5, 5)));
        assert!(!touches_chunk_face(BlockPos::new(5, 5, 5)));
    }
}
