use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;

use crate::job_queue::JobPool;
use crate::mesh::chunk_mesh::ChunkMesh;
use crate::mesh::mesh_data::MeshData;
use crate::mesh::vertex::PackedBlockVertex;
use crate::registry::{BlockRegistry, TextureRegistry};
use crate::voxels::chunk::{CHUNK_SIZE, CHUNK_VOLUME, ChunkState};
use crate::voxels::coord::{BlockPos, ChunkPos, local_coords_to_index};
use crate::voxels::face::{Face, remap_face_axis, remap_face_horizontal};
use crate::voxels::material::{Material, RotationType};
use crate::world_map::ChunkMap;

/// Uploads finished [`MeshData`] to whatever GPU backend the embedding
/// application uses, and hands back an opaque handle the renderer later
/// draws with. The only thing the core needs to know about `Handle` is that
/// it is cheap to clone (spec section 1: rendering API specifics are out of
/// scope here).
pub trait MeshUploader: Send + Sync {
    type Handle: Clone + Send + Sync;

    fn upload(&self, data: &MeshData) -> Self::Handle;
}

struct MeshJob {
    pos: ChunkPos,
    generation_id: u64,
}

type UploadQueue = Mutex<Vec<(ChunkPos, MeshData)>>;

/// Snapshot-driven mesh build and double-buffered publication (spec section
/// 4.4). Owns the mesh worker pool, the pending-upload queue, and the map of
/// per-chunk GPU meshes.
pub struct ChunkMeshPipeline<U: MeshUploader> {
    uploader: Arc<U>,
    meshes: DashMap<ChunkPos, Arc<ChunkMesh<U::Handle>>, ahash::RandomState>,
    upload_queue: Arc<UploadQueue>,
    mesh_pool: JobPool<MeshJob>,
}

impl<U: MeshUploader + 'static> ChunkMeshPipeline<U> {
    pub fn new(
        num_threads: usize,
        uploader: U,
        chunk_map: Arc<ChunkMap>,
        block_registry: Arc<dyn BlockRegistry>,
        texture_registry: Arc<dyn TextureRegistry>,
    ) -> Self {
        let upload_queue: Arc<UploadQueue> = Arc::new(Mutex::new(Vec::new()));
        let pool_queue = upload_queue.clone();

        let mesh_pool = JobPool::new(num_threads, move |job: MeshJob| {
            build_mesh_job(&chunk_map, &block_registry, &texture_registry, &pool_queue, job);
        });

        ChunkMeshPipeline {
            uploader: Arc::new(uploader),
            meshes: DashMap::default(),
            upload_queue,
            mesh_pool,
        }
    }

    /// Scans the chunk map for chunks needing a (re)mesh and enqueues mesh
    /// jobs (spec section 4.4, `scheduleMeshing`).
    pub fn schedule_meshing(&self, chunk_map: &ChunkMap, player_chunk_center: glam::Vec3) {
        for entry in chunk_map.iter() {
            let chunk = entry.value();
            let state = chunk.state();

            let is_first_mesh = state == ChunkState::DecorDone;
            let is_remesh = state == ChunkState::Ready && chunk.is_dirty();
            if !is_first_mesh && !is_remesh {
                continue;
            }

            if is_first_mesh {
                chunk.set_state(ChunkState::Meshing);
            } else {
                chunk.set_dirty(false);
            }

            let generation_id = chunk.bump_generation_id();
            let distance = chunk.position.center().distance(player_chunk_center);
            self.mesh_pool.submit(
                MeshJob {
                    pos: chunk.position,
                    generation_id,
                },
                distance,
            );
        }
    }

    /// Drains the upload queue onto the render thread (spec section 4.4,
    /// `update()`). Must only be called from the thread that owns GPU
    /// resources.
    pub fn update_mesh_uploads(&self, chunk_map: &ChunkMap) {
        let drained: Vec<_> = {
            let mut queue = self.upload_queue.lock().unwrap();
            queue.drain(..).collect()
        };

        for (pos, data) in drained {
            let vertex_count = data.vertex_count() as u32;
            let handle = self.uploader.upload(&data);

            let mesh = self
                .meshes
                .entry(pos)
                .or_insert_with(|| Arc::new(ChunkMesh::new(pos)))
                .clone();
            mesh.upload_and_swap(handle, vertex_count);

            if let Some(chunk) = chunk_map.get_arc(pos) {
                let _ = chunk.try_transition(ChunkState::Meshed, ChunkState::Ready);
            }
        }

        self.reap_orphaned_meshes(chunk_map);
    }

    /// A [`ChunkMesh`] outlives its chunk by at most one swap cycle, then is
    /// reaped (spec section 3, "Lifecycle").
    fn reap_orphaned_meshes(&self, chunk_map: &ChunkMap) {
        let mut to_remove = Vec::new();
        for entry in self.meshes.iter() {
            let pos = *entry.key();
            if chunk_map.contains(pos) {
                entry.value().reset_orphan_ticks();
            } else if entry.value().bump_orphan_ticks() > 1 {
                to_remove.push(pos);
            }
        }
        for pos in to_remove {
            self.meshes.remove(&pos);
        }
    }

    /// Draws the front buffer of every mesh named in `renderable`, skipping
    /// any with zero vertices (spec section 4.4, `render()`).
    pub fn render(&self, renderable: &[ChunkPos], mut draw: impl FnMut(ChunkPos, U::Handle, u32)) {
        for &pos in renderable {
            let Some(mesh) = self.meshes.get(&pos) else {
                continue;
            };
            if let Some((handle, count)) = mesh.front() {
                if count > 0 {
                    draw(pos, handle, count);
                }
            }
        }
    }
}

#[profiling::function]
fn build_mesh_job(
    chunk_map: &ChunkMap,
    block_registry: &Arc<dyn BlockRegistry>,
    texture_registry: &Arc<dyn TextureRegistry>,
    upload_queue: &UploadQueue,
    job: MeshJob,
) {
    let Some(chunk) = chunk_map.get_arc(job.pos) else {
        return;
    };
    if chunk.generation_id() != job.generation_id {
        return;
    }

    let snapshot = chunk.get_block_snapshot();
    let neighbor_snapshots: [Option<[Material; CHUNK_VOLUME]>; 6] = Face::ALL.map(|face| {
        let neighbor_pos = chunk.position + ChunkPos(face.to_ivec3());
        chunk_map
            .get_arc(neighbor_pos)
            .map(|c| c.get_block_snapshot())
    });

    let mut mesh_data = MeshData::new();

    for z in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let local = BlockPos::new(x, y, z);
                let material = snapshot[local.to_index()];
                if material.is_air() {
                    continue;
                }

                let meta = block_registry.get(material.block_id());

                for face in Face::ALL {
                    let neighbor_material =
                        sample_neighbor(local, face, &snapshot, &neighbor_snapshots);
                    let air_like = neighbor_material.is_air()
                        || block_registry.get(neighbor_material.block_id()).transparent;
                    if !air_like {
                        continue;
                    }

                    let effective_face = match meta.rotation {
                        RotationType::None => face,
                        RotationType::Horizontal => {
                            remap_face_horizontal(face, material.rotation())
                        }
                        RotationType::Axis => remap_face_axis(face, material.rotation()),
                    };
                    let texture_name = meta.face_texture_name(effective_face);
                    let texture_layer = texture_registry.get_by_name(texture_name).unwrap_or(0);

                    let vertices: [PackedBlockVertex; 6] = face.corners().map(|corner| {
                        PackedBlockVertex::new()
                            .with_x(local.x() + corner.offset.0)
                            .with_y(local.y() + corner.offset.1)
                            .with_z(local.z() + corner.offset.2)
                            .with_normal_index(face as u8)
                            .with_rotation(material.rotation())
                            .with_u(corner.uv.0)
                            .with_v(corner.uv.1)
                            .with_texture_layer(texture_layer)
                    });
                    mesh_data.push_face(vertices);
                }
            }
        }
    }

    upload_queue.lock().unwrap().push((job.pos, mesh_data));
    let _ = chunk.try_transition(ChunkState::Meshing, ChunkState::Meshed);
}

#[inline]
fn sample_neighbor(
    local: BlockPos,
    face: Face,
    own: &[Material; CHUNK_VOLUME],
    neighbor_snapshots: &[Option<[Material; CHUNK_VOLUME]>; 6],
) -> Material {
    let delta = face.to_ivec3();
    let size = CHUNK_SIZE as i32;
    let nx = local.x() as i32 + delta.x;
    let ny = local.y() as i32 + delta.y;
    let nz = local.z() as i32 + delta.z;

    if (0..size).contains(&nx) && (0..size).contains(&ny) && (0..size).contains(&nz) {
        return own[local_coords_to_index(nx as u8, ny as u8, nz as u8)];
    }

    let wrap = |v: i32| v.rem_euclid(size) as u8;
    match &neighbor_snapshots[face as usize] {
        Some(snapshot) => snapshot[local_coords_to_index(wrap(nx), wrap(ny), wrap(nz))],
        None => Material::AIR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_neighbor_within_chunk_reads_local_buffer() {
        let mut own = [Material::AIR; CHUNK_VOLUME];
        own[local_coords_to_index(1, 0, 0)] = Material::pack(9, 0);
        let neighbors: [Option<[Material; CHUNK_VOLUME]>; 6] = Default::default();
        let result = sample_neighbor(BlockPos::new(0, 0, 0), Face::East, &own, &neighbors);
        assert_eq!(result.block_id(), 9);
    }

    #[test]
    fn sample_neighbor_across_boundary_falls_back_to_air_when_missing() {
        let own = [Material::AIR; CHUNK_VOLUME];
        let neighbors: [Option<[Material; CHUNK_VOLUME]>; 6] = Default::default();
        let result = sample_neighbor(BlockPos::new(15, 0, 0), Face::East, &own, &neighbors);
        assert!(result.is_air());
    }
}
