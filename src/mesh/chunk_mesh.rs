use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crate::voxels::coord::ChunkPos;

struct MeshBuffer<H> {
    handle: H,
    vertex_count: u32,
}

/// Double-buffered GPU-side mesh for one chunk (spec section 3). The
/// backend resource type `H` is opaque to this subsystem -- rendering API
/// specifics are an external collaborator's concern (spec section 1).
pub struct ChunkMesh<H> {
    pub position: ChunkPos,
    buffers: [Mutex<Option<MeshBuffer<H>>>; 2],
    front_index: AtomicU8,
    orphan_ticks: AtomicU32,
}

impl<H: Clone> ChunkMesh<H> {
    pub fn new(position: ChunkPos) -> Self {
        ChunkMesh {
            position,
            buffers: [Mutex::new(None), Mutex::new(None)],
            front_index: AtomicU8::new(0),
            orphan_ticks: AtomicU32::new(0),
        }
    }

    /// Uploads into the back buffer, then flips it to front (spec section
    /// 4.4, `update()`: "upload data to its back buffer ... flip frontIndex").
    pub fn upload_and_swap(&self, handle: H, vertex_count: u32) {
        let front = self.front_index.load(Ordering::Acquire);
        let back = 1 - front;
        *self.buffers[back as usize].lock().unwrap() = Some(MeshBuffer {
            handle,
            vertex_count,
        });
        self.front_index.store(back, Ordering::Release);
    }

    /// The handle and vertex count of the buffer the renderer should draw,
    /// or `None` if nothing has been uploaded yet.
    pub fn front(&self) -> Option<(H, u32)> {
        let front = self.front_index.load(Ordering::Acquire);
        self.buffers[front as usize]
            .lock()
            .unwrap()
            .as_ref()
            .map(|b| (b.handle.clone(), b.vertex_count))
    }

    pub fn front_vertex_count(&self) -> u32 {
        self.front().map(|(_, count)| count).unwrap_or(0)
    }

    pub(crate) fn reset_orphan_ticks(&self) {
        self.orphan_ticks.store(0, Ordering::Relaxed);
    }

    pub(crate) fn bump_orphan_ticks(&self) -> u32 {
        self.orphan_ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_and_swap_makes_new_data_front() {
        let mesh: ChunkMesh<u32> = ChunkMesh::new(ChunkPos::new(0, 0, 0));
        assert!(mesh.front().is_none());
        mesh.upload_and_swap(1, 36);
        assert_eq!(mesh.front(), Some((1, 36)));
        mesh.upload_and_swap(2, 12);
        assert_eq!(mesh.front(), Some((2, 12)));
    }
}
