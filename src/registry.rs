//! External collaborator interfaces (spec section 6): registries and the
//! terrain generator are owned by other subsystems (JSON/asset loaders,
//! worldgen content). The core only specifies the shape it needs from them.

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

use crate::voxels::chunk::Chunk;
use crate::voxels::face::Face;
use crate::voxels::material::RotationType;
use crate::voxels::neighbor_access::NeighborAccess;

pub type BlockId = u16;
pub type TextureId = u32;

#[derive(Debug, Clone)]
pub struct BlockMeta {
    pub transparent: bool,
    pub hardness: f32,
    pub rotation: RotationType,
    pub faces: [Cow<'static, str>; 6],
}

impl BlockMeta {
    pub fn face_texture_name(&self, face: Face) -> &str {
        &self.faces[face as usize]
    }
}

/// `get`/`getByName`/`isAir`/`isEqual` from spec section 6.
pub trait BlockRegistry: Send + Sync {
    fn get(&self, block_id: BlockId) -> &BlockMeta;
    fn get_by_name(&self, name: &str) -> Option<BlockId>;
    fn is_air(&self, block_id: BlockId) -> bool {
        block_id == 0
    }
    fn is_equal(&self, block_id: BlockId, name: &str) -> bool {
        self.get_by_name(name) == Some(block_id)
    }
}

/// Maps a stable texture name to a numeric layer id into a texture array.
/// Atlas packing is entirely the registry's concern.
pub trait TextureRegistry: Send + Sync {
    fn get_by_name(&self, name: &str) -> Option<TextureId>;
}

/// Read-only input to [`TerrainGenerator::decorate`]; the core never
/// inspects prefab contents itself.
pub trait PrefabRegistry: Send + Sync {}

/// External terrain/decoration content generator.
///
/// `generate` must use only direct writes (the chunk has no readers yet).
/// `decorate` must use staged writes through the supplied [`NeighborAccess`]
/// window, since edits may spill into neighboring chunks.
pub trait TerrainGenerator: Send + Sync {
    fn generate(&self, chunk: &Chunk);
    fn decorate(&self, chunk: &Chunk, neighbors: &mut NeighborAccess);
}

/// RON-deserializable block definition, one entry per block id. Mirrors the
/// shape of the teacher's `BlockDefinition` (`assets/blocks.rs`), minus the
/// texture-atlas-packing fields that belong to `TextureRegistry`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockDefinition {
    pub id: BlockId,
    pub name: String,
    pub transparent: bool,
    pub hardness: f32,
    #[serde(default)]
    pub rotation: RotationType,
    /// Indexed in [`Face`] order: north, south, west, east, up, down.
    pub faces: [String; 6],
}

#[derive(Debug, thiserror::Error)]
pub enum BlockRegistryError {
    #[error("duplicate block id {0}")]
    DuplicateId(BlockId),
    #[error("duplicate block name {0:?}")]
    DuplicateName(String),
    #[error("block id {0} is reserved for air and cannot be redefined")]
    RedefinesAir(BlockId),
}

/// A [`BlockRegistry`] built once from a flat list of [`BlockDefinition`]s,
/// the way the teacher's `BlockDatabase` is built from `blocks.ron` (see
/// `assets/blocks.rs::load_all_blocks`).
pub struct StaticBlockRegistry {
    metas: Vec<BlockMeta>,
    names: HashMap<String, BlockId>,
}

impl StaticBlockRegistry {
    pub fn from_definitions(defs: Vec<BlockDefinition>) -> Result<Self, BlockRegistryError> {
        let mut metas = vec![
            BlockMeta {
                transparent: true,
                hardness: 0.0,
                rotation: RotationType::None,
                faces: Default::default(),
            };
            defs.iter().map(|d| d.id as usize + 1).max().unwrap_or(0) + 1
        ];
        let mut names = HashMap::new();
        let mut seen_ids = std::collections::HashSet::new();

        for def in defs {
            if def.id == 0 {
                return Err(BlockRegistryError::RedefinesAir(def.id));
            }
            if !seen_ids.insert(def.id) {
                return Err(BlockRegistryError::DuplicateId(def.id));
            }
            if names.insert(def.name.clone(), def.id).is_some() {
                return Err(BlockRegistryError::DuplicateName(def.name));
            }

            let faces = def.faces.map(Cow::Owned);
            metas[def.id as usize] = BlockMeta {
                transparent: def.transparent,
                hardness: def.hardness,
                rotation: def.rotation,
                faces,
            };
        }

        Ok(StaticBlockRegistry { metas, names })
    }

    /// Parses the RON document and builds the registry in one call, the way
    /// `BlockDatabase::load_all_blocks` reads and parses `blocks.ron`.
    pub fn from_ron_str(data: &str) -> anyhow::Result<Self> {
        let defs: Vec<BlockDefinition> =
            ron::from_str(data).context("failed to parse block definitions")?;
        Self::from_definitions(defs).context("failed to build block registry")
    }
}

impl BlockRegistry for StaticBlockRegistry {
    fn get(&self, block_id: BlockId) -> &BlockMeta {
        &self.metas[block_id as usize]
    }

    fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.names.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_registry_and_resolves_names() {
        let defs = vec![BlockDefinition {
            id: 1,
            name: "core:stone".to_string(),
            transparent: false,
            hardness: 1.5,
            rotation: RotationType::None,
            faces: [
                "stone".into(),
                "stone".into(),
                "stone".into(),
                "stone".into(),
                "stone".into(),
                "stone".into(),
            ],
        }];
        let registry = StaticBlockRegistry::from_definitions(defs).unwrap();
        assert_eq!(registry.get_by_name("core:stone"), Some(1));
        assert!(!registry.get(1).transparent);
        assert!(registry.is_air(0));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dup = |id: BlockId, name: &str| BlockDefinition {
            id,
            name: name.to_string(),
            transparent: false,
            hardness: 1.0,
            rotation: RotationType::None,
            faces: Default::default(),
        };
        let defs = vec![dup(1, "core:a"), dup(1, "core:b")];
        assert!(matches!(
            StaticBlockRegistry::from_definitions(defs),
            Err(BlockRegistryError::DuplicateId(1))
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let dup = |id: BlockId, name: &str| BlockDefinition {
            id,
            name: name.to_string(),
            transparent: false,
            hardness: 1.0,
            rotation: RotationType::None,
            faces: Default::default(),
        };
        let defs = vec![dup(1, "core:a"), dup(2, "core:a")];
        assert!(matches!(
            StaticBlockRegistry::from_definitions(defs),
            Err(BlockRegistryError::DuplicateName(name)) if name == "core:a"
        ));
    }
}
