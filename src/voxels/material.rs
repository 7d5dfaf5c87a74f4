use bitfield_struct::bitfield;
use serde::Deserialize;

/// A packed block value: 13 bits of block id (0 = air), 3 bits of rotation.
///
/// Mirrors the teacher's `Voxel` bitfield (`voxels/voxel.rs`), widened to the
/// 13/3 split this subsystem's rotation model needs.
#[bitfield(u16, hash = true)]
pub struct Material {
    #[bits(13)]
    pub block_id: u16,
    #[bits(3)]
    pub rotation: u8,
}

impl Material {
    pub const AIR: Material = Material::new();

    pub const fn pack(block_id: u16, rotation: u8) -> Material {
        let mut mat = Material::new();
        mat.set_block_id(block_id);
        mat.set_rotation(rotation);
        mat
    }

    pub const fn is_air(&self) -> bool {
        self.block_id() == 0
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.into_bits() == other.into_bits()
    }
}

impl Eq for Material {}

impl Default for Material {
    fn default() -> Self {
        Material::AIR
    }
}

/// Which family of rotation remapping a block's faces use. Plain data tag,
/// dispatched through the pure functions in [`crate::voxels::face`] rather
/// than through a block-type class hierarchy (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RotationType {
    #[default]
    None,
    Horizontal,
    Axis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        for block_id in [0u16, 1, 42, 4095, 8191] {
            for rotation in 0u8..8 {
                let mat = Material::pack(block_id, rotation);
                assert_eq!(mat.block_id(), block_id);
                assert_eq!(mat.rotation(), rotation);
            }
        }
    }

    #[test]
    fn zero_is_air() {
        assert!(Material::AIR.is_air());
        assert!(Material::pack(0, 3).is_air());
        assert!(!Material::pack(5, 0).is_air());
    }
}
