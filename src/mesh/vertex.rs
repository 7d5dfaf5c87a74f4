use bitfield_struct::bitfield;

/// A single mesh vertex, bit-packed per spec section 3: position (5b/axis,
/// 0..16), normal-index (3b, the emitting [`crate::voxels::face::Face`] as
/// 0..5), rotation (3b, 0..7), uv (1b/axis), texture-layer id (16b).
///
/// 15 + 3 + 3 + 2 + 16 = 39 bits, so this is packed into a `u64` rather than
/// the 24-32 bit word the spec prefers for the common case; the extra
/// headroom also leaves room to widen texture-layer ids later.
#[bitfield(u64, hash = true)]
pub struct PackedBlockVertex {
    #[bits(5)]
    pub x: u8,
    #[bits(5)]
    pub y: u8,
    #[bits(5)]
    pub z: u8,
    #[bits(3)]
    pub normal_index: u8,
    #[bits(3)]
    pub rotation: u8,
    #[bits(1)]
    pub u: u8,
    #[bits(1)]
    pub v: u8,
    #[bits(16)]
    pub texture_layer: u32,
    #[bits(25)]
    _padding: u32,
}

impl PartialEq for PackedBlockVertex {
    fn eq(&self, other: &Self) -> bool {
        self.into_bits() == other.into_bits()
    }
}

impl Eq for PackedBlockVertex {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let v = PackedBlockVertex::new()
            .with_x(15)
            .with_y(0)
            .with_z(8)
            .with_normal_index(4)
            .with_rotation(5)
            .with_u(1)
            .with_v(0)
            .with_texture_layer(4000);

        assert_eq!(v.x(), 15);
        assert_eq!(v.y(), 0);
        assert_eq!(v.z(), 8);
        assert_eq!(v.normal_index(), 4);
        assert_eq!(v.rotation(), 5);
        assert_eq!(v.u(), 1);
        assert_eq!(v.v(), 0);
        assert_eq!(v.texture_layer(), 4000);
    }
}
