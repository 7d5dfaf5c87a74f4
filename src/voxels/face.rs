use glam::IVec3;

/// One of the six axis-aligned faces of a block.
///
/// Ordering matches the packed `Material`'s rotation tables (§4.4 of the
/// world subsystem spec): NORTH/SOUTH are the ±Z faces, WEST/EAST are ∓X/±X,
/// UP/DOWN are ±Y/∓Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Face {
    North = 0,
    South = 1,
    West = 2,
    East = 3,
    Up = 4,
    Down = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::North,
        Face::South,
        Face::West,
        Face::East,
        Face::Up,
        Face::Down,
    ];

    #[inline(always)]
    pub const fn to_ivec3(self) -> IVec3 {
        match self {
            Face::North => IVec3::new(0, 0, -1),
            Face::South => IVec3::new(0, 0, 1),
            Face::West => IVec3::new(-1, 0, 0),
            Face::East => IVec3::new(1, 0, 0),
            Face::Up => IVec3::new(0, 1, 0),
            Face::Down => IVec3::new(0, -1, 0),
        }
    }

    #[inline(always)]
    pub const fn opposite(self) -> Face {
        match self {
            Face::North => Face::South,
            Face::South => Face::North,
            Face::West => Face::East,
            Face::East => Face::West,
            Face::Up => Face::Down,
            Face::Down => Face::Up,
        }
    }

    #[inline(always)]
    pub const fn from_index(index: u8) -> Face {
        match index {
            0 => Face::North,
            1 => Face::South,
            2 => Face::West,
            3 => Face::East,
            4 => Face::Up,
            _ => Face::Down,
        }
    }

    /// Per-corner (x, y, z, u, v) offsets for the two triangles making up this
    /// face, in the winding order the original mesher emits them.
    const fn vertex_data(self) -> [[u8; 5]; 6] {
        match self {
            Face::North => [
                [0, 0, 0, 0, 0],
                [1, 1, 0, 1, 1],
                [1, 0, 0, 1, 0],
                [0, 0, 0, 0, 0],
                [0, 1, 0, 0, 1],
                [1, 1, 0, 1, 1],
            ],
            Face::South => [
                [0, 0, 1, 1, 0],
                [1, 0, 1, 0, 0],
                [1, 1, 1, 0, 1],
                [0, 0, 1, 1, 0],
                [1, 1, 1, 0, 1],
                [0, 1, 1, 1, 1],
            ],
            Face::West => [
                [0, 0, 0, 1, 0],
                [0, 0, 1, 0, 0],
                [0, 1, 1, 0, 1],
                [0, 0, 0, 1, 0],
                [0, 1, 1, 0, 1],
                [0, 1, 0, 1, 1],
            ],
            Face::East => [
                [1, 0, 0, 0, 0],
                [1, 1, 1, 1, 1],
                [1, 0, 1, 1, 0],
                [1, 0, 0, 0, 0],
                [1, 1, 0, 0, 1],
                [1, 1, 1, 1, 1],
            ],
            Face::Up => [
                [0, 1, 0, 1, 0],
                [0, 1, 1, 1, 1],
                [1, 1, 1, 0, 1],
                [0, 1, 0, 1, 0],
                [1, 1, 1, 0, 1],
                [1, 1, 0, 0, 0],
            ],
            Face::Down => [
                [0, 0, 0, 1, 1],
                [1, 0, 1, 0, 0],
                [0, 0, 1, 1, 0],
                [0, 0, 0, 1, 1],
                [1, 0, 0, 0, 1],
                [1, 0, 1, 0, 0],
            ],
        }
    }

    /// Yields the six (position offset, uv) corners for this face, ready to be
    /// offset by a block's local position and packed into vertices.
    pub fn corners(self) -> [FaceCorner; 6] {
        let data = self.vertex_data();
        data.map(|c| FaceCorner {
            offset: (c[0], c[1], c[2]),
            uv: (c[3], c[4]),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FaceCorner {
    pub offset: (u8, u8, u8),
    pub uv: (u8, u8),
}

/// Horizontal (yaw) rotation, rotation values 0..4. UP/DOWN pass through
/// unchanged; the four horizontal faces cycle.
const HORIZONTAL_FACE_REMAP: [[Face; 4]; 4] = [
    [Face::North, Face::South, Face::West, Face::East],
    [Face::South, Face::North, Face::East, Face::West],
    [Face::East, Face::West, Face::North, Face::South],
    [Face::West, Face::East, Face::South, Face::North],
];

/// Remaps a face for `RotationType::Horizontal`, rotation in 0..4.
pub fn remap_face_horizontal(face: Face, rotation: u8) -> Face {
    if matches!(face, Face::Up | Face::Down) {
        return face;
    }
    HORIZONTAL_FACE_REMAP[rotation as usize & 0x3][face as usize]
}

/// Remaps a face for `RotationType::Axis`, rotation in {4, 5, 6}.
///
/// Rotation 4 is the Y axis (identity). Rotation 5 is the Z axis: UP<->SOUTH,
/// DOWN<->NORTH. Rotation 6 is the X axis: UP<->EAST, DOWN<->WEST. All other
/// faces pass through unchanged.
pub fn remap_face_axis(face: Face, rotation: u8) -> Face {
    match rotation {
        5 => match face {
            Face::Up => Face::South,
            Face::Down => Face::North,
            Face::North => Face::Down,
            Face::South => Face::Up,
            other => other,
        },
        6 => match face {
            Face::Up => Face::East,
            Face::Down => Face::West,
            Face::East => Face::Down,
            Face::West => Face::Up,
            other => other,
        },
        _ => face,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_rotation_zero_is_identity() {
        for face in Face::ALL {
            assert_eq!(remap_face_horizontal(face, 0), face);
        }
    }

    #[test]
    fn axis_rotation_four_is_identity() {
        for face in Face::ALL {
            assert_eq!(remap_face_axis(face, 4), face);
        }
    }

    #[test]
    fn axis_rotation_five_swaps_up_down_with_south_north() {
        assert_eq!(remap_face_axis(Face::Up, 5), Face::South);
        assert_eq!(remap_face_axis(Face::Down, 5), Face::North);
        assert_eq!(remap_face_axis(Face::North, 5), Face::Down);
        assert_eq!(remap_face_axis(Face::South, 5), Face::Up);
        assert_eq!(remap_face_axis(Face::East, 5), Face::East);
    }

    #[test]
    fn axis_rotation_six_swaps_up_down_with_east_west() {
        assert_eq!(remap_face_axis(Face::Up, 6), Face::East);
        assert_eq!(remap_face_axis(Face::Down, 6), Face::West);
        assert_eq!(remap_face_axis(Face::East, 6), Face::Down);
        assert_eq!(remap_face_axis(Face::West, 6), Face::Up);
    }

    #[test]
    fn opposite_is_involution() {
        for face in Face::ALL {
            assert_eq!(face.opposite().opposite(), face);
        }
    }
}
