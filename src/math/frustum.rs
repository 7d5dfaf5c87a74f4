use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4Swizzles, vec4};

use crate::math::aabb::Aabb;
use crate::math::plane::Plane;

/// Six-plane view frustum, derived from a view-projection matrix.
///
/// Used by [`crate::chunk_manager::ChunkManager::get_renderable_chunks`] to
/// cull chunks whose AABB falls entirely outside the current view.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct Frustum {
    // left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    fn corners(inverse_view_projection: &Mat4) -> [Vec3; 8] {
        let corners: [glam::Vec4; 8] = [
            vec4(-1.0, -1.0, 1.0, 1.0),
            vec4(1.0, -1.0, 1.0, 1.0),
            vec4(-1.0, 1.0, 1.0, 1.0),
            vec4(1.0, 1.0, 1.0, 1.0),
            vec4(-1.0, -1.0, 0.00001, 1.0),
            vec4(1.0, -1.0, 0.00001, 1.0),
            vec4(-1.0, 1.0, 0.00001, 1.0),
            vec4(1.0, 1.0, 0.00001, 1.0),
        ];

        corners.map(|corner| {
            let mut corner = *inverse_view_projection * corner;
            corner /= corner.w;
            corner.xyz()
        })
    }

    pub fn from_inverse_view_projection(inverse_view_projection: &Mat4) -> Frustum {
        let corners = Self::corners(inverse_view_projection);
        let [
            left_bottom_near,
            right_bottom_near,
            left_top_near,
            right_top_near,
            left_bottom_far,
            right_bottom_far,
            left_top_far,
            _right_top_far,
        ] = corners;

        let planes = [
            Plane::from_points(left_bottom_near, left_top_far, left_bottom_far),
            Plane::from_points(right_bottom_near, right_bottom_far, right_top_near),
            Plane::from_points(left_bottom_near, right_bottom_near, left_bottom_far).flip(),
            Plane::from_points(left_top_near, right_top_near, left_top_far),
            Plane::from_points(left_bottom_near, right_bottom_near, left_top_near),
            Plane::from_points(left_bottom_far, right_bottom_far, left_top_far).flip(),
        ];

        Frustum { planes }
    }

    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let extent = aabb.extent();

        for plane in &self.planes {
            let r = extent.dot(plane.normal.abs());
            let d = plane.distance_to_point(center);

            if d < -r {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn test_frustum_intersection() {
        let view = Mat4::look_at_lh(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let projection = Mat4::perspective_infinite_reverse_lh(90.0_f32.to_radians(), 1.0, 0.1);
        let view_projection = projection * view;
        let frustum = Frustum::from_inverse_view_projection(&view_projection);

        let aabb_inside = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        assert!(frustum.intersects_aabb(&aabb_inside));

        let aabb_behind = Aabb::new(Vec3::new(-0.5, -0.5, -7.0), Vec3::new(0.5, 0.5, -6.0));
        assert!(!frustum.intersects_aabb(&aabb_behind));

        let aabb_right = Aabb::new(Vec3::new(10.0, -0.5, -0.5), Vec3::new(11.0, 0.5, 0.5));
        assert!(!frustum.intersects_aabb(&aabb_right));
    }
}
