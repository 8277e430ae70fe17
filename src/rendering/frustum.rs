//! Frustum culling: clip planes from the view-projection matrix, tested
//! against chunk bounding boxes before any draw call is issued.

use cgmath::{EuclideanSpace, InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4};

/// A plane in the form `normal · p + distance = 0`, normalized so signed
/// distances are in world units.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vector3<f32>,
    distance: f32,
}

impl Plane {
    fn new(v: Vector4<f32>) -> Self {
        let normal = Vector3::new(v.x, v.y, v.z);
        let length = normal.magnitude();
        Plane {
            normal: normal / length,
            distance: v.w / length,
        }
    }

    /// Signed distance from a point to the plane; positive is inside.
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(point.to_vec()) + self.distance
    }
}

/// The six clip planes of a camera: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes from a view-projection matrix.
    ///
    /// Rows of the transposed matrix combine with its homogeneous row:
    /// each plane is `row3 ± row{0,1,2}`, normalized.
    pub fn from_view_projection(view_projection: Matrix4<f32>) -> Self {
        let m = view_projection.transpose();
        Frustum {
            planes: [
                Plane::new(m.w + m.x), // left
                Plane::new(m.w - m.x), // right
                Plane::new(m.w + m.y), // bottom
                Plane::new(m.w - m.y), // top
                Plane::new(m.w + m.z), // near
                Plane::new(m.w - m.z), // far
            ],
        }
    }

    /// Conservative AABB visibility test.
    ///
    /// For each plane, takes the box corner furthest along the plane
    /// normal; if even that corner is on the negative side, the whole box
    /// is outside and the test rejects immediately. A box that no plane
    /// rejects is reported visible — this can include boxes just outside a
    /// frustum corner, but never misses a visible one.
    pub fn is_box_visible(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        for plane in &self.planes {
            let positive_corner = Point3::new(
                if plane.normal.x >= 0.0 { max.x } else { min.x },
                if plane.normal.y >= 0.0 { max.y } else { min.y },
                if plane.normal.z >= 0.0 { max.z } else { min.z },
            );
            if plane.signed_distance(positive_corner) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{perspective, Deg, Vector3};

    fn looking_down_negative_z() -> Frustum {
        let projection = perspective(Deg(90.0), 1.0, 0.1, 1000.0);
        let view = Matrix4::look_to_rh(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::unit_y(),
        );
        Frustum::from_view_projection(projection * view)
    }

    #[test]
    fn plane_normalization_preserves_direction() {
        let plane = Plane::new(Vector4::new(3.0, 4.0, 0.0, 10.0));
        assert!((plane.normal.x - 0.6).abs() < 1e-6);
        assert!((plane.normal.y - 0.8).abs() < 1e-6);
        assert!((plane.distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn box_in_front_is_visible() {
        let frustum = looking_down_negative_z();
        assert!(frustum.is_box_visible(
            Point3::new(-8.0, -8.0, -32.0),
            Point3::new(8.0, 8.0, -16.0),
        ));
    }

    #[test]
    fn box_behind_camera_is_rejected() {
        let frustum = looking_down_negative_z();
        assert!(!frustum.is_box_visible(
            Point3::new(-8.0, -8.0, 16.0),
            Point3::new(8.0, 8.0, 32.0),
        ));
    }

    #[test]
    fn box_far_to_the_side_is_rejected() {
        let frustum = looking_down_negative_z();
        // At 90° fov the frustum at z = -10 is 20 units wide; x in
        // [500, 516] lies far outside the right plane.
        assert!(!frustum.is_box_visible(
            Point3::new(500.0, -8.0, -26.0),
            Point3::new(516.0, 8.0, -10.0),
        ));
    }

    #[test]
    fn box_beyond_far_plane_is_rejected() {
        let frustum = looking_down_negative_z();
        assert!(!frustum.is_box_visible(
            Point3::new(-8.0, -8.0, -5000.0),
            Point3::new(8.0, 8.0, -4000.0),
        ));
    }

    #[test]
    fn box_straddling_a_plane_is_kept() {
        let frustum = looking_down_negative_z();
        // Crosses the near plane: conservative test must keep it.
        assert!(frustum.is_box_visible(
            Point3::new(-1.0, -1.0, -2.0),
            Point3::new(1.0, 1.0, 2.0),
        ));
    }
}
