//! Oriented bounding boxes around internodes.

use glam::Vec3;

use crate::skeleton::Internode;

/// Added to the absolute rotation terms so near-parallel edges never produce
/// a zero cross-product axis.
const SAT_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    /// Orthonormal box axes
    pub axes: [Vec3; 3],
    pub half_extents: Vec3,
}

impl Obb {
    /// Box around an internode: `diameter` wide across, `length` long along
    /// its direction.
    pub fn from_internode(inode: &Internode, diameter_override: Option<f32>) -> Self {
        let dir = inode.direction.normalize_or(Vec3::Y);
        let radius = diameter_override.unwrap_or(inode.diameter) * 0.5;
        let side = perpendicular(dir);
        Self {
            center: inode.position + dir * (inode.length * 0.5),
            axes: [side, dir, dir.cross(side)],
            half_extents: Vec3::new(radius, inode.length * 0.5, radius),
        }
    }

    /// Radius of the sphere enclosing the box.
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents.length()
    }

    /// Separating axis test; touching boxes count as intersecting.
    pub fn intersects(&self, other: &Obb) -> bool {
        let reach = self.bounding_radius() + other.bounding_radius();
        let offset = other.center - self.center;
        if offset.length_squared() > reach * reach {
            return false;
        }

        let a = self.half_extents.to_array();
        let b = other.half_extents.to_array();
        let mut r = [[0.0f32; 3]; 3];
        let mut abs_r = [[0.0f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = self.axes[i].dot(other.axes[j]);
                abs_r[i][j] = r[i][j].abs() + SAT_EPSILON;
            }
        }
        let t = [
            offset.dot(self.axes[0]),
            offset.dot(self.axes[1]),
            offset.dot(self.axes[2]),
        ];

        // Face axes of self.
        for i in 0..3 {
            let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
            if t[i].abs() > a[i] + rb {
                return false;
            }
        }
        // Face axes of other.
        for j in 0..3 {
            let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
            let dist = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if dist.abs() > ra + b[j] {
                return false;
            }
        }
        // Edge-edge cross products.
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
                let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
                let dist = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if dist.abs() > ra + rb {
                    return false;
                }
            }
        }
        true
    }
}

/// A unit vector perpendicular to `dir`, axis-aligned whenever `dir` is.
pub fn perpendicular(dir: Vec3) -> Vec3 {
    let helper = if dir.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    dir.cross(helper).normalize_or(dir.any_orthonormal_vector())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(position: Vec3, direction: Vec3, length: f32, diameter: f32) -> Obb {
        Obb::from_internode(&Internode::new(position, direction, length, diameter), None)
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let obb = segment(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0).normalize(), 1.0, 0.1);
        for i in 0..3 {
            assert!((obb.axes[i].length() - 1.0).abs() < 1e-5);
            for j in (i + 1)..3 {
                assert!(obb.axes[i].dot(obb.axes[j]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let a = segment(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, 2.0, 0.2);
        let b = segment(Vec3::new(-1.0, 0.0, 0.0), Vec3::X, 2.0, 0.2);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_parallel_separated_segments() {
        let a = segment(Vec3::ZERO, Vec3::Y, 2.0, 0.2);
        let b = segment(Vec3::new(0.5, 0.0, 0.0), Vec3::Y, 2.0, 0.2);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_crossing_diagonals_in_different_planes() {
        // Seen from +z these cross; they sit 0.3 apart in z.
        let a = segment(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0).normalize(), 2.8, 0.1);
        let b = segment(Vec3::new(-1.0, 1.0, 0.3), Vec3::new(1.0, -1.0, 0.0).normalize(), 2.8, 0.1);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_end_to_end_segments_touch() {
        let a = segment(Vec3::ZERO, Vec3::Y, 1.0, 0.2);
        let b = segment(Vec3::Y, Vec3::Y, 1.0, 0.2);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_diameter_override() {
        let inode = Internode::new(Vec3::ZERO, Vec3::Y, 1.0, 0.1);
        let obb = Obb::from_internode(&inode, Some(2.0));
        assert!((obb.half_extents.x - 1.0).abs() < 1e-6);
        assert!((obb.half_extents.y - 0.5).abs() < 1e-6);
    }
}
