//! Ray marching across the surface of a triangle mesh.

use glam::{Quat, Vec3};

use super::mesh::{TriangleIndex, TriangleMesh};

/// Exit distances at or below this are treated as leaving through the entry point.
const EDGE_EPSILON: f32 = 1e-6;

/// A ray constrained to the mesh surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRay {
    pub triangle: TriangleIndex,
    pub point: Vec3,
    pub direction: Vec3,
}

/// One polyline segment of a projected ray: the segment lies in `triangle`
/// and ends at `exit_p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCrossing {
    pub exit_p: Vec3,
    pub triangle: TriangleIndex,
    pub tri: [u32; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayProjection {
    pub entries: Vec<RayCrossing>,
    /// Surface direction at the end of the polyline
    pub exit_direction: Vec3,
    /// False when the ray ran off the mesh before covering its length
    pub completed: bool,
}

impl RayProjection {
    /// Final point and triangle of the polyline, if any segment was produced.
    pub fn end(&self) -> Option<(Vec3, TriangleIndex)> {
        self.entries.last().map(|e| (e.exit_p, e.triangle))
    }
}

/// Projects a surface ray a given arc length across a mesh.
pub trait MeshRayProjector {
    fn project(&self, mesh: &TriangleMesh, ray: &SurfaceRay, length: f32) -> RayProjection;
}

/// Walks rays triangle to triangle through shared edges, folding the
/// direction into each new triangle's plane. Expects a consistently wound
/// manifold mesh.
#[derive(Debug, Clone, Default)]
pub struct EdgeWalkProjector {
    adjacency: Vec<[Option<TriangleIndex>; 3]>,
}

impl EdgeWalkProjector {
    pub fn new(mesh: &TriangleMesh) -> Self {
        Self {
            adjacency: mesh.edge_adjacency(),
        }
    }

    /// Nearest edge the ray leaves `triangle` through, and the distance to it.
    fn exit_edge(
        mesh: &TriangleMesh,
        triangle: TriangleIndex,
        normal: Vec3,
        point: Vec3,
        direction: Vec3,
    ) -> Option<(usize, f32)> {
        let verts = mesh.triangle_vertices(triangle);
        let mut best: Option<(usize, f32)> = None;
        for e in 0..3 {
            let a = verts[e];
            let b = verts[(e + 1) % 3];
            let outward = (b - a).cross(normal);
            let speed = direction.dot(outward);
            if speed <= EDGE_EPSILON {
                continue;
            }
            let t = ((a - point).dot(outward) / speed).max(0.0);
            if best.map_or(true, |(_, bt)| t < bt) {
                best = Some((e, t));
            }
        }
        best
    }
}

impl MeshRayProjector for EdgeWalkProjector {
    fn project(&self, mesh: &TriangleMesh, ray: &SurfaceRay, length: f32) -> RayProjection {
        let mut result = RayProjection {
            entries: Vec::new(),
            exit_direction: ray.direction,
            completed: false,
        };

        let mut triangle = ray.triangle;
        let mut normal = mesh.triangle_normal(triangle);
        let mut direction = flatten(ray.direction, normal);
        if direction == Vec3::ZERO {
            return result;
        }
        let mut point = ray.point;
        let mut remaining = length.max(0.0);

        // Each triangle is entered at most a few times by a straight geodesic.
        let max_steps = 4 * mesh.num_triangles() + 8;
        for _ in 0..max_steps {
            result.exit_direction = direction;
            let Some((edge, t)) = Self::exit_edge(mesh, triangle, normal, point, direction) else {
                return result;
            };

            if remaining <= t {
                result.entries.push(RayCrossing {
                    exit_p: point + direction * remaining,
                    triangle,
                    tri: mesh.triangles[triangle],
                });
                result.completed = true;
                return result;
            }

            if t > EDGE_EPSILON {
                point += direction * t;
                remaining -= t;
                result.entries.push(RayCrossing {
                    exit_p: point,
                    triangle,
                    tri: mesh.triangles[triangle],
                });
            }

            let Some(next) = self.adjacency[triangle][edge] else {
                return result;
            };
            let next_normal = mesh.triangle_normal(next);
            if next_normal == Vec3::ZERO {
                return result;
            }
            let fold = Quat::from_rotation_arc(normal, next_normal);
            let folded = flatten(fold * direction, next_normal);
            if folded == Vec3::ZERO {
                return result;
            }
            triangle = next;
            normal = next_normal;
            direction = folded;
        }

        log::warn!("surface ray exceeded {max_steps} triangle steps");
        result
    }
}

/// Unit projection of `v` onto the plane with unit `normal`; zero if degenerate.
pub fn flatten(v: Vec3, normal: Vec3) -> Vec3 {
    (v - normal * v.dot(normal)).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::tests::{folded_strip, square};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_ray_within_one_triangle() {
        let mesh = square();
        let projector = EdgeWalkProjector::new(&mesh);
        let ray = SurfaceRay {
            triangle: 0,
            point: Vec3::new(0.5, 0.1, 0.0),
            direction: Vec3::X,
        };
        let result = projector.project(&mesh, &ray, 0.2);

        assert!(result.completed);
        assert_eq!(result.entries.len(), 1);
        assert!(approx(result.entries[0].exit_p, Vec3::new(0.7, 0.1, 0.0)));
        assert_eq!(result.entries[0].tri, [0, 1, 2]);
    }

    #[test]
    fn test_ray_crosses_shared_edge() {
        let mesh = square();
        let projector = EdgeWalkProjector::new(&mesh);
        let ray = SurfaceRay {
            triangle: 1,
            point: Vec3::new(0.25, 0.5, 0.0),
            direction: Vec3::X,
        };
        let result = projector.project(&mesh, &ray, 0.5);

        assert!(result.completed);
        assert_eq!(result.entries.len(), 2);
        assert!(approx(result.entries[0].exit_p, Vec3::new(0.5, 0.5, 0.0)));
        assert_eq!(result.entries[0].triangle, 1);
        assert!(approx(result.entries[1].exit_p, Vec3::new(0.75, 0.5, 0.0)));
        assert_eq!(result.entries[1].triangle, 0);
    }

    #[test]
    fn test_ray_stops_at_mesh_boundary() {
        let mesh = square();
        let projector = EdgeWalkProjector::new(&mesh);
        let ray = SurfaceRay {
            triangle: 1,
            point: Vec3::new(0.25, 0.5, 0.0),
            direction: Vec3::X,
        };
        let result = projector.project(&mesh, &ray, 2.0);

        assert!(!result.completed);
        assert!(approx(result.end().unwrap().0, Vec3::new(1.0, 0.5, 0.0)));
    }

    #[test]
    fn test_ray_folds_over_edge() {
        let mesh = folded_strip();
        let projector = EdgeWalkProjector::new(&mesh);
        let ray = SurfaceRay {
            triangle: 1,
            point: Vec3::new(0.25, 0.5, 0.0),
            direction: Vec3::X,
        };
        let result = projector.project(&mesh, &ray, 1.1);

        assert!(result.completed);
        assert_eq!(result.entries.len(), 3);
        assert!(approx(result.entries[1].exit_p, Vec3::new(1.0, 0.5, 0.0)));
        assert!(approx(result.entries[2].exit_p, Vec3::new(1.0, 0.5, 0.35)));
        assert_eq!(result.entries[2].triangle, 3);
        assert!(approx(result.exit_direction, Vec3::Z));
    }

    #[test]
    fn test_direction_along_normal_is_rejected() {
        let mesh = square();
        let projector = EdgeWalkProjector::new(&mesh);
        let ray = SurfaceRay {
            triangle: 0,
            point: Vec3::new(0.5, 0.1, 0.0),
            direction: Vec3::Z,
        };
        let result = projector.project(&mesh, &ray, 1.0);
        assert!(!result.completed);
        assert!(result.entries.is_empty());
    }
}
