//! Indexed triangle mesh used as a projection surface.

use std::collections::HashMap;

use glam::Vec3;

pub type TriangleIndex = usize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    /// Counter-clockwise vertex indices per triangle
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle_vertices(&self, triangle: TriangleIndex) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[triangle];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Unit face normal; zero for degenerate triangles.
    pub fn triangle_normal(&self, triangle: TriangleIndex) -> Vec3 {
        let [a, b, c] = self.triangle_vertices(triangle);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Point at barycentric weights `(w0, w1, w2)` on a triangle.
    pub fn barycentric_point(&self, triangle: TriangleIndex, barycentric: Vec3) -> Vec3 {
        let [a, b, c] = self.triangle_vertices(triangle);
        a * barycentric.x + b * barycentric.y + c * barycentric.z
    }

    /// For each triangle and each edge `(v[e], v[(e + 1) % 3])`, the triangle
    /// sharing that edge. Edges shared by more than two triangles are left
    /// unconnected.
    pub fn edge_adjacency(&self) -> Vec<[Option<TriangleIndex>; 3]> {
        let mut edges: HashMap<(u32, u32), Vec<(TriangleIndex, usize)>> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for e in 0..3 {
                let (a, b) = (tri[e], tri[(e + 1) % 3]);
                edges.entry((a.min(b), a.max(b))).or_default().push((t, e));
            }
        }

        let mut adjacency = vec![[None; 3]; self.triangles.len()];
        for sharing in edges.values() {
            if let [(t0, e0), (t1, e1)] = sharing.as_slice() {
                adjacency[*t0][*e0] = Some(*t1);
                adjacency[*t1][*e1] = Some(*t0);
            }
        }
        adjacency
    }
}
