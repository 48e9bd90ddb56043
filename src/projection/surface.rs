//! Re-derives a skeleton lying on a triangle mesh by walking a reference
//! skeleton as a sequence of surface rays.
//!
//! Each reference internode becomes one ray of `length * length_scale`. The
//! ray may cross several triangles, so one reference internode can turn into
//! a chain of internodes, one per crossed triangle. Medial children keep
//! going along the parent's ray; lateral children start a new ray turned in
//! the surface plane by their branching angle.

use glam::{Quat, Vec3};

use crate::geometry::projector::flatten;
use crate::geometry::{MeshRayProjector, RayProjection, SurfaceRay, TriangleIndex, TriangleMesh};
use crate::skeleton::{debug_validate, Internode, InternodeIndex};

/// Segments shorter than this are skipped.
const MIN_SEGMENT_LENGTH: f32 = 1e-5;

/// Starting point on the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSeed {
    pub triangle: TriangleIndex,
    pub barycentric: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProjectionParams {
    pub seed: SurfaceSeed,
    /// Heading of the root, flattened into the seed triangle
    pub root_direction: Vec3,
    /// Axis that decides the sign of a lateral branching angle in the
    /// reference skeleton
    pub reference_normal: Vec3,
    /// Ceiling on generated internodes
    pub max_internodes: usize,
}

impl SurfaceProjectionParams {
    pub fn new(seed: SurfaceSeed, root_direction: Vec3) -> Self {
        Self {
            seed,
            root_direction,
            reference_normal: Vec3::Z,
            max_internodes: 1 << 16,
        }
    }
}

/// Output of a surface projection.
///
/// `ray_result_index`, `normals` and `internodes` are parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedInternodes {
    /// One entry per projected reference internode
    pub ray_results: Vec<RayProjection>,
    pub internodes: Vec<Internode>,
    /// Ray that produced each internode
    pub ray_result_index: Vec<Option<usize>>,
    /// Surface normal under each internode
    pub normals: Vec<Vec3>,
}

impl ProjectedInternodes {
    pub fn len(&self) -> usize {
        self.internodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internodes.is_empty()
    }

    fn push(
        &mut self,
        mut inode: Internode,
        attach: Option<InternodeIndex>,
        as_lateral: bool,
        ray_index: usize,
        normal: Vec3,
    ) -> InternodeIndex {
        let i = self.internodes.len();
        inode.parent = attach;
        if let Some(p) = attach {
            if as_lateral {
                self.internodes[p].lateral_child = Some(i);
            } else {
                self.internodes[p].medial_child = Some(i);
            }
        }
        self.internodes.push(inode);
        self.ray_result_index.push(Some(ray_index));
        self.normals.push(normal);
        i
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingRay {
    source: InternodeIndex,
    attach: Option<InternodeIndex>,
    as_lateral: bool,
    ray: SurfaceRay,
}

/// Resumable depth-first projection over a reference skeleton.
pub struct SurfaceProjectionContext<'a, P: MeshRayProjector> {
    source: &'a [Internode],
    mesh: &'a TriangleMesh,
    projector: &'a P,
    params: SurfaceProjectionParams,
    stack: Vec<PendingRay>,
    result: ProjectedInternodes,
}

impl<'a, P: MeshRayProjector> SurfaceProjectionContext<'a, P> {
    pub fn new(
        source: &'a [Internode],
        mesh: &'a TriangleMesh,
        projector: &'a P,
        params: SurfaceProjectionParams,
    ) -> Self {
        let mut stack = Vec::new();
        if !source.is_empty() && params.seed.triangle < mesh.num_triangles() {
            let triangle = params.seed.triangle;
            let normal = mesh.triangle_normal(triangle);
            let [a, b, _] = mesh.triangle_vertices(triangle);
            let direction = Some(flatten(params.root_direction, normal))
                .filter(|d| *d != Vec3::ZERO)
                .unwrap_or_else(|| (b - a).normalize_or_zero());
            stack.push(PendingRay {
                source: 0,
                attach: None,
                as_lateral: false,
                ray: SurfaceRay {
                    triangle,
                    point: mesh.barycentric_point(triangle, params.seed.barycentric),
                    direction,
                },
            });
        }
        Self {
            source,
            mesh,
            projector,
            params,
            stack,
            result: ProjectedInternodes::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    /// What has been built so far.
    pub fn result(&self) -> &ProjectedInternodes {
        &self.result
    }

    pub fn into_result(self) -> ProjectedInternodes {
        debug_validate(&self.result.internodes);
        self.result
    }

    /// Project up to `max_rays` reference internodes. Returns true while work
    /// remains.
    pub fn step(&mut self, max_rays: usize) -> bool {
        for _ in 0..max_rays {
            let Some(pending) = self.stack.pop() else {
                break;
            };
            self.project_one(pending);
        }
        !self.stack.is_empty()
    }

    fn project_one(&mut self, pending: PendingRay) {
        let source = self.source;
        let src = &source[pending.source];
        let length = src.length * src.length_scale;
        let is_root = pending.attach.is_none();

        let projection = if length > MIN_SEGMENT_LENGTH {
            self.projector.project(self.mesh, &pending.ray, length)
        } else {
            RayProjection {
                entries: Vec::new(),
                exit_direction: pending.ray.direction,
                completed: is_root,
            }
        };
        let ray_index = self.result.ray_results.len();

        let mut attach = pending.attach;
        let mut as_lateral = pending.as_lateral;
        let mut start = pending.ray.point;
        let mut capped = false;
        for entry in &projection.entries {
            let segment = entry.exit_p - start;
            let segment_length = segment.length();
            if segment_length <= MIN_SEGMENT_LENGTH {
                continue;
            }
            if self.result.len() >= self.params.max_internodes {
                capped = true;
                break;
            }

            let mut inode = Internode::new(
                start,
                segment / segment_length,
                segment_length,
                src.diameter,
            );
            if attach == pending.attach {
                inode.id = src.id;
            }
            inode.gravelius_order = src.gravelius_order;
            let normal = self.mesh.triangle_normal(entry.triangle);
            attach = Some(self.result.push(inode, attach, as_lateral, ray_index, normal));
            as_lateral = false;
            start = entry.exit_p;
        }

        // The root always leaves a node at the seed.
        if is_root && self.result.is_empty() {
            let mut inode = Internode::new(start, pending.ray.direction, 0.0, src.diameter);
            inode.id = src.id;
            let normal = self.mesh.triangle_normal(pending.ray.triangle);
            attach = Some(self.result.push(inode, None, false, ray_index, normal));
        }

        let end_triangle = projection.end().map_or(pending.ray.triangle, |(_, t)| t);
        let exit_direction = projection.exit_direction;
        let completed = projection.completed;
        self.result.ray_results.push(projection);

        // Truncated or empty rays drop the rest of this subtree.
        if !completed || capped || attach == pending.attach {
            return;
        }

        if let Some(l) = src.lateral_child {
            let angle = signed_angle(
                src.direction,
                source[l].direction,
                self.params.reference_normal,
            );
            let normal = self.mesh.triangle_normal(end_triangle);
            let direction = if normal == Vec3::ZERO {
                exit_direction
            } else {
                Quat::from_axis_angle(normal, angle) * exit_direction
            };
            self.stack.push(PendingRay {
                source: l,
                attach,
                as_lateral: true,
                ray: SurfaceRay {
                    triangle: end_triangle,
                    point: start,
                    direction,
                },
            });
        }
        if let Some(m) = src.medial_child {
            self.stack.push(PendingRay {
                source: m,
                attach,
                as_lateral: false,
                ray: SurfaceRay {
                    triangle: end_triangle,
                    point: start,
                    direction: exit_direction,
                },
            });
        }
    }
}

/// Angle from `from` to `to`, negative when their cross product points away
/// from `reference`.
fn signed_angle(from: Vec3, to: Vec3, reference: Vec3) -> f32 {
    let angle = from.angle_between(to);
    if from.cross(to).dot(reference) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Project a reference skeleton onto a mesh surface in one go.
pub fn project_internodes_onto_mesh<P: MeshRayProjector>(
    source: &[Internode],
    mesh: &TriangleMesh,
    projector: &P,
    params: SurfaceProjectionParams,
) -> ProjectedInternodes {
    let mut context = SurfaceProjectionContext::new(source, mesh, projector, params);
    while context.step(usize::MAX) {}
    let result = context.into_result();
    log::debug!(
        "projected {} reference internodes onto mesh as {} internodes",
        result.ray_results.len(),
        result.len()
    );
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::mesh::tests::folded_strip;
    use crate::geometry::EdgeWalkProjector;
    use crate::skeleton::topology::tests::branched_tree;
    use crate::skeleton::validate_internode_relationships;

    /// Square in the XY plane spanning `[-half, half]`, normal +Z. Triangle 1
    /// covers `y >= x`.
    pub(crate) fn plane(half: f32) -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Vec3::new(-half, -half, 0.0),
                Vec3::new(half, -half, 0.0),
                Vec3::new(half, half, 0.0),
                Vec3::new(-half, half, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    /// The reference tree projected flat with its root at (-5, 0, 0).
    pub(crate) fn projected_branched_tree() -> ProjectedInternodes {
        let mesh = plane(10.0);
        let projector = EdgeWalkProjector::new(&mesh);
        let seed = SurfaceSeed {
            triangle: 1,
            barycentric: Vec3::new(0.5, 0.25, 0.25),
        };
        project_internodes_onto_mesh(
            &branched_tree(),
            &mesh,
            &projector,
            SurfaceProjectionParams::new(seed, Vec3::Y),
        )
    }

    #[test]
    fn test_flat_projection_matches_reference() {
        let src = branched_tree();
        let result = projected_branched_tree();

        assert_eq!(result.len(), src.len());
        assert_eq!(result.ray_results.len(), src.len());
        assert!(validate_internode_relationships(&result.internodes).is_ok());

        let offset = Vec3::new(-5.0, 0.0, 0.0);
        for inode in &result.internodes {
            let s = src.iter().find(|s| s.id == inode.id).unwrap();
            assert!((inode.position - (s.position + offset)).length() < 1e-4);
            assert!((inode.direction - s.direction).length() < 1e-4);
            assert!((inode.length - s.length).abs() < 1e-4);
        }
        assert!(result.normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));

        let mut rays: Vec<_> = result.ray_result_index.iter().map(|r| r.unwrap()).collect();
        rays.sort_unstable();
        assert_eq!(rays, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_boundary_truncates_subtree() {
        let mesh = plane(2.0);
        let projector = EdgeWalkProjector::new(&mesh);
        let seed = SurfaceSeed {
            triangle: 1,
            barycentric: Vec3::new(0.375, 0.25, 0.375),
        };
        let result = project_internodes_onto_mesh(
            &branched_tree(),
            &mesh,
            &projector,
            SurfaceProjectionParams::new(seed, Vec3::Y),
        );

        // Node 1 runs off the top edge half way; nodes 2, 3 and 4 are lost.
        assert_eq!(result.len(), 2);
        assert!((result.internodes[1].length - 0.5).abs() < 1e-4);
        assert_eq!(result.internodes[1].lateral_child, None);
        assert!(!result.ray_results[1].completed);
    }

    #[test]
    fn test_ray_across_fold_splits_internode() {
        let mesh = folded_strip();
        let projector = EdgeWalkProjector::new(&mesh);
        let source = vec![Internode::new(Vec3::ZERO, Vec3::X, 1.1, 0.1)];
        let seed = SurfaceSeed {
            triangle: 1,
            barycentric: Vec3::new(0.5, 0.25, 0.25),
        };
        let params = SurfaceProjectionParams::new(seed, Vec3::X);
        let result = project_internodes_onto_mesh(&source, &mesh, &projector, params);

        assert_eq!(result.len(), 3);
        assert_eq!(result.internodes[0].id, source[0].id);
        assert_ne!(result.internodes[1].id, source[0].id);
        assert_eq!(result.ray_result_index, vec![Some(0); 3]);
        assert!((result.normals[2] - Vec3::NEG_X).length() < 1e-6);
        assert!((result.internodes[2].direction - Vec3::Z).length() < 1e-4);
        assert!(validate_internode_relationships(&result.internodes).is_ok());
    }

    #[test]
    fn test_zero_length_root_emits_seed_node() {
        let mesh = plane(1.0);
        let projector = EdgeWalkProjector::new(&mesh);
        let source = vec![Internode::new(Vec3::ZERO, Vec3::Y, 0.0, 0.1)];
        let seed = SurfaceSeed {
            triangle: 0,
            barycentric: Vec3::new(0.2, 0.6, 0.2),
        };
        let params = SurfaceProjectionParams::new(seed, Vec3::Y);
        let result = project_internodes_onto_mesh(&source, &mesh, &projector, params);

        assert_eq!(result.len(), 1);
        assert_eq!(result.internodes[0].length, 0.0);
        assert_eq!(result.ray_result_index, vec![Some(0)]);
    }

    #[test]
    fn test_stepwise_matches_one_shot() {
        let mesh = plane(10.0);
        let projector = EdgeWalkProjector::new(&mesh);
        let src = branched_tree();
        let seed = SurfaceSeed {
            triangle: 1,
            barycentric: Vec3::new(0.5, 0.25, 0.25),
        };
        let params = SurfaceProjectionParams::new(seed, Vec3::Y);

        let mut context = SurfaceProjectionContext::new(&src, &mesh, &projector, params);
        let mut steps = 0;
        while context.step(1) {
            steps += 1;
            assert!(context.result().len() <= src.len());
        }
        assert!(context.is_complete());
        assert_eq!(steps, src.len() - 1);

        let stepped = context.into_result();
        let one_shot = project_internodes_onto_mesh(&src, &mesh, &projector, params);
        let positions =
            |r: &ProjectedInternodes| r.internodes.iter().map(|i| i.position).collect::<Vec<_>>();
        assert_eq!(positions(&stepped), positions(&one_shot));
    }

    #[test]
    fn test_internode_ceiling() {
        let mesh = plane(10.0);
        let projector = EdgeWalkProjector::new(&mesh);
        let seed = SurfaceSeed {
            triangle: 1,
            barycentric: Vec3::new(0.5, 0.25, 0.25),
        };
        let mut params = SurfaceProjectionParams::new(seed, Vec3::Y);
        params.max_internodes = 2;
        let result = project_internodes_onto_mesh(&branched_tree(), &mesh, &projector, params);

        assert_eq!(result.len(), 2);
        assert!(validate_internode_relationships(&result.internodes).is_ok());
    }
}
