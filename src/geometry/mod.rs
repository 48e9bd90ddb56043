//! Geometry helpers: internode bounding boxes and triangle-mesh surfaces.

pub mod mesh;
pub mod obb;
pub mod projector;

pub use mesh::{TriangleIndex, TriangleMesh};
pub use obb::Obb;
pub use projector::{EdgeWalkProjector, MeshRayProjector, RayCrossing, RayProjection, SurfaceRay};
