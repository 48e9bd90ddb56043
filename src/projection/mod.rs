//! Surface projection: paints a reference skeleton onto a triangle mesh.

pub mod post_process;
pub mod surface;

pub use post_process::{
    post_process_projected_internodes, ProjectionPostProcessParams, MAX_SMOOTHING_WINDOW,
};
pub use surface::{
    project_internodes_onto_mesh, ProjectedInternodes, SurfaceProjectionContext,
    SurfaceProjectionParams, SurfaceSeed,
};
