//! Render animation for skeleton growth and death.
//!
//! Structural changes happen instantly; these state machines move each
//! internode's `length_scale` over many frames so the renderer sees branches
//! extend and retract smoothly.

mod render_death;
mod render_growth;

pub use render_death::{begin_render_axis_death, tick_render_axis_death, RenderAxisDeathContext};
pub use render_growth::{begin_render_axis_growth, tick_render_axis_growth, RenderAxisGrowthContext};
