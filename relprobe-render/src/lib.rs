pub mod geometry;
pub mod render;
pub mod text;

pub use geometry::Geometry;
pub use render::{load_font, load_stimulus, RenderError, SkiaSurface};
