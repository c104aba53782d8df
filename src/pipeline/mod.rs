use glam::{Mat4, Vec2, Vec3};
use image::RgbImage;

use crate::core::Color;

pub mod buffer;
pub mod rasterizer;
pub mod software;

pub use buffer::FrameBuffer;
pub use rasterizer::Rasterizer;
pub use software::SoftwareRenderer;

/// The slice of a fixed-function renderer the virtual camera drives: an
/// offscreen target, a projection and model-view pair, linear fog, and
/// indexed triangle drawing.
pub trait RenderBackend {
    /// (Re)create the offscreen target.
    fn allocate(&mut self, width: usize, height: usize);
    /// Start drawing into the offscreen target, clearing it to `clear`.
    fn begin(&mut self, clear: Color);
    fn end(&mut self);
    fn set_fog(&mut self, fog: Option<Fog>);
    fn set_projection(&mut self, projection: Mat4);
    fn set_model_view(&mut self, model_view: Mat4);
    fn set_depth_test(&mut self, enabled: bool);
    /// Draw `indices.len() / 3` triangles in a single flat color.
    fn draw_elements(&mut self, vertices: &[Vec3], indices: &[u32], color: Color);
    /// Copy the offscreen target into `out`, resizing it if needed.
    fn read_to_pixels(&self, out: &mut RgbImage);
    /// Composite the offscreen target onto a host surface, top-left at (x, y).
    fn draw(&self, target: &mut FrameBuffer, x: f32, y: f32);
}

/// Linear fog keyed on eye-space distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub start: f32,
    pub end: f32,
    pub color: Color,
}

impl Fog {
    pub fn linear(start: f32, end: f32, color: Color) -> Self {
        Self { start, end, color }
    }

    /// 1.0 keeps the fragment color, 0.0 is fully fogged.
    pub fn factor(&self, distance: f32) -> f32 {
        let span = self.end - self.start;
        if span == 0.0 {
            return if distance < self.end { 1.0 } else { 0.0 };
        }
        ((self.end - distance) / span).clamp(0.0, 1.0)
    }

    pub fn apply(&self, color: Color, distance: f32) -> Color {
        self.color.lerp(&color, self.factor(distance))
    }
}

/// A vertex after the model-view and projection transforms.
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex {
    /// Pixel coordinates, y growing downward
    pub position: Vec2,
    /// Normalized device depth, -1.0 at the near plane
    pub depth: f32,
    /// Eye-space distance used for fog
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    pub depth: f32,
    pub distance: f32,
}
