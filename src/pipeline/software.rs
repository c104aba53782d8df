use glam::{Mat4, Vec2, Vec3};
use image::RgbImage;
use log::{debug, warn};
use rayon::prelude::*;

use super::{Fog, Fragment, FrameBuffer, Rasterizer, RenderBackend, ScreenVertex};
use crate::core::Color;

/// CPU implementation of [`RenderBackend`].
pub struct SoftwareRenderer {
    target: FrameBuffer,
    rasterizer: Rasterizer,
    projection: Mat4,
    model_view: Mat4,
    fog: Option<Fog>,
    depth_test: bool,
    drawing: bool,
    vertices: Vec<ScreenVertex>,
    fragments: Vec<Fragment>,
}

impl SoftwareRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            target: FrameBuffer::new(width, height),
            rasterizer: Rasterizer::new(width, height),
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            fog: None,
            depth_test: false,
            drawing: false,
            vertices: Vec::new(),
            fragments: Vec::with_capacity(width * height),
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.target
    }

    fn project_vertices(&mut self, vertices: &[Vec3]) {
        let model_view = self.model_view;
        let projection = self.projection;
        let (w, h) = (self.target.width as f32, self.target.height as f32);

        vertices
            .par_iter()
            .map(|&p| {
                let eye = model_view.transform_point3(p);
                let ndc = projection.project_point3(eye);
                ScreenVertex {
                    position: Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h),
                    depth: ndc.z,
                    distance: eye.z.abs(),
                }
            })
            .collect_into_vec(&mut self.vertices);
    }

    fn process_fragments(&mut self, color: Color) {
        let flat = color.to_u32();
        let mut written = 0usize;
        for frag in &self.fragments {
            let packed = match &self.fog {
                Some(fog) => fog.apply(color, frag.distance).to_u32(),
                None => flat,
            };
            if self.depth_test {
                if self.target.set_pixel((frag.x, frag.y), frag.depth, packed) {
                    written += 1;
                }
            } else {
                self.target.put_pixel((frag.x, frag.y), packed);
                written += 1;
            }
        }
        debug!("{} of {} fragments written", written, self.fragments.len());
    }
}

impl RenderBackend for SoftwareRenderer {
    fn allocate(&mut self, width: usize, height: usize) {
        self.target = FrameBuffer::new(width, height);
        self.rasterizer = Rasterizer::new(width, height);
    }

    fn begin(&mut self, clear: Color) {
        self.target.clear(clear);
        self.drawing = true;
    }

    fn end(&mut self) {
        self.drawing = false;
    }

    fn set_fog(&mut self, fog: Option<Fog>) {
        self.fog = fog;
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn set_model_view(&mut self, model_view: Mat4) {
        self.model_view = model_view;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn draw_elements(&mut self, vertices: &[Vec3], indices: &[u32], color: Color) {
        if !self.drawing {
            warn!("draw_elements called outside begin/end, ignored");
            return;
        }
        if indices.is_empty() {
            return;
        }
        self.project_vertices(vertices);
        self.rasterizer
            .rasterize(&self.vertices, indices, &mut self.fragments);
        self.process_fragments(color);
    }

    fn read_to_pixels(&self, out: &mut RgbImage) {
        self.target.read_rgb(out);
    }

    fn draw(&self, target: &mut FrameBuffer, x: f32, y: f32) {
        self.target
            .blit(target, x.round() as i64, y.round() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::red_of;

    /// Axis-aligned square in the z = `z` plane, covering the whole view of
    /// an identity projection.
    fn square(z: f32, half: f32) -> [Vec3; 4] {
        [
            Vec3::new(-half, -half, z),
            Vec3::new(half, -half, z),
            Vec3::new(-half, half, z),
            Vec3::new(half, half, z),
        ]
    }

    const QUAD: [u32; 6] = [0, 1, 2, 1, 3, 2];

    fn ortho(near: f32, far: f32) -> Mat4 {
        Mat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, near, far)
    }

    #[test]
    fn fog_encodes_distance_in_red() {
        let mut r = SoftwareRenderer::new(8, 8);
        r.set_projection(ortho(0.0, 1000.0));
        r.set_fog(Some(Fog::linear(0.0, 1000.0, Color::BLACK)));
        r.set_depth_test(true);
        r.begin(Color::BLACK);
        r.draw_elements(&square(-250.0, 2.0), &QUAD, Color::WHITE);
        r.end();

        let fb = r.framebuffer();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(red_of(fb.get_pixel(x, y).unwrap()), 191, "({x}, {y})");
            }
        }
    }

    #[test]
    fn depth_test_keeps_nearest_surface() {
        let mut r = SoftwareRenderer::new(4, 4);
        r.set_projection(ortho(0.0, 100.0));
        r.set_depth_test(true);
        r.begin(Color::BLACK);
        r.draw_elements(&square(-20.0, 2.0), &QUAD, Color::RED);
        r.draw_elements(&square(-60.0, 2.0), &QUAD, Color::BLUE);
        r.end();
        assert!(r.framebuffer().data.iter().all(|&p| p == 0xFF0000));

        r.set_depth_test(false);
        r.begin(Color::BLACK);
        r.draw_elements(&square(-20.0, 2.0), &QUAD, Color::RED);
        r.draw_elements(&square(-60.0, 2.0), &QUAD, Color::BLUE);
        r.end();
        assert!(r.framebuffer().data.iter().all(|&p| p == 0x0000FF));
    }

    #[test]
    fn geometry_past_far_plane_is_clipped() {
        let mut r = SoftwareRenderer::new(4, 4);
        r.set_projection(ortho(0.0, 100.0));
        r.begin(Color::BLACK);
        r.draw_elements(&square(-150.0, 2.0), &QUAD, Color::WHITE);
        r.end();
        assert!(r.framebuffer().data.iter().all(|&p| p == 0));
    }

    #[test]
    fn image_rows_run_top_down() {
        let mut r = SoftwareRenderer::new(4, 4);
        r.set_projection(ortho(0.0, 100.0));
        r.begin(Color::BLACK);
        // upper half of the view only
        let verts = [
            Vec3::new(-1.0, 0.0, -10.0),
            Vec3::new(1.0, 0.0, -10.0),
            Vec3::new(-1.0, 1.0, -10.0),
            Vec3::new(1.0, 1.0, -10.0),
        ];
        r.draw_elements(&verts, &QUAD, Color::WHITE);
        r.end();

        let fb = r.framebuffer();
        assert_eq!(fb.get_pixel(0, 0), Some(0xFFFFFF));
        assert_eq!(fb.get_pixel(3, 1), Some(0xFFFFFF));
        assert_eq!(fb.get_pixel(0, 2), Some(0));
        assert_eq!(fb.get_pixel(3, 3), Some(0));
    }

    #[test]
    fn drawing_outside_a_pass_is_ignored() {
        let mut r = SoftwareRenderer::new(4, 4);
        r.set_projection(ortho(0.0, 100.0));
        r.draw_elements(&square(-10.0, 2.0), &QUAD, Color::WHITE);
        assert!(r.framebuffer().data.iter().all(|&p| p == 0));
    }

    #[test]
    fn readback_and_draw_share_the_target() {
        let mut r = SoftwareRenderer::new(2, 2);
        r.begin(Color::GREEN);
        r.end();

        let mut img = RgbImage::new(0, 0);
        r.read_to_pixels(&mut img);
        assert_eq!(img.get_pixel(1, 1).0, [0, 255, 0]);

        let mut screen = FrameBuffer::new(4, 4);
        r.draw(&mut screen, 1.0, 2.0);
        assert_eq!(screen.get_pixel(1, 2), Some(0x00FF00));
        assert_eq!(screen.get_pixel(2, 3), Some(0x00FF00));
        assert_eq!(screen.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn draw_at_infinite_position_is_clipped() {
        let mut r = SoftwareRenderer::new(2, 2);
        r.begin(Color::WHITE);
        r.end();

        let mut screen = FrameBuffer::new(4, 4);
        r.draw(&mut screen, f32::NEG_INFINITY, 0.0);
        r.draw(&mut screen, 0.0, f32::INFINITY);
        assert!(screen.data.iter().all(|&p| p == 0));
    }
}
