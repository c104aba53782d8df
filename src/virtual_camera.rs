use glam::Vec3;
use image::{GrayImage, RgbImage};
use log::{debug, info};

use crate::config::Settings;
use crate::core::{Color, MatrixStack, Resolution, VirtualPose};
use crate::error::Result;
use crate::pipeline::{Fog, FrameBuffer, RenderBackend};
use crate::sensor::DepthSensor;
use crate::surface::SurfaceMesh;

/// Re-projects a depth sensor's surface through an orthographic virtual
/// camera and hands back the result as an 8-bit depth image, brighter is
/// nearer.
pub struct VirtualDepthCamera<S: DepthSensor, R: RenderBackend> {
    sensor: S,
    renderer: R,
    resolution: Resolution,
    surface: SurfaceMesh,
    color_image: RgbImage,
    gray_image: GrayImage,
    matrices: MatrixStack,
    pose: VirtualPose,
    max_length: f32,
    step_size: usize,
    new_frame: bool,
    skipped_frames: u64,
}

impl<S: DepthSensor, R: RenderBackend> VirtualDepthCamera<S, R> {
    /// Buffers are sized to the sensor's resolution.
    pub fn new(sensor: S, renderer: R) -> Self {
        let resolution = sensor.resolution();
        let defaults = Settings::default();
        Self {
            sensor,
            renderer,
            resolution,
            surface: SurfaceMesh::new(resolution),
            color_image: RgbImage::new(resolution.width as u32, resolution.height as u32),
            gray_image: GrayImage::new(resolution.width as u32, resolution.height as u32),
            matrices: MatrixStack::new(),
            pose: defaults.pose,
            max_length: defaults.max_length,
            step_size: defaults.step_size,
            new_frame: false,
            skipped_frames: 0,
        }
    }

    /// Allocate every buffer at sensor resolution, then open the depth stream
    /// and start it.
    pub fn setup(&mut self) -> Result<()> {
        self.resolution = self.sensor.resolution();
        let Resolution { width, height } = self.resolution;
        self.surface = SurfaceMesh::new(self.resolution);
        self.renderer.allocate(width, height);
        self.color_image = RgbImage::new(width as u32, height as u32);
        self.gray_image = GrayImage::new(width as u32, height as u32);

        self.sensor.open(false, true)?;
        self.sensor.start()?;
        info!("virtual depth camera running at {}x{}", width, height);
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.sensor.close()
    }

    pub fn update(&mut self) {
        self.sensor.update();
        if !self.sensor.is_frame_new() {
            return;
        }
        self.new_frame = true;

        let cells = self.resolution.len();
        let sensor = &self.sensor;
        let Some(depth) = sensor.depth_pixels().filter(|d| d.len() == cells) else {
            self.skipped_frames += 1;
            debug!("frame without usable depth, keeping previous output");
            return;
        };
        self.surface
            .resample(self.step_size, |x, y| sensor.world_coordinate_at(x, y));
        self.surface
            .triangulate(depth, self.step_size, self.max_length);

        self.render_camera();
        self.update_pixels();
    }

    fn render_camera(&mut self) {
        let pose = self.pose;
        self.renderer.begin(Color::BLACK);
        self.renderer
            .set_fog(Some(Fog::linear(pose.near, pose.far, Color::BLACK)));
        self.renderer
            .set_projection(pose.projection_matrix(self.resolution));

        self.matrices.push();
        self.matrices.load_identity();
        pose.apply_model_view(&mut self.matrices);
        self.renderer.set_model_view(self.matrices.top());

        self.renderer.set_depth_test(true);
        self.renderer.draw_elements(
            self.surface.points(),
            self.surface.indices(),
            Color::WHITE,
        );
        self.matrices.pop();

        self.renderer.set_fog(None);
        self.renderer.set_depth_test(false);
        self.renderer.end();
    }

    /// Red channel of the render, one byte per pixel.
    fn update_pixels(&mut self) {
        self.renderer.read_to_pixels(&mut self.color_image);
        for (gray, rgb) in self
            .gray_image
            .pixels_mut()
            .zip(self.color_image.pixels())
        {
            gray.0[0] = rgb.0[0];
        }
    }

    /// True once per frame processed since the previous call.
    pub fn is_frame_new(&mut self) -> bool {
        std::mem::take(&mut self.new_frame)
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.gray_image
    }

    pub fn pixels_mut(&mut self) -> &mut GrayImage {
        &mut self.gray_image
    }

    /// Composite the last render onto `target` at (x, y).
    pub fn draw(&self, target: &mut FrameBuffer, x: f32, y: f32) {
        self.renderer.draw(target, x, y);
    }

    pub fn width(&self) -> usize {
        self.resolution.width
    }

    pub fn height(&self) -> usize {
        self.resolution.height
    }

    pub fn surface(&self) -> &SurfaceMesh {
        &self.surface
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn pose(&self) -> &VirtualPose {
        &self.pose
    }

    /// Frames that arrived without a usable depth image.
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn gray_to_distance(&self, value: u8) -> f32 {
        self.pose.gray_to_distance(value)
    }

    pub fn set_max_length(&mut self, max_length: f32) {
        self.max_length = max_length;
    }

    pub fn set_step_size(&mut self, step_size: usize) {
        self.step_size = step_size;
    }

    pub fn set_clipping(&mut self, near: f32, far: f32) {
        self.pose.near = near;
        self.pose.far = far;
    }

    pub fn set_ortho_scale(&mut self, ortho_scale: f32) {
        self.pose.ortho_scale = ortho_scale;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.pose.position = position;
    }

    pub fn set_camera_rotation(&mut self, rotation: Vec3) {
        self.pose.camera_rotation = rotation;
    }

    pub fn set_scene_rotation(&mut self, rotation: Vec3) {
        self.pose.scene_rotation = rotation;
    }

    pub fn set_horizontal_flip(&mut self, horizontal_flip: bool) {
        self.pose.horizontal_flip = horizontal_flip;
    }

    pub fn apply(&mut self, settings: &Settings) {
        self.set_max_length(settings.max_length);
        self.set_step_size(settings.step_size);
        self.set_clipping(settings.pose.near, settings.pose.far);
        self.set_ortho_scale(settings.pose.ortho_scale);
        self.set_position(settings.pose.position);
        self.set_camera_rotation(settings.pose.camera_rotation);
        self.set_scene_rotation(settings.pose.scene_rotation);
        self.set_horizontal_flip(settings.pose.horizontal_flip);
    }
}
