use glam::{Mat4, Vec3};
use log::warn;

/// Fixed-function style model-view stack. Every operation post-multiplies the
/// top matrix, so calls read in the order they apply to the model.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    top: Mat4,
    saved: Vec<Mat4>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            top: Mat4::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub fn top(&self) -> Mat4 {
        self.top
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn load_identity(&mut self) {
        self.top = Mat4::IDENTITY;
    }

    pub fn push(&mut self) {
        self.saved.push(self.top);
    }

    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(m) => self.top = m,
            None => warn!("matrix stack underflow, pop ignored"),
        }
    }

    pub fn mult(&mut self, m: Mat4) {
        self.top *= m;
    }

    pub fn rotate_x(&mut self, degrees: f32) {
        self.mult(Mat4::from_rotation_x(degrees.to_radians()));
    }

    pub fn rotate_y(&mut self, degrees: f32) {
        self.mult(Mat4::from_rotation_y(degrees.to_radians()));
    }

    pub fn rotate_z(&mut self, degrees: f32) {
        self.mult(Mat4::from_rotation_z(degrees.to_radians()));
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.mult(Mat4::from_translation(offset));
    }

    pub fn scale(&mut self, factor: Vec3) {
        self.mult(Mat4::from_scale(factor));
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}
