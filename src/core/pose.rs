use glam::{Mat4, Vec3};

use super::{transform::MatrixStack, Resolution};

/// Where the virtual camera sits relative to the sensor's point cloud, and how
/// it projects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualPose {
    pub position: Vec3,
    /// Degrees, applied X then Y then Z before the translation
    pub scene_rotation: Vec3,
    /// Degrees, applied X then Y then Z after the translation
    pub camera_rotation: Vec3,
    /// World units per output pixel
    pub ortho_scale: f32,
    pub near: f32,
    pub far: f32,
    pub horizontal_flip: bool,
}

impl Default for VirtualPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scene_rotation: Vec3::ZERO,
            camera_rotation: Vec3::ZERO,
            ortho_scale: 10.0,
            near: 0.0,
            far: 1024.0,
            horizontal_flip: true,
        }
    }
}

impl VirtualPose {
    /// Orthographic box centred on the view axis, one output pixel spanning
    /// `ortho_scale` world units.
    pub fn projection_matrix(&self, resolution: Resolution) -> Mat4 {
        let half_w = resolution.width as f32 / 2.0 * self.ortho_scale;
        let half_h = resolution.height as f32 / 2.0 * self.ortho_scale;
        Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    /// Scene rotation, translation, camera rotation, then the mirror. The
    /// extra half turn about Z and the Z flip bring sensor space (y down,
    /// z forward) into a view looking down -Z.
    pub fn apply_model_view(&self, stack: &mut MatrixStack) {
        stack.rotate_x(self.scene_rotation.x);
        stack.rotate_y(self.scene_rotation.y);
        stack.rotate_z(self.scene_rotation.z - 180.0);
        stack.translate(self.position);
        stack.rotate_x(self.camera_rotation.x);
        stack.rotate_y(self.camera_rotation.y);
        stack.rotate_z(self.camera_rotation.z);

        let mirror = if self.horizontal_flip { -1.0 } else { 1.0 };
        stack.scale(Vec3::new(mirror, 1.0, -1.0));
    }

    pub fn model_view_matrix(&self) -> Mat4 {
        let mut stack = MatrixStack::new();
        self.apply_model_view(&mut stack);
        stack.top()
    }

    /// Linear inverse of the fog ramp: 0 is the far plane, 255 the near one.
    pub fn gray_to_distance(&self, value: u8) -> f32 {
        (1.0 - value as f32 / 255.0) * (self.far - self.near) + self.near
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KINECT_V2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn default_pose_keeps_sensor_right_on_screen_right() {
        let pose = VirtualPose::default();
        let mv = pose.model_view_matrix();
        // sensor space: x right, y down, z forward
        let p = mv.transform_point3(Vec3::new(1.0, 2.0, 500.0));
        assert!(approx(p, Vec3::new(1.0, -2.0, -500.0)), "{p}");
    }

    #[test]
    fn disabling_flip_mirrors_x() {
        let pose = VirtualPose {
            horizontal_flip: false,
            ..Default::default()
        };
        let p = pose.model_view_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(p, Vec3::new(-1.0, 0.0, 0.0)), "{p}");
    }

    #[test]
    fn position_is_applied_in_view_space() {
        let pose = VirtualPose {
            position: Vec3::new(0.0, 0.0, -100.0),
            ..Default::default()
        };
        let p = pose.model_view_matrix().transform_point3(Vec3::new(0.0, 0.0, 500.0));
        assert!(approx(p, Vec3::new(0.0, 0.0, -600.0)), "{p}");
    }

    #[test]
    fn projection_maps_half_extent_to_ndc_edge() {
        let pose = VirtualPose {
            ortho_scale: 2.0,
            near: 0.0,
            far: 1000.0,
            ..Default::default()
        };
        let proj = pose.projection_matrix(KINECT_V2);
        let edge = proj.project_point3(Vec3::new(512.0, 424.0, -500.0));
        assert!((edge.x - 1.0).abs() < 1e-5);
        assert!((edge.y - 1.0).abs() < 1e-5);
        assert!(edge.z.abs() < 1e-5);
    }

    #[test]
    fn gray_to_distance_spans_clip_range() {
        let pose = VirtualPose {
            near: 200.0,
            far: 1200.0,
            ..Default::default()
        };
        assert!((pose.gray_to_distance(0) - 1200.0).abs() < 1e-3);
        assert!((pose.gray_to_distance(255) - 200.0).abs() < 1e-3);
        let mut last = f32::INFINITY;
        for v in 0..=255u8 {
            let d = pose.gray_to_distance(v);
            assert!(d < last);
            last = d;
        }
    }
}
