use glam::Vec3;

use crate::core::Resolution;
use crate::error::Result;

pub mod playback;
pub mod synthetic;

pub use playback::PlaybackSensor;
pub use synthetic::SyntheticSensor;

/// What the virtual camera needs from a depth device.
///
/// `update` is polled once per host tick; `is_frame_new` reports whether that
/// poll delivered a frame. Coordinates and depth are in the same world units.
pub trait DepthSensor {
    /// Fixed size of the depth image, known before `open`.
    fn resolution(&self) -> Resolution;
    fn open(&mut self, color: bool, depth: bool) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn update(&mut self);
    fn is_frame_new(&self) -> bool;
    fn world_coordinate_at(&self, x: usize, y: usize) -> Vec3;
    /// Row-major depth image, `None` while no depth has been received.
    fn depth_pixels(&self) -> Option<&[f32]>;
}

/// Pinhole model of a depth camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    /// Factory calibration typical of a Kinect v2 depth stream.
    pub const KINECT_V2: Intrinsics = Intrinsics {
        fx: 365.456,
        fy: 365.456,
        cx: 254.878,
        cy: 205.395,
    };

    /// Centred principal point, `fx` pixels of focal length.
    pub fn centered(resolution: Resolution, focal: f32) -> Self {
        Self {
            fx: focal,
            fy: focal,
            cx: resolution.width as f32 / 2.0,
            cy: resolution.height as f32 / 2.0,
        }
    }

    /// Pixel centre to 3D point, y growing downward like the image rows.
    pub fn deproject(&self, x: usize, y: usize, depth: f32) -> Vec3 {
        Vec3::new(
            (x as f32 + 0.5 - self.cx) / self.fx * depth,
            (y as f32 + 0.5 - self.cy) / self.fy * depth,
            depth,
        )
    }

    /// Direction through a pixel centre with unit z.
    pub fn ray(&self, x: usize, y: usize) -> Vec3 {
        self.deproject(x, y, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_point_deprojects_onto_axis() {
        let k = Intrinsics {
            fx: 100.0,
            fy: 100.0,
            cx: 10.5,
            cy: 20.5,
        };
        assert_eq!(k.deproject(10, 20, 800.0), Vec3::new(0.0, 0.0, 800.0));
    }

    #[test]
    fn deprojection_scales_with_depth() {
        let k = Intrinsics::KINECT_V2;
        let near = k.deproject(400, 50, 500.0);
        let far = k.deproject(400, 50, 1000.0);
        assert!((far - near * 2.0).length() < 1e-3);
        assert!(near.x > 0.0 && near.y < 0.0);
    }
}
