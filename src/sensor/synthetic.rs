use glam::Vec3;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{DepthSensor, Intrinsics};
use crate::core::{Resolution, KINECT_V2};
use crate::error::{Error, Result};

/// Procedural stand-in for a depth camera: a flat back wall with a sphere
/// circling in front of it.
pub struct SyntheticSensor {
    resolution: Resolution,
    intrinsics: Intrinsics,
    depth: Vec<f32>,
    has_depth: bool,
    opened: bool,
    started: bool,
    new_frame: bool,
    ticks: u64,
    frames: u64,
    /// A frame is delivered every `frame_interval` updates
    pub frame_interval: u64,
    /// Fraction of pixels reported as missing, 0.0 - 1.0
    pub dropout: f64,
    pub wall_depth: f32,
    pub sphere_radius: f32,
    pub sphere_depth: f32,
    pub orbit_radius: f32,
    /// Radians per delivered frame
    pub orbit_speed: f32,
    rng: StdRng,
}

impl SyntheticSensor {
    pub fn new(resolution: Resolution, intrinsics: Intrinsics) -> Self {
        Self {
            resolution,
            intrinsics,
            depth: vec![0.0; resolution.len()],
            has_depth: false,
            opened: false,
            started: false,
            new_frame: false,
            ticks: 0,
            frames: 0,
            frame_interval: 1,
            dropout: 0.0,
            wall_depth: 900.0,
            sphere_radius: 120.0,
            sphere_depth: 600.0,
            orbit_radius: 150.0,
            orbit_speed: 0.05,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    pub fn kinect_v2() -> Self {
        Self::new(KINECT_V2, Intrinsics::KINECT_V2)
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout.clamp(0.0, 1.0);
        self
    }

    pub fn with_frame_interval(mut self, interval: u64) -> Self {
        self.frame_interval = interval.max(1);
        self
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames
    }

    fn sphere_center(&self) -> Vec3 {
        let angle = self.frames as f32 * self.orbit_speed;
        Vec3::new(
            self.orbit_radius * angle.cos(),
            self.orbit_radius * 0.5 * angle.sin(),
            self.sphere_depth,
        )
    }

    /// Nearest hit along the pixel ray, expressed as z (ray has unit z).
    fn trace(&self, ray: Vec3, center: Vec3) -> f32 {
        let a = ray.length_squared();
        let b = -2.0 * ray.dot(center);
        let c = center.length_squared() - self.sphere_radius * self.sphere_radius;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let t = (-b - disc.sqrt()) / (2.0 * a);
            if t > 0.0 && t < self.wall_depth {
                return t;
            }
        }
        self.wall_depth
    }

    fn render_frame(&mut self) {
        let center = self.sphere_center();
        let Resolution { width, height } = self.resolution;
        for y in 0..height {
            for x in 0..width {
                let z = self.trace(self.intrinsics.ray(x, y), center);
                let dropped = self.dropout > 0.0 && self.rng.gen_bool(self.dropout);
                self.depth[y * width + x] = if dropped { 0.0 } else { z };
            }
        }
        self.has_depth = true;
        self.frames += 1;
    }
}

impl DepthSensor for SyntheticSensor {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn open(&mut self, color: bool, depth: bool) -> Result<()> {
        if color {
            return Err(Error::StreamUnsupported("color"));
        }
        if !depth {
            return Err(Error::StreamUnsupported("depth"));
        }
        self.opened = true;
        info!(
            "synthetic sensor opened at {}x{}",
            self.resolution.width, self.resolution.height
        );
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.opened {
            return Err(Error::SensorUnavailable(
                "synthetic sensor started before open".into(),
            ));
        }
        self.started = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.started = false;
        self.opened = false;
        debug!("synthetic sensor closed after {} frames", self.frames);
        Ok(())
    }

    fn update(&mut self) {
        self.new_frame = false;
        if !self.started {
            return;
        }
        self.ticks += 1;
        if self.ticks % self.frame_interval == 0 {
            self.render_frame();
            self.new_frame = true;
        }
    }

    fn is_frame_new(&self) -> bool {
        self.new_frame
    }

    fn world_coordinate_at(&self, x: usize, y: usize) -> Vec3 {
        let d = self.depth[self.resolution.index(x, y)];
        self.intrinsics.deproject(x, y, d)
    }

    fn depth_pixels(&self) -> Option<&[f32]> {
        self.has_depth.then_some(self.depth.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(sensor: &mut SyntheticSensor) {
        sensor.open(false, true).unwrap();
        sensor.start().unwrap();
    }

    #[test]
    fn no_depth_until_first_frame() {
        let mut sensor = SyntheticSensor::new(Resolution::new(32, 24), Intrinsics::KINECT_V2);
        assert!(sensor.depth_pixels().is_none());
        sensor.update();
        assert!(!sensor.is_frame_new(), "not started yet");
        started(&mut sensor);
        sensor.update();
        assert!(sensor.is_frame_new());
        assert_eq!(sensor.depth_pixels().unwrap().len(), 32 * 24);
    }

    #[test]
    fn frames_arrive_at_interval() {
        let mut sensor = SyntheticSensor::kinect_v2().with_frame_interval(3);
        started(&mut sensor);
        let pattern: Vec<bool> = (0..6)
            .map(|_| {
                sensor.update();
                sensor.is_frame_new()
            })
            .collect();
        assert_eq!(pattern, [false, false, true, false, false, true]);
        assert_eq!(sensor.frames_delivered(), 2);
    }

    #[test]
    fn sphere_sits_in_front_of_wall() {
        let res = Resolution::new(64, 48);
        let mut sensor = SyntheticSensor::new(res, Intrinsics::centered(res, 60.0));
        sensor.orbit_radius = 0.0;
        started(&mut sensor);
        sensor.update();

        let depth = sensor.depth_pixels().unwrap();
        let centre = depth[res.index(32, 24)];
        let corner = depth[res.index(0, 0)];
        assert!((centre - (sensor.sphere_depth - sensor.sphere_radius)).abs() < 1.0);
        assert_eq!(corner, sensor.wall_depth);

        let p = sensor.world_coordinate_at(0, 0);
        assert_eq!(p.z, sensor.wall_depth);
        assert!(p.x < 0.0 && p.y < 0.0);
    }

    #[test]
    fn dropout_zeroes_some_pixels() {
        let res = Resolution::new(64, 48);
        let mut sensor = SyntheticSensor::new(res, Intrinsics::centered(res, 60.0)).with_dropout(0.5);
        started(&mut sensor);
        sensor.update();
        let zeros = sensor
            .depth_pixels()
            .unwrap()
            .iter()
            .filter(|&&d| d == 0.0)
            .count();
        assert!(zeros > res.len() / 4 && zeros < res.len() * 3 / 4, "{zeros}");
    }

    #[test]
    fn open_requires_depth_only() {
        let mut sensor = SyntheticSensor::kinect_v2();
        assert!(matches!(
            sensor.open(false, false),
            Err(Error::StreamUnsupported("depth"))
        ));
        assert!(matches!(
            sensor.open(true, true),
            Err(Error::StreamUnsupported("color"))
        ));
        assert!(sensor.start().is_err());
    }
}
