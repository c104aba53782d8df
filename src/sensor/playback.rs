use std::path::{Path, PathBuf};

use glam::Vec3;
use log::{debug, info};

use super::{DepthSensor, Intrinsics};
use crate::core::Resolution;
use crate::error::{Error, Result};

/// Replays a directory of 16-bit grayscale PNG depth frames, one per update,
/// looping at the end. Pixel values are depth in world units, 0 for no data.
pub struct PlaybackSensor {
    dir: PathBuf,
    resolution: Resolution,
    intrinsics: Intrinsics,
    frames: Vec<Vec<f32>>,
    current: Option<usize>,
    started: bool,
    new_frame: bool,
}

impl PlaybackSensor {
    pub fn new(dir: impl AsRef<Path>, resolution: Resolution, intrinsics: Intrinsics) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            resolution,
            intrinsics,
            frames: Vec::new(),
            current: None,
            started: false,
            new_frame: false,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn load_frame(&self, path: &Path) -> Result<Vec<f32>> {
        let img = image::open(path)?.to_luma16();
        let (w, h) = img.dimensions();
        if w as usize != self.resolution.width || h as usize != self.resolution.height {
            return Err(Error::SensorUnavailable(format!(
                "{} is {}x{}, expected {}x{}",
                path.display(),
                w,
                h,
                self.resolution.width,
                self.resolution.height
            )));
        }
        Ok(img.into_raw().into_iter().map(|v| v as f32).collect())
    }
}

impl DepthSensor for PlaybackSensor {
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

        let paths = self.frame_paths()?;
        if paths.is_empty() {
            return Err(Error::SensorUnavailable(format!(
                "no PNG frames in {}",
                self.dir.display()
            )));
        }
        self.frames = paths
            .iter()
            .map(|p| self.load_frame(p))
            .collect::<Result<_>>()?;
        info!(
            "playback sensor loaded {} frames from {}",
            self.frames.len(),
            self.dir.display()
        );
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::SensorUnavailable(
                "playback sensor started before open".into(),
            ));
        }
        self.started = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.started = false;
        self.frames.clear();
        self.current = None;
        debug!("playback sensor closed");
        Ok(())
    }

    fn update(&mut self) {
        self.new_frame = false;
        if !self.started || self.frames.is_empty() {
            return;
        }
        let next = self.current.map_or(0, |i| (i + 1) % self.frames.len());
        self.current = Some(next);
        self.new_frame = true;
    }

    fn is_frame_new(&self) -> bool {
        self.new_frame
    }

    fn world_coordinate_at(&self, x: usize, y: usize) -> Vec3 {
        match self.depth_pixels() {
            Some(depth) => self
                .intrinsics
                .deproject(x, y, depth[self.resolution.index(x, y)]),
            None => Vec3::ZERO,
        }
    }

    fn depth_pixels(&self) -> Option<&[f32]> {
        self.current
            .and_then(|i| self.frames.get(i))
            .map(|f| f.as_slice())
    }
}
