use glam::Vec3;
use log::debug;

use crate::core::Resolution;

/// World-space sample grid plus the triangle list stitched over it.
///
/// Both live at full sensor resolution; the stride only decides which cells
/// get refreshed and which get connected, so indices always address the full
/// grid directly.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    resolution: Resolution,
    points: Vec<Vec3>,
    indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            points: vec![Vec3::ZERO; resolution.len()],
            indices: Vec::with_capacity(resolution.len() * 3),
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Overwrite every `stride`-th cell in both directions. Cells in between
    /// keep whatever they held before.
    pub fn resample<F>(&mut self, stride: usize, mut world_at: F)
    where
        F: FnMut(usize, usize) -> Vec3,
    {
        let stride = stride.max(1);
        let Resolution { width, height } = self.resolution;
        for y in (0..height).step_by(stride) {
            for x in (0..width).step_by(stride) {
                self.points[y * width + x] = world_at(x, y);
            }
        }
    }

    /// Rebuild the index list from a depth image, two triangles per quad at
    /// most. A triangle is kept only when its three corners carry depth and
    /// the two edges leaving its right-angle corner stay under `max_length`.
    pub fn triangulate(&mut self, depth: &[f32], stride: usize, max_length: f32) {
        let stride = stride.max(1);
        let Resolution { width, height } = self.resolution;
        debug_assert!(depth.len() >= width * height);

        self.indices.clear();
        let row = stride * width;

        for y in (0..height.saturating_sub(stride)).step_by(stride) {
            for x in (0..width.saturating_sub(stride)).step_by(stride) {
                let nwi = y * width + x;
                let nei = nwi + stride;
                let swi = nwi + row;
                let sei = swi + stride;

                let nw = depth[nwi];
                let ne = depth[nei];
                let sw = depth[swi];
                let se = depth[sei];

                if nw != 0.0
                    && ne != 0.0
                    && sw != 0.0
                    && (nw - ne).abs() < max_length
                    && (nw - sw).abs() < max_length
                {
                    self.indices
                        .extend_from_slice(&[nwi as u32, nei as u32, swi as u32]);
                }

                if ne != 0.0
                    && se != 0.0
                    && sw != 0.0
                    && (sw - se).abs() < max_length
                    && (ne - se).abs() < max_length
                {
                    self.indices
                        .extend_from_slice(&[nei as u32, sei as u32, swi as u32]);
                }
            }
        }

        debug!(
            "triangulated {} triangles at stride {}",
            self.triangle_count(),
            stride
        );
    }
}

/// Upper bound on the index count `triangulate` can emit.
pub fn max_index_count(resolution: Resolution, stride: usize) -> usize {
    let stride = stride.max(1);
    let quads_x = resolution.width.saturating_sub(stride).div_ceil(stride);
    let quads_y = resolution.height.saturating_sub(stride).div_ceil(stride);
    3 * quads_x * quads_y * 2
}
