use glam::Vec2;
use log::debug;
use rayon::prelude::*;

use crate::pipeline::{Fragment, ScreenVertex};

pub struct Rasterizer {
    width: usize,
    height: usize,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Modifies the fragment buffer in place. Triangles referencing a vertex
    /// that does not exist are skipped.
    pub fn rasterize(&self, vertices: &[ScreenVertex], indices: &[u32], frags: &mut Vec<Fragment>) {
        frags.clear();
        debug!("Processing {} triangles", indices.len() / 3);

        frags.par_extend(
            indices
                .par_chunks_exact(3)
                .filter_map(|tri| {
                    Some([
                        *vertices.get(tri[0] as usize)?,
                        *vertices.get(tri[1] as usize)?,
                        *vertices.get(tri[2] as usize)?,
                    ])
                })
                .flat_map_iter(|tri| self.rasterize_triangle_barycentric(tri)),
        );

        debug!("Generated {} fragments", frags.len());
    }

    /// Every pixel whose centre lies inside the triangle, with depth and fog
    /// distance interpolated from the corners.
    fn rasterize_triangle_barycentric(&self, verts: [ScreenVertex; 3]) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        if self.width == 0 || self.height == 0 {
            return fragments;
        }

        let (v0, v1, v2) = (verts[0].position, verts[1].position, verts[2].position);
        let bbox_min = v0.min(v1).min(v2);
        let bbox_max = v0.max(v1).max(v2);
        if !(bbox_min.is_finite() && bbox_max.is_finite()) {
            return fragments;
        }

        // Clamp bounding box to screen
        let x_min = bbox_min.x.floor().max(0.0);
        let y_min = bbox_min.y.floor().max(0.0);
        let x_max = bbox_max.x.ceil().min((self.width - 1) as f32);
        let y_max = bbox_max.y.ceil().min((self.height - 1) as f32);
        if x_min > x_max || y_min > y_max {
            return fragments;
        }

        for y in y_min as usize..=y_max as usize {
            for x in x_min as usize..=x_max as usize {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric(p, v0, v1, v2) else {
                    // Degenerate triangle
                    return fragments;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = verts[0].depth * w0 + verts[1].depth * w1 + verts[2].depth * w2;
                // outside the near/far slab
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }
                let distance =
                    verts[0].distance * w0 + verts[1].distance * w1 + verts[2].distance * w2;

                fragments.push(Fragment {
                    x,
                    y,
                    depth,
                    distance,
                });
            }
        }

        fragments
    }
}

fn barycentric(p: Vec2, v0: Vec2, v1: Vec2, v2: Vec2) -> Option<(f32, f32, f32)> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);
    if denom.abs() < 1e-10 {
        return None;
    }
    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;
    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32, y: f32, depth: f32) -> ScreenVertex {
        ScreenVertex {
            position: Vec2::new(x, y),
            depth,
            distance: 100.0 * (depth + 1.0),
        }
    }

    #[test]
    fn quad_covers_every_pixel_once_or_more() {
        let r = Rasterizer::new(8, 8);
        let verts = [
            vert(0.0, 0.0, 0.0),
            vert(4.0, 0.0, 0.0),
            vert(0.0, 4.0, 0.0),
            vert(4.0, 4.0, 0.0),
        ];
        let mut frags = Vec::new();
        r.rasterize(&verts, &[0, 1, 2, 1, 3, 2], &mut frags);

        let mut covered = [[false; 8]; 8];
        for f in &frags {
            covered[f.y][f.x] = true;
        }
        for (y, row) in covered.iter().enumerate() {
            for (x, &c) in row.iter().enumerate() {
                assert_eq!(c, x < 4 && y < 4, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn winding_does_not_matter() {
        let r = Rasterizer::new(8, 8);
        let verts = [vert(0.0, 0.0, 0.0), vert(6.0, 0.0, 0.0), vert(0.0, 6.0, 0.0)];
        let mut cw = Vec::new();
        let mut ccw = Vec::new();
        r.rasterize(&verts, &[0, 1, 2], &mut cw);
        r.rasterize(&verts, &[0, 2, 1], &mut ccw);
        assert!(!cw.is_empty());
        assert_eq!(cw.len(), ccw.len());
    }

    #[test]
    fn depth_and_distance_interpolate() {
        let r = Rasterizer::new(16, 1);
        // thin sliver along the row, depth ramps left to right
        let verts = [
            vert(0.0, -1.0, -0.5),
            vert(16.0, -1.0, 0.5),
            vert(0.0, 3.0, -0.5),
            vert(16.0, 3.0, 0.5),
        ];
        let mut frags = Vec::new();
        r.rasterize(&verts, &[0, 1, 2, 1, 3, 2], &mut frags);
        let left = frags.iter().find(|f| f.x == 0).unwrap();
        let right = frags.iter().find(|f| f.x == 15).unwrap();
        assert!(left.depth < right.depth);
        assert!(left.distance < right.distance);
        assert!((left.depth - (-0.5 + 0.5 / 16.0)).abs() < 1e-4);
    }

    #[test]
    fn fragments_beyond_depth_range_are_dropped() {
        let r = Rasterizer::new(4, 4);
        let verts = [vert(0.0, 0.0, 1.5), vert(4.0, 0.0, 1.5), vert(0.0, 4.0, 1.5)];
        let mut frags = Vec::new();
        r.rasterize(&verts, &[0, 1, 2], &mut frags);
        assert!(frags.is_empty());
    }

    #[test]
    fn offscreen_and_bad_indices_are_skipped() {
        let r = Rasterizer::new(4, 4);
        let verts = [
            vert(-20.0, -20.0, 0.0),
            vert(-10.0, -20.0, 0.0),
            vert(-20.0, -10.0, 0.0),
        ];
        let mut frags = Vec::new();
        r.rasterize(&verts, &[0, 1, 2, 0, 1, 7], &mut frags);
        assert!(frags.is_empty());
    }

    #[test]
    fn degenerate_triangle_produces_nothing() {
        let r = Rasterizer::new(4, 4);
        let verts = [vert(0.0, 0.0, 0.0), vert(2.0, 2.0, 0.0), vert(4.0, 4.0, 0.0)];
        let mut frags = Vec::new();
        r.rasterize(&verts, &[0, 1, 2], &mut frags);
        assert!(frags.is_empty());
    }
}
