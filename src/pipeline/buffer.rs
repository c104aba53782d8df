use image::RgbImage;
use minifb::Window;
use rayon::prelude::*;

use crate::core::Color;
use crate::error::Result;

/// Packed 0x00RRGGBB color plus a depth value per pixel. Smaller depth wins.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
    pub depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let buf_size = width * height;
        FrameBuffer {
            width,
            height,
            data: vec![0; buf_size],
            depth: vec![f32::INFINITY; buf_size],
        }
    }

    pub fn clear(&mut self, color: Color) {
        let packed = color.to_u32();
        self.data.par_chunks_mut(1024).for_each(|chunk| {
            for point in chunk {
                *point = packed;
            }
        });
        self.depth.par_chunks_mut(1024).for_each(|chunk| {
            for d in chunk {
                *d = f32::INFINITY;
            }
        });
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.data[x + y * self.width])
    }

    /// Depth-tested write. Returns whether the pixel was written.
    #[inline]
    pub fn set_pixel(&mut self, pos: (usize, usize), depth: f32, color: u32) -> bool {
        if pos.0 < self.width && pos.1 < self.height {
            let index = pos.0 + pos.1 * self.width;
            if depth < self.depth[index] {
                self.data[index] = color;
                self.depth[index] = depth;
                return true;
            }
        }
        false
    }

    /// Write without consulting or updating depth.
    #[inline]
    pub fn put_pixel(&mut self, pos: (usize, usize), color: u32) {
        if pos.0 < self.width && pos.1 < self.height {
            self.data[pos.0 + pos.1 * self.width] = color;
        }
    }

    /// Copy this buffer's colors onto `target` with the top-left corner at
    /// (x, y). Whatever falls outside `target` is dropped.
    pub fn blit(&self, target: &mut FrameBuffer, x: i64, y: i64) {
        let src_x0 = x.saturating_neg().max(0) as usize;
        let src_y0 = y.saturating_neg().max(0) as usize;
        let dst_x0 = x.max(0) as usize;
        let dst_y0 = y.max(0) as usize;
        if src_x0 >= self.width
            || src_y0 >= self.height
            || dst_x0 >= target.width
            || dst_y0 >= target.height
        {
            return;
        }

        let cols = (self.width - src_x0).min(target.width - dst_x0);
        let rows = (self.height - src_y0).min(target.height - dst_y0);
        for row in 0..rows {
            let src = (src_y0 + row) * self.width + src_x0;
            let dst = (dst_y0 + row) * target.width + dst_x0;
            target.data[dst..dst + cols].copy_from_slice(&self.data[src..src + cols]);
        }
    }

    pub fn read_rgb(&self, out: &mut RgbImage) {
        if out.width() as usize != self.width || out.height() as usize != self.height {
            *out = RgbImage::new(self.width as u32, self.height as u32);
        }
        let raw: &mut [u8] = out;
        raw.par_chunks_mut(3)
            .zip(self.data.par_iter())
            .for_each(|(px, &packed)| {
                px[0] = ((packed >> 16) & 0xFF) as u8;
                px[1] = ((packed >> 8) & 0xFF) as u8;
                px[2] = (packed & 0xFF) as u8;
            });
    }

    pub fn present_window(&self, window: &mut Window) -> Result<()> {
        window.update_with_buffer(&self.data, self.width, self.height)?;
        Ok(())
    }
}
