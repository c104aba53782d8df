use std::fmt::Write as _;
use std::io::{self, stdout, Write};

use image::GrayImage;

/// Two image rows per terminal row: the upper pixel is drawn as the
/// foreground of '▀', the lower one as the background.
const HALF_BLOCK: char = '▀';

/// Nearest-neighbour scale `img` to `cols` x `rows` cells and encode it as
/// truecolor ANSI, starting at the home position.
pub fn render_ansi(img: &GrayImage, cols: usize, rows: usize) -> String {
    let mut output = String::new();
    let (w, h) = img.dimensions();
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return output;
    }

    output.push_str("\x1B[H"); // Move cursor to home position

    let sub_rows = rows * 2;
    let sample = |cx: usize, sy: usize| -> u8 {
        let x = (cx * w as usize / cols).min(w as usize - 1);
        let y = (sy * h as usize / sub_rows).min(h as usize - 1);
        img.get_pixel(x as u32, y as u32).0[0]
    };

    // Keep track of the last colors to minimize escape codes
    let mut last: Option<(u8, u8)> = None;
    for row in 0..rows {
        let _ = write!(output, "\x1B[{};1H", row + 1);
        for col in 0..cols {
            let top = sample(col, row * 2);
            let bottom = sample(col, row * 2 + 1);
            if last != Some((top, bottom)) {
                let _ = write!(
                    output,
                    "\x1b[38;2;{top};{top};{top}m\x1b[48;2;{bottom};{bottom};{bottom}m"
                );
                last = Some((top, bottom));
            }
            output.push(HALF_BLOCK);
        }
    }
    output.push_str("\x1b[0m");
    output
}

pub fn present_terminal(img: &GrayImage, cols: usize, rows: usize) -> io::Result<()> {
    let mut stdout = stdout();
    stdout.write_all(render_ansi(img, cols, rows).as_bytes())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn uniform_image_emits_one_color_change() {
        let img = GrayImage::from_pixel(16, 16, Luma([200]));
        let out = render_ansi(&img, 4, 2);
        assert_eq!(out.matches("\x1b[38;2;").count(), 1);
        assert_eq!(out.matches(HALF_BLOCK).count(), 8);
        assert!(out.contains("200;200;200m"));
    }

    #[test]
    fn upper_and_lower_halves_split_per_cell() {
        let mut img = GrayImage::new(1, 2);
        img.put_pixel(0, 0, Luma([255]));
        let out = render_ansi(&img, 1, 1);
        assert!(out.contains("\x1b[38;2;255;255;255m"));
        assert!(out.contains("\x1b[48;2;0;0;0m"));
    }

    #[test]
    fn empty_viewport_renders_nothing() {
        let img = GrayImage::new(4, 4);
        assert!(render_ansi(&img, 0, 10).is_empty());
    }
}
