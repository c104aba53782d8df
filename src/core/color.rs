#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32, // Red component (0.0 - 1.0)
    pub g: f32, // Green component (0.0 - 1.0)
    pub b: f32, // Blue component (0.0 - 1.0)
}

impl Color {
    /// Create a new color with RGB components normalized.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Grey level, all three channels equal.
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    const fn hex_char_to_u8(c: char) -> u8 {
        match c {
            '0'..='9' => (c as u8) - b'0',
            'a'..='f' => (c as u8) - b'a' + 10,
            'A'..='F' => (c as u8) - b'A' + 10,
            _ => 0,
        }
    }

    const fn hex_pair_to_u8(high: char, low: char) -> u8 {
        (Self::hex_char_to_u8(high) << 4) | Self::hex_char_to_u8(low)
    }

    /// Only used to build the constants below.
    const fn hex(hex: &str) -> Self {
        let bytes = hex.as_bytes();
        let offset = if bytes[0] == b'#' { 1 } else { 0 };

        let r =
            Self::hex_pair_to_u8(bytes[offset] as char, bytes[offset + 1] as char) as f32 / 255.0;
        let g = Self::hex_pair_to_u8(bytes[offset + 2] as char, bytes[offset + 3] as char) as f32
            / 255.0;
        let b = Self::hex_pair_to_u8(bytes[offset + 4] as char, bytes[offset + 5] as char) as f32
            / 255.0;

        Self { r, g, b }
    }

    /// Quantize a channel to a byte, rounding to nearest.
    fn channel_to_u8(c: f32) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            Self::channel_to_u8(self.r),
            Self::channel_to_u8(self.g),
            Self::channel_to_u8(self.b),
        ]
    }

    /// Pack as 0x00RRGGBB, the layout minifb expects.
    pub fn to_u32(&self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    pub fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as f32 / 255.0,
            g: ((packed >> 8) & 0xFF) as f32 / 255.0,
            b: (packed & 0xFF) as f32 / 255.0,
        }
    }

    pub fn lerp(&self, end: &Color, t: f32) -> Color {
        Color {
            r: self.r + (end.r - self.r) * t,
            g: self.g + (end.g - self.g) * t,
            b: self.b + (end.b - self.b) * t,
        }
    }
}

/// Red byte of a packed 0x00RRGGBB pixel.
#[inline]
pub fn red_of(packed: u32) -> u8 {
    ((packed >> 16) & 0xFF) as u8
}

// Predefined colors
impl Color {
    pub const BLACK: Color = Color::hex("000000");
    pub const WHITE: Color = Color::hex("FFFFFF");
    pub const RED: Color = Color::hex("FF0000");
    pub const GREEN: Color = Color::hex("00FF00");
    pub const BLUE: Color = Color::hex("0000FF");
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_in_minifb_order() {
        assert_eq!(Color::RED.to_u32(), 0x00FF0000);
        assert_eq!(Color::GREEN.to_u32(), 0x0000FF00);
        assert_eq!(Color::BLUE.to_u32(), 0x000000FF);
        assert_eq!(Color::WHITE.to_u32(), 0x00FFFFFF);
        assert_eq!(red_of(Color::new(0.5, 1.0, 0.0).to_u32()), 128);
    }

    #[test]
    fn unpacking_recovers_byte_values() {
        let c = Color::from_u32(0x00336699);
        assert_eq!(c.to_rgb8(), [0x33, 0x66, 0x99]);
    }

    #[test]
    fn out_of_range_channels_saturate() {
        assert_eq!(Color::new(1.5, -0.2, 0.0).to_rgb8(), [255, 0, 0]);
    }

    #[test]
    fn lerp_hits_both_ends() {
        let a = Color::BLACK;
        let b = Color::WHITE;
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Color::gray(0.5));
    }
}
