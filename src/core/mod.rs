pub mod color;
pub mod pose;
pub mod transform;

pub use color::Color;
pub use pose::VirtualPose;
pub use transform::MatrixStack;

/// Pixel dimensions of a sensor stream and of every buffer derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// Depth stream of a Kinect for Windows v2.
pub const KINECT_V2: Resolution = Resolution::new(512, 424);
