pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod sensor;
pub mod surface;
pub mod virtual_camera;

pub use config::{create_clap_command, handle_clap_matches, Settings};
pub use crate::core::{Color, Resolution, VirtualPose, KINECT_V2};
pub use error::{Error, Result};
pub use pipeline::{FrameBuffer, RenderBackend, SoftwareRenderer};
pub use sensor::{DepthSensor, Intrinsics, PlaybackSensor, SyntheticSensor};
pub use surface::SurfaceMesh;
pub use virtual_camera::VirtualDepthCamera;
