//! moodlens-hw — camera snapshots for the capture surface.
//!
//! Opens a V4L2 device, negotiates MJPG or YUYV and hands back RGB stills.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat, SnapshotOptions};
pub use frame::FrameError;
