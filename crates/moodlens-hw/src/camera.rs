//! V4L2 camera snapshots via the `v4l` crate.

use crate::frame::{self, FrameError};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Fraction of near-black pixels above which a frame is discarded.
const DARK_FRAME_THRESHOLD: f32 = 0.95;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
    #[error("frame conversion failed: {0}")]
    Frame(#[from] FrameError),
    #[error("only dark frames after {0} attempts")]
    AllFramesDark(usize),
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Motion-JPEG, one JPEG per buffer.
    Mjpg,
    /// YUYV 4:2:2 packed, 2 bytes per pixel.
    Yuyv,
}

/// Knobs for [`Camera::snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    /// Frames discarded first so auto-exposure can settle.
    pub warmup_frames: usize,
    /// Upper bound on frames read while looking for a non-dark one.
    pub max_attempts: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            warmup_frames: 4,
            max_attempts: 6,
        }
    }
}

/// V4L2 camera device handle.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open a capture device (e.g. "/dev/video0") and negotiate a color format
    /// near the requested resolution. MJPG is preferred, YUYV accepted.
    pub fn open(device_path: &str, width: u32, height: u32) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to query capabilities: {e}")))?;
        tracing::info!(device = device_path, driver = %caps.driver, card = %caps.card, "opened camera");

        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        let mut fmt = device
            .format()
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to get format: {e}")))?;
        fmt.width = width;
        fmt.height = height;

        let mut negotiated = None;
        for wanted in [b"MJPG", b"YUYV"] {
            fmt.fourcc = FourCC::new(wanted);
            let got = device
                .set_format(&fmt)
                .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to set format: {e}")))?;
            if let Some(pixel_format) = pixel_format_for(got.fourcc) {
                negotiated = Some((got, pixel_format));
                break;
            }
        }

        let Some((got, pixel_format)) = negotiated else {
            return Err(CameraError::FormatNegotiationFailed(
                "device offers neither MJPG nor YUYV".to_string(),
            ));
        };

        tracing::info!(
            width = got.width,
            height = got.height,
            fourcc = ?got.fourcc,
            "negotiated format"
        );

        Ok(Self {
            device,
            width: got.width,
            height: got.height,
            device_path: device_path.to_string(),
            fourcc: got.fourcc,
            pixel_format,
        })
    }

    /// Capture one still as RGB, skipping warm-up and dark frames.
    pub fn snapshot(&self, options: SnapshotOptions) -> Result<RgbImage, CameraError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CameraError::CaptureFailed(format!("failed to create mmap stream: {e}")))?;

        for _ in 0..options.warmup_frames {
            stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;
        }

        let attempts = options.max_attempts.max(1);
        for _ in 0..attempts {
            let (buf, meta) = stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

            let rgb = self.to_rgb(payload(buf, meta.bytesused))?;
            if frame::is_dark_frame(&rgb, DARK_FRAME_THRESHOLD) {
                tracing::debug!(seq = meta.sequence, "skipping dark frame");
                continue;
            }

            tracing::debug!(
                seq = meta.sequence,
                brightness = frame::avg_brightness(&rgb),
                "snapshot captured"
            );
            return Ok(rgb);
        }

        Err(CameraError::AllFramesDark(attempts))
    }

    fn to_rgb(&self, buf: &[u8]) -> Result<RgbImage, CameraError> {
        let rgb = match self.pixel_format {
            PixelFormat::Mjpg => frame::mjpg_to_rgb(buf)?,
            PixelFormat::Yuyv => frame::yuyv_to_rgb(buf, self.width, self.height)?,
        };
        Ok(rgb)
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..16)
            .filter_map(|i| {
                let path = format!("/dev/video{i}");
                if !Path::new(&path).exists() {
                    return None;
                }
                let dev = Device::with_path(&path).ok()?;
                let caps = dev.query_caps().ok()?;
                if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                    return None;
                }
                Some(DeviceInfo {
                    path,
                    name: caps.card.clone(),
                    driver: caps.driver.clone(),
                    bus: caps.bus.clone(),
                })
            })
            .collect()
    }
}

/// The filled part of a dequeued buffer. Drivers that report zero get the whole buffer.
fn payload(buf: &[u8], bytesused: u32) -> &[u8] {
    match bytesused as usize {
        0 => buf,
        used => &buf[..used.min(buf.len())],
    }
}

fn pixel_format_for(fourcc: FourCC) -> Option<PixelFormat> {
    if fourcc == FourCC::new(b"MJPG") {
        Some(PixelFormat::Mjpg)
    } else if fourcc == FourCC::new(b"YUYV") {
        Some(PixelFormat::Yuyv)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_for() {
        assert_eq!(pixel_format_for(FourCC::new(b"MJPG")), Some(PixelFormat::Mjpg));
        assert_eq!(pixel_format_for(FourCC::new(b"YUYV")), Some(PixelFormat::Yuyv));
        assert_eq!(pixel_format_for(FourCC::new(b"GREY")), None);
    }

    #[test]
    fn test_payload_trims_to_bytes_used() {
        let buf = [0xFF, 0xD8, 0xFF, 0xD9, 0xAA, 0xAA];
        assert_eq!(payload(&buf, 4), &[0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(payload(&buf, 0), &buf[..]);
        assert_eq!(payload(&buf, 64), &buf[..]);
    }

    #[test]
    fn test_open_missing_device() {
        assert!(matches!(
            Camera::open("/dev/moodlens-no-such-camera", 640, 480),
            Err(CameraError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_default_snapshot_options() {
        let opts = SnapshotOptions::default();
        assert!(opts.warmup_frames > 0);
        assert!(opts.max_attempts >= 1);
    }
}
