mod webcam;

pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame at the sink resolution
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of delivered frames
    fn resolution(&self) -> (u32, u32);
}
