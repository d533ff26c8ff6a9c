use super::CaptureSource;
use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

/// Webcam frames, optionally mirrored and scaled to the sink size
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
    mirror: bool,
}

impl WebcamCapture {
    /// # Arguments
    /// * `device_index` - Camera index (`/dev/videoN`)
    /// * `source_size` - (width, height) requested from the camera
    /// * `sink_size` - (width, height) of the frames handed downstream
    /// * `mirror` - Flip frames horizontally
    pub fn new(
        device_index: u32,
        source_size: (u32, u32),
        sink_size: (u32, u32),
        mirror: bool,
    ) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{} (sink {}x{}, mirror={})",
            device_index,
            source_size.0,
            source_size.1,
            sink_size.0,
            sink_size.1,
            mirror
        );

        let index = CameraIndex::Index(device_index);
        let format = CameraFormat::new(
            Resolution::new(source_size.0, source_size.1),
            FrameFormat::MJPEG,
            30,
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        tracing::info!("Webcam initialized with format {}", camera.camera_format());

        Ok(Self {
            camera,
            width: sink_size.0,
            height: sink_size.1,
            mirror,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().context("Failed to capture frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;
        let (width, height) = decoded.dimensions();
        let mut decoded = RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Decoded frame has an unexpected buffer size")?;

        if decoded.dimensions() != (self.width, self.height) {
            decoded = imageops::resize(
                &decoded,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            );
        }
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut decoded);
        }

        Ok(decoded)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
