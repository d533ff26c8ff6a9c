use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// v4l2loopback sink fed with packed YUYV frames
pub struct V4L2Output {
    // Kept open so the negotiated format stays in place
    _device: Device,
    file: File,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let mut format = Output::format(&device).context("Failed to query output format")?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"YUYV");
        let format = Output::set_format(&device, &format).context("Failed to set output format")?;
        tracing::info!(
            "v4l2loopback format: {}x{} {}",
            format.width,
            format.height,
            format.fourcc
        );

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        Ok(Self {
            _device: device,
            file,
            width,
            height,
            buffer: Vec::with_capacity((width * height * 2) as usize),
        })
    }
}

/// Pack an RGB frame as YUYV, sharing chroma between horizontal pixel pairs
pub fn rgb_to_yuyv(frame: &RgbImage, out: &mut Vec<u8>) {
    let width = frame.width() as usize;
    out.clear();
    if width == 0 {
        return;
    }
    for row in frame.as_raw().chunks_exact(width * 3) {
        for pair in row.chunks(6) {
            let first = [pair[0], pair[1], pair[2]];
            // Odd widths repeat the last pixel
            let second = if pair.len() == 6 {
                [pair[3], pair[4], pair[5]]
            } else {
                first
            };
            let (y0, u0, v0) = yuv(first);
            let (y1, u1, v1) = yuv(second);
            out.extend_from_slice(&[
                y0,
                ((u0 as u16 + u1 as u16) / 2) as u8,
                y1,
                ((v0 as u16 + v1 as u16) / 2) as u8,
            ]);
        }
    }
}

/// BT.601 RGB to YUV
fn yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.147 * r - 0.289 * g + 0.436 * b + 128.0;
    let v = 0.615 * r - 0.515 * g - 0.100 * b + 128.0;
    (
        y.clamp(0.0, 255.0) as u8,
        u.clamp(0.0, 255.0) as u8,
        v.clamp(0.0, 255.0) as u8,
    )
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let resized;
        let frame = if frame.dimensions() != (self.width, self.height) {
            resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        rgb_to_yuyv(frame, &mut self.buffer);

        self.file
            .write_all(&self.buffer)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_packing() {
        let frame = RgbImage::from_fn(3, 2, |_, _| image::Rgb([255, 255, 255]));
        let mut out = Vec::new();
        rgb_to_yuyv(&frame, &mut out);
        // Two pairs per row (last one padded), four bytes each
        assert_eq!(out.len(), 2 * 2 * 4);
        assert!(out[0] >= 254);
        assert!(out[2] >= 254);
    }

    #[test]
    fn test_black_is_neutral_chroma() {
        assert_eq!(yuv([0, 0, 0]), (0, 128, 128));
    }

    #[test]
    fn test_zero_width_frame_packs_nothing() {
        let mut out = vec![1, 2, 3];
        rgb_to_yuyv(&RgbImage::new(0, 4), &mut out);
        assert!(out.is_empty());
    }
}
