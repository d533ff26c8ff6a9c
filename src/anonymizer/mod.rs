//! Per-frame anonymization and skeleton overlay.

mod background;
pub mod heatmap;
mod timing;

pub use background::{mixing_ratio, BackgroundEstimate};
pub use heatmap::{opacity, Interpolation};
pub use timing::{TimingAccumulator, MIN_FRAME_INTERVAL};

use crate::config::DEFAULT_KEYPOINT_THRESHOLD;
use crate::overlay::{self, Color, DrawCommand};
use crate::pose::Detection;
use crate::{Error, Result};
use image::{Rgb, RgbImage};
use ndarray::{Array3, ArrayView2, ArrayView3};
use std::time::Instant;

/// Red-tinted highlight added over likely people, per channel
const OUTLINE_TINT: [f32; 3] = [250.0, -0.2 * 250.0, -0.2 * 250.0];

const STATUS_ORIGIN: (i32, i32) = (10, 20);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnonymizerConfig {
    /// Replace people with the background estimate instead of only
    /// outlining them
    pub anonymize: bool,
    /// Minimum keypoint score for a keypoint to be drawn
    pub keypoint_threshold: f32,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            anonymize: false,
            keypoint_threshold: DEFAULT_KEYPOINT_THRESHOLD,
        }
    }
}

/// Result of one processing cycle
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub frame: RgbImage,
    pub overlay: Vec<DrawCommand>,
    /// Rolling timing summary, also the first overlay text line
    pub status: String,
}

/// Owns the background estimate and timing counters for one stream
///
/// Not internally synchronised: one instance per stream, one `process` call
/// at a time.
pub struct FrameAnonymizer {
    config: AnonymizerConfig,
    background: Option<BackgroundEstimate>,
    timing: TimingAccumulator,
}

impl FrameAnonymizer {
    pub fn new(config: AnonymizerConfig) -> Self {
        tracing::info!(
            "Frame anonymizer ready (anonymize={}, keypoint_threshold={})",
            config.anonymize,
            config.keypoint_threshold
        );
        Self {
            config,
            background: None,
            timing: TimingAccumulator::new(Instant::now()),
        }
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    /// Current background estimate; `None` until the first anonymized frame
    /// and always `None` when anonymization is off
    pub fn background(&self) -> Option<&BackgroundEstimate> {
        self.background.as_ref()
    }

    pub fn timing(&self) -> &TimingAccumulator {
        &self.timing
    }

    /// Process one frame
    ///
    /// # Arguments
    /// * `frame` - Current camera frame
    /// * `detection` - Heatmap, poses and inference time for this frame
    /// * `started` - When this cycle began, before inference ran
    pub fn process(
        &mut self,
        frame: &RgbImage,
        detection: &Detection,
        started: Instant,
    ) -> Result<ProcessedFrame> {
        let _span = tracing::debug_span!("anonymizer_process").entered();

        let output = self.composite(frame, detection.heatmap.view())?;

        self.timing
            .record(started, Instant::now(), detection.inference_ms);
        let status = self.timing.summary(detection.poses.len());

        let mut commands = Vec::new();
        overlay::shadow_text(&mut commands, STATUS_ORIGIN.0, STATUS_ORIGIN.1, &status);
        for pose in &detection.poses {
            overlay::draw_pose(
                &mut commands,
                pose,
                Color::Blue,
                self.config.keypoint_threshold,
            );
        }

        tracing::debug!("{}", status);

        Ok(ProcessedFrame {
            frame: output,
            overlay: commands,
            status,
        })
    }

    /// Produce the output pixels for one frame, updating the background
    /// estimate when anonymizing
    pub fn composite(&mut self, frame: &RgbImage, logits: ArrayView2<f32>) -> Result<RgbImage> {
        let (width, height) = frame.dimensions();
        let (rows, cols) = (height as usize, width as usize);

        let mode = if self.config.anonymize {
            Interpolation::Bilinear
        } else {
            Interpolation::Nearest
        };
        let resampled = heatmap::resample(logits, rows, cols, mode)?;
        let opacity = heatmap::opacity_map(resampled.view());
        if opacity.dim() != (rows, cols) {
            return Err(Error::ShapeMismatch {
                context: "resampled heatmap",
                expected: vec![rows, cols],
                actual: opacity.shape().to_vec(),
            });
        }

        let pixels = frame_to_array(frame)?;

        if self.config.anonymize {
            let frames_seen = self.timing.frames();
            let background = self
                .background
                .get_or_insert_with(|| BackgroundEstimate::zeros(rows, cols));
            background.update(pixels.view(), opacity.view(), frames_seen)?;
            Ok(compose(background.pixels(), opacity.view()))
        } else {
            Ok(compose(pixels.view(), opacity.view()))
        }
    }
}

/// Frame as an H x W x 3 float array
pub fn frame_to_array(frame: &RgbImage) -> Result<Array3<f32>> {
    let (width, height) = frame.dimensions();
    let shape = (height as usize, width as usize, 3);
    let raw = ArrayView3::from_shape(shape, frame.as_raw().as_slice()).map_err(|_| {
        Error::ShapeMismatch {
            context: "frame buffer",
            expected: vec![shape.0, shape.1, shape.2],
            actual: vec![frame.as_raw().len()],
        }
    })?;
    Ok(raw.mapv(f32::from))
}

/// `background + opacity * opacity * tint`, clipped to [0, 255] and rounded
fn compose(background: ArrayView3<f32>, opacity: ArrayView2<f32>) -> RgbImage {
    let _span = tracing::debug_span!("compose").entered();

    let (rows, cols, _) = background.dim();
    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let (y, x) = (y as usize, x as usize);
        let a = opacity[[y, x]];
        let mut px = [0u8; 3];
        for (c, out) in px.iter_mut().enumerate() {
            let value = background[[y, x, c]] + a * a * OUTLINE_TINT[c];
            *out = value.clamp(0.0, 255.0).round() as u8;
        }
        Rgb(px)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn detection(heatmap: Array2<f32>) -> Detection {
        Detection {
            heatmap,
            poses: Vec::new(),
            inference_ms: 0.0,
        }
    }

    #[test]
    fn test_compose_tints_opaque_pixels() {
        let background = Array3::from_elem((1, 2, 3), 100.0);
        let opacity = ndarray::array![[0.0, 1.0]];
        let out = compose(background.view(), opacity.view());
        assert_eq!(out.get_pixel(0, 0), &Rgb([100, 100, 100]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 50, 50]));
    }

    #[test]
    fn test_compose_rounds_float_drift() {
        let background = Array3::from_elem((1, 1, 3), 139.99998);
        let opacity = Array2::zeros((1, 1));
        let out = compose(background.view(), opacity.view());
        assert_eq!(out.get_pixel(0, 0), &Rgb([140, 140, 140]));
    }

    #[test]
    fn test_frame_to_array_layout() {
        let frame = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let arr = frame_to_array(&frame).unwrap();
        assert_eq!(arr.dim(), (2, 3, 3));
        assert_eq!(arr[[1, 2, 0]], 2.0);
        assert_eq!(arr[[1, 2, 1]], 1.0);
        assert_eq!(arr[[1, 2, 2]], 7.0);
    }

    #[test]
    fn test_background_created_lazily() {
        let mut anonymizer = FrameAnonymizer::new(AnonymizerConfig {
            anonymize: true,
            ..Default::default()
        });
        assert!(anonymizer.background().is_none());

        let frame = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        anonymizer
            .process(&frame, &detection(Array2::from_elem((2, 2), -1.0)), Instant::now())
            .unwrap();
        let bg = anonymizer.background().unwrap();
        assert_eq!(bg.pixels().dim(), (4, 4, 3));
    }

    #[test]
    fn test_overlay_starts_with_status_text() {
        let mut anonymizer = FrameAnonymizer::new(AnonymizerConfig::default());
        let frame = RgbImage::new(4, 4);
        let result = anonymizer
            .process(&frame, &detection(Array2::zeros((2, 2))), Instant::now())
            .unwrap();
        assert_eq!(result.overlay.len(), 2);
        match &result.overlay[1] {
            DrawCommand::Text { text, origin, .. } => {
                assert_eq!(text, &result.status);
                assert_eq!(*origin, (10, 20));
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert!(result.status.ends_with("Nposes 0"));
    }
}
