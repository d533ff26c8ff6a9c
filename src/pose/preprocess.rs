use super::types::{Keypoint, KeypointLabel, Pose};
use crate::{Error, Result};
use image::{imageops, RgbImage};
use ndarray::{Array4, ArrayView3};

/// Converts frames into model input tensors and model outputs back into
/// frame-space poses
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NHWC tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Scale each channel from [0, 255] to [-1, 1]
    ///
    /// Returns: Array4<f32> with shape [1, height, width, 3]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized;
        let source = if image.dimensions() != (self.target_width, self.target_height) {
            resized = imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            image
        };

        let (width, height) = source.dimensions();
        Array4::from_shape_fn(
            (1, height as usize, width as usize, 3),
            |(_, y, x, c)| {
                let value = source.get_pixel(x as u32, y as u32)[c] as f32;
                value / 127.5 - 1.0
            },
        )
    }

    /// Decode the strongest instance of every keypoint into a single pose
    ///
    /// # Arguments
    /// * `heatmaps` - Part heatmap logits, shape [rows, cols, 17]
    /// * `offsets` - Short-range offsets, shape [rows, cols, 34] (all y then all x)
    /// * `output_stride` - Model pixels per heatmap cell
    /// * `frame_size` - (width, height) of the frame the pose is drawn on
    ///
    /// Keypoint positions are mapped from model input space to frame space.
    pub fn decode_single_pose(
        &self,
        heatmaps: ArrayView3<f32>,
        offsets: ArrayView3<f32>,
        output_stride: u32,
        frame_size: (u32, u32),
    ) -> Result<Pose> {
        let parts = KeypointLabel::ALL.len();
        let (rows, cols, channels) = heatmaps.dim();
        if channels != parts {
            return Err(Error::ShapeMismatch {
                context: "part heatmaps",
                expected: vec![rows, cols, parts],
                actual: heatmaps.shape().to_vec(),
            });
        }
        if offsets.dim() != (rows, cols, 2 * parts) {
            return Err(Error::ShapeMismatch {
                context: "short offsets",
                expected: vec![rows, cols, 2 * parts],
                actual: offsets.shape().to_vec(),
            });
        }
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyHeatmap {
                height: rows,
                width: cols,
            });
        }

        let scale_x = frame_size.0 as f32 / self.target_width as f32;
        let scale_y = frame_size.1 as f32 / self.target_height as f32;
        let stride = output_stride as f32;

        let keypoints: Vec<Keypoint> = KeypointLabel::ALL
            .iter()
            .map(|&label| {
                let k = label.index();
                let mut best = (0, 0, f32::NEG_INFINITY);
                for ((y, x), &logit) in heatmaps.slice(ndarray::s![.., .., k]).indexed_iter() {
                    if logit > best.2 {
                        best = (y, x, logit);
                    }
                }
                let (y, x, logit) = best;
                let model_y = y as f32 * stride + offsets[[y, x, k]];
                let model_x = x as f32 * stride + offsets[[y, x, k + parts]];
                Keypoint {
                    label,
                    y: model_y * scale_y,
                    x: model_x * scale_x,
                    score: sigmoid(logit),
                }
            })
            .collect();

        let score = keypoints.iter().map(|k| k.score).sum::<f32>() / parts as f32;
        Ok(Pose { keypoints, score })
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_preprocess_shape_and_range() {
        let pre = Preprocessor::new(4, 3);
        let frame = RgbImage::from_fn(8, 6, |x, _| {
            if x < 4 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        let tensor = pre.preprocess(&frame);
        assert_eq!(tensor.shape(), &[1, 3, 4, 3]);
        assert!(tensor.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 3, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_single_pose_uses_argmax_and_offsets() {
        let pre = Preprocessor::new(33, 33);
        let mut heatmaps = Array3::<f32>::from_elem((3, 3, 17), -5.0);
        let mut offsets = Array3::<f32>::zeros((3, 3, 34));
        let nose = KeypointLabel::Nose.index();
        heatmaps[[2, 1, nose]] = 5.0;
        offsets[[2, 1, nose]] = 1.0;
        offsets[[2, 1, nose + 17]] = -2.0;

        // Frame twice the model size
        let pose = pre
            .decode_single_pose(heatmaps.view(), offsets.view(), 16, (66, 66))
            .unwrap();

        assert_eq!(pose.keypoints.len(), 17);
        let kp = pose.keypoint(KeypointLabel::Nose).unwrap();
        assert!((kp.y - 66.0).abs() < 1e-4); // (2 * 16 + 1) * 2
        assert!((kp.x - 28.0).abs() < 1e-4); // (1 * 16 - 2) * 2
        assert!(kp.score > 0.99);
        let ear = pose.keypoint(KeypointLabel::LeftEar).unwrap();
        assert!(ear.score < 0.01);
    }

    #[test]
    fn test_decode_rejects_wrong_channel_count() {
        let pre = Preprocessor::new(33, 33);
        let heatmaps = Array3::<f32>::zeros((3, 3, 5));
        let offsets = Array3::<f32>::zeros((3, 3, 10));
        let err = pre
            .decode_single_pose(heatmaps.view(), offsets.view(), 16, (33, 33))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
