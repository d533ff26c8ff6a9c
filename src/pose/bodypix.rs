use super::preprocess::Preprocessor;
use super::types::{Detection, PoseEngine};
use crate::{Error, Result};
use anyhow::Context;
use image::RgbImage;
use ndarray::{Array2, Axis, Ix4};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::time::Instant;

/// Output stride of the MobileNet BodyPix exports
const OUTPUT_STRIDE: u32 = 16;

/// Poses whose mean keypoint score falls below this are dropped
const MIN_POSE_SCORE: f32 = 0.15;

// Output order of the ONNX export
const SEGMENTS_OUTPUT: usize = 0;
const HEATMAPS_OUTPUT: usize = 1;
const OFFSETS_OUTPUT: usize = 2;

/// BodyPix person segmentation + keypoint model
///
/// The segmentation logits are passed straight through as the person
/// heatmap. Keypoints are decoded for a single person.
pub struct BodyPix {
    session: Session,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
}

fn model_err(e: impl std::fmt::Display) -> Error {
    Error::Model(e.to_string())
}

impl BodyPix {
    /// Create a new BodyPix engine from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `input_size` - (width, height) the model was exported at
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: (u32, u32)) -> anyhow::Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading BodyPix model from {}", path.display());

        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(4)
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(model_err)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("BodyPix model loaded successfully");

        let (width, height) = input_size;
        Ok(Self {
            session,
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
        })
    }
}

impl PoseEngine for BodyPix {
    fn detect(&mut self, frame: &RgbImage) -> Result<Detection> {
        let _span = tracing::debug_span!("bodypix_detect").entered();

        let input = self.preprocessor.preprocess(frame);
        let input = Tensor::from_array(input).map_err(model_err)?;

        let started = Instant::now();
        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(model_err)?;
        drop(_infer_span);
        let inference_ms = started.elapsed().as_secs_f64() * 1000.0;

        // All outputs are NHWC with batch 1
        let extract = |index: usize| -> Result<ndarray::Array3<f32>> {
            let view = outputs[index]
                .try_extract_array::<f32>()
                .map_err(model_err)?
                .into_dimensionality::<Ix4>()
                .map_err(model_err)?;
            Ok(view.index_axis(Axis(0), 0).to_owned())
        };

        let segments = extract(SEGMENTS_OUTPUT)?;
        let heatmaps = extract(HEATMAPS_OUTPUT)?;
        let offsets = extract(OFFSETS_OUTPUT)?;

        // [rows, cols, 1] -> [rows, cols]
        let heatmap: Array2<f32> = segments.index_axis(Axis(2), 0).to_owned();

        let pose = self.preprocessor.decode_single_pose(
            heatmaps.view(),
            offsets.view(),
            OUTPUT_STRIDE,
            frame.dimensions(),
        )?;
        let poses = if pose.score >= MIN_POSE_SCORE {
            vec![pose]
        } else {
            Vec::new()
        };

        Ok(Detection {
            heatmap,
            poses,
            inference_ms,
        })
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
