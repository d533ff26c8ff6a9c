mod preprocess;
pub mod types;

#[cfg(feature = "onnx")]
mod bodypix;

#[cfg(feature = "onnx")]
pub use bodypix::BodyPix;
pub use preprocess::Preprocessor;
pub use types::{Detection, Keypoint, KeypointLabel, Pose, PoseEngine, EDGES};

/// Create the default pose engine (BodyPix)
#[cfg(feature = "onnx")]
pub fn create_default_engine(
    model_path: &std::path::Path,
    input_size: (u32, u32),
) -> anyhow::Result<Box<dyn PoseEngine>> {
    let engine = BodyPix::new(model_path, input_size)?;
    Ok(Box::new(engine))
}
