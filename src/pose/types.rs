use crate::Result;
use image::RgbImage;
use ndarray::Array2;

/// Anatomical landmarks reported by PoseNet-family models, in model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeypointLabel {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointLabel {
    pub const ALL: [KeypointLabel; 17] = [
        KeypointLabel::Nose,
        KeypointLabel::LeftEye,
        KeypointLabel::RightEye,
        KeypointLabel::LeftEar,
        KeypointLabel::RightEar,
        KeypointLabel::LeftShoulder,
        KeypointLabel::RightShoulder,
        KeypointLabel::LeftElbow,
        KeypointLabel::RightElbow,
        KeypointLabel::LeftWrist,
        KeypointLabel::RightWrist,
        KeypointLabel::LeftHip,
        KeypointLabel::RightHip,
        KeypointLabel::LeftKnee,
        KeypointLabel::RightKnee,
        KeypointLabel::LeftAnkle,
        KeypointLabel::RightAnkle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeypointLabel::Nose => "nose",
            KeypointLabel::LeftEye => "left eye",
            KeypointLabel::RightEye => "right eye",
            KeypointLabel::LeftEar => "left ear",
            KeypointLabel::RightEar => "right ear",
            KeypointLabel::LeftShoulder => "left shoulder",
            KeypointLabel::RightShoulder => "right shoulder",
            KeypointLabel::LeftElbow => "left elbow",
            KeypointLabel::RightElbow => "right elbow",
            KeypointLabel::LeftWrist => "left wrist",
            KeypointLabel::RightWrist => "right wrist",
            KeypointLabel::LeftHip => "left hip",
            KeypointLabel::RightHip => "right hip",
            KeypointLabel::LeftKnee => "left knee",
            KeypointLabel::RightKnee => "right knee",
            KeypointLabel::LeftAnkle => "left ankle",
            KeypointLabel::RightAnkle => "right ankle",
        }
    }

    /// Channel index in the model's part heatmap output
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Skeleton connections drawn between keypoints
pub const EDGES: [(KeypointLabel, KeypointLabel); 19] = [
    (KeypointLabel::Nose, KeypointLabel::LeftEye),
    (KeypointLabel::Nose, KeypointLabel::RightEye),
    (KeypointLabel::Nose, KeypointLabel::LeftEar),
    (KeypointLabel::Nose, KeypointLabel::RightEar),
    (KeypointLabel::LeftEar, KeypointLabel::LeftEye),
    (KeypointLabel::RightEar, KeypointLabel::RightEye),
    (KeypointLabel::LeftEye, KeypointLabel::RightEye),
    (KeypointLabel::LeftShoulder, KeypointLabel::RightShoulder),
    (KeypointLabel::LeftShoulder, KeypointLabel::LeftElbow),
    (KeypointLabel::LeftShoulder, KeypointLabel::LeftHip),
    (KeypointLabel::RightShoulder, KeypointLabel::RightElbow),
    (KeypointLabel::RightShoulder, KeypointLabel::RightHip),
    (KeypointLabel::LeftElbow, KeypointLabel::LeftWrist),
    (KeypointLabel::RightElbow, KeypointLabel::RightWrist),
    (KeypointLabel::LeftHip, KeypointLabel::RightHip),
    (KeypointLabel::LeftHip, KeypointLabel::LeftKnee),
    (KeypointLabel::RightHip, KeypointLabel::RightKnee),
    (KeypointLabel::LeftKnee, KeypointLabel::LeftAnkle),
    (KeypointLabel::RightKnee, KeypointLabel::RightAnkle),
];

/// A single detected landmark in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub label: KeypointLabel,
    pub y: f32,
    pub x: f32,
    /// Confidence in [0, 1]
    pub score: f32,
}

/// One detected person
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    pub score: f32,
}

impl Pose {
    pub fn keypoint(&self, label: KeypointLabel) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.label == label)
    }
}

/// Everything the pose model reports for one frame
#[derive(Debug, Clone)]
pub struct Detection {
    /// Person logits at model resolution (rows x cols)
    pub heatmap: Array2<f32>,
    pub poses: Vec<Pose>,
    /// Time the model spent on this frame, in milliseconds
    pub inference_ms: f64,
}

/// Trait for pose estimation backends
///
/// The anonymizer only depends on the [`Detection`] contract, so any model
/// that produces a person heatmap and keypoints can sit behind this.
pub trait PoseEngine {
    /// Run the model on a frame
    fn detect(&mut self, frame: &RgbImage) -> Result<Detection>;

    /// Get the model's input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_model_order() {
        for (i, label) in KeypointLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
        assert_eq!(KeypointLabel::RightAnkle.name(), "right ankle");
    }

    #[test]
    fn test_pose_lookup() {
        let pose = Pose {
            keypoints: vec![Keypoint {
                label: KeypointLabel::LeftWrist,
                y: 4.0,
                x: 2.0,
                score: 0.9,
            }],
            score: 0.9,
        };
        assert!(pose.keypoint(KeypointLabel::LeftWrist).is_some());
        assert!(pose.keypoint(KeypointLabel::RightWrist).is_none());
    }
}
