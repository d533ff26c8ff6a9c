//! Real-time visual privacy filter.
//!
//! Takes camera frames plus the person heatmap and poses produced by a pose
//! model, and either overlays skeletons or replaces people with a running
//! estimate of the static background. Also hosts the debounced button reader
//! used by the board front panel.

pub mod anonymizer;
pub mod config;
pub mod error;
pub mod input;
pub mod overlay;
pub mod pose;

#[cfg(feature = "camera")]
pub mod capture;
#[cfg(feature = "loopback")]
pub mod output;

pub use anonymizer::{AnonymizerConfig, FrameAnonymizer, ProcessedFrame};
pub use error::{Error, Result};
pub use input::{Board, DebouncedButtons};
pub use pose::{Detection, Keypoint, KeypointLabel, Pose, PoseEngine};
