//! Resolution presets and component configuration.

use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Keypoints scoring below this are not drawn
pub const DEFAULT_KEYPOINT_THRESHOLD: f32 = 0.2;

/// A press is reported once the button has been held longer than this
/// since it was last seen released
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);

/// Buttons (and LEDs) on the dev board front panel
pub const DEV_BOARD_LINES: usize = 5;

/// Supported capture/output resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Resolution {
    #[value(name = "480x360")]
    Low,
    #[default]
    #[value(name = "640x480")]
    Medium,
    #[value(name = "1280x720")]
    High,
}

impl Resolution {
    /// Size requested from the camera, (width, height)
    pub fn source_size(self) -> (u32, u32) {
        match self {
            Resolution::Low | Resolution::Medium => (640, 480),
            Resolution::High => (1280, 720),
        }
    }

    /// Size of the frames handed to the anonymizer and the output device
    pub fn sink_size(self) -> (u32, u32) {
        match self {
            Resolution::Low => (480, 360),
            Resolution::Medium => (640, 480),
            Resolution::High => (1280, 720),
        }
    }

    /// Model input size. The models are exported at sink size plus one so
    /// that output stride 16 lands on pixel centres.
    pub fn model_size(self) -> (u32, u32) {
        let (width, height) = self.sink_size();
        (width + 1, height + 1)
    }

    pub fn default_model_path(self) -> PathBuf {
        let (width, height) = self.model_size();
        PathBuf::from(format!(
            "models/bodypix_mobilenet_v1_075_{}_{}_16.onnx",
            width, height
        ))
    }
}

/// Debounced button reader settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceConfig {
    pub lines: usize,
    pub interval: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            lines: DEV_BOARD_LINES,
            interval: DEFAULT_DEBOUNCE_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_presets() {
        assert_eq!(Resolution::Low.source_size(), (640, 480));
        assert_eq!(Resolution::Low.sink_size(), (480, 360));
        assert_eq!(Resolution::High.model_size(), (1281, 721));
        assert_eq!(
            Resolution::Medium.default_model_path(),
            PathBuf::from("models/bodypix_mobilenet_v1_075_641_481_16.onnx")
        );
    }

    #[test]
    fn test_resolution_parses_from_cli_names() {
        let parsed = Resolution::from_str("1280x720", false).unwrap();
        assert_eq!(parsed, Resolution::High);
        assert!(Resolution::from_str("800x600", false).is_err());
    }
}
