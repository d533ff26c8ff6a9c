//! Error types for the privacy filter library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Two buffers that must share a shape do not
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Heatmap with a zero-sized dimension
    #[error("heatmap is empty ({height}x{width})")]
    EmptyHeatmap { height: usize, width: usize },

    /// Raw sample count does not match the configured button lines
    #[error("expected {expected} button samples, got {actual}")]
    LineCountMismatch { expected: usize, actual: usize },

    #[error("board wiring has {buttons} buttons but {leds} LEDs")]
    LedCountMismatch { buttons: usize, leds: usize },

    /// Line index outside the board's configured lines
    #[error("line {index} out of range (board has {count} lines)")]
    LineOutOfRange { index: usize, count: usize },

    /// sysfs GPIO/PWM access failed
    #[error("board I/O on {path}: {source}")]
    Board {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pose model loading or inference error
    #[error("model error: {0}")]
    Model(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
