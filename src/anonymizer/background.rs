use crate::{Error, Result};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis, Zip};

/// Weight given to the newest instantaneous estimate after `frames_seen`
/// frames: `1 / max(1, n / 2)`.
///
/// 1.0 for the first three frames, then decays like a running mean so that
/// the estimate settles quickly and then stays put.
pub fn mixing_ratio(frames_seen: u64) -> f32 {
    1.0 / (frames_seen as f32 / 2.0).max(1.0)
}

/// Running estimate of the person-free scene, H x W x 3, in pixel units
#[derive(Debug, Clone)]
pub struct BackgroundEstimate {
    pixels: Array3<f32>,
}

impl BackgroundEstimate {
    /// All-black estimate for frames of `rows` x `cols`
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            pixels: Array3::zeros((rows, cols, 3)),
        }
    }

    pub fn pixels(&self) -> ArrayView3<f32> {
        self.pixels.view()
    }

    /// Fold one frame into the estimate
    ///
    /// Where `opacity` is high (likely a person) the current estimate is kept,
    /// elsewhere the frame is trusted:
    ///
    /// ```text
    /// instant    = background * opacity + frame * (1 - opacity)
    /// background = background * (1 - ratio) + instant * ratio
    /// ```
    ///
    /// Both steps are convex combinations, so every pixel stays between the
    /// smallest and largest value it has ever been fed.
    pub fn update(
        &mut self,
        frame: ArrayView3<f32>,
        opacity: ArrayView2<f32>,
        frames_seen: u64,
    ) -> Result<()> {
        let _span = tracing::debug_span!("background_update").entered();

        let (rows, cols, channels) = self.pixels.dim();
        if frame.dim() != (rows, cols, channels) {
            return Err(Error::ShapeMismatch {
                context: "background frame",
                expected: self.pixels.shape().to_vec(),
                actual: frame.shape().to_vec(),
            });
        }
        if opacity.dim() != (rows, cols) {
            return Err(Error::ShapeMismatch {
                context: "background opacity",
                expected: vec![rows, cols],
                actual: opacity.shape().to_vec(),
            });
        }

        let ratio = mixing_ratio(frames_seen);
        let alpha = opacity.insert_axis(Axis(2));

        Zip::from(&mut self.pixels)
            .and(&frame)
            .and_broadcast(&alpha)
            .for_each(|bg, &px, &a| {
                let instant = *bg * a + px * (1.0 - a);
                *bg = *bg * (1.0 - ratio) + instant * ratio;
            });

        Ok(())
    }
}
