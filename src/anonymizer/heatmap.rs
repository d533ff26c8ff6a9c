use crate::{Error, Result};
use ndarray::{Array2, ArrayView2};

// opacity = clip((50 + 100 * logit) / 254, 0, 1)
const OPACITY_BIAS: f32 = 50.0;
const OPACITY_GAIN: f32 = 100.0;
const OPACITY_SCALE: f32 = 254.0;

/// How the heatmap is stretched to frame resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Keeps hard person boundaries; used when only drawing skeletons
    Nearest,
    /// Avoids block edges in the anonymized output
    Bilinear,
}

/// Resample a heatmap to `rows` x `cols`
///
/// Output samples are placed so that the corner samples of input and output
/// coincide, i.e. output index `i` reads input coordinate
/// `i * (in - 1) / (out - 1)`.
pub fn resample(
    heatmap: ArrayView2<f32>,
    rows: usize,
    cols: usize,
    mode: Interpolation,
) -> Result<Array2<f32>> {
    let _span = tracing::debug_span!("resample").entered();

    let (in_rows, in_cols) = heatmap.dim();
    if in_rows == 0 || in_cols == 0 {
        return Err(Error::EmptyHeatmap {
            height: in_rows,
            width: in_cols,
        });
    }

    if (in_rows, in_cols) == (rows, cols) {
        return Ok(heatmap.to_owned());
    }

    let row_coords = source_coords(in_rows, rows);
    let col_coords = source_coords(in_cols, cols);

    let out = match mode {
        Interpolation::Nearest => Array2::from_shape_fn((rows, cols), |(y, x)| {
            let sy = (row_coords[y].round() as usize).min(in_rows - 1);
            let sx = (col_coords[x].round() as usize).min(in_cols - 1);
            heatmap[[sy, sx]]
        }),
        Interpolation::Bilinear => Array2::from_shape_fn((rows, cols), |(y, x)| {
            let (y0, y1, fy) = neighbours(row_coords[y], in_rows);
            let (x0, x1, fx) = neighbours(col_coords[x], in_cols);
            let top = heatmap[[y0, x0]] * (1.0 - fx) + heatmap[[y0, x1]] * fx;
            let bottom = heatmap[[y1, x0]] * (1.0 - fx) + heatmap[[y1, x1]] * fx;
            top * (1.0 - fy) + bottom * fy
        }),
    };

    Ok(out)
}

fn source_coords(input: usize, output: usize) -> Vec<f32> {
    if output <= 1 {
        return vec![0.0; output];
    }
    let step = (input - 1) as f32 / (output - 1) as f32;
    (0..output).map(|i| i as f32 * step).collect()
}

fn neighbours(coord: f32, len: usize) -> (usize, usize, f32) {
    let lo = (coord.floor() as usize).min(len - 1);
    let hi = (lo + 1).min(len - 1);
    (lo, hi, coord - lo as f32)
}

/// Map a raw person logit to a blend weight in [0, 1]
///
/// Logits at or below -0.5 give 0, at or above 2.04 give 1, linear in
/// between. NaN maps to 0 so that a bad model output can never poison the
/// background estimate.
pub fn opacity(logit: f32) -> f32 {
    if logit.is_nan() {
        return 0.0;
    }
    ((OPACITY_BIAS + OPACITY_GAIN * logit) / OPACITY_SCALE).clamp(0.0, 1.0)
}

/// Apply [`opacity`] to every heatmap cell
pub fn opacity_map(heatmap: ArrayView2<f32>) -> Array2<f32> {
    heatmap.mapv(opacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_opacity_boundaries() {
        assert_eq!(opacity(-0.5), 0.0);
        assert_eq!(opacity(-10.0), 0.0);
        assert_eq!(opacity(f32::NEG_INFINITY), 0.0);
        assert_eq!(opacity(2.04), 1.0);
        assert_eq!(opacity(3.0), 1.0);
        assert_eq!(opacity(f32::INFINITY), 1.0);
        assert_eq!(opacity(f32::NAN), 0.0);
    }

    #[test]
    fn test_opacity_is_linear_between_boundaries() {
        assert!((opacity(0.0) - 50.0 / 254.0).abs() < 1e-6);
        assert!((opacity(0.77) - 0.5).abs() < 1e-6);
        let a = opacity(0.2);
        let b = opacity(0.4);
        let c = opacity(0.6);
        assert!(((b - a) - (c - b)).abs() < 1e-6);
        assert!(((b - a) - 20.0 / 254.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_keeps_hard_edges() {
        let src = array![[0.0, 1.0], [0.0, 1.0]];
        let out = resample(src.view(), 2, 5, Interpolation::Nearest).unwrap();
        assert_eq!(out.dim(), (2, 5));
        for v in out.iter() {
            assert!(*v == 0.0 || *v == 1.0);
        }
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[0, 4]], 1.0);
    }

    #[test]
    fn test_bilinear_interpolates() {
        let src = array![[0.0, 4.0]];
        let out = resample(src.view(), 1, 5, Interpolation::Bilinear).unwrap();
        let expected = [0.0, 1.0, 2.0, 3.0, 4.0];
        for (v, e) in out.iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-5, "{} != {}", v, e);
        }
    }

    #[test]
    fn test_resample_downscale_and_identity() {
        let src = Array2::from_shape_fn((9, 9), |(y, x)| (y * 9 + x) as f32);
        let same = resample(src.view(), 9, 9, Interpolation::Bilinear).unwrap();
        assert_eq!(same, src);

        let small = resample(src.view(), 3, 3, Interpolation::Nearest).unwrap();
        assert_eq!(small[[0, 0]], 0.0);
        assert_eq!(small[[2, 2]], 80.0);
        assert_eq!(small[[1, 1]], 40.0);
    }

    #[test]
    fn test_resample_rejects_empty() {
        let src = Array2::<f32>::zeros((0, 4));
        let err = resample(src.view(), 4, 4, Interpolation::Nearest).unwrap_err();
        assert!(matches!(err, Error::EmptyHeatmap { .. }));
    }
}
