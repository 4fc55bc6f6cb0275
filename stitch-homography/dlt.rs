use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

use crate::{HomographyError, HomographyResult};

/// Minimum number of correspondences that determine a homography
pub const MIN_POINTS: usize = 4;

/// Map `p` through `h`; a point sent to infinity yields NaN coordinates.
#[inline]
pub fn project(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let q = h * Vector3::new(p[0], p[1], 1.0);
    if q.z.abs() < 1e-12 {
        return [f64::NAN, f64::NAN];
    }
    [q.x / q.z, q.y / q.z]
}

/// Euclidean distance between `project(h, src)` and `dst`.
#[inline]
pub fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src);
    (p[0] - dst[0]).hypot(p[1] - dst[1])
}

/// Similarity moving the centroid to the origin with mean radius sqrt(2)
fn conditioning(points: &[[f64; 2]]) -> Matrix3<f64> {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(ax, ay), p| (ax + p[0], ay + p[1]));
    let (cx, cy) = (sx / n, sy / n);
    let spread = points.iter().map(|p| (p[0] - cx).hypot(p[1] - cy)).sum::<f64>() / n;
    let s = if spread > 1e-12 { std::f64::consts::SQRT_2 / spread } else { 1.0 };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Least-squares homography with `dst ≈ H · src` from at least four pairs.
///
/// Both point sets are conditioned first. The solution is the eigenvector of
/// the smallest eigenvalue of `AᵀA`, mapped back and scaled so `h33 = 1`.
pub fn estimate_homography_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> HomographyResult<Matrix3<f64>> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < MIN_POINTS {
        return Err(HomographyError::TooFewPoints { needed: MIN_POINTS, got: n });
    }

    let t_src = conditioning(src);
    let t_dst = conditioning(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let [x, y] = project(&t_src, *s);
        let [u, v] = project(&t_dst, *d);
        let r = 2 * i;
        a.row_mut(r)
            .copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, -u]);
        a.row_mut(r + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, -v]);
    }

    let eig = SymmetricEigen::new(a.transpose() * &a);
    let smallest = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, l), (_, r)| l.abs().total_cmp(&r.abs()))
        .map(|(i, _)| i)
        .ok_or_else(|| HomographyError::NumericalFailure("empty eigen decomposition".into()))?;
    let h = eig.eigenvectors.column(smallest);
    let h_cond = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HomographyError::NumericalFailure("conditioning not invertible".into()))?;
    let m = t_dst_inv * h_cond * t_src;

    let scale = m[(2, 2)];
    if !scale.is_finite() || scale.abs() < 1e-12 {
        return Err(HomographyError::NumericalFailure(format!("h33 = {}", scale)));
    }
    let m = m / scale;
    if m.iter().any(|v| !v.is_finite()) {
        return Err(HomographyError::NumericalFailure("non-finite homography".into()));
    }
    Ok(m)
}

/// Whether any three of the points lie on one line.
pub(crate) fn has_collinear_triple(points: &[[f64; 2]]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let [ax, ay] = points[i];
                let [bx, by] = points[j];
                let [cx, cy] = points[k];
                let area2 = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
                if area2.abs() < 1e-6 {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn perspective() -> Matrix3<f64> {
        Matrix3::new(1.2, 0.05, 14.0, -0.03, 0.95, -6.0, 0.0004, -0.0002, 1.0)
    }

    #[test]
    fn test_four_points_are_fit_exactly() {
        let h_true = perspective();
        let src = [[0.0, 0.0], [80.0, 0.0], [80.0, 60.0], [0.0, 60.0]];
        let dst: Vec<[f64; 2]> = src.iter().map(|&s| project(&h_true, s)).collect();

        let h = estimate_homography_dlt(&src, &dst).unwrap();
        assert_relative_eq!(h[(2, 2)], 1.0);
        for (s, d) in src.iter().zip(&dst) {
            assert!(reprojection_error(&h, *s, *d) < 1e-6);
        }
        assert_relative_eq!(h, h_true, epsilon = 1e-6);
    }

    #[test]
    fn test_overdetermined_translation() {
        let src: Vec<[f64; 2]> = (0..16).map(|i| [(i % 4) as f64 * 7.0, (i / 4) as f64 * 5.0]).collect();
        let dst: Vec<[f64; 2]> = src.iter().map(|p| [p[0] + 10.0, p[1] - 2.5]).collect();

        let h = estimate_homography_dlt(&src, &dst).unwrap();
        let expected = Matrix3::new(1.0, 0.0, 10.0, 0.0, 1.0, -2.5, 0.0, 0.0, 1.0);
        assert_relative_eq!(h, expected, epsilon = 1e-8);
    }

    #[test]
    fn test_input_shape_errors() {
        let three = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            estimate_homography_dlt(&three, &three),
            Err(HomographyError::TooFewPoints { needed: 4, got: 3 })
        );

        let four = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            estimate_homography_dlt(&four, &three),
            Err(HomographyError::LengthMismatch { src: 4, dst: 3 })
        );
    }

    #[test]
    fn test_point_at_infinity_projects_to_nan() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        let p = project(&h, [0.0, 3.0]);
        assert!(p[0].is_nan() && p[1].is_nan());
    }

    #[test]
    fn test_collinearity() {
        assert!(has_collinear_triple(&[[0.0, 0.0], [5.0, 5.0], [1.0, 7.0], [10.0, 10.0]]));
        assert!(!has_collinear_triple(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]));
    }
}
