//! Geometry kernel: arc-length accumulation and the Umeyama alignment solver.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// Running Euclidean distance from the first position to each position.
///
/// The result has the same length as the input and starts at `0.0`. A single
/// position yields `[0.0]`, an empty slice yields an empty vector.
pub fn accumulated_distances(positions: &[Vector3<f64>]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(positions.len());
    let mut total = 0.0;
    for (i, position) in positions.iter().enumerate() {
        if i > 0 {
            total += (position - positions[i - 1]).norm();
        }
        distances.push(total);
    }
    distances
}

/// Total arc length of a position sequence.
pub fn arc_len(positions: &[Vector3<f64>]) -> f64 {
    positions
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).norm())
        .sum()
}

/// Result of the Umeyama alignment: `target ≈ scale · rotation · source + translation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UmeyamaResult {
    /// Optimal rotation mapping source onto target.
    pub rotation: Matrix3<f64>,
    /// Optimal translation, applied after rotation and scaling.
    pub translation: Vector3<f64>,
    /// Optimal uniform scale (`1.0` when scale correction is disabled).
    pub scale: f64,
}

/// Least-squares rigid (or similarity) alignment of two point sets.
///
/// Computes the rotation, translation, and optional uniform scale that best
/// map `source` onto `target` in the least-squares sense (Umeyama's
/// closed-form method):
///
/// 1. Center both point sets on their means.
/// 2. Compute the cross-covariance matrix and its SVD `U·D·Vᵀ`.
/// 3. Form the rotation as `U·S·Vᵀ` where `S` is the identity, except its
///    last diagonal entry is flipped to `-1` when `det(U)·det(Vᵀ) < 0`.
///    Without the flip the result can be an improper rotation (a reflection).
/// 4. Scale, if requested, is `trace(D·S) / σ_source` where `σ_source` is the
///    mean squared deviation of the source points.
/// 5. Translation is `mean_target − scale·R·mean_source`.
///
/// # Errors
///
/// Fails on point sets of unequal size, on fewer than 4 points (the
/// dimensionality plus one), and on a rank-deficient cross-covariance (fewer
/// than two non-zero singular values), where the decomposition is ill-posed.
pub fn umeyama_alignment(
    source: &[Vector3<f64>],
    target: &[Vector3<f64>],
    with_scale: bool,
) -> Result<UmeyamaResult> {
    if source.len() != target.len() {
        return Err(TrajectoryError::PointSetSizeMismatch {
            source: source.len(),
            target: target.len(),
        });
    }
    let n = source.len();
    if n < 4 {
        return Err(TrajectoryError::DegenerateAlignment);
    }

    let inv_n = 1.0 / n as f64;
    let mean_source: Vector3<f64> = source.iter().sum::<Vector3<f64>>() * inv_n;
    let mean_target: Vector3<f64> = target.iter().sum::<Vector3<f64>>() * inv_n;

    // Mean squared deviation of the source set and cross-covariance.
    let mut sigma_source = 0.0;
    let mut covariance = Matrix3::zeros();
    for (s, t) in source.iter().zip(target.iter()) {
        let s_centered = s - mean_source;
        let t_centered = t - mean_target;
        sigma_source += s_centered.norm_squared();
        covariance += t_centered * s_centered.transpose();
    }
    sigma_source *= inv_n;
    covariance *= inv_n;

    let svd = covariance.svd(true, true);
    let nonzero = svd
        .singular_values
        .iter()
        .filter(|&&value| value > f64::EPSILON)
        .count();
    if nonzero < 2 {
        return Err(TrajectoryError::DegenerateAlignment);
    }
    let u = svd.u.ok_or(TrajectoryError::DegenerateAlignment)?;
    let v_t = svd.v_t.ok_or(TrajectoryError::DegenerateAlignment)?;

    // Reflection correction.
    let mut s_sign = Matrix3::identity();
    if u.determinant() * v_t.determinant() < 0.0 {
        s_sign[(2, 2)] = -1.0;
    }

    let rotation = u * s_sign * v_t;
    let scale = if with_scale {
        let trace_ds = svd.singular_values[0] * s_sign[(0, 0)]
            + svd.singular_values[1] * s_sign[(1, 1)]
            + svd.singular_values[2] * s_sign[(2, 2)];
        trace_ds / sigma_source
    } else {
        1.0
    };
    let translation = mean_target - scale * (rotation * mean_source);

    Ok(UmeyamaResult {
        rotation,
        translation,
        scale,
    })
}
