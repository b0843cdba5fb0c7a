//! Motion-based subsequence selection.
//!
//! Reduces a pose sequence to the poses that represent actual motion: a pose
//! is kept once the translation or rotation accumulated since the last kept
//! pose reaches a threshold. The same thresholding idea drives keyframe
//! selection in SLAM pipelines; here it runs in one pass over a finished
//! sequence and returns the kept indices.

use nalgebra::Matrix4;

use crate::core::lie;
use crate::error::{Result, TrajectoryError};

/// Select pose indices by accumulated motion.
///
/// Walks the sequence greedily: the first pose is always kept, then
/// translation deltas (Euclidean norm between consecutive positions) and
/// rotation deltas (log-map angle of the relative rotation between
/// consecutive poses) are accumulated; a pose is kept as soon as either
/// accumulator reaches its threshold, and both accumulators reset from that
/// kept pose. The last pose is only kept if it triggers a threshold itself.
///
/// With both thresholds zero every pose is kept, which is what callers
/// synchronizing two sequences rely on. Joint filtering of two trajectories
/// is only meaningful when both carry per-pose timestamps; guaranteeing that
/// is the caller's concern.
///
/// # Arguments
///
/// * `poses` - SE(3) pose sequence, at least two poses
/// * `distance_threshold` - accumulated translation threshold in meters
/// * `angle_threshold` - accumulated rotation threshold in radians
///   (or degrees if `degrees` is set)
/// * `degrees` - set to true if `angle_threshold` is given in degrees
///
/// # Errors
///
/// Fails on sequences with fewer than two poses and on negative thresholds.
pub fn filter_by_motion(
    poses: &[Matrix4<f64>],
    distance_threshold: f64,
    angle_threshold: f64,
    degrees: bool,
) -> Result<Vec<usize>> {
    if poses.len() < 2 {
        return Err(TrajectoryError::TooFewPoses {
            required: 2,
            actual: poses.len(),
        });
    }
    if distance_threshold < 0.0 {
        return Err(TrajectoryError::NegativeThreshold(distance_threshold));
    }
    if angle_threshold < 0.0 {
        return Err(TrajectoryError::NegativeThreshold(angle_threshold));
    }
    let angle_threshold = if degrees {
        angle_threshold.to_radians()
    } else {
        angle_threshold
    };

    let mut ids = vec![0];
    let mut accumulated_distance = 0.0;
    let mut accumulated_angle = 0.0;
    for i in 1..poses.len() {
        let previous = &poses[i - 1];
        let current = &poses[i];
        accumulated_distance +=
            (lie::translation_from_se3(current) - lie::translation_from_se3(previous)).norm();
        let relative_rotation =
            lie::so3_from_se3(previous).transpose() * lie::so3_from_se3(current);
        accumulated_angle += lie::so3_log_angle(&relative_rotation, false).abs();

        if accumulated_distance >= distance_threshold || accumulated_angle >= angle_threshold {
            ids.push(i);
            accumulated_distance = 0.0;
            accumulated_angle = 0.0;
        }
    }
    Ok(ids)
}
