//! Pose trajectories: pose paths with per-pose timestamps.
//!
//! A [`PoseTrajectory`] is a [`PosePath`] plus a timestamp per pose, with
//! index reductions keeping both in lockstep. Timestamps
//! are expected to be strictly ascending without duplicates; that invariant
//! is reported by [`check`](PoseSequence::check), never silently repaired.
//! Only [`merge`] re-sorts, by construction.

use nalgebra::{Matrix4, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::geometry::UmeyamaResult;
use crate::core::lie;
use crate::error::{Result, TrajectoryError};
use crate::path::{AlignConfig, PathInfo, Plane, PosePath, PoseSequence, ValidityReport};

/// Descriptive summary of a trajectory, as returned by
/// [`PoseTrajectory::get_infos`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryInfo {
    /// Summary of the underlying path.
    pub path: PathInfo,
    /// Duration between first and last timestamp, in seconds.
    pub duration: f64,
    /// First timestamp.
    pub t_start: f64,
    /// Last timestamp.
    pub t_end: f64,
}

/// Speed statistics of a trajectory, as returned by
/// [`PoseTrajectory::get_statistics`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryStats {
    /// Minimum speed in m/s.
    pub v_min_ms: f64,
    /// Maximum speed in m/s.
    pub v_max_ms: f64,
    /// Mean speed in m/s.
    pub v_avg_ms: f64,
    /// Minimum speed in km/h.
    pub v_min_kmh: f64,
    /// Maximum speed in km/h.
    pub v_max_kmh: f64,
    /// Mean speed in km/h.
    pub v_avg_kmh: f64,
}

const MS_TO_KMH: f64 = 3.6;

/// A pose path with one timestamp per pose.
#[derive(Clone, Debug)]
pub struct PoseTrajectory {
    path: PosePath,
    timestamps: Vec<f64>,
}

impl PoseTrajectory {
    /// Create a trajectory from positions, scalar-first quaternions, and
    /// timestamps in seconds.
    pub fn from_positions_orientations(
        positions: Vec<Vector3<f64>>,
        orientations: Vec<Quaternion<f64>>,
        timestamps: Vec<f64>,
    ) -> Result<Self> {
        let path = PosePath::from_positions_orientations(positions, orientations)?;
        Self::from_path(path, timestamps)
    }

    /// Create a trajectory from SE(3) pose matrices and timestamps in
    /// seconds.
    pub fn from_poses(poses: Vec<Matrix4<f64>>, timestamps: Vec<f64>) -> Result<Self> {
        let path = PosePath::from_poses(poses)?;
        Self::from_path(path, timestamps)
    }

    /// Attach timestamps to an existing path.
    ///
    /// # Errors
    ///
    /// Fails when the timestamp count does not match the pose count.
    pub fn from_path(path: PosePath, timestamps: Vec<f64>) -> Result<Self> {
        if timestamps.len() != path.num_poses() {
            return Err(TrajectoryError::TimestampCountMismatch {
                expected: path.num_poses(),
                actual: timestamps.len(),
            });
        }
        Ok(Self { path, timestamps })
    }

    /// The underlying pose path.
    pub fn path(&self) -> &PosePath {
        &self.path
    }

    /// Timestamps, one per pose, in seconds.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Positions of all poses, derived and cached on first access.
    pub fn positions(&mut self) -> &[Vector3<f64>] {
        self.path.positions()
    }

    /// Scalar-first quaternions of all poses, derived and cached on first
    /// access.
    pub fn orientations(&mut self) -> &[Quaternion<f64>] {
        self.path.orientations()
    }

    /// Running distance from the first position to each position.
    pub fn distances(&self) -> Vec<f64> {
        self.path.distances()
    }

    /// Euler angles `(roll, pitch, yaw)` of every pose.
    pub fn orientations_euler(&self) -> Vec<Vector3<f64>> {
        self.path.orientations_euler()
    }

    /// Arc length of the trajectory in meters.
    pub fn path_length(&self) -> f64 {
        self.path.path_length()
    }

    /// Opaque metadata mapping of the underlying path.
    pub fn meta(&self) -> &std::collections::HashMap<String, String> {
        self.path.meta()
    }

    /// Mutable access to the metadata mapping.
    pub fn meta_mut(&mut self) -> &mut std::collections::HashMap<String, String> {
        self.path.meta_mut()
    }

    /// Project the trajectory into a plane (one-shot, see
    /// [`PosePath::project`]). Timestamps are unaffected.
    pub fn project(&mut self, plane: Plane) -> Result<()> {
        self.path.project(plane)
    }

    /// Align to a reference trajectory using Umeyama's method
    /// (see [`PosePath::align`]).
    pub fn align(
        &mut self,
        reference: &PoseTrajectory,
        config: &AlignConfig,
    ) -> Result<UmeyamaResult> {
        self.path.align(&reference.path, config)
    }

    /// Move this trajectory so its first pose coincides with the
    /// reference's first pose (see [`PosePath::align_origin`]).
    pub fn align_origin(&mut self, reference: &PoseTrajectory) -> Result<Matrix4<f64>> {
        self.path.align_origin(&reference.path)
    }

    /// Keep only the poses with timestamps inside `[start, end]` inclusive.
    ///
    /// Unspecified bounds default to the current extreme timestamps.
    /// Relative order is preserved.
    ///
    /// # Errors
    ///
    /// Fails on an empty trajectory or when `start > end`.
    pub fn reduce_to_time_range(&mut self, start: Option<f64>, end: Option<f64>) -> Result<()> {
        if self.num_poses() == 0 {
            return Err(TrajectoryError::EmptyPoseData);
        }
        let start = start.unwrap_or(self.timestamps[0]);
        let end = end.unwrap_or(self.timestamps[self.timestamps.len() - 1]);
        if start > end {
            return Err(TrajectoryError::InvalidTimeRange { start, end });
        }
        let ids: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, &t)| t >= start && t <= end)
            .map(|(i, _)| i)
            .collect();
        self.reduce_to_ids(&ids);
        Ok(())
    }

    /// Speed of motion between consecutive poses, in m/s. The result has
    /// one entry per pose pair (length N − 1).
    ///
    /// # Errors
    ///
    /// Fails on trajectories shorter than 2 poses and on any pose pair with
    /// non-positive elapsed time.
    pub fn speeds(&self) -> Result<Vec<f64>> {
        if self.num_poses() < 2 {
            return Err(TrajectoryError::TooFewPoses {
                required: 2,
                actual: self.num_poses(),
            });
        }
        let positions = self.path.positions_snapshot();
        let mut speeds = Vec::with_capacity(positions.len() - 1);
        for i in 0..positions.len() - 1 {
            speeds.push(calc_speed(
                &positions[i],
                &positions[i + 1],
                self.timestamps[i],
                self.timestamps[i + 1],
            )?);
        }
        Ok(speeds)
    }

    /// Duration between the first and last timestamp, in seconds.
    ///
    /// # Errors
    ///
    /// Fails on an empty trajectory.
    pub fn duration(&self) -> Result<f64> {
        if self.timestamps.is_empty() {
            return Err(TrajectoryError::EmptyPoseData);
        }
        Ok(self.timestamps[self.timestamps.len() - 1] - self.timestamps[0])
    }

    /// Descriptive summary of the trajectory.
    pub fn get_infos(&self) -> Result<TrajectoryInfo> {
        let path = self.path.get_infos()?;
        Ok(TrajectoryInfo {
            path,
            duration: self.duration()?,
            t_start: self.timestamps[0],
            t_end: self.timestamps[self.timestamps.len() - 1],
        })
    }

    /// Speed statistics in m/s and km/h.
    ///
    /// # Errors
    ///
    /// Fails on trajectories shorter than 2 poses and on non-positive
    /// elapsed time between any pose pair.
    pub fn get_statistics(&self) -> Result<TrajectoryStats> {
        let speeds = self.speeds()?;
        let v_min = speeds.iter().cloned().fold(f64::INFINITY, f64::min);
        let v_max = speeds.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let v_avg = speeds.iter().sum::<f64>() / speeds.len() as f64;
        Ok(TrajectoryStats {
            v_min_ms: v_min,
            v_max_ms: v_max,
            v_avg_ms: v_avg,
            v_min_kmh: v_min * MS_TO_KMH,
            v_max_kmh: v_max * MS_TO_KMH,
            v_avg_kmh: v_avg * MS_TO_KMH,
        })
    }

    /// Approximate equality of poses and timestamps, accepting the
    /// quaternion sign ambiguity.
    pub fn approx_eq(&self, other: &PoseTrajectory, epsilon: f64) -> bool {
        self.path.approx_eq(&other.path, epsilon)
            && self.timestamps.len() == other.timestamps.len()
            && self
                .timestamps
                .iter()
                .zip(other.timestamps.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl PoseSequence for PoseTrajectory {
    fn num_poses(&self) -> usize {
        self.path.num_poses()
    }

    fn poses_se3(&mut self) -> &[Matrix4<f64>] {
        self.path.poses_se3()
    }

    fn transform(&mut self, t: &Matrix4<f64>, right_mul: bool, propagate: bool) {
        self.path.transform(t, right_mul, propagate);
    }

    fn scale(&mut self, factor: f64) {
        self.path.scale(factor);
    }

    fn reduce_to_ids(&mut self, ids: &[usize]) {
        self.path.reduce_to_ids(ids);
        self.timestamps = ids.iter().map(|&i| self.timestamps[i]).collect();
    }

    fn check(&mut self) -> ValidityReport {
        if self.num_poses() == 0 {
            return ValidityReport::trivially_valid();
        }
        let mut report = self.path.check();
        report.timestamp_count_ok = Some(self.timestamps.len() == self.path.num_poses());
        report.timestamps_ascending =
            Some(self.timestamps.windows(2).all(|pair| pair[0] < pair[1]));
        report
    }
}

/// Speed between two stamped positions, in m/s.
///
/// # Errors
///
/// Fails when the elapsed time is zero or negative.
pub fn calc_speed(xyz_1: &Vector3<f64>, xyz_2: &Vector3<f64>, t_1: f64, t_2: f64) -> Result<f64> {
    if t_2 - t_1 <= 0.0 {
        return Err(TrajectoryError::NonPositiveTimeDelta { t1: t_1, t2: t_2 });
    }
    Ok((xyz_2 - xyz_1).norm() / (t_2 - t_1))
}

/// Angular speed between two stamped poses: difference of the log-map
/// rotation angles over the elapsed time, in rad/s (or deg/s).
///
/// # Errors
///
/// Fails when the elapsed time is zero or negative.
pub fn calc_angular_speed(
    pose_1: &Matrix4<f64>,
    pose_2: &Matrix4<f64>,
    t_1: f64,
    t_2: f64,
    degrees: bool,
) -> Result<f64> {
    if t_2 - t_1 <= 0.0 {
        return Err(TrajectoryError::NonPositiveTimeDelta { t1: t_1, t2: t_2 });
    }
    let angle_1 = lie::so3_log_angle(&lie::so3_from_se3(pose_1), degrees);
    let angle_2 = lie::so3_log_angle(&lie::so3_from_se3(pose_2), degrees);
    Ok((angle_2 - angle_1) / (t_2 - t_1))
}

/// Merge trajectories into a single one, re-sorted by timestamp.
///
/// Concatenates positions, orientations, and timestamps of all inputs and
/// stably sorts the combined sequence by timestamp ascending. Duplicate
/// timestamps are kept; ties keep their input order. This is the one place
/// where timestamps are reordered on the caller's behalf.
///
/// # Errors
///
/// Fails when the inputs contain no poses at all.
pub fn merge(trajectories: &[PoseTrajectory]) -> Result<PoseTrajectory> {
    let mut positions = Vec::new();
    let mut orientations = Vec::new();
    let mut timestamps = Vec::new();
    for trajectory in trajectories {
        positions.extend_from_slice(&trajectory.path.positions_snapshot());
        orientations.extend_from_slice(&trajectory.path.orientations_snapshot());
        timestamps.extend_from_slice(&trajectory.timestamps);
    }

    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    order.sort_by(|&a, &b| {
        timestamps[a]
            .partial_cmp(&timestamps[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    PoseTrajectory::from_positions_orientations(
        order.iter().map(|&i| positions[i]).collect(),
        order.iter().map(|&i| orientations[i]).collect(),
        order.iter().map(|&i| timestamps[i]).collect(),
    )
}
