//! Pose paths: ordered sequences of rigid poses with a dual representation.
//!
//! A [`PosePath`] stores either position + quaternion arrays or a list of
//! SE(3) matrices, whichever it was constructed from. The other
//! representation is derived on first access and cached; every mutating
//! operation either recomputes or drops the cached side so the two views can
//! never diverge.

use std::borrow::Cow;
use std::collections::HashMap;

use nalgebra::{Matrix4, Quaternion, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::geometry::{self, UmeyamaResult};
use crate::core::{filters, lie};
use crate::error::{Result, TrajectoryError};

/// Planes embedded in R3, for projection purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plane {
    /// The XY plane (normal axis Z).
    XY,
    /// The XZ plane (normal axis Y).
    XZ,
    /// The YZ plane (normal axis X).
    YZ,
}

impl Plane {
    /// Index of the coordinate axis normal to this plane.
    fn normal_axis(self) -> usize {
        match self {
            Plane::XY => 2,
            Plane::XZ => 1,
            Plane::YZ => 0,
        }
    }
}

/// Configuration for [`PosePath::align`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Also estimate and apply a uniform scale correction.
    pub correct_scale: bool,
    /// Apply only the scale correction, skipping rotation and translation.
    pub correct_only_scale: bool,
    /// Use only the first `fraction * N` poses to solve the alignment
    /// (the resulting transform is still applied to the whole path).
    /// `None` uses all poses.
    pub fraction: Option<f64>,
}

/// Per-check breakdown returned by [`PoseSequence::check`].
///
/// The timestamp fields are `None` for plain paths and `Some` for
/// trajectories.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidityReport {
    /// All materialized representations have the same pose count.
    pub lengths_consistent: bool,
    /// Every pose matrix is a valid SE(3) member within tolerance.
    pub se3_conform: bool,
    /// Every orientation quaternion has unit norm within tolerance.
    pub quaternions_normed: bool,
    /// Timestamp count matches the pose count (trajectories only).
    pub timestamp_count_ok: Option<bool>,
    /// Timestamps are strictly ascending without duplicates
    /// (trajectories only).
    pub timestamps_ascending: Option<bool>,
}

impl ValidityReport {
    /// Overall verdict: true when every performed check passed.
    pub fn is_valid(&self) -> bool {
        self.lengths_consistent
            && self.se3_conform
            && self.quaternions_normed
            && self.timestamp_count_ok.unwrap_or(true)
            && self.timestamps_ascending.unwrap_or(true)
    }

    /// Report for a trivially valid (empty) sequence.
    pub(crate) fn trivially_valid() -> Self {
        Self {
            lengths_consistent: true,
            se3_conform: true,
            quaternions_normed: true,
            timestamp_count_ok: None,
            timestamps_ascending: None,
        }
    }
}

/// Descriptive summary of a path, as returned by [`PosePath::get_infos`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathInfo {
    /// Number of poses.
    pub num_poses: usize,
    /// Arc length of the position sequence in meters.
    pub path_length: f64,
    /// First position.
    pub pos_start: Vector3<f64>,
    /// Last position.
    pub pos_end: Vector3<f64>,
}

/// Shared capability interface of [`PosePath`] and
/// [`PoseTrajectory`](crate::trajectory::PoseTrajectory).
///
/// Index reductions flow through [`PoseSequence::reduce_to_ids`] of the
/// implementor, so the provided [`downsample`](PoseSequence::downsample) and
/// [`motion_filter`](PoseSequence::motion_filter) keep trajectory timestamps
/// in lockstep automatically.
pub trait PoseSequence {
    /// Number of poses in the sequence.
    fn num_poses(&self) -> usize;

    /// SE(3) matrices of all poses, derived and cached on first access.
    fn poses_se3(&mut self) -> &[Matrix4<f64>];

    /// Apply a 4x4 transform to every pose, in place.
    ///
    /// Left-multiplicative (default): `new = t · old`, a rigid frame change
    /// applied uniformly. Right-multiplicative without propagation:
    /// `new = old · t`, a body-frame offset applied to each pose
    /// independently. Right-multiplicative with propagation injects `t` as
    /// drift: the first pose receives `t` directly and every subsequent pose
    /// is re-chained from the previous *new* pose through the perturbed
    /// relative step, so the effect accumulates along the path.
    ///
    /// `t` is typically SE(3) but may carry scale (Sim(3)); rigidity is the
    /// business of [`check`](PoseSequence::check), not enforced here. Derived
    /// representations are recomputed afterwards.
    fn transform(&mut self, t: &Matrix4<f64>, right_mul: bool, propagate: bool);

    /// Multiply every translation component by `factor`, in all materialized
    /// representations. Rotations are untouched.
    fn scale(&mut self, factor: f64);

    /// Keep only the poses at the given ordered indices, across all
    /// materialized representations.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    fn reduce_to_ids(&mut self, ids: &[usize]);

    /// Validate the sequence: representation length consistency, SE(3)
    /// validity of every pose, and unit norm of every quaternion.
    ///
    /// Advisory only; operations never run this implicitly. Empty sequences
    /// are trivially valid.
    fn check(&mut self) -> ValidityReport;

    /// Downsample to `num_poses` evenly spaced poses (always including the
    /// first and last). No-op when the sequence is already small enough.
    ///
    /// # Errors
    ///
    /// Fails when asked to go below 2 poses.
    fn downsample(&mut self, num_poses: usize) -> Result<()> {
        if self.num_poses() <= num_poses {
            return Ok(());
        }
        if num_poses < 2 {
            return Err(TrajectoryError::DownsampleBelowMinimum(num_poses));
        }
        let ids = evenly_spaced_ids(self.num_poses(), num_poses);
        self.reduce_to_ids(&ids);
        Ok(())
    }

    /// Reduce to the poses selected by the motion filter
    /// (see [`filter_by_motion`](crate::core::filters::filter_by_motion)).
    fn motion_filter(
        &mut self,
        distance_threshold: f64,
        angle_threshold: f64,
        degrees: bool,
    ) -> Result<()> {
        let ids =
            filters::filter_by_motion(self.poses_se3(), distance_threshold, angle_threshold, degrees)?;
        self.reduce_to_ids(&ids);
        Ok(())
    }
}

/// Evenly spaced indices over `0..len`, first and last included.
fn evenly_spaced_ids(len: usize, count: usize) -> Vec<usize> {
    let step = (len - 1) as f64 / (count - 1) as f64;
    let mut ids: Vec<usize> = (0..count).map(|i| (i as f64 * step) as usize).collect();
    // Rounding may land the endpoint one short; the last pose is always kept.
    if let Some(last) = ids.last_mut() {
        *last = len - 1;
    }
    ids
}

/// An ordered sequence of rigid poses, without temporal information.
///
/// Owns its backing arrays exclusively; callers needing an independent copy
/// must clone. All mutating operations work in place.
#[derive(Clone, Debug)]
pub struct PosePath {
    positions: Option<Vec<Vector3<f64>>>,
    orientations: Option<Vec<Quaternion<f64>>>,
    poses: Option<Vec<Matrix4<f64>>>,
    meta: HashMap<String, String>,
    projected: bool,
}

impl PosePath {
    /// Create a path from positions and scalar-first `(w, x, y, z)`
    /// quaternions of equal length.
    ///
    /// # Errors
    ///
    /// Fails on mismatched lengths or empty input.
    pub fn from_positions_orientations(
        positions: Vec<Vector3<f64>>,
        orientations: Vec<Quaternion<f64>>,
    ) -> Result<Self> {
        if positions.len() != orientations.len() {
            return Err(TrajectoryError::RepresentationLengthMismatch {
                positions: positions.len(),
                orientations: orientations.len(),
            });
        }
        if positions.is_empty() {
            return Err(TrajectoryError::EmptyPoseData);
        }
        Ok(Self {
            positions: Some(positions),
            orientations: Some(orientations),
            poses: None,
            meta: HashMap::new(),
            projected: false,
        })
    }

    /// Create a path from a list of SE(3) pose matrices.
    ///
    /// # Errors
    ///
    /// Fails on empty input.
    pub fn from_poses(poses: Vec<Matrix4<f64>>) -> Result<Self> {
        if poses.is_empty() {
            return Err(TrajectoryError::EmptyPoseData);
        }
        Ok(Self {
            positions: None,
            orientations: None,
            poses: Some(poses),
            meta: HashMap::new(),
            projected: false,
        })
    }

    /// Attach opaque metadata, replacing any existing mapping.
    pub fn with_meta(mut self, meta: HashMap<String, String>) -> Self {
        self.meta = meta;
        self
    }

    /// Opaque metadata mapping; never interpreted by the engine.
    pub fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Mutable access to the metadata mapping.
    pub fn meta_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.meta
    }

    /// Whether this path has already been projected into a plane.
    pub fn is_projected(&self) -> bool {
        self.projected
    }

    /// Positions of all poses, derived and cached on first access.
    pub fn positions(&mut self) -> &[Vector3<f64>] {
        if self.positions.is_none() {
            let poses = self.poses.as_ref().unwrap();
            self.positions = Some(derive_positions(poses));
        }
        self.positions.as_ref().unwrap()
    }

    /// Scalar-first `(w, x, y, z)` quaternions of all poses, derived and
    /// cached on first access.
    ///
    /// Quaternions derived from matrices carry the usual sign ambiguity:
    /// `q` and `-q` encode the same rotation.
    pub fn orientations(&mut self) -> &[Quaternion<f64>] {
        if self.orientations.is_none() {
            let poses = self.poses.as_ref().unwrap();
            self.orientations = Some(derive_orientations(poses));
        }
        self.orientations.as_ref().unwrap()
    }

    /// Running distance from the first position to each position.
    pub fn distances(&self) -> Vec<f64> {
        geometry::accumulated_distances(&self.positions_snapshot())
    }

    /// Euler angles `(roll, pitch, yaw)` of every pose, about the fixed
    /// X, Y, Z axes. Computed on the fly for plotting-layer egress.
    pub fn orientations_euler(&self) -> Vec<Vector3<f64>> {
        self.poses_snapshot()
            .iter()
            .map(|pose| {
                let (roll, pitch, yaw) =
                    Rotation3::from_matrix_unchecked(lie::so3_from_se3(pose)).euler_angles();
                Vector3::new(roll, pitch, yaw)
            })
            .collect()
    }

    /// Arc length of the path in meters.
    pub fn path_length(&self) -> f64 {
        geometry::arc_len(&self.positions_snapshot())
    }

    /// Project positions and orientations into a plane.
    ///
    /// Zeroes the coordinate normal to the plane in every translation and
    /// constrains every rotation to a pure rotation about the plane normal
    /// (keeping only that Euler component). Projection destroys the
    /// information needed to project again meaningfully, so it is one-shot.
    ///
    /// # Errors
    ///
    /// Fails if the path was already projected once.
    pub fn project(&mut self, plane: Plane) -> Result<()> {
        if self.projected {
            return Err(TrajectoryError::AlreadyProjected);
        }
        let axis = plane.normal_axis();
        let mut normal = Vector3::zeros();
        normal[axis] = 1.0;

        self.poses_se3();
        let poses = self.poses.as_mut().unwrap();
        for pose in poses.iter_mut() {
            pose[(axis, 3)] = 0.0;
            let euler = Rotation3::from_matrix_unchecked(lie::so3_from_se3(pose)).euler_angles();
            let angle = match axis {
                0 => euler.0,
                1 => euler.1,
                _ => euler.2,
            };
            let constrained = lie::so3_exp(&(normal * angle));
            pose.fixed_view_mut::<3, 3>(0, 0).copy_from(&constrained);
        }

        // Cached derived arrays are stale; recompute lazily on next access.
        self.positions = None;
        self.orientations = None;
        self.projected = true;
        Ok(())
    }

    /// Align this path to a reference using Umeyama's method.
    ///
    /// Solves for the rigid (or, with scale correction, similarity)
    /// transform mapping this path's positions onto the reference's and
    /// applies it in place. With `correct_only_scale` only the scale factor
    /// is applied. `fraction` restricts the poses fed to the solver to the
    /// first `fraction * N`, while the transform still applies to the whole
    /// path.
    ///
    /// After the primary alignment a corrective rotation is derived so that
    /// this path's first orientation exactly matches the reference's first
    /// orientation, and applied right-multiplicatively with propagation:
    /// residual orientation drift at the start is distributed along the
    /// whole path instead of offsetting it uniformly. Translation drift is
    /// deliberately not pinned.
    ///
    /// Returns the rotation, translation, and scale of the primary
    /// alignment step.
    pub fn align(&mut self, reference: &PosePath, config: &AlignConfig) -> Result<UmeyamaResult> {
        let with_scale = config.correct_scale || config.correct_only_scale;
        if config.correct_only_scale {
            log::debug!("correcting scale only");
        } else {
            log::debug!(
                "aligning using Umeyama's method{}",
                if with_scale { " (with scale correction)" } else { "" }
            );
        }

        let result = {
            let source = self.positions_snapshot();
            let target = reference.positions_snapshot();
            let (source_used, target_used) = match config.fraction {
                None => (&source[..], &target[..]),
                Some(fraction) => {
                    if !(fraction > 0.0 && fraction <= 1.0) {
                        return Err(TrajectoryError::InvalidFraction(fraction));
                    }
                    let count = (fraction * target.len() as f64) as usize;
                    let source_used = source.get(..count).ok_or(
                        TrajectoryError::PointSetSizeMismatch {
                            source: source.len(),
                            target: count,
                        },
                    )?;
                    (source_used, &target[..count])
                }
            };
            geometry::umeyama_alignment(source_used, target_used, with_scale)?
        };
        log::debug!("scale correction: {}", result.scale);

        if config.correct_only_scale {
            self.scale(result.scale);
            return Ok(result);
        }
        if config.correct_scale {
            self.scale(result.scale);
        }
        self.transform(&lie::se3(&result.rotation, &result.translation), false, false);
        self.pin_origin_orientation(reference);
        Ok(result)
    }

    /// Rigidly move this path so its first pose coincides exactly with the
    /// reference's first pose (no least-squares fitting), then apply the
    /// same origin-orientation pinning correction as [`align`](Self::align).
    ///
    /// Returns the transform used for the first step.
    ///
    /// # Errors
    ///
    /// Fails if either path is empty.
    pub fn align_origin(&mut self, reference: &PosePath) -> Result<Matrix4<f64>> {
        if self.num_poses() == 0 || reference.num_poses() == 0 {
            return Err(TrajectoryError::EmptyPoseData);
        }
        let own_first = self.poses_se3()[0];
        let ref_first = reference.poses_snapshot()[0];
        let to_ref_origin = ref_first * lie::se3_inverse(&own_first);
        log::debug!("origin alignment transformation: {:?}", to_ref_origin);
        self.transform(&to_ref_origin, false, false);
        self.pin_origin_orientation(reference);
        Ok(to_ref_origin)
    }

    /// Descriptive summary of the path.
    ///
    /// # Errors
    ///
    /// Fails on an empty path.
    pub fn get_infos(&self) -> Result<PathInfo> {
        let positions = self.positions_snapshot();
        if positions.is_empty() {
            return Err(TrajectoryError::EmptyPoseData);
        }
        Ok(PathInfo {
            num_poses: positions.len(),
            path_length: geometry::arc_len(&positions),
            pos_start: positions[0],
            pos_end: positions[positions.len() - 1],
        })
    }

    /// Approximate equality, accepting the quaternion sign ambiguity
    /// (`q` and `-q` encode the same rotation).
    pub fn approx_eq(&self, other: &PosePath, epsilon: f64) -> bool {
        if self.num_poses() != other.num_poses() {
            return false;
        }
        let own_poses = self.poses_snapshot();
        let other_poses = other.poses_snapshot();
        let poses_close = own_poses
            .iter()
            .zip(other_poses.iter())
            .all(|(a, b)| (a - b).abs().max() <= epsilon);

        let own_quats = self.orientations_snapshot();
        let other_quats = other.orientations_snapshot();
        let quats_close = own_quats.iter().zip(other_quats.iter()).all(|(a, b)| {
            (*a - *b).norm() <= epsilon || (*a + *b).norm() <= epsilon
        });

        poses_close && quats_close
    }

    /// Corrective rotation so the first pose matches the reference's first
    /// orientation, injected right-multiplicatively with propagation.
    fn pin_origin_orientation(&mut self, reference: &PosePath) {
        let own_first = self.poses_se3()[0];
        let ref_first = reference.poses_snapshot()[0];
        let to_ref_origin = lie::relative_se3(&own_first, &ref_first);
        let correction = lie::se3(&lie::so3_from_se3(&to_ref_origin), &Vector3::zeros());
        log::debug!("origin orientation correction: {:?}", correction);
        self.transform(&correction, true, true);
    }

    /// Positions without mutating the cache (derived on the fly when only
    /// the matrix representation is materialized).
    pub(crate) fn positions_snapshot(&self) -> Cow<'_, [Vector3<f64>]> {
        match &self.positions {
            Some(positions) => Cow::Borrowed(positions.as_slice()),
            None => Cow::Owned(derive_positions(self.poses.as_ref().unwrap())),
        }
    }

    /// Orientations without mutating the cache.
    pub(crate) fn orientations_snapshot(&self) -> Cow<'_, [Quaternion<f64>]> {
        match &self.orientations {
            Some(orientations) => Cow::Borrowed(orientations.as_slice()),
            None => Cow::Owned(derive_orientations(self.poses.as_ref().unwrap())),
        }
    }

    /// SE(3) matrices without mutating the cache.
    pub(crate) fn poses_snapshot(&self) -> Cow<'_, [Matrix4<f64>]> {
        match &self.poses {
            Some(poses) => Cow::Borrowed(poses.as_slice()),
            None => Cow::Owned(derive_poses(
                self.positions.as_ref().unwrap(),
                self.orientations.as_ref().unwrap(),
            )),
        }
    }
}

impl PoseSequence for PosePath {
    fn num_poses(&self) -> usize {
        if let Some(poses) = &self.poses {
            poses.len()
        } else if let Some(positions) = &self.positions {
            positions.len()
        } else {
            0
        }
    }

    fn poses_se3(&mut self) -> &[Matrix4<f64>] {
        if self.poses.is_none() {
            self.poses = Some(derive_poses(
                self.positions.as_ref().unwrap(),
                self.orientations.as_ref().unwrap(),
            ));
        }
        self.poses.as_ref().unwrap()
    }

    fn transform(&mut self, t: &Matrix4<f64>, right_mul: bool, propagate: bool) {
        let poses = self.poses_se3();
        let new_poses: Vec<Matrix4<f64>> = if right_mul && !propagate {
            poses.iter().map(|p| p * t).collect()
        } else if right_mul && propagate {
            // Perturb each relative step by t and re-chain from the first
            // pose forward, so t's effect accumulates along the path.
            let relative: Vec<Matrix4<f64>> = poses
                .windows(2)
                .map(|pair| lie::relative_se3(&pair[0], &pair[1]) * t)
                .collect();
            let mut chained = Vec::with_capacity(poses.len());
            chained.push(poses[0] * t);
            for step in &relative {
                let next = chained[chained.len() - 1] * step;
                chained.push(next);
            }
            chained
        } else {
            poses.iter().map(|p| t * p).collect()
        };
        self.poses = Some(new_poses);

        let poses = self.poses.as_ref().unwrap();
        self.positions = Some(derive_positions(poses));
        self.orientations = Some(derive_orientations(poses));
    }

    fn scale(&mut self, factor: f64) {
        if let Some(poses) = self.poses.as_mut() {
            for pose in poses.iter_mut() {
                let scaled = lie::translation_from_se3(pose) * factor;
                pose.fixed_view_mut::<3, 1>(0, 3).copy_from(&scaled);
            }
        }
        if let Some(positions) = self.positions.as_mut() {
            for position in positions.iter_mut() {
                *position *= factor;
            }
        }
    }

    fn reduce_to_ids(&mut self, ids: &[usize]) {
        if let Some(positions) = self.positions.take() {
            self.positions = Some(ids.iter().map(|&i| positions[i]).collect());
        }
        if let Some(orientations) = self.orientations.take() {
            self.orientations = Some(ids.iter().map(|&i| orientations[i]).collect());
        }
        if let Some(poses) = self.poses.take() {
            self.poses = Some(ids.iter().map(|&i| poses[i]).collect());
        }
    }

    fn check(&mut self) -> ValidityReport {
        if self.num_poses() == 0 {
            return ValidityReport::trivially_valid();
        }
        self.poses_se3();
        self.positions();
        self.orientations();
        let positions = self.positions.as_ref().unwrap();
        let orientations = self.orientations.as_ref().unwrap();
        let poses = self.poses.as_ref().unwrap();
        ValidityReport {
            lengths_consistent: positions.len() == orientations.len()
                && orientations.len() == poses.len(),
            se3_conform: poses.iter().all(lie::is_se3),
            quaternions_normed: orientations
                .iter()
                .all(|q| (q.norm() - 1.0).abs() < lie::MATRIX_EPS),
            timestamp_count_ok: None,
            timestamps_ascending: None,
        }
    }
}

fn derive_positions(poses: &[Matrix4<f64>]) -> Vec<Vector3<f64>> {
    poses.iter().map(lie::translation_from_se3).collect()
}

fn derive_orientations(poses: &[Matrix4<f64>]) -> Vec<Quaternion<f64>> {
    poses
        .iter()
        .map(|p| lie::quaternion_from_rotation(&lie::so3_from_se3(p)))
        .collect()
}

fn derive_poses(
    positions: &[Vector3<f64>],
    orientations: &[Quaternion<f64>],
) -> Vec<Matrix4<f64>> {
    positions
        .iter()
        .zip(orientations.iter())
        .map(|(position, quaternion)| {
            lie::se3(&lie::rotation_from_quaternion(quaternion), position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;
    use std::f64::consts::FRAC_PI_2;

    fn sample_quat(axis_angle: Vector3<f64>) -> Quaternion<f64> {
        lie::quaternion_from_rotation(&lie::so3_exp(&axis_angle))
    }

    fn sample_path() -> PosePath {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.5),
            Vector3::new(2.0, 1.0, 1.0),
            Vector3::new(3.0, 1.5, 1.5),
        ];
        let orientations = vec![
            sample_quat(Vector3::zeros()),
            sample_quat(Vector3::new(0.0, 0.0, 0.3)),
            sample_quat(Vector3::new(0.1, 0.0, 0.6)),
            sample_quat(Vector3::new(0.1, 0.2, 0.9)),
        ];
        PosePath::from_positions_orientations(positions, orientations).unwrap()
    }

    #[test]
    fn test_construction_rejects_empty_and_mismatched() {
        assert_eq!(
            PosePath::from_positions_orientations(Vec::new(), Vec::new()).unwrap_err(),
            TrajectoryError::EmptyPoseData
        );
        assert_eq!(
            PosePath::from_poses(Vec::new()).unwrap_err(),
            TrajectoryError::EmptyPoseData
        );
        assert_eq!(
            PosePath::from_positions_orientations(
                vec![Vector3::zeros()],
                vec![Quaternion::identity(), Quaternion::identity()],
            )
            .unwrap_err(),
            TrajectoryError::RepresentationLengthMismatch {
                positions: 1,
                orientations: 2
            }
        );
    }

    #[test]
    fn test_representation_roundtrip() {
        let mut path = sample_path();
        let positions: Vec<_> = path.positions().to_vec();
        let orientations: Vec<_> = path.orientations().to_vec();

        // positions + quaternions -> SE(3) -> positions + quaternions
        let mut rebuilt = PosePath::from_poses(path.poses_se3().to_vec()).unwrap();
        for (original, derived) in positions.iter().zip(rebuilt.positions().iter()) {
            assert_relative_eq!(*original, *derived, epsilon = 1e-12);
        }
        for (original, derived) in orientations.iter().zip(rebuilt.orientations().iter()) {
            let direct = (*original - *derived).norm();
            let flipped = (*original + *derived).norm();
            assert!(
                direct < 1e-9 || flipped < 1e-9,
                "quaternions differ beyond sign: {:?} vs {:?}",
                original,
                derived
            );
        }
        assert!(path.approx_eq(&rebuilt, 1e-9));
    }

    #[test]
    fn test_transform_left_invertible() {
        let mut path = sample_path();
        let reference = path.clone();
        let t = lie::se3(
            &lie::so3_exp(&Vector3::new(0.2, -0.1, 0.5)),
            &Vector3::new(1.0, 2.0, 3.0),
        );
        path.transform(&t, false, false);
        assert!(!path.approx_eq(&reference, 1e-9));
        path.transform(&lie::se3_inverse(&t), false, false);
        assert!(path.approx_eq(&reference, 1e-9));
    }

    #[test]
    fn test_transform_right_is_body_frame_offset() {
        let mut path = sample_path();
        let original = path.poses_se3().to_vec();
        let t = lie::se3(&Matrix3::identity(), &Vector3::new(0.0, 0.0, 1.0));
        path.transform(&t, true, false);
        for (new_pose, old_pose) in path.poses_se3().iter().zip(original.iter()) {
            assert_relative_eq!(*new_pose, old_pose * t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_propagate_chains_drift() {
        let mut path = sample_path();
        let original = path.poses_se3().to_vec();
        let t = lie::se3(
            &lie::so3_exp(&Vector3::new(0.0, 0.0, 0.01)),
            &Vector3::new(0.01, 0.0, 0.0),
        );
        path.transform(&t, true, true);

        let transformed = path.poses_se3();
        assert_relative_eq!(transformed[0], original[0] * t, epsilon = 1e-12);
        for i in 1..original.len() {
            let step = lie::relative_se3(&original[i - 1], &original[i]) * t;
            assert_relative_eq!(transformed[i], transformed[i - 1] * step, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_keeps_representations_consistent() {
        let mut path = sample_path();
        let t = lie::se3(
            &lie::so3_exp(&Vector3::new(0.0, 0.3, 0.0)),
            &Vector3::new(-1.0, 0.0, 2.0),
        );
        path.transform(&t, false, false);
        let from_matrices: Vec<_> = path
            .poses_se3()
            .iter()
            .map(lie::translation_from_se3)
            .collect();
        for (cached, derived) in path.positions().iter().zip(from_matrices.iter()) {
            assert_relative_eq!(*cached, *derived, epsilon = 1e-12);
        }
        assert!(path.check().is_valid());
    }

    #[test]
    fn test_scale_touches_translations_only() {
        let mut path = sample_path();
        path.poses_se3();
        let orientations_before = path.orientations().to_vec();
        path.scale(2.0);
        assert_relative_eq!(path.positions()[1], Vector3::new(2.0, 0.0, 1.0));
        assert_relative_eq!(
            lie::translation_from_se3(&path.poses_se3()[3]),
            Vector3::new(6.0, 3.0, 3.0)
        );
        for (before, after) in orientations_before.iter().zip(path.orientations().iter()) {
            assert_relative_eq!(*before, *after, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_project_xy_zeroes_z_and_constrains_rotations() {
        let mut path = sample_path();
        path.project(Plane::XY).unwrap();

        for pose in path.poses_se3() {
            assert_relative_eq!(lie::translation_from_se3(pose).z, 0.0);
            let rotvec = lie::so3_log(&lie::so3_from_se3(pose));
            assert_relative_eq!(rotvec.x, 0.0, epsilon = 1e-9);
            assert_relative_eq!(rotvec.y, 0.0, epsilon = 1e-9);
        }
        assert!(path.check().is_valid());
        assert!(path.is_projected());
        assert_eq!(path.project(Plane::XY), Err(TrajectoryError::AlreadyProjected));
    }

    #[test]
    fn test_project_preserves_pure_plane_rotation() {
        let positions = vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(2.0, 2.0, 3.0)];
        let orientations = vec![
            sample_quat(Vector3::new(0.0, 0.0, FRAC_PI_2)),
            sample_quat(Vector3::new(0.0, 0.0, 0.4)),
        ];
        let mut path = PosePath::from_positions_orientations(positions, orientations).unwrap();
        path.project(Plane::XY).unwrap();

        let rotvec = lie::so3_log(&lie::so3_from_se3(&path.poses_se3()[0]));
        assert_relative_eq!(rotvec.z, FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_reduce_to_ids_all_representations() {
        let mut path = sample_path();
        path.poses_se3();
        path.reduce_to_ids(&[0, 2]);
        assert_eq!(path.num_poses(), 2);
        assert_relative_eq!(path.positions()[1], Vector3::new(2.0, 1.0, 1.0));
        assert_eq!(path.poses_se3().len(), 2);
        assert!(path.check().is_valid());
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let positions: Vec<_> = (0..11).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect();
        let orientations = vec![Quaternion::identity(); 11];
        let mut path = PosePath::from_positions_orientations(positions, orientations).unwrap();

        path.downsample(4).unwrap();
        assert_eq!(path.num_poses(), 4);
        assert_relative_eq!(path.positions()[0], Vector3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(path.positions()[3], Vector3::new(10.0, 0.0, 0.0));

        // Already small enough: no-op.
        path.downsample(10).unwrap();
        assert_eq!(path.num_poses(), 4);

        assert_eq!(
            path.downsample(1),
            Err(TrajectoryError::DownsampleBelowMinimum(1))
        );
    }

    #[test]
    fn test_motion_filter_reduces_in_place() {
        let positions: Vec<_> = (0..10).map(|i| Vector3::new(i as f64 * 0.4, 0.0, 0.0)).collect();
        let orientations = vec![Quaternion::identity(); 10];
        let mut path = PosePath::from_positions_orientations(positions, orientations).unwrap();
        path.motion_filter(1.0, 1000.0, false).unwrap();
        assert_relative_eq!(path.positions()[0], Vector3::zeros());
        assert_relative_eq!(path.positions()[1], Vector3::new(1.2, 0.0, 0.0));
    }

    #[test]
    fn test_orientations_euler_yaw_only() {
        let positions = vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)];
        let orientations = vec![
            sample_quat(Vector3::new(0.0, 0.0, 0.3)),
            sample_quat(Vector3::new(0.0, 0.0, -0.7)),
        ];
        let path = PosePath::from_positions_orientations(positions, orientations).unwrap();
        let euler = path.orientations_euler();
        assert_relative_eq!(euler[0], Vector3::new(0.0, 0.0, 0.3), epsilon = 1e-9);
        assert_relative_eq!(euler[1], Vector3::new(0.0, 0.0, -0.7), epsilon = 1e-9);
    }

    #[test]
    fn test_check_flags_denormalized_quaternions() {
        let positions = vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)];
        let orientations = vec![Quaternion::identity(), Quaternion::new(2.0, 0.0, 0.0, 0.0)];
        let mut path = PosePath::from_positions_orientations(positions, orientations).unwrap();
        let report = path.check();
        assert!(!report.quaternions_normed);
        assert!(!report.is_valid());
        assert!(report.lengths_consistent);
    }

    #[test]
    fn test_get_infos_summary() {
        let path = sample_path();
        let infos = path.get_infos().unwrap();
        assert_eq!(infos.num_poses, 4);
        assert!(infos.path_length > 0.0);
        assert_relative_eq!(infos.pos_start, Vector3::zeros());
        assert_relative_eq!(infos.pos_end, Vector3::new(3.0, 1.5, 1.5));
    }

    #[test]
    fn test_meta_is_opaque_and_preserved() {
        let mut path = sample_path().with_meta(HashMap::from([(
            "frame".to_string(),
            "odom".to_string(),
        )]));
        path.scale(2.0);
        assert_eq!(path.meta().get("frame").map(String::as_str), Some("odom"));
    }
}
