//! Test utilities for trajectory-geometry integration tests.

#![allow(dead_code)]

use gati_eval::core::lie;
use gati_eval::{PosePath, PoseTrajectory};
use nalgebra::{Matrix4, Quaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Quaternion for a rotation about Z by `yaw` radians.
pub fn quat_from_yaw(yaw: f64) -> Quaternion<f64> {
    lie::quaternion_from_rotation(&lie::so3_exp(&Vector3::new(0.0, 0.0, yaw)))
}

/// Straight-line trajectory along X with constant speed.
pub fn straight_trajectory(n: usize, spacing: f64, dt: f64) -> PoseTrajectory {
    let positions: Vec<_> = (0..n)
        .map(|i| Vector3::new(i as f64 * spacing, 0.0, 0.0))
        .collect();
    let orientations = vec![Quaternion::identity(); n];
    let timestamps: Vec<_> = (0..n).map(|i| i as f64 * dt).collect();
    PoseTrajectory::from_positions_orientations(positions, orientations, timestamps).unwrap()
}

/// Circular path in the XY plane with tangent orientations.
pub fn circle_path(n: usize, radius: f64) -> PosePath {
    let mut positions = Vec::with_capacity(n);
    let mut orientations = Vec::with_capacity(n);
    for i in 0..n {
        let angle = TAU * i as f64 / n as f64;
        positions.push(Vector3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
        orientations.push(quat_from_yaw(angle + FRAC_PI_2));
    }
    PosePath::from_positions_orientations(positions, orientations).unwrap()
}

/// Helix trajectory climbing along Z with tangent orientations.
pub fn helix_trajectory(n: usize, radius: f64, climb: f64, dt: f64) -> PoseTrajectory {
    let mut positions = Vec::with_capacity(n);
    let mut orientations = Vec::with_capacity(n);
    for i in 0..n {
        let angle = TAU * i as f64 / n as f64;
        positions.push(Vector3::new(
            radius * angle.cos(),
            radius * angle.sin(),
            climb * i as f64,
        ));
        orientations.push(quat_from_yaw(angle + FRAC_PI_2));
    }
    let timestamps: Vec<_> = (0..n).map(|i| i as f64 * dt).collect();
    PoseTrajectory::from_positions_orientations(positions, orientations, timestamps).unwrap()
}

/// A fixed rigid test transform with rotation about all axes.
pub fn sample_transform() -> Matrix4<f64> {
    lie::se3(
        &lie::so3_exp(&Vector3::new(0.25, -0.4, 0.6)),
        &Vector3::new(2.0, -1.0, 0.5),
    )
}

/// Add seeded uniform position noise to a trajectory.
pub fn add_position_noise(trajectory: &PoseTrajectory, amplitude: f64, seed: u64) -> PoseTrajectory {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut noisy = trajectory.clone();
    let positions: Vec<_> = noisy
        .positions()
        .iter()
        .map(|p| {
            p + Vector3::new(
                rng.gen_range(-amplitude..amplitude),
                rng.gen_range(-amplitude..amplitude),
                rng.gen_range(-amplitude..amplitude),
            )
        })
        .collect();
    let orientations = noisy.orientations().to_vec();
    PoseTrajectory::from_positions_orientations(
        positions,
        orientations,
        trajectory.timestamps().to_vec(),
    )
    .unwrap()
}
