//! # GatiEval
//!
//! Trajectory geometry engine for comparing estimated robot/sensor motion
//! against a reference: SE(3) pose sequences, Umeyama alignment, and
//! motion-based sequence reduction.
//!
//! ## Architecture
//!
//! The crate is organized into two layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              path/ and trajectory/                  │  ← Entities
//! │   (PosePath, PoseTrajectory: in-place operations)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │        (lie algebra, geometry, motion filter)       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The foundation layer is pure functions over nalgebra types; the entities
//! own their pose arrays exclusively and mutate in place. A downstream
//! metrics layer reads the resulting arrays through the read-only accessors.
//! No error metrics are computed here, and no file formats, plotting, or
//! CLI handling belong to this crate.
//!
//! ## Quick Start
//!
//! ```
//! use gati_eval::{AlignConfig, PoseSequence, PoseTrajectory};
//! use nalgebra::{Quaternion, Vector3};
//!
//! // An arc climbing out of the XY plane.
//! let positions: Vec<_> = (0..8)
//!     .map(|i| {
//!         let angle = i as f64 * 0.4;
//!         Vector3::new(angle.cos(), angle.sin(), 0.1 * i as f64)
//!     })
//!     .collect();
//! let orientations = vec![Quaternion::identity(); 8];
//! let timestamps: Vec<_> = (0..8).map(|i| i as f64 * 0.1).collect();
//!
//! let reference =
//!     PoseTrajectory::from_positions_orientations(positions, orientations, timestamps).unwrap();
//! let mut estimate = reference.clone();
//!
//! let result = estimate.align(&reference, &AlignConfig::default()).unwrap();
//! assert!((result.scale - 1.0).abs() < 1e-9);
//! assert!(estimate.check().is_valid());
//! ```
//!
//! ## Conventions
//!
//! - Quaternions are scalar-first `(w, x, y, z)` with unit norm.
//! - SE(3) poses are homogeneous 4x4 matrices with an orthonormal,
//!   determinant +1 rotation block.
//! - Timestamps are seconds, strictly ascending without duplicates.
//!
//! Validity is advisory: operations never re-validate their inputs
//! implicitly, callers needing guarantees run
//! [`check`](path::PoseSequence::check) explicitly.

#![warn(missing_docs)]

// Foundation: pure geometry and algebra
pub mod core;

// Error taxonomy
pub mod error;

// Pose sequence entities
pub mod path;
pub mod trajectory;

// Re-export commonly used types
pub use crate::core::{accumulated_distances, arc_len, umeyama_alignment, UmeyamaResult};
pub use error::{Result, TrajectoryError};
pub use path::{AlignConfig, PathInfo, Plane, PosePath, PoseSequence, ValidityReport};
pub use trajectory::{
    calc_angular_speed, calc_speed, merge, PoseTrajectory, TrajectoryInfo, TrajectoryStats,
};
