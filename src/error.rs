//! Error types for trajectory construction and manipulation.

use thiserror::Error;

/// Errors raised by pose-sequence construction and operations.
///
/// All failures are deterministic: the same inputs always fail the same way,
/// so there is no point in retrying any of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrajectoryError {
    /// Construction was attempted without any poses.
    #[error("pose data is empty")]
    EmptyPoseData,

    /// Positions and orientations arrays disagree in length.
    #[error("positions and orientations must have equal length ({positions} vs {orientations})")]
    RepresentationLengthMismatch {
        /// Number of positions provided.
        positions: usize,
        /// Number of orientations provided.
        orientations: usize,
    },

    /// Timestamp array length does not match the pose count.
    #[error("expected {expected} timestamps but got {actual}")]
    TimestampCountMismatch {
        /// Pose count of the trajectory.
        expected: usize,
        /// Number of timestamps provided.
        actual: usize,
    },

    /// An operation needs more poses than the sequence has.
    #[error("operation requires at least {required} poses, sequence has {actual}")]
    TooFewPoses {
        /// Minimum pose count for the operation.
        required: usize,
        /// Actual pose count.
        actual: usize,
    },

    /// `downsample` was asked for fewer than 2 poses.
    #[error("cannot downsample below 2 poses (requested {0})")]
    DownsampleBelowMinimum(usize),

    /// `project` was called a second time on the same entity.
    #[error("path was already projected once")]
    AlreadyProjected,

    /// Time range bounds are inverted.
    #[error("start timestamp is greater than end timestamp ({start} > {end})")]
    InvalidTimeRange {
        /// Requested range start.
        start: f64,
        /// Requested range end.
        end: f64,
    },

    /// Elapsed time between two stamped poses is zero or negative.
    #[error("bad timestamps: {t1} and {t2}")]
    NonPositiveTimeDelta {
        /// Earlier timestamp.
        t1: f64,
        /// Later timestamp.
        t2: f64,
    },

    /// A motion-filter threshold is negative.
    #[error("threshold must be non-negative, got {0}")]
    NegativeThreshold(f64),

    /// Alignment fraction outside (0, 1].
    #[error("alignment fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),

    /// Point sets handed to the alignment solver differ in size.
    #[error("point sets must have equal size ({source} vs {target})")]
    PointSetSizeMismatch {
        /// Source point count.
        source: usize,
        /// Target point count.
        target: usize,
    },

    /// The alignment problem is ill-posed (too few points or
    /// rank-deficient covariance).
    #[error("degenerate point configuration, alignment is not possible")]
    DegenerateAlignment,
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, TrajectoryError>;
