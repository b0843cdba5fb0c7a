//! Foundation layer: Lie-group algebra, geometry kernel, and motion filtering.
//!
//! Everything in this module is a pure function over nalgebra types. The
//! stateful pose-sequence entities built on top live in [`crate::path`] and
//! [`crate::trajectory`].

pub mod filters;
pub mod geometry;
pub mod lie;

pub use filters::filter_by_motion;
pub use geometry::{accumulated_distances, arc_len, umeyama_alignment, UmeyamaResult};
