//! SO(3)/SE(3) primitives for rigid-transform math.
//!
//! Rigid transforms are plain homogeneous `Matrix4` values: a 3x3 rotation
//! block, a translation column, and a fixed `[0, 0, 0, 1]` bottom row.
//! Composition is plain matrix multiplication. Keeping the raw matrix form
//! (instead of `Isometry3`) lets validity be a property that [`is_se3`]
//! checks rather than one the type system silently repairs, which is what
//! the advisory `check()` on pose sequences needs.

use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, UnitQuaternion, Vector3, Vector6};

/// Numerical tolerance for orthonormality and determinant checks.
pub const MATRIX_EPS: f64 = 1e-6;

/// Build an SE(3) matrix from a rotation block and a translation vector.
///
/// # Example
/// ```
/// use gati_eval::core::lie;
/// use nalgebra::{Matrix3, Matrix4, Vector3};
///
/// let t = lie::se3(&Matrix3::identity(), &Vector3::new(1.0, 2.0, 3.0));
/// assert_eq!(t[(0, 3)], 1.0);
/// assert_eq!(t[(3, 3)], 1.0);
/// ```
#[inline]
pub fn se3(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut pose = Matrix4::identity();
    pose.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    pose.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    pose
}

/// Closed-form inverse of a rigid transform.
///
/// Uses the SE(3) structure (transposed rotation block, negated transformed
/// translation) instead of generic 4x4 inversion.
#[inline]
pub fn se3_inverse(pose: &Matrix4<f64>) -> Matrix4<f64> {
    let r_inv = so3_from_se3(pose).transpose();
    let t = translation_from_se3(pose);
    se3(&r_inv, &(-(r_inv * t)))
}

/// Extract the 3x3 rotation block of an SE(3) matrix.
#[inline]
pub fn so3_from_se3(pose: &Matrix4<f64>) -> Matrix3<f64> {
    pose.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Extract the translation column of an SE(3) matrix.
#[inline]
pub fn translation_from_se3(pose: &Matrix4<f64>) -> Vector3<f64> {
    pose.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Relative transform from pose `a` to pose `b`: `a⁻¹ · b`.
#[inline]
pub fn relative_se3(a: &Matrix4<f64>, b: &Matrix4<f64>) -> Matrix4<f64> {
    se3_inverse(a) * b
}

/// Exponential map: rotation vector (axis scaled by angle) to SO(3).
#[inline]
pub fn so3_exp(axis_angle: &Vector3<f64>) -> Matrix3<f64> {
    Rotation3::from_scaled_axis(*axis_angle).into_inner()
}

/// Logarithm map: SO(3) to rotation vector (axis scaled by angle).
///
/// The input must be a valid rotation matrix; see [`is_so3`].
#[inline]
pub fn so3_log(rotation: &Matrix3<f64>) -> Vector3<f64> {
    Rotation3::from_matrix_unchecked(*rotation).scaled_axis()
}

/// Rotation angle of an SO(3) matrix, in radians or degrees.
///
/// # Example
/// ```
/// use gati_eval::core::lie;
/// use nalgebra::Vector3;
/// use std::f64::consts::FRAC_PI_2;
///
/// let r = lie::so3_exp(&Vector3::new(0.0, 0.0, FRAC_PI_2));
/// assert!((lie::so3_log_angle(&r, true) - 90.0).abs() < 1e-9);
/// ```
#[inline]
pub fn so3_log_angle(rotation: &Matrix3<f64>, degrees: bool) -> f64 {
    let angle = Rotation3::from_matrix_unchecked(*rotation).angle();
    if degrees {
        angle.to_degrees()
    } else {
        angle
    }
}

/// Check whether a 3x3 matrix is a member of SO(3): orthonormal with
/// determinant +1, within [`MATRIX_EPS`].
pub fn is_so3(rotation: &Matrix3<f64>) -> bool {
    let orthonormality = rotation * rotation.transpose() - Matrix3::identity();
    orthonormality.abs().max() < MATRIX_EPS && (rotation.determinant() - 1.0).abs() < MATRIX_EPS
}

/// Check whether a 4x4 matrix is a member of SE(3): SO(3) rotation block and
/// a `[0, 0, 0, 1]` bottom row, within [`MATRIX_EPS`].
pub fn is_se3(pose: &Matrix4<f64>) -> bool {
    let bottom_row_ok = pose[(3, 0)].abs() < MATRIX_EPS
        && pose[(3, 1)].abs() < MATRIX_EPS
        && pose[(3, 2)].abs() < MATRIX_EPS
        && (pose[(3, 3)] - 1.0).abs() < MATRIX_EPS;
    bottom_row_ok && is_so3(&so3_from_se3(pose))
}

/// Angle below which the SE(3) tangent maps fall back to their first-order
/// form (the closed-form coefficients divide by the angle).
const SMALL_ANGLE: f64 = 1e-12;

/// Exponential map from an se(3) tangent vector to SE(3).
///
/// The tangent layout is rotation-first: `(ω, v)` with `ω` a rotation vector
/// and `v` the translational generator. The translation of the result is
/// `V·v` with `V` the left Jacobian of SO(3), so [`se3_log`] inverts this
/// exactly.
pub fn se3_exp(tangent: &Vector6<f64>) -> Matrix4<f64> {
    let omega = Vector3::new(tangent[0], tangent[1], tangent[2]);
    let v = Vector3::new(tangent[3], tangent[4], tangent[5]);
    let theta = omega.norm();

    let translation = if theta < SMALL_ANGLE {
        v
    } else {
        let k = (omega / theta).cross_matrix();
        let v_mat = Matrix3::identity()
            + ((1.0 - theta.cos()) / theta) * k
            + (1.0 - theta.sin() / theta) * (k * k);
        v_mat * v
    };
    se3(&so3_exp(&omega), &translation)
}

/// Logarithm map from SE(3) to its se(3) tangent vector, rotation-first.
///
/// Inverse of [`se3_exp`]; the input must be a valid rigid transform.
pub fn se3_log(pose: &Matrix4<f64>) -> Vector6<f64> {
    let omega = so3_log(&so3_from_se3(pose));
    let t = translation_from_se3(pose);
    let theta = omega.norm();

    let v = if theta < SMALL_ANGLE {
        t
    } else {
        let k = (omega / theta).cross_matrix();
        let v_inv = Matrix3::identity() - (0.5 * theta) * k
            + (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) * (k * k);
        v_inv * t
    };
    Vector6::new(omega.x, omega.y, omega.z, v.x, v.y, v.z)
}

/// Rotation matrix of a scalar-first `(w, x, y, z)` quaternion.
///
/// The quaternion is normalized before conversion, so near-unit input from
/// upstream estimators converts cleanly; whether the stored quaternion was
/// actually unit-norm is the business of the sequence-level `check()`.
#[inline]
pub fn rotation_from_quaternion(quaternion: &Quaternion<f64>) -> Matrix3<f64> {
    UnitQuaternion::from_quaternion(*quaternion)
        .to_rotation_matrix()
        .into_inner()
}

/// Unit quaternion (scalar-first semantics) of a rotation matrix.
///
/// The sign of the result is unspecified: `q` and `-q` encode the same
/// rotation and callers comparing quaternions must accept both.
#[inline]
pub fn quaternion_from_rotation(rotation: &Matrix3<f64>) -> Quaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*rotation)).into_inner()
}
