use glam::{DMat3, DMat4, DQuat, DVec3};

use crate::foundation::core::RotateOrder;

/// A 4x4 affine matrix factored into scale, shear, rotation, and translation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Srt {
    /// Per-axis scale.
    pub scale: DVec3,
    /// Shear triple (xy, xz, yz).
    pub shear: DVec3,
    /// Euler rotation in radians, in `order`.
    pub rotation: DVec3,
    /// Rotation order of `rotation`.
    pub order: RotateOrder,
    /// Translation.
    pub translation: DVec3,
}

impl Srt {
    /// The identity factorization.
    pub fn identity(order: RotateOrder) -> Self {
        Self {
            scale: DVec3::ONE,
            shear: DVec3::ZERO,
            rotation: DVec3::ZERO,
            order,
            translation: DVec3::ZERO,
        }
    }
}

/// Factor an affine matrix into scale, shear, Euler rotation, and
/// translation.
///
/// Deterministic Gram–Schmidt on the basis columns: translation comes off the
/// w column, scale is the column norms, shear is the off-diagonal correlation
/// left after removing scale, and the rotation is the Euler decomposition of
/// the orthonormal remainder. A negative determinant is folded into the Z
/// scale so the rotation stays proper.
pub fn matrix_to_srt(m: DMat4, order: RotateOrder) -> Srt {
    let translation = m.w_axis.truncate();

    let c0 = m.x_axis.truncate();
    let c1 = m.y_axis.truncate();
    let c2 = m.z_axis.truncate();

    let sx = c0.length();
    let r0 = safe_axis(c0, sx, DVec3::X);

    let d01 = r0.dot(c1);
    let c1_ortho = c1 - d01 * r0;
    let sy = c1_ortho.length();
    let r1 = safe_axis(c1_ortho, sy, DVec3::Y);

    let d02 = r0.dot(c2);
    let d12 = r1.dot(c2);
    let c2_ortho = c2 - d02 * r0 - d12 * r1;
    let mut sz = c2_ortho.length();
    let mut r2 = safe_axis(c2_ortho, sz, DVec3::Z);

    if DMat3::from_cols(r0, r1, r2).determinant() < 0.0 {
        sz = -sz;
        r2 = -r2;
    }

    let shear = DVec3::new(
        if sy != 0.0 { d01 / sy } else { 0.0 },
        if sz != 0.0 { d02 / sz } else { 0.0 },
        if sz != 0.0 { d12 / sz } else { 0.0 },
    );

    let q = DQuat::from_mat3(&DMat3::from_cols(r0, r1, r2));
    let rotation = order.euler_from_quat(q.normalize());

    Srt {
        scale: DVec3::new(sx, sy, sz),
        shear,
        rotation,
        order,
        translation,
    }
}

/// Compose a factorization back into its affine matrix
/// (`T * R * Sh * S`, column-vector convention).
pub fn srt_to_matrix(srt: &Srt) -> DMat4 {
    DMat4::from_translation(srt.translation)
        * DMat4::from_quat(srt.order.quat_from_euler(srt.rotation))
        * shear_matrix(srt.shear)
        * DMat4::from_scale(srt.scale)
}

/// The affine matrix of a shear triple (xy, xz, yz).
pub fn shear_matrix(sh: DVec3) -> DMat4 {
    let mut m = DMat4::IDENTITY;
    m.y_axis.x = sh.x;
    m.z_axis.x = sh.y;
    m.z_axis.y = sh.z;
    m
}

fn safe_axis(v: DVec3, len: f64, fallback: DVec3) -> DVec3 {
    if len > 0.0 { v / len } else { fallback }
}

#[cfg(test)]
#[path = "../../tests/unit/xform/decompose.rs"]
mod tests;
