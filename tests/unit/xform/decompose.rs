use super::*;
use glam::DVec3;

fn assert_close(a: DVec3, b: DVec3, eps: f64, what: &str) {
    assert!((a - b).length() < eps, "{what}: {a} != {b}");
}

fn roundtrip(srt: Srt) {
    let m = srt_to_matrix(&srt);
    let back = matrix_to_srt(m, srt.order);
    assert_close(back.scale, srt.scale, 1e-9, "scale");
    assert_close(back.shear, srt.shear, 1e-9, "shear");
    assert_close(back.translation, srt.translation, 1e-9, "translation");
    // Compare rotations through their matrices so equivalent Euler triples
    // cannot fail the comparison.
    let qa = srt.order.quat_from_euler(srt.rotation);
    let qb = back.order.quat_from_euler(back.rotation);
    assert!(qa.dot(qb).abs() > 1.0 - 1e-9, "rotation");
}

#[test]
fn identity_decomposes_to_identity() {
    let srt = matrix_to_srt(DMat4::IDENTITY, RotateOrder::Xyz);
    assert_eq!(srt, Srt::identity(RotateOrder::Xyz));
}

#[test]
fn translation_only() {
    let srt = matrix_to_srt(
        DMat4::from_translation(DVec3::new(5.0, -2.0, 1.5)),
        RotateOrder::Xyz,
    );
    assert_close(srt.translation, DVec3::new(5.0, -2.0, 1.5), 1e-12, "t");
    assert_close(srt.scale, DVec3::ONE, 1e-12, "s");
    assert_close(srt.rotation, DVec3::ZERO, 1e-12, "r");
}

#[test]
fn full_srt_roundtrip() {
    roundtrip(Srt {
        scale: DVec3::new(2.0, 0.5, 3.0),
        shear: DVec3::new(0.25, -0.1, 0.4),
        rotation: DVec3::new(0.3, -0.6, 1.2),
        order: RotateOrder::Xyz,
        translation: DVec3::new(10.0, 20.0, -5.0),
    });
}

#[test]
fn roundtrip_in_every_rotation_order() {
    for order in [
        RotateOrder::Xyz,
        RotateOrder::Xzy,
        RotateOrder::Yxz,
        RotateOrder::Yzx,
        RotateOrder::Zxy,
        RotateOrder::Zyx,
    ] {
        roundtrip(Srt {
            scale: DVec3::new(1.5, 2.5, 0.75),
            shear: DVec3::ZERO,
            rotation: DVec3::new(0.4, 0.8, -0.3),
            order,
            translation: DVec3::new(1.0, 2.0, 3.0),
        });
    }
}

#[test]
fn negative_determinant_folds_into_z_scale() {
    // Mirror on one axis must come back as a negative scale with a proper
    // rotation, and reproduce the input matrix.
    let m = DMat4::from_scale(DVec3::new(1.0, 1.0, -1.0));
    let srt = matrix_to_srt(m, RotateOrder::Xyz);
    assert!(srt.scale.z < 0.0);
    assert_close(srt.translation, DVec3::ZERO, 1e-12, "t");

    let back = srt_to_matrix(&srt);
    assert!((back.x_axis - m.x_axis).length() < 1e-5);
    assert!((back.y_axis - m.y_axis).length() < 1e-5);
    assert!((back.z_axis - m.z_axis).length() < 1e-5);
    assert!((back.w_axis - m.w_axis).length() < 1e-5);
}

#[test]
fn shear_matrix_entries() {
    let m = shear_matrix(DVec3::new(0.5, 0.25, -0.75));
    assert_eq!(m.y_axis.x, 0.5);
    assert_eq!(m.z_axis.x, 0.25);
    assert_eq!(m.z_axis.y, -0.75);
    assert_eq!(m.x_axis.x, 1.0);
    assert_eq!(m.w_axis.w, 1.0);
}

#[test]
fn pure_rotation_has_unit_scale_and_no_shear() {
    let q = RotateOrder::Xyz.quat_from_euler(DVec3::new(0.7, 0.2, -0.4));
    let srt = matrix_to_srt(DMat4::from_quat(q), RotateOrder::Xyz);
    assert_close(srt.scale, DVec3::ONE, 1e-12, "scale");
    assert_close(srt.shear, DVec3::ZERO, 1e-12, "shear");
}
