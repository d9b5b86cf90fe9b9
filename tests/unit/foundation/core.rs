use super::*;
use glam::DVec3;

const ALL_ORDERS: [RotateOrder; 6] = [
    RotateOrder::Xyz,
    RotateOrder::Xzy,
    RotateOrder::Yxz,
    RotateOrder::Yzx,
    RotateOrder::Zxy,
    RotateOrder::Zyx,
];

#[test]
fn euler_quat_roundtrip_all_orders() {
    let e = DVec3::new(0.3, -0.7, 1.1);
    for order in ALL_ORDERS {
        let q = order.quat_from_euler(e);
        let back = order.euler_from_quat(q);
        assert!(
            (back - e).length() < 1e-10,
            "order {order:?}: {back} != {e}"
        );
    }
}

#[test]
fn single_axis_rotations_agree_across_orders() {
    // A rotation about one axis alone must be order-independent.
    let e = DVec3::new(0.0, 0.9, 0.0);
    let reference = RotateOrder::Xyz.quat_from_euler(e);
    for order in ALL_ORDERS {
        let q = order.quat_from_euler(e);
        assert!(q.dot(reference).abs() > 1.0 - 1e-12);
    }
}

#[test]
fn xyz_order_matches_axis_composition() {
    // Extrinsic x-then-y-then-z is Rz * Ry * Rx on column vectors.
    let e = DVec3::new(0.2, 0.4, 0.6);
    let q = RotateOrder::Xyz.quat_from_euler(e);
    let composed = glam::DQuat::from_rotation_z(0.6)
        * glam::DQuat::from_rotation_y(0.4)
        * glam::DQuat::from_rotation_x(0.2);
    assert!(q.dot(composed).abs() > 1.0 - 1e-12);
}

#[test]
fn component_set_insert_remove_contains() {
    let mut set = ComponentSet::EMPTY;
    assert!(set.is_empty());
    set.insert(Component::Translate);
    set.insert(Component::Scale);
    assert!(set.contains(Component::Translate));
    assert!(set.contains(Component::Scale));
    assert!(!set.contains(Component::Rotate));
    set.remove(Component::Translate);
    assert!(!set.contains(Component::Translate));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Component::Scale]);
}

#[test]
fn time_code_default_query() {
    assert!(TimeCode::Default.is_default());
    assert!(!TimeCode::At(3.0).is_default());
}
