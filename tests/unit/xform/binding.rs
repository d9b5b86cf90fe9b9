use super::*;
use std::cell::{Cell, RefCell};

use crate::scene::memory::MemoryPrim;

#[derive(Default)]
struct TestHost {
    lock_rotate: Cell<bool>,
    dirty: Cell<u32>,
    absorbed: RefCell<Vec<(Component, DVec3)>>,
}

impl HostNode for TestHost {
    fn is_locked(&self, component: Component) -> bool {
        component == Component::Rotate && self.lock_rotate.get()
    }

    fn notify_dirty(&self) {
        self.dirty.set(self.dirty.get() + 1);
    }

    fn absorb(&self, component: Component, value: DVec3) {
        self.absorbed.borrow_mut().push((component, value));
    }
}

fn translate_prim(v: [f64; 3]) -> MemoryPrim {
    let mut prim = MemoryPrim::new();
    prim.author_op(
        OpKind::Translate,
        Precision::Double,
        "translate",
        OpValue::Vec3d(v),
    )
    .unwrap();
    prim
}

#[test]
fn set_rotate_order_fails_once_bound() {
    let mut binding: TransformBinding<MemoryPrim> = TransformBinding::new();
    binding.set_rotate_order(RotateOrder::Zxy).unwrap();
    assert_eq!(binding.rotate_order(), RotateOrder::Zxy);

    binding.bind(MemoryPrim::new());
    assert!(binding.set_rotate_order(RotateOrder::Xyz).is_err());
}

#[test]
fn world_space_edits_are_rejected() {
    let mut binding: TransformBinding<MemoryPrim> = TransformBinding::new();
    binding.bind(MemoryPrim::new());
    assert!(
        binding
            .translate_to(DVec3::new(1.0, 0.0, 0.0), Space::World)
            .is_err()
    );
    assert_eq!(binding.translation(), DVec3::ZERO);
}

#[test]
fn locked_component_accepts_the_call_without_effect() {
    let host = Rc::new(TestHost::default());
    host.lock_rotate.set(true);

    let mut binding = TransformBinding::new();
    let host_dyn: Rc<dyn HostNode> = host.clone();
    binding.set_host(Rc::downgrade(&host_dyn));
    binding.bind(translate_prim([0.0; 3]));
    binding.enable_push_to_prim(true).unwrap();
    let revision = binding.prim().unwrap().revision();

    binding
        .rotate_to(DVec3::new(0.5, 0.0, 0.0), Space::Transform)
        .unwrap();
    assert_eq!(binding.rotation(), DVec3::ZERO);
    assert_eq!(binding.prim().unwrap().revision(), revision);
}

#[test]
fn bind_seeds_host_attributes_once() {
    let host = Rc::new(TestHost::default());
    let mut binding = TransformBinding::new();
    let host_dyn: Rc<dyn HostNode> = host.clone();
    binding.set_host(Rc::downgrade(&host_dyn));
    binding.bind(translate_prim([1.0, 2.0, 3.0]));

    let absorbed = host.absorbed.borrow();
    assert_eq!(
        *absorbed,
        vec![(Component::Translate, DVec3::new(1.0, 2.0, 3.0))]
    );
}

#[test]
fn foreign_stack_falls_back_to_matrix_decomposition() {
    let mut prim = MemoryPrim::new();
    // scale before translate matches no template.
    prim.author_op(
        OpKind::Scale,
        Precision::Double,
        "scale",
        OpValue::Vec3d([2.0, 2.0, 2.0]),
    )
    .unwrap();
    prim.author_op(
        OpKind::Translate,
        Precision::Double,
        "translate",
        OpValue::Vec3d([4.0, 0.0, 0.0]),
    )
    .unwrap();

    let mut binding = TransformBinding::new();
    binding.bind(prim);
    assert!(binding.is_foreign());
    assert!(binding.is_matrix_only());
    assert!(!binding.from_template());
    // S(2) * T(4,0,0) has translation (8,0,0) scale 2.
    assert!((binding.translation() - DVec3::new(8.0, 0.0, 0.0)).length() < 1e-9);
    assert!((binding.scale() - DVec3::splat(2.0)).length() < 1e-9);
    assert!(!binding.component_present(Component::Translate));
}

#[test]
fn push_on_foreign_stack_writes_nothing() {
    let mut prim = MemoryPrim::new();
    prim.author_op(
        OpKind::Scale,
        Precision::Double,
        "scale",
        OpValue::Vec3d([2.0, 2.0, 2.0]),
    )
    .unwrap();
    prim.author_op(
        OpKind::Translate,
        Precision::Double,
        "translate",
        OpValue::Vec3d([4.0, 0.0, 0.0]),
    )
    .unwrap();

    let mut binding = TransformBinding::new();
    binding.bind(prim);
    let revision = binding.prim().unwrap().revision();
    binding.push().unwrap();
    assert_eq!(binding.prim().unwrap().revision(), revision);
}

#[test]
fn animated_stack_demotes_to_read_only_viewer() {
    let mut prim = MemoryPrim::new();
    prim.author_animated_op(
        OpKind::Translate,
        Precision::Double,
        "translate",
        vec![
            crate::scene::memory::TimeSample {
                time: 1.0,
                value: OpValue::Vec3d([1.0, 0.0, 0.0]),
            },
            crate::scene::memory::TimeSample {
                time: 2.0,
                value: OpValue::Vec3d([2.0, 0.0, 0.0]),
            },
        ],
    )
    .unwrap();

    let mut binding = TransformBinding::new();
    binding.bind(prim);
    assert!(binding.has_animation());
    assert!(binding.component_animated(Component::Translate));
    assert!(!binding.config().push_to_prim);
    assert!(binding.config().read_animated_values);
}

#[test]
fn refresh_moves_animated_baselines_and_keeps_tweaks() {
    let mut prim = MemoryPrim::new();
    prim.author_animated_op(
        OpKind::Translate,
        Precision::Double,
        "translate",
        vec![
            crate::scene::memory::TimeSample {
                time: 1.0,
                value: OpValue::Vec3d([1.0, 0.0, 0.0]),
            },
            crate::scene::memory::TimeSample {
                time: 2.0,
                value: OpValue::Vec3d([2.0, 0.0, 0.0]),
            },
        ],
    )
    .unwrap();
    prim.author_op(
        OpKind::Scale,
        Precision::Double,
        "scale",
        OpValue::Vec3d([3.0, 3.0, 3.0]),
    )
    .unwrap();

    let mut binding = TransformBinding::new();
    binding.bind(prim);
    // Baseline starts at the earliest sample.
    assert!((binding.translation() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);

    // A local tweak survives the time change.
    binding
        .translate_by(DVec3::new(0.0, 0.5, 0.0), Space::Transform)
        .unwrap();
    binding.refresh_at_time(TimeCode::At(2.0));
    assert!((binding.translation() - DVec3::new(2.0, 0.5, 0.0)).length() < 1e-12);

    // The non-animated scale is untouched by the refresh.
    assert!((binding.scale() - DVec3::splat(3.0)).length() < 1e-12);
}

#[test]
fn matrix_backed_push_rewrites_the_transform_op() {
    let mut prim = MemoryPrim::new();
    prim.author_op(
        OpKind::Transform,
        Precision::Double,
        "transform",
        OpValue::Matrix4d(DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0))),
    )
    .unwrap();

    let mut binding = TransformBinding::new();
    binding.bind(prim);
    assert!(binding.is_matrix_only());
    assert!(!binding.is_foreign());
    binding.enable_push_to_prim(true).unwrap();

    binding
        .translate_to(DVec3::new(7.0, 0.0, 0.0), Space::Transform)
        .unwrap();
    let prim = binding.unbind().unwrap();
    let ops = prim.ordered_ops();
    assert_eq!(ops.len(), 1, "no component op inserted for a matrix prim");
    let m = prim
        .read(ops[0].id, TimeCode::Default)
        .and_then(|v| v.as_matrix())
        .unwrap();
    assert!((m.w_axis.truncate() - DVec3::new(7.0, 0.0, 0.0)).length() < 1e-9);
}

#[test]
fn push_notifies_the_host_only_when_the_matrix_changes() {
    let host = Rc::new(TestHost::default());
    let mut binding = TransformBinding::new();
    let host_dyn: Rc<dyn HostNode> = host.clone();
    binding.set_host(Rc::downgrade(&host_dyn));
    binding.bind(translate_prim([0.0; 3]));
    binding.enable_push_to_prim(true).unwrap();
    host.dirty.set(0);

    binding
        .translate_to(DVec3::new(1.0, 0.0, 0.0), Space::Transform)
        .unwrap();
    assert_eq!(host.dirty.get(), 1);

    // Pushing again with no further edit keeps the stack untouched.
    binding.push().unwrap();
    assert_eq!(host.dirty.get(), 1);
}

#[test]
fn compose_applies_local_offset_along_rotated_axes() {
    let mut binding: TransformBinding<MemoryPrim> = TransformBinding::new();
    binding.bind(MemoryPrim::new());
    binding
        .rotate_to(
            DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            Space::Transform,
        )
        .unwrap();
    binding.set_local_translate_offset(DVec3::new(1.0, 0.0, 0.0));

    let m = binding.compose();
    // The offset rides the rotated X basis: 90 degrees about Z maps it to Y.
    assert!((m.w_axis.truncate() - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-9);

    let half = binding.compose_blended(0.0);
    assert!((half.w_axis.truncate() - DVec3::ZERO).length() < 1e-9);
}

#[test]
fn unbind_discards_all_state() {
    let mut binding = TransformBinding::new();
    binding.bind(translate_prim([1.0, 1.0, 1.0]));
    binding
        .translate_by(DVec3::new(5.0, 0.0, 0.0), Space::Transform)
        .unwrap();
    let _ = binding.unbind();
    assert!(!binding.is_bound());
    assert_eq!(binding.translation(), DVec3::ZERO);
    assert_eq!(binding.scale(), DVec3::ONE);
}
