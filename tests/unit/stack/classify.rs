use super::*;
use crate::stack::op::{OpId, OpKind, Precision};

fn desc(id: u32, kind: OpKind, name: &str, inverted_twin: bool) -> OpDesc {
    OpDesc {
        id: OpId(id),
        kind,
        precision: Precision::Float,
        name: name.to_owned(),
        inverted_twin,
    }
}

fn native_full() -> Vec<OpDesc> {
    vec![
        desc(0, OpKind::Translate, "translate", false),
        desc(1, OpKind::Translate, "rotatePivotTranslate", false),
        desc(2, OpKind::Translate, "rotatePivot", false),
        desc(3, OpKind::RotateXyz, "rotate", false),
        desc(4, OpKind::RotateXyz, "rotateAxis", false),
        desc(5, OpKind::Translate, "rotatePivot", true),
        desc(6, OpKind::Translate, "scalePivotTranslate", false),
        desc(7, OpKind::Translate, "scalePivot", false),
        desc(8, OpKind::Transform, "shear", false),
        desc(9, OpKind::Scale, "scale", false),
        desc(10, OpKind::Translate, "scalePivot", true),
    ]
}

#[test]
fn full_native_stack_classifies_native() {
    let c = classify(&native_full()).unwrap();
    assert_eq!(c.template, TemplateKind::Native);
    assert_eq!(c.ops.len(), 11);
    assert_eq!(c.rotate_order, RotateOrder::Xyz);
}

#[test]
fn ordered_subsets_still_classify_native() {
    let full = native_full();
    // Every contiguous-order subset that keeps pivot pairs intact matches.
    let subsets: [&[usize]; 5] = [
        &[0],
        &[0, 3, 9],
        &[0, 2, 3, 5],
        &[3, 4],
        &[6, 7, 9, 10],
    ];
    for keep in subsets {
        let ops: Vec<OpDesc> = keep.iter().map(|&i| full[i].clone()).collect();
        let c = classify(&ops).unwrap_or_else(|| panic!("subset {keep:?} must classify"));
        assert_eq!(c.template, TemplateKind::Native, "subset {keep:?}");
    }
}

#[test]
fn rotate_order_follows_the_matched_rotate_kind() {
    let ops = vec![
        desc(0, OpKind::Translate, "translate", false),
        desc(1, OpKind::RotateZxy, "rotate", false),
    ];
    let c = classify(&ops).unwrap();
    assert_eq!(c.rotate_order, RotateOrder::Zxy);
}

#[test]
fn single_axis_rotate_defaults_to_natural_order() {
    let ops = vec![desc(0, OpKind::RotateZ, "rotate", false)];
    let c = classify(&ops).unwrap();
    assert_eq!(c.rotate_order, RotateOrder::Xyz);
}

#[test]
fn common_stack_classifies_common() {
    let ops = vec![
        desc(0, OpKind::Translate, "translate", false),
        desc(1, OpKind::Translate, "pivot", false),
        desc(2, OpKind::RotateXyz, "rotate", false),
        desc(3, OpKind::Scale, "scale", false),
        desc(4, OpKind::Translate, "pivot", true),
    ];
    let c = classify(&ops).unwrap();
    assert_eq!(c.template, TemplateKind::Common);
}

#[test]
fn matrix_stack_classifies_matrix() {
    let ops = vec![desc(0, OpKind::Transform, "transform", false)];
    let c = classify(&ops).unwrap();
    assert_eq!(c.template, TemplateKind::Matrix);
    assert_eq!(c.ops[0].entry.role, OpRole::Transform);
}

#[test]
fn out_of_order_stack_is_foreign() {
    let ops = vec![
        desc(0, OpKind::Scale, "scale", false),
        desc(1, OpKind::Translate, "translate", false),
    ];
    assert!(classify(&ops).is_none());
}

#[test]
fn unknown_names_are_foreign() {
    let ops = vec![desc(0, OpKind::Translate, "offsetParentMatrix", false)];
    assert!(classify(&ops).is_none());
}

#[test]
fn pivot_without_its_inverse_is_foreign() {
    let ops = vec![
        desc(0, OpKind::Translate, "translate", false),
        desc(1, OpKind::Translate, "pivot", false),
        desc(2, OpKind::RotateXyz, "rotate", false),
    ];
    assert!(classify(&ops).is_none());
}

#[test]
fn empty_stack_classifies_trivially() {
    let c = classify(&[]).unwrap();
    assert!(c.ops.is_empty());
}

#[test]
fn duplicate_role_is_foreign() {
    let ops = vec![
        desc(0, OpKind::Translate, "translate", false),
        desc(1, OpKind::Translate, "translate", false),
    ];
    assert!(classify(&ops).is_none());
}
