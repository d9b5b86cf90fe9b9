use super::*;
use crate::stack::op::{OpId, Precision};

fn desc(kind: OpKind, name: &str, inverted_twin: bool) -> OpDesc {
    OpDesc {
        id: OpId(0),
        kind,
        precision: Precision::Float,
        name: name.to_owned(),
        inverted_twin,
    }
}

#[test]
fn native_template_orders_pivot_pairs() {
    let native = StackTemplate::native();
    let (rp, rp_inv) = native.find_pair("rotatePivot");
    let (sp, sp_inv) = native.find_pair("scalePivot");
    let (rotate, none) = native.find_pair("rotate");
    assert!(rp.unwrap() < rotate.unwrap());
    assert!(rotate.unwrap() < rp_inv.unwrap());
    assert!(sp.unwrap() < sp_inv.unwrap());
    assert_eq!(none, None);
    assert_eq!(sp_inv.unwrap(), native.entries.len() - 1);
}

#[test]
fn common_template_brackets_with_one_pivot() {
    let common = StackTemplate::common();
    let (pivot, pivot_inv) = common.find_pair("pivot");
    assert_eq!(pivot, Some(1));
    assert_eq!(pivot_inv, Some(common.entries.len() - 1));
}

#[test]
fn entry_matching_checks_name_twin_and_kind() {
    let translate = &StackTemplate::native().entries[0];
    assert!(translate.matches(&desc(OpKind::Translate, "translate", false)));
    assert!(!translate.matches(&desc(OpKind::Scale, "translate", false)));
    assert!(!translate.matches(&desc(OpKind::Translate, "scale", false)));
    assert!(!translate.matches(&desc(OpKind::Translate, "translate", true)));
}

#[test]
fn rotate_entry_accepts_any_rotate_kind() {
    let rotate = StackTemplate::native()
        .entries
        .iter()
        .find(|e| e.role == OpRole::Rotate)
        .unwrap();
    assert!(rotate.matches(&desc(OpKind::RotateX, "rotate", false)));
    assert!(rotate.matches(&desc(OpKind::RotateZyx, "rotate", false)));
    assert!(!rotate.matches(&desc(OpKind::Translate, "rotate", false)));
}

#[test]
fn common_entries_map_into_native_order() {
    // translate, pivot, rotate, scale, pivot inverse.
    let mapped: Vec<usize> = (0..5)
        .map(|i| native_order_index(TemplateKind::Common, i))
        .collect();
    assert_eq!(mapped, vec![0, 2, 3, 9, 10]);
    let mut sorted = mapped.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, mapped, "mapping must preserve relative order");
    assert_eq!(native_order_index(TemplateKind::Native, 4), 4);
}

#[test]
fn roles_map_onto_components() {
    use crate::foundation::core::Component;
    assert_eq!(OpRole::Transform.component(), Component::Matrix);
    assert_eq!(OpRole::Pivot.component(), Component::Pivot);
    assert_eq!(OpRole::Scale.component(), Component::Scale);
}
