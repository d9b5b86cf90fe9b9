use tracing::debug;

use crate::foundation::error::{GimbalError, GimbalResult};
use crate::scene::prim::ScenePrim;
use crate::stack::classify::ClassifiedOp;
use crate::stack::op::{OpDesc, OpId, OpKind, Precision};
use crate::stack::template::{StackTemplate, TemplateKind, native_order_index};

/// Insert a new operation (and its paired inverse, when the native template
/// defines one) at its canonical stack position.
///
/// Position: the earliest point that precedes every role the native template
/// orders after the inserted one, found by scanning the live classified list
/// with each entry mapped into native-template order. The twin is created
/// first so a front insertion keeps the pair's relative order. The live order
/// is written back to the prim in one reorder call.
#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_op<P: ScenePrim>(
    prim: &mut P,
    ops: &mut Vec<OpDesc>,
    classified: &mut Vec<ClassifiedOp>,
    kind: OpKind,
    precision: Precision,
    name: &str,
    inherits_transform: bool,
    at_beginning: bool,
) -> GimbalResult<()> {
    debug!(name, ?kind, "inserting stack operation");

    let native = StackTemplate::native();
    let (primary_index, twin_index) = native.find_pair(name);
    let primary_index = primary_index.ok_or_else(|| {
        GimbalError::mutation(format!("`{name}` is not a native stack role"))
    })?;

    let twin_added = match twin_index {
        Some(t) => {
            add_at(prim, ops, classified, kind, precision, name, true, t, at_beginning)?;
            true
        }
        None => false,
    };

    if let Err(e) = add_at(
        prim,
        ops,
        classified,
        kind,
        precision,
        name,
        false,
        primary_index,
        at_beginning,
    ) {
        if twin_added {
            // Back out the half-inserted pair from the live lists.
            if let Some(pos) = ops.iter().position(|d| d.name == name && d.inverted_twin) {
                ops.remove(pos);
                classified.remove(pos);
            }
        }
        return Err(e);
    }

    let order: Vec<OpId> = ops.iter().map(|d| d.id).collect();
    prim.set_op_order(&order, !inherits_transform)
}

#[allow(clippy::too_many_arguments)]
fn add_at<P: ScenePrim>(
    prim: &mut P,
    ops: &mut Vec<OpDesc>,
    classified: &mut Vec<ClassifiedOp>,
    kind: OpKind,
    precision: Precision,
    name: &str,
    inverted_twin: bool,
    template_index: usize,
    at_beginning: bool,
) -> GimbalResult<()> {
    let id = prim.add_op(kind, precision, name, inverted_twin)?;
    let pos = if at_beginning {
        0
    } else {
        insert_pos(classified, template_index)
    };
    ops.insert(
        pos,
        OpDesc {
            id,
            kind,
            precision,
            name: name.to_owned(),
            inverted_twin,
        },
    );
    classified.insert(
        pos,
        ClassifiedOp {
            entry: &StackTemplate::native().entries[template_index],
            template: TemplateKind::Native,
            template_index,
        },
    );
    Ok(())
}

fn insert_pos(classified: &[ClassifiedOp], template_index: usize) -> usize {
    classified
        .iter()
        .position(|c| native_order_index(c.template, c.template_index) >= template_index)
        .unwrap_or(classified.len())
}

#[cfg(test)]
#[path = "../../tests/unit/xform/insert.rs"]
mod tests;
