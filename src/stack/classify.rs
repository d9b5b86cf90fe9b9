use tracing::debug;

use crate::foundation::core::RotateOrder;
use crate::stack::op::OpDesc;
use crate::stack::template::{OpRole, StackTemplate, TemplateEntry, TemplateKind};

/// One live operation matched to a template entry.
#[derive(Clone, Copy, Debug)]
pub struct ClassifiedOp {
    /// The template entry the operation occupies.
    pub entry: &'static TemplateEntry,
    /// Which template the entry belongs to.
    pub template: TemplateKind,
    /// Index of the entry within its template.
    pub template_index: usize,
}

/// Result of matching a live operation list against the known templates.
#[derive(Clone, Debug)]
pub struct Classification {
    /// One classification per live operation, in stack order.
    pub ops: Vec<ClassifiedOp>,
    /// Template that produced the match.
    pub template: TemplateKind,
    /// Rotation order implied by the matched rotate operation.
    pub rotate_order: RotateOrder,
}

/// Match an ordered operation list against the canonical templates.
///
/// Templates are tried in preference order; a template matches when every
/// live operation maps, in order, onto one of its entries, and every matched
/// pivot brings its paired inverse along. The first match wins. `None` means
/// the stack is foreign and the caller falls back to whole-matrix
/// decomposition; classification itself never fails.
pub fn classify(ops: &[OpDesc]) -> Option<Classification> {
    for template in StackTemplate::preference_order() {
        if let Some(classified) = match_template(template, ops) {
            let rotate_order = classified
                .iter()
                .zip(ops)
                .find(|(c, _)| c.entry.role == OpRole::Rotate)
                .and_then(|(_, desc)| desc.kind.rotate_order())
                .unwrap_or_default();
            debug!(template = ?template.kind, ops = ops.len(), "stack classified");
            return Some(Classification {
                ops: classified,
                template: template.kind,
                rotate_order,
            });
        }
    }
    debug!(ops = ops.len(), "no template matched, stack is foreign");
    None
}

fn match_template(template: &'static StackTemplate, ops: &[OpDesc]) -> Option<Vec<ClassifiedOp>> {
    let mut matched = Vec::with_capacity(ops.len());
    let mut used = vec![false; template.entries.len()];
    let mut cursor = 0usize;

    for desc in ops {
        let found = template.entries[cursor..]
            .iter()
            .position(|e| e.matches(desc))?;
        let index = cursor + found;
        used[index] = true;
        matched.push(ClassifiedOp {
            entry: &template.entries[index],
            template: template.kind,
            template_index: index,
        });
        cursor = index + 1;
    }

    // A matched pivot without its paired inverse (or the reverse) is not a
    // valid occupancy of the template.
    for (i, e) in template.entries.iter().enumerate() {
        if !used[i] {
            continue;
        }
        let pair = template
            .entries
            .iter()
            .enumerate()
            .find(|(j, other)| {
                *j != i && other.name == e.name && other.inverted_twin != e.inverted_twin
            })
            .map(|(j, _)| j);
        if let Some(j) = pair {
            if !used[j] {
                return None;
            }
        }
    }

    Some(matched)
}

#[cfg(test)]
#[path = "../../tests/unit/stack/classify.rs"]
mod tests;
