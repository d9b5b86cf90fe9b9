use crate::foundation::core::Component;
use crate::stack::op::{OpDesc, OpKind};

/// Role a template expects at one position of a canonical stack.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum OpRole {
    /// Translation.
    Translate,
    /// Generic interchange pivot.
    Pivot,
    /// Rotate-pivot translation offset.
    RotatePivotTranslate,
    /// Rotate pivot.
    RotatePivot,
    /// Rotation.
    Rotate,
    /// Rotate-axis orientation.
    RotateAxis,
    /// Scale-pivot translation offset.
    ScalePivotTranslate,
    /// Scale pivot.
    ScalePivot,
    /// Shear.
    Shear,
    /// Scale.
    Scale,
    /// Whole-matrix transform.
    Transform,
}

impl OpRole {
    /// The decomposed component this role feeds.
    pub fn component(self) -> Component {
        match self {
            Self::Translate => Component::Translate,
            Self::Pivot => Component::Pivot,
            Self::RotatePivotTranslate => Component::RotatePivotTranslate,
            Self::RotatePivot => Component::RotatePivot,
            Self::Rotate => Component::Rotate,
            Self::RotateAxis => Component::RotateAxis,
            Self::ScalePivotTranslate => Component::ScalePivotTranslate,
            Self::ScalePivot => Component::ScalePivot,
            Self::Shear => Component::Shear,
            Self::Scale => Component::Scale,
            Self::Transform => Component::Matrix,
        }
    }

    fn accepts(self, kind: OpKind) -> bool {
        match self {
            Self::Translate
            | Self::Pivot
            | Self::RotatePivotTranslate
            | Self::RotatePivot
            | Self::ScalePivotTranslate
            | Self::ScalePivot => kind == OpKind::Translate,
            Self::Rotate | Self::RotateAxis => kind.is_rotate(),
            Self::Shear | Self::Transform => kind == OpKind::Transform,
            Self::Scale => kind == OpKind::Scale,
        }
    }
}

/// One expected entry of a stack template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Component role at this position.
    pub role: OpRole,
    /// Canonical authored name.
    pub name: &'static str,
    /// `true` when this entry is the paired inverse of an earlier entry.
    pub inverted_twin: bool,
}

impl TemplateEntry {
    /// Return `true` when a live operation can occupy this entry.
    pub fn matches(&self, desc: &OpDesc) -> bool {
        desc.name == self.name
            && desc.inverted_twin == self.inverted_twin
            && self.role.accepts(desc.kind)
    }
}

/// Which canonical template a classification came from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum TemplateKind {
    /// Host-native ordering with the full pivot set.
    Native,
    /// Interchange-neutral ordering with one shared pivot.
    Common,
    /// Single whole-matrix transform.
    Matrix,
}

const fn entry(role: OpRole, name: &'static str) -> TemplateEntry {
    TemplateEntry {
        role,
        name,
        inverted_twin: false,
    }
}

const fn twin(role: OpRole, name: &'static str) -> TemplateEntry {
    TemplateEntry {
        role,
        name,
        inverted_twin: true,
    }
}

static NATIVE_ENTRIES: [TemplateEntry; 11] = [
    entry(OpRole::Translate, "translate"),
    entry(OpRole::RotatePivotTranslate, "rotatePivotTranslate"),
    entry(OpRole::RotatePivot, "rotatePivot"),
    entry(OpRole::Rotate, "rotate"),
    entry(OpRole::RotateAxis, "rotateAxis"),
    twin(OpRole::RotatePivot, "rotatePivot"),
    entry(OpRole::ScalePivotTranslate, "scalePivotTranslate"),
    entry(OpRole::ScalePivot, "scalePivot"),
    entry(OpRole::Shear, "shear"),
    entry(OpRole::Scale, "scale"),
    twin(OpRole::ScalePivot, "scalePivot"),
];

static COMMON_ENTRIES: [TemplateEntry; 5] = [
    entry(OpRole::Translate, "translate"),
    entry(OpRole::Pivot, "pivot"),
    entry(OpRole::Rotate, "rotate"),
    entry(OpRole::Scale, "scale"),
    twin(OpRole::Pivot, "pivot"),
];

static MATRIX_ENTRIES: [TemplateEntry; 1] = [entry(OpRole::Transform, "transform")];

/// An ordered catalogue of expected operation roles.
///
/// The three templates are process-wide immutable data; classification tries
/// them in preference order (native, common, matrix).
#[derive(Clone, Copy, Debug)]
pub struct StackTemplate {
    /// Which template this is.
    pub kind: TemplateKind,
    /// Ordered expected entries.
    pub entries: &'static [TemplateEntry],
}

static NATIVE: StackTemplate = StackTemplate {
    kind: TemplateKind::Native,
    entries: &NATIVE_ENTRIES,
};

static COMMON: StackTemplate = StackTemplate {
    kind: TemplateKind::Common,
    entries: &COMMON_ENTRIES,
};

static MATRIX: StackTemplate = StackTemplate {
    kind: TemplateKind::Matrix,
    entries: &MATRIX_ENTRIES,
};

impl StackTemplate {
    /// The host-native template.
    pub fn native() -> &'static StackTemplate {
        &NATIVE
    }

    /// The interchange-neutral template.
    pub fn common() -> &'static StackTemplate {
        &COMMON
    }

    /// The single-matrix template.
    pub fn matrix() -> &'static StackTemplate {
        &MATRIX
    }

    /// Templates in classification preference order.
    pub fn preference_order() -> [&'static StackTemplate; 3] {
        [&NATIVE, &COMMON, &MATRIX]
    }

    /// Index pair (primary, inverse twin) of the entries with the given name.
    pub fn find_pair(&self, name: &str) -> (Option<usize>, Option<usize>) {
        let mut primary = None;
        let mut inverse = None;
        for (i, e) in self.entries.iter().enumerate() {
            if e.name == name {
                if e.inverted_twin {
                    inverse = Some(i);
                } else {
                    primary = Some(i);
                }
            }
        }
        (primary, inverse)
    }
}

/// Position an entry of any template occupies in native-template order.
///
/// Common entries map onto the native positions they stand in for: the shared
/// pivot opens where the rotate pivot would and closes where the scale pivot
/// inverse would. Used when inserting new operations into a stack that was
/// classified against a non-native template.
pub fn native_order_index(kind: TemplateKind, index: usize) -> usize {
    match kind {
        TemplateKind::Native => index,
        TemplateKind::Common => match index {
            0 => 0,  // translate
            1 => 2,  // pivot opens as rotatePivot
            2 => 3,  // rotate
            3 => 9,  // scale
            _ => 10, // pivot inverse closes as scalePivot inverse
        },
        TemplateKind::Matrix => usize::MAX,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/template.rs"]
mod tests;
