use glam::{DQuat, DVec3};

use crate::foundation::core::ComponentSet;

/// Externally driven configuration; survives every classification refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BindingConfig {
    /// Propagate local edits back onto the stack.
    pub push_to_prim: bool,
    /// Resolve reads and writes at the binding's current time instead of the
    /// reference time.
    pub read_animated_values: bool,
}

/// State derived purely from the stack; recomputed wholesale by every
/// classification refresh.
#[derive(Clone, Debug, Default)]
pub struct DerivedState {
    /// The stack inherits the parent transform (reset flag not authored).
    pub inherits_transform: bool,
    /// The stack matched one of the known templates.
    pub from_template: bool,
    /// The stack is the single-matrix template.
    pub from_matrix: bool,
    /// No template matched; components came from whole-matrix fallback.
    pub foreign: bool,
    /// Pushes rewrite the whole-matrix transform operation.
    pub push_prim_to_matrix: bool,
    /// Components that currently have an operation on the stack.
    pub present: ComponentSet,
    /// Components whose operation carries more than one time sample.
    pub animated: ComponentSet,
}

/// A baseline/tweak pair for an additive vector component.
///
/// The exposed value is always `baseline + tweak`; the baseline tracks the
/// stack, the tweak tracks unsynchronized local edits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tracked {
    /// Last value read from or written to the stack.
    pub baseline: DVec3,
    /// Local delta since the last baseline refresh or push.
    pub tweak: DVec3,
}

impl Tracked {
    /// A pair at the given identity value with no tweak.
    pub fn at(identity: DVec3) -> Self {
        Self {
            baseline: identity,
            tweak: DVec3::ZERO,
        }
    }

    /// The externally visible value.
    pub fn exposed(&self) -> DVec3 {
        self.baseline + self.tweak
    }

    /// Move the exposed value; the difference lands in the tweak.
    pub fn set_exposed(&mut self, v: DVec3) {
        self.tweak = v - self.baseline;
    }

    /// A push or read synchronized the stack; the tweak is spent.
    pub fn absorb(&mut self, v: DVec3) {
        self.baseline = v;
        self.tweak = DVec3::ZERO;
    }

    /// A time refresh moved the external baseline; the tweak persists.
    pub fn rebase(&mut self, v: DVec3) {
        self.baseline = v;
    }
}

/// A baseline/tweak pair for the rotate-axis orientation, composed
/// multiplicatively (`exposed = baseline * tweak`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedQuat {
    /// Last orientation read from or written to the stack.
    pub baseline: DQuat,
    /// Local rotation applied on top of the baseline.
    pub tweak: DQuat,
}

impl TrackedQuat {
    /// The identity pair.
    pub fn identity() -> Self {
        Self {
            baseline: DQuat::IDENTITY,
            tweak: DQuat::IDENTITY,
        }
    }

    /// The externally visible orientation.
    pub fn exposed(&self) -> DQuat {
        self.baseline * self.tweak
    }

    /// Move the exposed orientation; the quotient lands in the tweak.
    pub fn set_exposed(&mut self, q: DQuat) {
        self.tweak = self.baseline.inverse() * q;
    }

    /// A push or read synchronized the stack; the tweak is spent.
    pub fn absorb(&mut self, q: DQuat) {
        self.baseline = q;
        self.tweak = DQuat::IDENTITY;
    }

    /// A time refresh moved the external baseline; the tweak persists.
    pub fn rebase(&mut self, q: DQuat) {
        self.baseline = q;
    }
}

/// All decomposed component slots of one binding.
#[derive(Clone, Debug)]
pub struct ComponentState {
    /// Translation (identity zero).
    pub translation: Tracked,
    /// Euler rotation in radians (identity zero).
    pub rotation: Tracked,
    /// Scale (identity one).
    pub scale: Tracked,
    /// Shear triple (identity zero).
    pub shear: Tracked,
    /// Scale pivot point.
    pub scale_pivot: Tracked,
    /// Scale pivot translation offset.
    pub scale_pivot_translation: Tracked,
    /// Rotate pivot point.
    pub rotate_pivot: Tracked,
    /// Rotate pivot translation offset.
    pub rotate_pivot_translation: Tracked,
    /// Rotate-axis orientation.
    pub rotate_orientation: TrackedQuat,
    /// Auxiliary translation offset along the node's own rotated axes.
    pub local_translate_offset: DVec3,
}

impl ComponentState {
    /// All slots at identity.
    pub fn identity() -> Self {
        Self {
            translation: Tracked::at(DVec3::ZERO),
            rotation: Tracked::at(DVec3::ZERO),
            scale: Tracked::at(DVec3::ONE),
            shear: Tracked::at(DVec3::ZERO),
            scale_pivot: Tracked::at(DVec3::ZERO),
            scale_pivot_translation: Tracked::at(DVec3::ZERO),
            rotate_pivot: Tracked::at(DVec3::ZERO),
            rotate_pivot_translation: Tracked::at(DVec3::ZERO),
            rotate_orientation: TrackedQuat::identity(),
            local_translate_offset: DVec3::ZERO,
        }
    }
}

impl Default for ComponentState {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/xform/state.rs"]
mod tests;
