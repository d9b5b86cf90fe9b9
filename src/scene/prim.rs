use glam::{DMat4, DVec3};

use crate::foundation::core::{Component, RotateOrder, TimeCode};
use crate::foundation::error::GimbalResult;
use crate::stack::op::{OpDesc, OpId, OpKind, OpValue, Precision};

/// Scene-description surface the reconciliation core reads and writes.
///
/// The prim owns the operation stack; the core only touches it through this
/// trait. A binding assumes exclusive access to its prim (§concurrency:
/// single-threaded, serialized by the caller).
pub trait ScenePrim {
    /// Enumerate the ordered operations of the stack.
    fn ordered_ops(&self) -> Vec<OpDesc>;

    /// Read one operation's value at a time, or `None` when the stored type
    /// has no value there.
    fn read(&self, op: OpId, time: TimeCode) -> Option<OpValue>;

    /// Write one operation's value at a time.
    fn write(&mut self, op: OpId, value: OpValue, time: TimeCode) -> GimbalResult<()>;

    /// Number of authored time samples on an operation.
    fn sample_count(&self, op: OpId) -> usize;

    /// Create a new operation; it is appended to the stack order until a
    /// [`ScenePrim::set_op_order`] call positions it.
    fn add_op(
        &mut self,
        kind: OpKind,
        precision: Precision,
        name: &str,
        inverted_twin: bool,
    ) -> GimbalResult<OpId>;

    /// Atomically replace the stack order and the parent-inheritance reset
    /// flag.
    fn set_op_order(&mut self, order: &[OpId], resets_stack: bool) -> GimbalResult<()>;

    /// `true` when the stack resets inheritance from the parent.
    fn resets_stack(&self) -> bool;

    /// The authored local transform: ordered operations composed
    /// first-listed-outermost at the given time.
    fn local_matrix(&self, time: TimeCode) -> DMat4;
}

/// Capability surface of the host transform node that owns a binding.
///
/// Held by the binding as a non-owning handle; the host owns the binding,
/// never the reverse. Every method has a default so hosts implement only
/// what they care about.
pub trait HostNode {
    /// Rotation order configured on the host node.
    fn rotate_order(&self) -> RotateOrder {
        RotateOrder::default()
    }

    /// `true` when the host has locked a component against edits.
    fn is_locked(&self, _component: Component) -> bool {
        false
    }

    /// The binding's pushed state changed the local transform; dependent
    /// visual state is stale.
    fn notify_dirty(&self) {}

    /// One-time sync of a freshly decomposed baseline into the host's own
    /// attribute storage on first bind. Rotation-like components arrive as
    /// Euler radians.
    fn absorb(&self, _component: Component, _value: DVec3) {}
}
