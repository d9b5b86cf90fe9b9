use std::rc::{Rc, Weak};

use glam::{DMat4, DQuat, DVec3};
use tracing::{debug, trace, warn};

use crate::foundation::core::{Component, RotateOrder, TimeCode};
use crate::foundation::error::{GimbalError, GimbalResult};
use crate::scene::prim::{HostNode, ScenePrim};
use crate::stack::classify::{ClassifiedOp, classify};
use crate::stack::op::{OpDesc, OpId, OpKind, OpValue, Precision, rotation_from, rotation_into};
use crate::stack::template::OpRole;
use crate::xform::decompose::{matrix_to_srt, shear_matrix};
use crate::xform::insert::insert_op;
use crate::xform::state::{BindingConfig, ComponentState, DerivedState};

/// Coordinate space of a setter argument.
///
/// The binding evaluates in the node's own transform space; world-space
/// edits need the host's hierarchy context, which lives outside this core.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Space {
    /// The node's local transform space.
    #[default]
    Transform,
    /// World space (not resolvable by the core).
    World,
}

fn check_space(space: Space) -> GimbalResult<()> {
    match space {
        Space::Transform => Ok(()),
        Space::World => Err(GimbalError::mutation(
            "world-space edits require host hierarchy context",
        )),
    }
}

/// Bidirectional binding between a decomposed transform and one scene prim's
/// operation stack.
///
/// The stack is the source of truth until a component is edited; edits are
/// tracked as tweaks against the stack baseline and written back with
/// [`TransformBinding::push`] when propagation is enabled. One binding owns
/// its prim exclusively; callers serialize access.
pub struct TransformBinding<P: ScenePrim> {
    prim: Option<P>,
    host: Option<Weak<dyn HostNode>>,
    time: TimeCode,
    rotate_order: RotateOrder,
    config: BindingConfig,
    derived: DerivedState,
    state: ComponentState,
    ops: Vec<OpDesc>,
    classified: Vec<ClassifiedOp>,
}

impl<P: ScenePrim> Default for TransformBinding<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ScenePrim> TransformBinding<P> {
    /// An unbound binding with identity state.
    pub fn new() -> Self {
        Self {
            prim: None,
            host: None,
            time: TimeCode::Default,
            rotate_order: RotateOrder::default(),
            config: BindingConfig::default(),
            derived: DerivedState::default(),
            state: ComponentState::identity(),
            ops: Vec::new(),
            classified: Vec::new(),
        }
    }

    /// Bind to a prim: discard all local state, classify the stack, and
    /// decompose it into fresh baselines at the reference time.
    pub fn bind(&mut self, prim: P) {
        debug!("binding to prim");
        self.reset();
        self.prim = Some(prim);
        self.initialise(true);
    }

    /// Release the bound prim, resetting all local state.
    pub fn unbind(&mut self) -> Option<P> {
        let prim = self.prim.take();
        self.reset();
        prim
    }

    /// Attach the owning host node's capability handle. Non-owning: the host
    /// owns the binding, never the reverse.
    pub fn set_host(&mut self, host: Weak<dyn HostNode>) {
        self.host = Some(host);
    }

    /// `true` when a prim is bound.
    pub fn is_bound(&self) -> bool {
        self.prim.is_some()
    }

    /// The bound prim.
    pub fn prim(&self) -> Option<&P> {
        self.prim.as_ref()
    }

    /// The binding's current evaluation time.
    pub fn time(&self) -> TimeCode {
        self.time
    }

    /// The binding's rotation order.
    pub fn rotate_order(&self) -> RotateOrder {
        self.rotate_order
    }

    /// Change the rotation order.
    ///
    /// Fails once a prim is bound: remapping every authored rotate operation
    /// to a different order is not supported.
    pub fn set_rotate_order(&mut self, order: RotateOrder) -> GimbalResult<()> {
        if self.prim.is_some() {
            return Err(GimbalError::mutation(
                "rotation order cannot change while bound to a stack",
            ));
        }
        self.rotate_order = order;
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> BindingConfig {
        self.config
    }

    /// `true` when the stack has an operation for the component.
    pub fn component_present(&self, c: Component) -> bool {
        self.derived.present.contains(c)
    }

    /// `true` when the component's operation carries more than one time
    /// sample.
    pub fn component_animated(&self, c: Component) -> bool {
        self.derived.animated.contains(c)
    }

    /// `true` when any component is animated.
    pub fn has_animation(&self) -> bool {
        !self.derived.animated.is_empty()
    }

    /// `true` when component values come from whole-matrix decomposition
    /// (single-matrix template or foreign stack).
    pub fn is_matrix_only(&self) -> bool {
        self.derived.from_matrix || self.derived.foreign
    }

    /// `true` when no template matched the stack.
    pub fn is_foreign(&self) -> bool {
        self.derived.foreign
    }

    /// `true` when the stack matched one of the known templates.
    pub fn from_template(&self) -> bool {
        self.derived.from_template
    }

    /// `true` when the stack inherits the parent transform.
    pub fn inherits_transform(&self) -> bool {
        self.derived.inherits_transform
    }

    /// Set whether the stack inherits the parent transform (rewrites the
    /// stack-reset flag through the collaborator).
    pub fn set_inherits_transform(&mut self, inherits: bool) -> GimbalResult<()> {
        self.derived.inherits_transform = inherits;
        let order: Vec<OpId> = self.ops.iter().map(|d| d.id).collect();
        match self.prim.as_mut() {
            Some(prim) => prim.set_op_order(&order, !inherits),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Component getters (exposed values: baseline plus tweak).
    // ------------------------------------------------------------------

    /// Exposed translation.
    pub fn translation(&self) -> DVec3 {
        self.state.translation.exposed()
    }

    /// Exposed Euler rotation in radians, in [`TransformBinding::rotate_order`].
    pub fn rotation(&self) -> DVec3 {
        self.state.rotation.exposed()
    }

    /// Exposed rotation as a quaternion.
    pub fn rotation_quat(&self) -> DQuat {
        self.rotate_order.quat_from_euler(self.state.rotation.exposed())
    }

    /// Exposed scale.
    pub fn scale(&self) -> DVec3 {
        self.state.scale.exposed()
    }

    /// Exposed shear triple (xy, xz, yz).
    pub fn shear(&self) -> DVec3 {
        self.state.shear.exposed()
    }

    /// Exposed scale pivot.
    pub fn scale_pivot(&self) -> DVec3 {
        self.state.scale_pivot.exposed()
    }

    /// Exposed scale pivot translation.
    pub fn scale_pivot_translation(&self) -> DVec3 {
        self.state.scale_pivot_translation.exposed()
    }

    /// Exposed rotate pivot.
    pub fn rotate_pivot(&self) -> DVec3 {
        self.state.rotate_pivot.exposed()
    }

    /// Exposed rotate pivot translation.
    pub fn rotate_pivot_translation(&self) -> DVec3 {
        self.state.rotate_pivot_translation.exposed()
    }

    /// Exposed rotate-axis orientation.
    pub fn rotate_orientation(&self) -> DQuat {
        self.state.rotate_orientation.exposed()
    }

    /// The auxiliary local translate offset.
    pub fn local_translate_offset(&self) -> DVec3 {
        self.state.local_translate_offset
    }

    // ------------------------------------------------------------------
    // Component setters. Contract: locked components accept the call as a
    // no-op; otherwise the tweak is recomputed against the baseline, a
    // missing operation is inserted when the value left its default, and
    // the full state is pushed while propagation is enabled.
    // ------------------------------------------------------------------

    /// Set the translation.
    pub fn translate_to(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "translate_to");
        if self.locked(Component::Translate) {
            return Ok(());
        }
        self.state.translation.set_exposed(v);
        let present = self.derived.present.contains(Component::Translate);
        let non_default = self.translation() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Translate,
                Precision::Float,
                "translate",
                Component::Translate,
                // translate is always first in the stack, so the scan can
                // be skipped
                true,
            )
        })
    }

    /// Add to the translation.
    pub fn translate_by(&mut self, d: DVec3, space: Space) -> GimbalResult<()> {
        let v = self.translation() + d;
        self.translate_to(v, space)
    }

    /// Set the Euler rotation (radians, in the binding's rotation order).
    pub fn rotate_to(&mut self, euler: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?euler, "rotate_to");
        if self.locked(Component::Rotate) {
            return Ok(());
        }
        self.state.rotation.set_exposed(euler);
        let present = self.derived.present.contains(Component::Rotate);
        let non_default = self.rotation() != DVec3::ZERO;
        let kind = OpKind::for_rotate_order(self.rotate_order);
        self.after_edit(present, non_default, move |b| {
            b.insert_component_op(kind, Precision::Float, "rotate", Component::Rotate, false)
        })
    }

    /// Set the rotation from a quaternion, converted through the binding's
    /// rotation order.
    pub fn rotate_to_quat(&mut self, q: DQuat, space: Space) -> GimbalResult<()> {
        let euler = self.rotate_order.euler_from_quat(q);
        self.rotate_to(euler, space)
    }

    /// Add to the Euler rotation.
    pub fn rotate_by(&mut self, euler: DVec3, space: Space) -> GimbalResult<()> {
        let v = self.rotation() + euler;
        self.rotate_to(v, space)
    }

    /// Compose a quaternion onto the rotation.
    pub fn rotate_by_quat(&mut self, q: DQuat, space: Space) -> GimbalResult<()> {
        let composed = self.rotation_quat() * q;
        self.rotate_to_quat(composed, space)
    }

    /// Set the scale.
    pub fn scale_to(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "scale_to");
        if self.locked(Component::Scale) {
            return Ok(());
        }
        self.state.scale.set_exposed(v);
        let present = self.derived.present.contains(Component::Scale);
        let non_default = self.scale() != DVec3::ONE;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(OpKind::Scale, Precision::Float, "scale", Component::Scale, false)
        })
    }

    /// Multiply the scale.
    pub fn scale_by(&mut self, factor: DVec3, space: Space) -> GimbalResult<()> {
        let v = self.scale() * factor;
        self.scale_to(v, space)
    }

    /// Set the shear triple (xy, xz, yz).
    ///
    /// Shear is only representable through the matrix-typed operation kind,
    /// so a fresh shear operation is always inserted with that kind.
    pub fn shear_to(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "shear_to");
        if self.locked(Component::Shear) {
            return Ok(());
        }
        self.state.shear.set_exposed(v);
        let present = self.derived.present.contains(Component::Shear);
        let non_default = self.shear() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Transform,
                Precision::Double,
                "shear",
                Component::Shear,
                false,
            )
        })
    }

    /// Add to the shear triple.
    pub fn shear_by(&mut self, d: DVec3, space: Space) -> GimbalResult<()> {
        let v = self.shear() + d;
        self.shear_to(v, space)
    }

    /// Set the scale pivot.
    pub fn set_scale_pivot(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "set_scale_pivot");
        if self.locked(Component::ScalePivot) {
            return Ok(());
        }
        self.state.scale_pivot.set_exposed(v);
        // A stack with the generic pivot already covers the scale pivot.
        let present = self.derived.present.contains(Component::ScalePivot)
            || self.derived.present.contains(Component::Pivot);
        let non_default = self.scale_pivot() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Translate,
                Precision::Float,
                "scalePivot",
                Component::ScalePivot,
                false,
            )
        })
    }

    /// Set the scale pivot translation.
    pub fn set_scale_pivot_translation(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "set_scale_pivot_translation");
        if self.locked(Component::ScalePivotTranslate) {
            return Ok(());
        }
        self.state.scale_pivot_translation.set_exposed(v);
        let present = self.derived.present.contains(Component::ScalePivotTranslate);
        let non_default = self.scale_pivot_translation() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Translate,
                Precision::Float,
                "scalePivotTranslate",
                Component::ScalePivotTranslate,
                false,
            )
        })
    }

    /// Set the rotate pivot.
    pub fn set_rotate_pivot(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "set_rotate_pivot");
        if self.locked(Component::RotatePivot) {
            return Ok(());
        }
        self.state.rotate_pivot.set_exposed(v);
        let present = self.derived.present.contains(Component::RotatePivot)
            || self.derived.present.contains(Component::Pivot);
        let non_default = self.rotate_pivot() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Translate,
                Precision::Float,
                "rotatePivot",
                Component::RotatePivot,
                false,
            )
        })
    }

    /// Set the rotate pivot translation.
    pub fn set_rotate_pivot_translation(&mut self, v: DVec3, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?v, "set_rotate_pivot_translation");
        if self.locked(Component::RotatePivotTranslate) {
            return Ok(());
        }
        self.state.rotate_pivot_translation.set_exposed(v);
        let present = self.derived.present.contains(Component::RotatePivotTranslate);
        let non_default = self.rotate_pivot_translation() != DVec3::ZERO;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::Translate,
                Precision::Float,
                "rotatePivotTranslate",
                Component::RotatePivotTranslate,
                false,
            )
        })
    }

    /// Set the rotate-axis orientation.
    pub fn set_rotate_orientation(&mut self, q: DQuat, space: Space) -> GimbalResult<()> {
        check_space(space)?;
        trace!(?q, "set_rotate_orientation");
        if self.locked(Component::RotateAxis) {
            return Ok(());
        }
        self.state.rotate_orientation.set_exposed(q);
        let present = self.derived.present.contains(Component::RotateAxis);
        let non_default = self.rotate_orientation() != DQuat::IDENTITY;
        self.after_edit(present, non_default, |b| {
            b.insert_component_op(
                OpKind::RotateXyz,
                Precision::Float,
                "rotateAxis",
                Component::RotateAxis,
                false,
            )
        })
    }

    /// Set the auxiliary translation offset expressed along the node's own
    /// rotated axes. Host-driven; never written to the stack.
    pub fn set_local_translate_offset(&mut self, v: DVec3) {
        self.state.local_translate_offset = v;
    }

    // ------------------------------------------------------------------
    // Matrix composition.
    // ------------------------------------------------------------------

    /// The local affine matrix of the current exposed state, including the
    /// local translate offset projected through the rotated and scaled
    /// basis.
    pub fn compose(&self) -> DMat4 {
        let mut m = self.compose_decomposed();
        let o = self.state.local_translate_offset;
        m.w_axis += m.x_axis * o.x + m.y_axis * o.y + m.z_axis * o.z;
        m
    }

    /// Fractional blend from identity toward [`TransformBinding::compose`],
    /// for interpolated evaluation.
    pub fn compose_blended(&self, fraction: f64) -> DMat4 {
        let s = &self.state;
        let rotation = DQuat::IDENTITY.slerp(
            self.rotate_order.quat_from_euler(s.rotation.exposed()),
            fraction,
        );
        let orientation = DQuat::IDENTITY.slerp(s.rotate_orientation.exposed(), fraction);
        let mut m = DMat4::from_translation(s.translation.exposed() * fraction)
            * DMat4::from_translation(s.rotate_pivot_translation.exposed() * fraction)
            * DMat4::from_translation(s.rotate_pivot.exposed())
            * DMat4::from_quat(rotation)
            * DMat4::from_quat(orientation)
            * DMat4::from_translation(-s.rotate_pivot.exposed())
            * DMat4::from_translation(s.scale_pivot_translation.exposed() * fraction)
            * DMat4::from_translation(s.scale_pivot.exposed())
            * shear_matrix(s.shear.exposed() * fraction)
            * DMat4::from_scale(DVec3::ONE.lerp(s.scale.exposed(), fraction))
            * DMat4::from_translation(-s.scale_pivot.exposed());
        let o = s.local_translate_offset * fraction;
        m.w_axis += m.x_axis * o.x + m.y_axis * o.y + m.z_axis * o.z;
        m
    }

    fn compose_decomposed(&self) -> DMat4 {
        let s = &self.state;
        DMat4::from_translation(s.translation.exposed())
            * DMat4::from_translation(s.rotate_pivot_translation.exposed())
            * DMat4::from_translation(s.rotate_pivot.exposed())
            * DMat4::from_quat(self.rotate_order.quat_from_euler(s.rotation.exposed()))
            * DMat4::from_quat(s.rotate_orientation.exposed())
            * DMat4::from_translation(-s.rotate_pivot.exposed())
            * DMat4::from_translation(s.scale_pivot_translation.exposed())
            * DMat4::from_translation(s.scale_pivot.exposed())
            * shear_matrix(s.shear.exposed())
            * DMat4::from_scale(s.scale.exposed())
            * DMat4::from_translation(-s.scale_pivot.exposed())
    }

    // ------------------------------------------------------------------
    // Push.
    // ------------------------------------------------------------------

    /// Write the current component state back onto the stack.
    ///
    /// Each classified operation is written only when its serialized value
    /// differs from what the stack stores at the current time; a written
    /// component's baseline absorbs the value and its tweak resets. Failures
    /// are per-operation: one failed write never rolls back the others. If
    /// the authored local transform changed, the host is told its dependent
    /// visual state is stale.
    pub fn push(&mut self) -> GimbalResult<()> {
        let tc = self.effective_time();
        let before = match self.prim.as_ref() {
            Some(prim) => prim.local_matrix(tc),
            None => return Ok(()),
        };
        debug!("pushing decomposed state to stack");

        let count = self.ops.len().min(self.classified.len());
        for i in 0..count {
            let cls = self.classified[i];
            if cls.entry.inverted_twin {
                continue;
            }
            let desc = self.ops[i].clone();
            if let Err(e) = self.push_role(cls.entry.role, &desc, tc) {
                warn!(op = %desc.name, error = %e, "push of one operation failed; continuing");
            }
        }

        let after = match self.prim.as_ref() {
            Some(prim) => prim.local_matrix(tc),
            None => return Ok(()),
        };
        if before != after {
            if let Some(host) = self.host() {
                host.notify_dirty();
            }
        }
        Ok(())
    }

    /// Enable or disable propagation of local edits to the stack.
    ///
    /// Enabling at the reference time sweeps every component that is present
    /// on the stack or has left its default through its setter, so missing
    /// operations materialize in canonical order.
    pub fn enable_push_to_prim(&mut self, enabled: bool) -> GimbalResult<()> {
        self.config.push_to_prim = enabled;
        if !enabled || self.prim.is_none() || !self.effective_time().is_default() {
            return Ok(());
        }
        self.materialize_edits()
    }

    /// Enable or disable resolving values at the binding's current time
    /// rather than the reference time.
    pub fn enable_read_animated_values(&mut self, enabled: bool) -> GimbalResult<()> {
        self.config.read_animated_values = enabled;
        if !enabled || self.prim.is_none() {
            return Ok(());
        }
        self.materialize_edits()
    }

    // ------------------------------------------------------------------
    // Time-varying refresh.
    // ------------------------------------------------------------------

    /// Re-read animated components at a new evaluation time.
    ///
    /// Only roles flagged animated at classification are touched; their
    /// baselines move and the existing tweaks apply unchanged. An animated
    /// whole-matrix operation triggers a full numeric re-decomposition.
    /// Everything else is left alone: re-reading a non-animated operation at
    /// a new time must not change any exposed value.
    pub fn refresh_at_time(&mut self, time: TimeCode) {
        if self.prim.is_none() || self.time == time {
            return;
        }
        debug!(?time, "refreshing animated components");
        self.time = time;
        if self.derived.animated.is_empty() {
            return;
        }
        let tc = self.effective_time();

        let count = self.ops.len().min(self.classified.len());
        for i in 0..count {
            let cls = self.classified[i];
            if cls.entry.inverted_twin {
                continue;
            }
            let component = cls.entry.role.component();
            if !self.derived.animated.contains(component) {
                continue;
            }
            let desc = self.ops[i].clone();
            match cls.entry.role {
                OpRole::Translate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.translation.rebase(v);
                    }
                }
                OpRole::Pivot => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.rotate_pivot.rebase(v);
                        self.state.scale_pivot.rebase(v);
                    }
                }
                OpRole::RotatePivotTranslate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.rotate_pivot_translation.rebase(v);
                    }
                }
                OpRole::RotatePivot => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.rotate_pivot.rebase(v);
                    }
                }
                OpRole::Rotate => {
                    let decoded = self
                        .read_op(desc.id, tc)
                        .and_then(|v| rotation_from(desc.kind, &v));
                    if let Some((euler, _)) = decoded {
                        self.state.rotation.rebase(euler);
                    }
                }
                OpRole::RotateAxis => {
                    if let Some(q) = self.read_orientation(&desc, tc) {
                        self.state.rotate_orientation.rebase(q);
                    }
                }
                OpRole::ScalePivotTranslate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale_pivot_translation.rebase(v);
                    }
                }
                OpRole::ScalePivot => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale_pivot.rebase(v);
                    }
                }
                OpRole::Shear => {
                    if let Some(v) = self.read_op(desc.id, tc).and_then(|v| v.as_shear()) {
                        self.state.shear.rebase(v);
                    }
                }
                OpRole::Scale => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale.rebase(v);
                    }
                }
                OpRole::Transform => {
                    if let Some(m) = self.read_op(desc.id, tc).and_then(|v| v.as_matrix()) {
                        self.rebase_decomposed(m);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals.
    // ------------------------------------------------------------------

    fn reset(&mut self) {
        self.prim = None;
        self.time = TimeCode::Default;
        self.rotate_order = RotateOrder::default();
        self.config = BindingConfig::default();
        self.derived = DerivedState::default();
        self.state = ComponentState::identity();
        self.ops.clear();
        self.classified.clear();
    }

    /// Classify the stack and decompose it into baselines.
    ///
    /// Derived state is recomputed wholesale; the externally driven
    /// configuration is only touched by the animated-stack demotion below.
    fn initialise(&mut self, read_from_prim: bool) {
        let Some(prim) = self.prim.as_ref() else {
            return;
        };
        self.derived = DerivedState {
            inherits_transform: !prim.resets_stack(),
            ..DerivedState::default()
        };
        self.ops = prim.ordered_ops();
        self.classified.clear();
        if let Some(host) = self.host() {
            self.rotate_order = host.rotate_order();
        }

        match classify(&self.ops) {
            Some(c) => {
                if !self.ops.is_empty() {
                    self.derived.from_template = true;
                }
                self.classified = c.ops;
                let matched_order = self
                    .classified
                    .iter()
                    .zip(&self.ops)
                    .find(|(cls, _)| cls.entry.role == OpRole::Rotate)
                    .and_then(|(_, desc)| desc.kind.rotate_order());
                if let Some(order) = matched_order {
                    self.rotate_order = order;
                }
                self.read_classified(read_from_prim);
            }
            None => {
                self.derived.foreign = true;
                let m = match self.prim.as_ref() {
                    Some(prim) => prim.local_matrix(self.effective_time()),
                    None => DMat4::IDENTITY,
                };
                if read_from_prim {
                    self.absorb_decomposed(m);
                }
            }
        }

        // A stack with animation keys starts out as a read-only viewer of
        // the animated data.
        if !self.derived.animated.is_empty() {
            self.config.push_to_prim = false;
            self.config.read_animated_values = true;
        }
    }

    fn read_classified(&mut self, read_from_prim: bool) {
        let tc = self.effective_time();
        let host = self.host();

        for i in 0..self.ops.len() {
            let cls = self.classified[i];
            if cls.entry.inverted_twin {
                continue;
            }
            let desc = self.ops[i].clone();
            let component = cls.entry.role.component();
            self.derived.present.insert(component);
            let samples = match self.prim.as_ref() {
                Some(prim) => prim.sample_count(desc.id),
                None => 0,
            };
            if samples > 1 {
                self.derived.animated.insert(component);
            }
            if !read_from_prim {
                if cls.entry.role == OpRole::Transform {
                    self.derived.from_matrix = true;
                    self.derived.push_prim_to_matrix = true;
                }
                continue;
            }

            match cls.entry.role {
                OpRole::Translate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.translation.absorb(v);
                        absorb_into(&host, Component::Translate, v);
                    }
                }
                OpRole::Pivot => {
                    // The generic pivot seeds both pivots; they stay
                    // synchronized aliases of one another.
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale_pivot.absorb(v);
                        self.state.rotate_pivot.absorb(v);
                        absorb_into(&host, Component::RotatePivot, v);
                        absorb_into(&host, Component::ScalePivot, v);
                    }
                }
                OpRole::RotatePivotTranslate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.rotate_pivot_translation.absorb(v);
                        absorb_into(&host, Component::RotatePivotTranslate, v);
                    }
                }
                OpRole::RotatePivot => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.rotate_pivot.absorb(v);
                        absorb_into(&host, Component::RotatePivot, v);
                    }
                }
                OpRole::Rotate => {
                    let decoded = self
                        .read_op(desc.id, tc)
                        .and_then(|v| rotation_from(desc.kind, &v));
                    if let Some((euler, _)) = decoded {
                        self.state.rotation.absorb(euler);
                        absorb_into(&host, Component::Rotate, euler);
                    }
                }
                OpRole::RotateAxis => {
                    if let Some(q) = self.read_orientation(&desc, tc) {
                        self.state.rotate_orientation.absorb(q);
                        absorb_into(&host, Component::RotateAxis, RotateOrder::Xyz.euler_from_quat(q));
                    }
                }
                OpRole::ScalePivotTranslate => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale_pivot_translation.absorb(v);
                        absorb_into(&host, Component::ScalePivotTranslate, v);
                    }
                }
                OpRole::ScalePivot => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale_pivot.absorb(v);
                        absorb_into(&host, Component::ScalePivot, v);
                    }
                }
                OpRole::Shear => {
                    if let Some(v) = self.read_op(desc.id, tc).and_then(|v| v.as_shear()) {
                        self.state.shear.absorb(v);
                        absorb_into(&host, Component::Shear, v);
                    }
                }
                OpRole::Scale => {
                    if let Some(v) = self.read_vector(&desc, tc) {
                        self.state.scale.absorb(v);
                        absorb_into(&host, Component::Scale, v);
                    }
                }
                OpRole::Transform => {
                    self.derived.from_matrix = true;
                    self.derived.push_prim_to_matrix = true;
                    if let Some(m) = self.read_op(desc.id, tc).and_then(|v| v.as_matrix()) {
                        self.absorb_decomposed(m);
                        absorb_into(&host, Component::Translate, self.state.translation.baseline);
                        absorb_into(&host, Component::Rotate, self.state.rotation.baseline);
                        absorb_into(&host, Component::Scale, self.state.scale.baseline);
                        absorb_into(&host, Component::Shear, self.state.shear.baseline);
                    }
                }
            }
        }
    }

    /// Time code reads and writes resolve at: the binding's current time
    /// while animated-value reads are enabled, the reference time otherwise.
    fn effective_time(&self) -> TimeCode {
        if self.config.read_animated_values {
            self.time
        } else {
            TimeCode::Default
        }
    }

    fn host(&self) -> Option<Rc<dyn HostNode>> {
        self.host.as_ref()?.upgrade()
    }

    fn locked(&self, c: Component) -> bool {
        self.host().is_some_and(|h| h.is_locked(c))
    }

    fn read_op(&self, id: OpId, tc: TimeCode) -> Option<OpValue> {
        self.prim.as_ref()?.read(id, tc)
    }

    fn read_vector(&self, desc: &OpDesc, tc: TimeCode) -> Option<DVec3> {
        self.read_op(desc.id, tc)?.as_vector()
    }

    fn read_orientation(&self, desc: &OpDesc, tc: TimeCode) -> Option<DQuat> {
        let v = self.read_vector(desc, tc)?;
        let euler = DVec3::new(v.x.to_radians(), v.y.to_radians(), v.z.to_radians());
        Some(RotateOrder::Xyz.quat_from_euler(euler))
    }

    fn absorb_decomposed(&mut self, m: DMat4) {
        let srt = matrix_to_srt(m, self.rotate_order);
        self.state.scale.absorb(srt.scale);
        self.state.shear.absorb(srt.shear);
        self.state.rotation.absorb(srt.rotation);
        self.state.translation.absorb(srt.translation);
    }

    fn rebase_decomposed(&mut self, m: DMat4) {
        let srt = matrix_to_srt(m, self.rotate_order);
        self.state.scale.rebase(srt.scale);
        self.state.shear.rebase(srt.shear);
        self.state.rotation.rebase(srt.rotation);
        self.state.translation.rebase(srt.translation);
    }

    /// Shared setter tail: insert a missing operation when warranted, then
    /// push. Pushing is unconditional once propagation is enabled; the
    /// per-operation value guard keeps it idempotent.
    fn after_edit(
        &mut self,
        already_present: bool,
        non_default: bool,
        insert: impl FnOnce(&mut Self) -> GimbalResult<()>,
    ) -> GimbalResult<()> {
        if !self.config.push_to_prim || self.prim.is_none() {
            return Ok(());
        }
        if !already_present && !self.derived.push_prim_to_matrix && non_default {
            insert(self)?;
        }
        self.push()
    }

    fn insert_component_op(
        &mut self,
        kind: OpKind,
        precision: Precision,
        name: &str,
        component: Component,
        at_beginning: bool,
    ) -> GimbalResult<()> {
        let inherits = self.derived.inherits_transform;
        let Some(prim) = self.prim.as_mut() else {
            return Ok(());
        };
        insert_op(
            prim,
            &mut self.ops,
            &mut self.classified,
            kind,
            precision,
            name,
            inherits,
            at_beginning,
        )?;
        self.derived.present.insert(component);
        Ok(())
    }

    fn push_role(&mut self, role: OpRole, desc: &OpDesc, tc: TimeCode) -> GimbalResult<()> {
        match role {
            OpRole::Translate => {
                let v = self.state.translation.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.translation.absorb(v);
            }
            OpRole::Pivot => {
                // The generic pivot is written from the rotate-pivot side;
                // both pivot baselines absorb their exposed values.
                let rp = self.state.rotate_pivot.exposed();
                let sp = self.state.scale_pivot.exposed();
                let value = self.vector_value(desc, tc, rp);
                self.write_guarded(desc, tc, value)?;
                self.state.rotate_pivot.absorb(rp);
                self.state.scale_pivot.absorb(sp);
            }
            OpRole::RotatePivotTranslate => {
                let v = self.state.rotate_pivot_translation.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.rotate_pivot_translation.absorb(v);
            }
            OpRole::RotatePivot => {
                let v = self.state.rotate_pivot.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.rotate_pivot.absorb(v);
            }
            OpRole::Rotate => {
                let euler = self.state.rotation.exposed();
                let current = self.read_op(desc.id, tc);
                let value = rotation_into(desc.kind, desc.precision, current.as_ref(), euler)
                    .ok_or_else(|| {
                        GimbalError::stack(format!(
                            "rotation not encodable onto operation `{}`",
                            desc.name
                        ))
                    })?;
                self.write_guarded(desc, tc, value)?;
                self.state.rotation.absorb(euler);
            }
            OpRole::RotateAxis => {
                let q = self.state.rotate_orientation.exposed();
                let euler = RotateOrder::Xyz.euler_from_quat(q);
                let deg = DVec3::new(
                    euler.x.to_degrees(),
                    euler.y.to_degrees(),
                    euler.z.to_degrees(),
                );
                let value = self.vector_value(desc, tc, deg);
                self.write_guarded(desc, tc, value)?;
                self.state.rotate_orientation.absorb(q);
            }
            OpRole::ScalePivotTranslate => {
                let v = self.state.scale_pivot_translation.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.scale_pivot_translation.absorb(v);
            }
            OpRole::ScalePivot => {
                let v = self.state.scale_pivot.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.scale_pivot.absorb(v);
            }
            OpRole::Shear => {
                let sh = self.state.shear.exposed();
                self.write_guarded(desc, tc, OpValue::shear_matrix(sh))?;
                self.state.shear.absorb(sh);
            }
            OpRole::Scale => {
                let v = self.state.scale.exposed();
                let value = self.vector_value(desc, tc, v);
                self.write_guarded(desc, tc, value)?;
                self.state.scale.absorb(v);
            }
            OpRole::Transform => {
                // The baselines of a matrix-backed prim keep tracking the
                // decomposition; the operation itself receives the composed
                // matrix.
                if self.derived.push_prim_to_matrix {
                    let m = self.compose_decomposed();
                    self.write_guarded(desc, tc, OpValue::Matrix4d(m))?;
                }
            }
        }
        Ok(())
    }

    fn vector_value(&self, desc: &OpDesc, tc: TimeCode, v: DVec3) -> OpValue {
        self.read_op(desc.id, tc)
            .and_then(|current| current.retype_vector(v))
            .unwrap_or_else(|| OpValue::vector(desc.precision, v))
    }

    fn write_guarded(&mut self, desc: &OpDesc, tc: TimeCode, value: OpValue) -> GimbalResult<()> {
        let Some(prim) = self.prim.as_mut() else {
            return Ok(());
        };
        if prim.read(desc.id, tc).as_ref() == Some(&value) {
            trace!(op = %desc.name, "value unchanged, skipping write");
            return Ok(());
        }
        prim.write(desc.id, value, tc)
    }

    /// Nudge every component that is present on the stack or away from its
    /// default through its setter, materializing missing operations in
    /// canonical order.
    fn materialize_edits(&mut self) -> GimbalResult<()> {
        if self.derived.push_prim_to_matrix {
            let tc = self.effective_time();
            let target = (0..self.classified.len().min(self.ops.len())).find(|&i| {
                self.classified[i].entry.role == OpRole::Transform
            });
            if let Some(i) = target {
                let desc = self.ops[i].clone();
                self.push_role(OpRole::Transform, &desc, tc)?;
            }
            return Ok(());
        }

        let present = self.derived.present;
        if present.contains(Component::Translate) || self.translation() != DVec3::ZERO {
            self.translate_by(DVec3::ZERO, Space::Transform)?;
        }
        if present.contains(Component::Scale) || self.scale() != DVec3::ONE {
            self.scale_by(DVec3::ONE, Space::Transform)?;
        }
        if present.contains(Component::Shear) || self.shear() != DVec3::ZERO {
            self.shear_by(DVec3::ZERO, Space::Transform)?;
        }
        if present.contains(Component::ScalePivot)
            || present.contains(Component::Pivot)
            || self.scale_pivot() != DVec3::ZERO
        {
            let v = self.scale_pivot();
            self.set_scale_pivot(v, Space::Transform)?;
        }
        if present.contains(Component::ScalePivotTranslate)
            || self.scale_pivot_translation() != DVec3::ZERO
        {
            let v = self.scale_pivot_translation();
            self.set_scale_pivot_translation(v, Space::Transform)?;
        }
        if present.contains(Component::RotatePivot)
            || present.contains(Component::Pivot)
            || self.rotate_pivot() != DVec3::ZERO
        {
            let v = self.rotate_pivot();
            self.set_rotate_pivot(v, Space::Transform)?;
        }
        if present.contains(Component::RotatePivotTranslate)
            || self.rotate_pivot_translation() != DVec3::ZERO
        {
            let v = self.rotate_pivot_translation();
            self.set_rotate_pivot_translation(v, Space::Transform)?;
        }
        if present.contains(Component::Rotate) || self.rotation() != DVec3::ZERO {
            self.rotate_by_quat(DQuat::IDENTITY, Space::Transform)?;
        }
        if present.contains(Component::RotateAxis) || self.rotate_orientation() != DQuat::IDENTITY {
            let q = self.rotate_orientation();
            self.set_rotate_orientation(q, Space::Transform)?;
        }
        Ok(())
    }
}

fn absorb_into(host: &Option<Rc<dyn HostNode>>, component: Component, value: DVec3) {
    if let Some(h) = host {
        h.absorb(component, value);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/xform/binding.rs"]
mod tests;
