use glam::DMat4;

use crate::foundation::core::TimeCode;
use crate::foundation::error::{GimbalError, GimbalResult};
use crate::scene::prim::ScenePrim;
use crate::stack::op::{OpDesc, OpId, OpKind, OpValue, Precision};

/// One authored time sample.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeSample {
    /// Sample time.
    pub time: f64,
    /// Value at that time.
    pub value: OpValue,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct MemoryOp {
    id: OpId,
    kind: OpKind,
    precision: Precision,
    name: String,
    inverted_twin: bool,
    default_value: Option<OpValue>,
    samples: Vec<TimeSample>, // sorted by time
}

impl MemoryOp {
    /// Value resolution: a specific time reads the sample at or before it
    /// (earliest sample when the time precedes all of them); the default
    /// time reads the default value, falling back to the earliest sample.
    fn read(&self, time: TimeCode) -> Option<OpValue> {
        match time {
            TimeCode::Default => self
                .default_value
                .clone()
                .or_else(|| self.samples.first().map(|s| s.value.clone())),
            TimeCode::At(t) => {
                if self.samples.is_empty() {
                    return self.default_value.clone();
                }
                let idx = self.samples.partition_point(|s| s.time <= t);
                let s = if idx == 0 { &self.samples[0] } else { &self.samples[idx - 1] };
                Some(s.value.clone())
            }
        }
    }

    fn write(&mut self, value: OpValue, time: TimeCode) {
        match time {
            TimeCode::Default => self.default_value = Some(value),
            TimeCode::At(t) => {
                let idx = self.samples.partition_point(|s| s.time < t);
                if idx < self.samples.len() && self.samples[idx].time == t {
                    self.samples[idx].value = value;
                } else {
                    self.samples.insert(idx, TimeSample { time: t, value });
                }
            }
        }
    }
}

/// In-memory reference implementation of [`ScenePrim`].
///
/// Stores per-operation default values and sorted time samples, evaluates
/// per-operation matrices, and composes the authored local transform. The
/// revision counter advances on every mutation and stands in for downstream
/// change notification: a reconciliation pass that writes nothing leaves it
/// untouched.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MemoryPrim {
    next_id: u32,
    order: Vec<OpId>,
    ops: Vec<MemoryOp>,
    resets_stack: bool,
    #[serde(skip)]
    revision: u64,
}

impl MemoryPrim {
    /// An empty prim with no operations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Create an operation with an authored default value, appended to the
    /// stack order. Convenience for building scenes by hand.
    pub fn author_op(
        &mut self,
        kind: OpKind,
        precision: Precision,
        name: &str,
        value: OpValue,
    ) -> GimbalResult<OpId> {
        let id = self.add_op(kind, precision, name, false)?;
        self.write(id, value, TimeCode::Default)?;
        Ok(id)
    }

    /// Create an operation with authored time samples, appended to the stack
    /// order.
    pub fn author_animated_op(
        &mut self,
        kind: OpKind,
        precision: Precision,
        name: &str,
        samples: Vec<TimeSample>,
    ) -> GimbalResult<OpId> {
        let id = self.add_op(kind, precision, name, false)?;
        for s in samples {
            self.write(id, s.value, TimeCode::At(s.time))?;
        }
        Ok(id)
    }

    fn op(&self, id: OpId) -> Option<&MemoryOp> {
        self.ops.iter().find(|o| o.id == id)
    }

    fn op_mut(&mut self, id: OpId) -> Option<&mut MemoryOp> {
        self.ops.iter_mut().find(|o| o.id == id)
    }

    fn op_matrix(&self, op: &MemoryOp, time: TimeCode) -> DMat4 {
        if op.inverted_twin {
            let primary = self
                .ops
                .iter()
                .find(|o| o.name == op.name && !o.inverted_twin);
            return match primary {
                Some(p) => self.op_matrix(p, time).inverse(),
                None => DMat4::IDENTITY,
            };
        }

        let Some(value) = op.read(time) else {
            return DMat4::IDENTITY;
        };
        match op.kind {
            OpKind::Translate => match value.as_vector() {
                Some(v) => DMat4::from_translation(v),
                None => DMat4::IDENTITY,
            },
            OpKind::Scale => match value.as_vector() {
                Some(v) => DMat4::from_scale(v),
                None => DMat4::IDENTITY,
            },
            OpKind::Transform => value.as_matrix().unwrap_or(DMat4::IDENTITY),
            kind => match crate::stack::op::rotation_from(kind, &value) {
                Some((euler, order)) => DMat4::from_quat(order.quat_from_euler(euler)),
                None => DMat4::IDENTITY,
            },
        }
    }
}

impl ScenePrim for MemoryPrim {
    fn ordered_ops(&self) -> Vec<OpDesc> {
        self.order
            .iter()
            .filter_map(|id| self.op(*id))
            .map(|o| OpDesc {
                id: o.id,
                kind: o.kind,
                precision: o.precision,
                name: o.name.clone(),
                inverted_twin: o.inverted_twin,
            })
            .collect()
    }

    fn read(&self, op: OpId, time: TimeCode) -> Option<OpValue> {
        self.op(op)?.read(time)
    }

    fn write(&mut self, op: OpId, value: OpValue, time: TimeCode) -> GimbalResult<()> {
        let target = self
            .op_mut(op)
            .ok_or_else(|| GimbalError::stack(format!("no operation with id {}", op.0)))?;
        if target.inverted_twin {
            return Err(GimbalError::stack(format!(
                "operation {} is an inverse twin and carries no value of its own",
                target.name
            )));
        }
        target.write(value, time);
        self.revision += 1;
        Ok(())
    }

    fn sample_count(&self, op: OpId) -> usize {
        self.op(op).map_or(0, |o| o.samples.len())
    }

    fn add_op(
        &mut self,
        kind: OpKind,
        precision: Precision,
        name: &str,
        inverted_twin: bool,
    ) -> GimbalResult<OpId> {
        let id = OpId(self.next_id);
        self.next_id += 1;
        self.ops.push(MemoryOp {
            id,
            kind,
            precision,
            name: name.to_owned(),
            inverted_twin,
            default_value: None,
            samples: Vec::new(),
        });
        self.order.push(id);
        self.revision += 1;
        Ok(id)
    }

    fn set_op_order(&mut self, order: &[OpId], resets_stack: bool) -> GimbalResult<()> {
        for id in order {
            if self.op(*id).is_none() {
                return Err(GimbalError::stack(format!(
                    "order references unknown operation id {}",
                    id.0
                )));
            }
        }
        self.order = order.to_vec();
        self.resets_stack = resets_stack;
        self.revision += 1;
        Ok(())
    }

    fn resets_stack(&self) -> bool {
        self.resets_stack
    }

    fn local_matrix(&self, time: TimeCode) -> DMat4 {
        self.order
            .iter()
            .filter_map(|id| self.op(*id))
            .fold(DMat4::IDENTITY, |m, op| m * self.op_matrix(op, time))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/memory.rs"]
mod tests;
