use glam::{DMat4, DVec3};

use crate::foundation::core::RotateOrder;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Semantic kind of a stack operation.
///
/// Rotate kinds store their angles in degrees on the stack; the decomposed
/// state works in radians throughout.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum OpKind {
    /// 3-vector translation.
    Translate,
    /// 3-vector scale.
    Scale,
    /// Single-axis rotation about X.
    RotateX,
    /// Single-axis rotation about Y.
    RotateY,
    /// Single-axis rotation about Z.
    RotateZ,
    /// Three-axis rotation, X applied first.
    RotateXyz,
    /// Three-axis rotation, X applied first, then Z.
    RotateXzy,
    /// Three-axis rotation, Y applied first.
    RotateYxz,
    /// Three-axis rotation, Y applied first, then Z.
    RotateYzx,
    /// Three-axis rotation, Z applied first.
    RotateZxy,
    /// Three-axis rotation, Z applied first, then Y.
    RotateZyx,
    /// A whole 4x4 transform (also used for matrix-encoded shear).
    Transform,
}

impl OpKind {
    /// Return `true` for any rotation kind.
    pub fn is_rotate(self) -> bool {
        matches!(
            self,
            Self::RotateX
                | Self::RotateY
                | Self::RotateZ
                | Self::RotateXyz
                | Self::RotateXzy
                | Self::RotateYxz
                | Self::RotateYzx
                | Self::RotateZxy
                | Self::RotateZyx
        )
    }

    /// Rotation order implied by a three-axis rotate kind.
    ///
    /// Single-axis kinds report the natural `Xyz` order; non-rotate kinds
    /// report nothing.
    pub fn rotate_order(self) -> Option<RotateOrder> {
        match self {
            Self::RotateX | Self::RotateY | Self::RotateZ | Self::RotateXyz => {
                Some(RotateOrder::Xyz)
            }
            Self::RotateXzy => Some(RotateOrder::Xzy),
            Self::RotateYxz => Some(RotateOrder::Yxz),
            Self::RotateYzx => Some(RotateOrder::Yzx),
            Self::RotateZxy => Some(RotateOrder::Zxy),
            Self::RotateZyx => Some(RotateOrder::Zyx),
            _ => None,
        }
    }

    /// The three-axis rotate kind matching a rotation order.
    pub fn for_rotate_order(order: RotateOrder) -> OpKind {
        match order {
            RotateOrder::Xyz => Self::RotateXyz,
            RotateOrder::Xzy => Self::RotateXzy,
            RotateOrder::Yxz => Self::RotateYxz,
            RotateOrder::Yzx => Self::RotateYzx,
            RotateOrder::Zxy => Self::RotateZxy,
            RotateOrder::Zyx => Self::RotateZyx,
        }
    }
}

/// Numeric precision an operation's attribute was authored at.
///
/// Half values are stored widened to `f32`; the precision tag records the
/// author's intent so writes never silently retype an attribute.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Precision {
    /// 16-bit float storage.
    Half,
    /// 32-bit float storage.
    Float,
    /// 64-bit float storage.
    Double,
}

/// Stable identifier of one operation within its prim.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct OpId(pub u32);

/// Description of one live operation as enumerated from the scene prim.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpDesc {
    /// Stable operation id.
    pub id: OpId,
    /// Semantic kind.
    pub kind: OpKind,
    /// Authored numeric precision.
    pub precision: Precision,
    /// Authored role name (e.g. `translate`, `rotatePivot`).
    pub name: String,
    /// `true` when this operation is the paired inverse of another.
    pub inverted_twin: bool,
}

/// A typed operation value as stored in the scene description.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OpValue {
    /// Half-precision scalar (widened storage).
    Half(f32),
    /// Single-precision scalar.
    Float(f32),
    /// Double-precision scalar.
    Double(f64),
    /// Integer scalar.
    Int(i32),
    /// Half-precision 3-vector (widened storage).
    Vec3h([f32; 3]),
    /// Single-precision 3-vector.
    Vec3f([f32; 3]),
    /// Double-precision 3-vector.
    Vec3d([f64; 3]),
    /// Integer 3-vector.
    Vec3i([i32; 3]),
    /// Double-precision 4x4 matrix.
    Matrix4d(DMat4),
}

impl OpValue {
    /// Type-directed scalar read.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Half(v) | Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Type-directed 3-vector read.
    pub fn as_vector(&self) -> Option<DVec3> {
        match self {
            Self::Vec3h(v) | Self::Vec3f(v) => {
                Some(DVec3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
            }
            Self::Vec3d(v) => Some(DVec3::from_array(*v)),
            Self::Vec3i(v) => {
                Some(DVec3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
            }
            _ => None,
        }
    }

    /// Type-directed matrix read.
    pub fn as_matrix(&self) -> Option<DMat4> {
        match self {
            Self::Matrix4d(m) => Some(*m),
            _ => None,
        }
    }

    /// Shear triple (xy, xz, yz) of a matrix-encoded shear value.
    pub fn as_shear(&self) -> Option<DVec3> {
        let m = self.as_matrix()?;
        Some(DVec3::new(m.y_axis.x, m.z_axis.x, m.z_axis.y))
    }

    /// A 3-vector value at the given precision.
    pub fn vector(precision: Precision, v: DVec3) -> OpValue {
        match precision {
            Precision::Half => Self::Vec3h([v.x as f32, v.y as f32, v.z as f32]),
            Precision::Float => Self::Vec3f([v.x as f32, v.y as f32, v.z as f32]),
            Precision::Double => Self::Vec3d(v.to_array()),
        }
    }

    /// A scalar value at the given precision.
    pub fn scalar(precision: Precision, s: f64) -> OpValue {
        match precision {
            Precision::Half => Self::Half(s as f32),
            Precision::Float => Self::Float(s as f32),
            Precision::Double => Self::Double(s),
        }
    }

    /// A matrix value encoding a shear triple (xy, xz, yz).
    pub fn shear_matrix(sh: DVec3) -> OpValue {
        let mut m = DMat4::IDENTITY;
        m.y_axis.x = sh.x;
        m.z_axis.x = sh.y;
        m.z_axis.y = sh.z;
        Self::Matrix4d(m)
    }

    /// A 3-vector value stored with the same type as `self`.
    ///
    /// Keeps an authored attribute's type on the write path, including the
    /// integer case the precision tag cannot express.
    pub fn retype_vector(&self, v: DVec3) -> Option<OpValue> {
        match self {
            Self::Vec3h(_) => Some(Self::Vec3h([v.x as f32, v.y as f32, v.z as f32])),
            Self::Vec3f(_) => Some(Self::Vec3f([v.x as f32, v.y as f32, v.z as f32])),
            Self::Vec3d(_) => Some(Self::Vec3d(v.to_array())),
            Self::Vec3i(_) => Some(Self::Vec3i([
                v.x.round() as i32,
                v.y.round() as i32,
                v.z.round() as i32,
            ])),
            _ => None,
        }
    }

    /// A scalar value stored with the same type as `self`.
    pub fn retype_scalar(&self, s: f64) -> Option<OpValue> {
        match self {
            Self::Half(_) => Some(Self::Half(s as f32)),
            Self::Float(_) => Some(Self::Float(s as f32)),
            Self::Double(_) => Some(Self::Double(s)),
            Self::Int(_) => Some(Self::Int(s.round() as i32)),
            _ => None,
        }
    }
}

/// Decode a rotation operation value into Euler radians plus the implied
/// rotation order.
///
/// Single-axis kinds zero the other two axes and report the natural order.
/// Returns `None` when the stored type does not fit the kind.
pub fn rotation_from(kind: OpKind, value: &OpValue) -> Option<(DVec3, RotateOrder)> {
    let order = kind.rotate_order()?;
    let euler = match kind {
        OpKind::RotateX => DVec3::new(value.as_scalar()? * DEG_TO_RAD, 0.0, 0.0),
        OpKind::RotateY => DVec3::new(0.0, value.as_scalar()? * DEG_TO_RAD, 0.0),
        OpKind::RotateZ => DVec3::new(0.0, 0.0, value.as_scalar()? * DEG_TO_RAD),
        _ => value.as_vector()? * DEG_TO_RAD,
    };
    Some((euler, order))
}

/// Encode Euler radians into a rotation operation value, preserving the
/// stored type of `current` when one exists.
pub fn rotation_into(
    kind: OpKind,
    precision: Precision,
    current: Option<&OpValue>,
    euler: DVec3,
) -> Option<OpValue> {
    if !kind.is_rotate() {
        return None;
    }
    match kind {
        OpKind::RotateX | OpKind::RotateY | OpKind::RotateZ => {
            let angle = match kind {
                OpKind::RotateX => euler.x,
                OpKind::RotateY => euler.y,
                _ => euler.z,
            } * RAD_TO_DEG;
            match current {
                Some(v) => v.retype_scalar(angle),
                None => Some(OpValue::scalar(precision, angle)),
            }
        }
        _ => {
            let deg = euler * RAD_TO_DEG;
            match current {
                Some(v) => v.retype_vector(deg),
                None => Some(OpValue::vector(precision, deg)),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/op.rs"]
mod tests;
