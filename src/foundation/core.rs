use glam::{DQuat, DVec3, EulerRot};

/// Point on the scene timeline at which operation values are authored or
/// sampled.
///
/// `Default` addresses the unvarying value outside any animation; it is the
/// reference time used for initial decomposition and for every read or write
/// while animated-value reads are disabled.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TimeCode {
    /// The unvarying default value.
    Default,
    /// A specific sample time.
    At(f64),
}

impl TimeCode {
    /// Return `true` for the default (non-animated) time.
    pub fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

/// Euler rotation order of a decomposed rotation, named by the axis applied
/// first.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum RotateOrder {
    /// Rotate about X, then Y, then Z.
    #[default]
    Xyz,
    /// Rotate about X, then Z, then Y.
    Xzy,
    /// Rotate about Y, then X, then Z.
    Yxz,
    /// Rotate about Y, then Z, then X.
    Yzx,
    /// Rotate about Z, then X, then Y.
    Zxy,
    /// Rotate about Z, then Y, then X.
    Zyx,
}

impl RotateOrder {
    /// Quaternion for Euler angles given in radians as an (x, y, z) triple.
    ///
    /// The rotations are applied about the fixed frame axes in this order's
    /// sequence, which matches how per-axis stack operations compose.
    pub fn quat_from_euler(self, e: DVec3) -> DQuat {
        match self {
            Self::Xyz => DQuat::from_euler(EulerRot::XYZEx, e.x, e.y, e.z),
            Self::Xzy => DQuat::from_euler(EulerRot::XZYEx, e.x, e.z, e.y),
            Self::Yxz => DQuat::from_euler(EulerRot::YXZEx, e.y, e.x, e.z),
            Self::Yzx => DQuat::from_euler(EulerRot::YZXEx, e.y, e.z, e.x),
            Self::Zxy => DQuat::from_euler(EulerRot::ZXYEx, e.z, e.x, e.y),
            Self::Zyx => DQuat::from_euler(EulerRot::ZYXEx, e.z, e.y, e.x),
        }
    }

    /// Euler angles in radians, as an (x, y, z) triple, for a quaternion.
    pub fn euler_from_quat(self, q: DQuat) -> DVec3 {
        match self {
            Self::Xyz => {
                let (x, y, z) = q.to_euler(EulerRot::XYZEx);
                DVec3::new(x, y, z)
            }
            Self::Xzy => {
                let (x, z, y) = q.to_euler(EulerRot::XZYEx);
                DVec3::new(x, y, z)
            }
            Self::Yxz => {
                let (y, x, z) = q.to_euler(EulerRot::YXZEx);
                DVec3::new(x, y, z)
            }
            Self::Yzx => {
                let (y, z, x) = q.to_euler(EulerRot::YZXEx);
                DVec3::new(x, y, z)
            }
            Self::Zxy => {
                let (z, x, y) = q.to_euler(EulerRot::ZXYEx);
                DVec3::new(x, y, z)
            }
            Self::Zyx => {
                let (z, y, x) = q.to_euler(EulerRot::ZYXEx);
                DVec3::new(x, y, z)
            }
        }
    }
}

/// One semantic slot of the decomposed transform.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Component {
    /// Translation.
    Translate,
    /// The generic interchange pivot (synchronized rotate/scale pivot alias).
    Pivot,
    /// Translation offset applied around the rotate pivot.
    RotatePivotTranslate,
    /// Rotate pivot point.
    RotatePivot,
    /// Rotation.
    Rotate,
    /// Rotate-axis orientation.
    RotateAxis,
    /// Translation offset applied around the scale pivot.
    ScalePivotTranslate,
    /// Scale pivot point.
    ScalePivot,
    /// Shear.
    Shear,
    /// Scale.
    Scale,
    /// The whole-matrix representation.
    Matrix,
}

impl Component {
    const ALL: [Component; 11] = [
        Component::Translate,
        Component::Pivot,
        Component::RotatePivotTranslate,
        Component::RotatePivot,
        Component::Rotate,
        Component::RotateAxis,
        Component::ScalePivotTranslate,
        Component::ScalePivot,
        Component::Shear,
        Component::Scale,
        Component::Matrix,
    ];

    fn bit(self) -> u16 {
        1 << (Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as u16)
    }
}

/// Set of [`Component`] values, used for the derived presence and animation
/// state of a binding.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct ComponentSet(u16);

impl ComponentSet {
    /// The empty set.
    pub const EMPTY: ComponentSet = ComponentSet(0);

    /// Add a component to the set.
    pub fn insert(&mut self, c: Component) {
        self.0 |= c.bit();
    }

    /// Remove a component from the set.
    pub fn remove(&mut self, c: Component) {
        self.0 &= !c.bit();
    }

    /// Return `true` when the component is in the set.
    pub fn contains(self, c: Component) -> bool {
        self.0 & c.bit() != 0
    }

    /// Return `true` when no component is in the set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the components in the set.
    pub fn iter(self) -> impl Iterator<Item = Component> {
        Component::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
