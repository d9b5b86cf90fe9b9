//! Gimbal keeps a decomposed, editable transform synchronized with an
//! ordered stack of named transform operations on a scene-description prim.
//!
//! The stack is the source of truth until a component is edited; after that
//! the decomposed representation leads and edits are reconciled back:
//!
//! - Bind a [`TransformBinding`] to a [`ScenePrim`]
//! - Read decomposed components, classified against the canonical stack
//!   templates (or recovered from a whole-matrix decomposition)
//! - Edit components; tweaks are tracked against the external baseline and
//!   pushed back in the author's own operation order, inserting missing
//!   operations only when a component leaves its default
#![forbid(unsafe_code)]

pub mod foundation;
pub mod scene;
pub mod stack;
pub mod xform;

pub use crate::foundation::core::{Component, ComponentSet, RotateOrder, TimeCode};
pub use crate::foundation::error::{GimbalError, GimbalResult};

pub use crate::scene::memory::{MemoryPrim, TimeSample};
pub use crate::scene::prim::{HostNode, ScenePrim};
pub use crate::stack::classify::{Classification, ClassifiedOp, classify};
pub use crate::stack::op::{OpDesc, OpId, OpKind, OpValue, Precision};
pub use crate::stack::template::{OpRole, StackTemplate, TemplateEntry, TemplateKind};
pub use crate::xform::binding::{Space, TransformBinding};
pub use crate::xform::decompose::{Srt, matrix_to_srt, srt_to_matrix};
pub use crate::xform::state::BindingConfig;
