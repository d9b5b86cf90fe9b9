//! The reconciliation engine: decomposition, edit tracking, composition,
//! and stack mutation.

/// The transform binding and its edit/push/refresh machinery.
pub mod binding;
/// Numeric matrix factorization.
pub mod decompose;
/// Canonical-position operation insertion.
pub(crate) mod insert;
/// Configuration, derived state, and baseline/tweak pairs.
pub mod state;
