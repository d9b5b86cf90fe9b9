//! Operation-stack data model, canonical templates, and the classifier.

/// First-match-wins template classification.
pub mod classify;
/// Operation kinds, precisions, and typed values.
pub mod op;
/// Canonical stack templates and role ordering.
pub mod template;
