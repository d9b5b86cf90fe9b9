/// Convenience result type used across Gimbal.
pub type GimbalResult<T> = Result<T, GimbalError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Classification misses and locked-component writes are deliberately *not*
/// errors; they are ordinary outcomes of the reconciliation model.
#[derive(thiserror::Error, Debug)]
pub enum GimbalError {
    /// A mutation the bound stack cannot express (e.g. changing rotation
    /// order after binding).
    #[error("mutation error: {0}")]
    Mutation(String),

    /// A scene-description write or reorder was rejected by the collaborator.
    #[error("stack error: {0}")]
    Stack(String),

    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GimbalError {
    /// Build a [`GimbalError::Mutation`] value.
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::Mutation(msg.into())
    }

    /// Build a [`GimbalError::Stack`] value.
    pub fn stack(msg: impl Into<String>) -> Self {
        Self::Stack(msg.into())
    }

    /// Build a [`GimbalError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
