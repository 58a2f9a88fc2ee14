// ============================================================================
// propcell - Binding Errors
// Sticky error state attached to bindings, never to cells
// ============================================================================

use thiserror::Error;

/// Classification of a binding failure.
///
/// The "no error" state is represented by `Option::None` wherever an error
/// may be absent; there is no dedicated variant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingErrorKind {
    /// The binding's dependency graph reached back into the binding itself
    /// while it was evaluating.
    #[error("binding loop")]
    BindingLoop,

    /// The user evaluator reported a failure.
    #[error("evaluation error")]
    EvaluationError,

    /// Anything the engine cannot classify further.
    #[error("unknown error")]
    Unknown,
}

/// An error recorded on a binding.
///
/// Errors are sticky: once recorded they persist until the next successful
/// evaluation. A cell's value is always defined regardless; dependents of a
/// failed binding observe its last good value and may inspect the binding to
/// discover the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct BindingError {
    kind: BindingErrorKind,
    description: String,
}

impl BindingError {
    /// Create an error with an explicit kind and description.
    pub fn new(kind: BindingErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// The binding re-entered its own evaluation.
    pub fn binding_loop() -> Self {
        Self::new(BindingErrorKind::BindingLoop, "binding loop detected")
    }

    /// The user evaluator signalled failure.
    pub fn evaluation(description: impl Into<String>) -> Self {
        Self::new(BindingErrorKind::EvaluationError, description)
    }

    /// Unclassified failure.
    pub fn unknown(description: impl Into<String>) -> Self {
        Self::new(BindingErrorKind::Unknown, description)
    }

    pub fn kind(&self) -> BindingErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

// =============================================================================
// TESTS
// =============================================================================
