//! Error taxonomy for the tent-pitching core.
//!
//! Three fatal classes surface out of `propagate_tent`:
//! - [`TentError::InvariantViolation`] — internal state that must never occur
//!   (a cyclic dependency table, a tent touching no elements, ...)
//! - [`TentError::UnsupportedOperation`] — a capability the active equation
//!   does not provide (transparent boundary on a non-wave equation, SIMD
//!   volume flux for an x-dependent equation, more than one entropy variable)
//! - [`TentError::ConfigurationError`] — caller-fixable setup problems, most
//!   prominently a boundary code with no registered handler
//!
//! Numerical warnings (missing entropy overloads) are *not* errors: they are
//! emitted through `tracing::warn!` and the pipeline proceeds with a zero
//! residual.

use thiserror::Error;

/// Error type for tent propagation and its kernels.
#[derive(Debug, Error)]
pub enum TentError {
    /// Internal invariant broken. Carries enough context to locate the tent.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The active equation does not provide a required capability.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Caller-fixable configuration problem.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl TentError {
    /// Missing boundary-condition handler. The code is reported 1-based to
    /// match the numbering users see in mesh generators.
    pub fn no_bc_handler(bc: i32) -> Self {
        TentError::ConfigurationError(format!(
            "no implementation for your chosen boundary condition number {}",
            bc + 1
        ))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TentError>;
