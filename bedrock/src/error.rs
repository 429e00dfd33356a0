//! The failure surface of the propagation core.

use std::sync::Arc;
use thiserror::Error;

/// Every failure a deferred value can surface.
///
/// Errors are `Clone` because they are the rejected state of shared lazy
/// computations: every Output derived from a failed computation observes the
/// same error, on the same fields, however many consumers await it.
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum OutputError {
    /// A value refers back to one of its own ancestors. Aliasing (the same
    /// node appearing at several positions) is legal; a true back-reference
    /// is not.
    #[error("circular structure: a value refers back to one of its ancestors")]
    CircularStructure,

    /// A pending input failed to produce its value.
    #[error("pending input failed: {0}")]
    Pending(String),

    /// A user callback passed to an apply failed.
    #[error("callback failed: {0}")]
    Callback(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),

    /// An interpolation template did not match its expressions.
    #[error("template error: {0}")]
    Template(String),

    /// A deferred output was resolved a second time.
    #[error("deferred output resolved more than once")]
    DeferredAlreadyResolved,

    /// A deferred output's resolver was dropped before being called, so the
    /// output can never produce a value.
    #[error("deferred output dropped before being resolved")]
    DeferredDropped,

    /// Catch-all. Shared so that every derived field can observe the same
    /// underlying cause.
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl OutputError {
    /// Wrap an arbitrary error as the shared catch-all variant.
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        OutputError::Other(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_error_display_all_variants() {
        assert_eq!(
            OutputError::CircularStructure.to_string(),
            "circular structure: a value refers back to one of its ancestors"
        );
        assert_eq!(
            OutputError::Pending("provider timed out".into()).to_string(),
            "pending input failed: provider timed out"
        );
        assert_eq!(
            OutputError::Callback("bad port".into()).to_string(),
            "callback failed: bad port"
        );
        assert_eq!(
            OutputError::Json("expected string".into()).to_string(),
            "json error: expected string"
        );
        assert_eq!(
            OutputError::Template("2 placeholders, 1 expression".into()).to_string(),
            "template error: 2 placeholders, 1 expression"
        );
        assert_eq!(
            OutputError::DeferredAlreadyResolved.to_string(),
            "deferred output resolved more than once"
        );
        assert_eq!(
            OutputError::DeferredDropped.to_string(),
            "deferred output dropped before being resolved"
        );
    }

    #[test]
    fn other_preserves_the_cause_across_clones() {
        let err = OutputError::other(std::io::Error::other("socket closed"));
        let clone = err.clone();
        assert_eq!(err.to_string(), "socket closed");
        assert_eq!(clone.to_string(), "socket closed");
    }
}
