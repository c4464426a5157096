//! Faults raised inside the semantic core.
//!
//! Unresolved names and unknown types are not errors: they are ordinary
//! results (`Vec::new()` and [`TypeRef::Unknown`](crate::ty::TypeRef)).
//! A [`Fault`] is for conditions that stop the current computation. Only
//! cancellation crosses the public boundary; everything else is logged and
//! turned into an unknown result by the dispatcher that catches it.

use thiserror::Error;

use crate::model::NodePtr;

/// Internal failure of a recursive step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// The cancellation token was triggered.
    #[error("analysis cancelled")]
    Cancelled,
    /// The recursion limit of the session was hit.
    #[error("recursion depth limit of {0} exceeded")]
    DepthExceeded(usize),
    /// A node pointer no longer matches the file it points into.
    #[error("node {0:?} not found in its file")]
    DanglingNode(NodePtr),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Fault {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Fault::Cancelled)
    }
}

/// The one error the public API returns: the caller cancelled the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis cancelled")]
pub struct Cancelled;

impl From<Cancelled> for Fault {
    fn from(_: Cancelled) -> Self {
        Fault::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_messages() {
        assert_eq!(Fault::Cancelled.to_string(), "analysis cancelled");
        assert_eq!(
            Fault::DepthExceeded(16).to_string(),
            "recursion depth limit of 16 exceeded"
        );
        assert_eq!(
            Fault::Internal("bad member id".into()).to_string(),
            "internal error: bad member id"
        );
    }

    #[test]
    fn only_cancellation_is_cancelled() {
        assert!(Fault::from(Cancelled).is_cancelled());
        assert!(!Fault::DepthExceeded(1).is_cancelled());
    }
}
