//! Opaque resource identities and the dependency sets they live in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque identity of a registered resource.
///
/// Just a string underneath — typically a URN minted by the resource
/// registration machinery, but the propagation core never inspects it. It
/// only stores identities in dependency sets and unions those sets, so any
/// stable string works.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Create a new identity from anything that converts to String.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A set of resource identities.
///
/// Ordered so that dependency sets render deterministically in diagnostics
/// and test assertions.
pub type ResourceSet = BTreeSet<ResourceId>;
