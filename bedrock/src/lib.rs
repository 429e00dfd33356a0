//! # bedrock — vocabulary types for the caldera deferred-value core
//!
//! This crate defines the data types that cross every boundary of the
//! deferred-value propagation system. It contains no runtime behavior:
//! the lazy `Output` container, the lifting machinery, and the combinators
//! all live in `caldera-output`. Bedrock defines the vocabulary; higher
//! layers define the behavior.
//!
//! | Type | What it is |
//! |------|------------|
//! | [`Value`] | The resolved-value domain, including the [`Value::Unknown`] sentinel |
//! | [`ResourceId`] | Opaque identity of a registered resource |
//! | [`DeployPhase`] | Which execution phase a deployment is in |
//! | [`OutputError`] | Every failure the propagation core can surface |
//!
//! ## Dependency Notes
//!
//! Numbers are represented as `serde_json::Number`. JSON is the interchange
//! format between the language host and the provider engine, and keeping the
//! numeric domain identical to serde_json's avoids a lossy conversion at the
//! boundary. [`Value`] itself does not derive `Serialize`: the
//! [`Value::Unknown`] sentinel has no JSON form, so conversion is the partial
//! [`Value::to_json`] instead.

#![deny(missing_docs)]

pub mod error;
pub mod phase;
pub mod resource;
pub mod value;

// Re-exports for convenience
pub use error::OutputError;
pub use phase::DeployPhase;
pub use resource::{ResourceId, ResourceSet};
pub use value::Value;
