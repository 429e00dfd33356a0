#![deny(missing_docs)]
//! # caldera — umbrella crate
//!
//! Provides a single import surface for the caldera deferred-value core:
//! re-exports the vocabulary layer and the Output algebra, plus a `prelude`
//! for the happy path.

#[cfg(feature = "core")]
pub use bedrock;
#[cfg(feature = "core")]
pub use caldera_output;

#[cfg(feature = "core")]
pub use caldera_output::interpolate;

/// Happy-path imports for writing deployment programs.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use bedrock::{DeployPhase, OutputError, ResourceId, ResourceSet, Value};

    #[cfg(feature = "core")]
    pub use caldera_output::{
        DeferredResolver, Input, InputList, InputMap, Output, all, all_entries, concat, deferred,
        json_parse, json_stringify, json_stringify_pretty, output, secret, unsecret,
    };

    #[cfg(feature = "core")]
    pub use caldera_output::phase::{current_phase, enter_phase, set_phase};
}
