//! # caldera-output — lazy deferred-value containers for deployment programs
//!
//! A deployment program computes values it does not have yet: an address the
//! cloud will assign, an id a provider will mint, a connection string built
//! from both. This crate models such values as [`Output`]s — lazy,
//! asynchronous containers that carry the eventual value together with the
//! metadata that must travel with it:
//!
//! | Dimension | Meaning |
//! |-----------|---------|
//! | knownness | will the value materialize in the current phase, or only after a real update? |
//! | secrecy | must the value be masked wherever it is rendered? |
//! | resources | which registered resources produced it, directly and transitively? |
//!
//! The point of the algebra is that user code never reasons about those
//! dimensions. [`output()`] lifts arbitrarily nested data — concrete values,
//! pending computations, other Outputs, sequences and records mixing all
//! three — into a single Output with correctly joined metadata.
//! [`Output::apply`] transforms the eventual value; [`all`], [`concat`],
//! [`interpolate!`], [`json_stringify`] and friends combine Outputs; and
//! [`deferred()`] breaks cyclic wiring between resources. Metadata flows
//! through every one of them by the same rules.
//!
//! ```
//! use bedrock::DeployPhase;
//! use caldera_output::{Output, phase};
//!
//! # async fn demo() -> Result<(), bedrock::OutputError> {
//! // A provider will fill this in during the update.
//! let address = Output::unknown();
//! let url = caldera_output::interpolate!("https://{}/healthz", address);
//!
//! let _preview = phase::enter_phase(DeployPhase::Preview);
//! assert_eq!(url.is_known().await?, false);
//! assert_eq!(url.value().await?, None);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod combinators;
pub mod deferred;
pub mod input;
pub mod lift;
pub mod output;
pub mod phase;

pub use bedrock::{DeployPhase, OutputError, ResourceId, ResourceSet, Value};
pub use combinators::{
    all, all_entries, concat, interpolate, is_secret, json_parse, json_stringify,
    json_stringify_pretty, secret, unsecret,
};
pub use deferred::{DeferredResolver, deferred};
pub use input::{Input, InputList, InputMap, PendingInput};
pub use lift::output;
pub use output::Output;
pub use phase::{PhaseGuard, current_phase, enter_phase, set_phase};
