//! Deferred outputs: an Output created before its source exists.
//!
//! Resource wiring is sometimes cyclic at the program level — a listener
//! needs the group's id, the group needs the listener's arn — even though
//! the values themselves are not. A deferred output breaks such knots: hand
//! out the Output now, bind it to its real source later. Every read
//! suspends until the source is bound, then chains to the source's
//! corresponding field.

use std::fmt;
use std::sync::Arc;

use bedrock::{OutputError, ResourceSet};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::output::{Output, field};

/// Create an Output bound to a source that does not exist yet, plus the
/// resolver that will bind it.
///
/// Until [`DeferredResolver::resolve`] is called, every field read
/// suspends. Once the source is bound, each field chains to the source's
/// corresponding field. The deferred Output carries no direct resource
/// dependencies of its own; the source's resources are captured
/// transitively.
///
/// Dropping the resolver without binding a source rejects every field with
/// [`OutputError::DeferredDropped`] — a vanished resolver is a wiring bug,
/// and suspending forever would hide it.
pub fn deferred() -> (Output, DeferredResolver) {
    let (tx, rx) = oneshot::channel::<Output>();
    let source = async move { rx.await.map_err(|_| OutputError::DeferredDropped) }
        .boxed()
        .shared();

    let value = {
        let source = source.clone();
        field(async move { source.await?.value_fut().await })
    };
    let known = {
        let source = source.clone();
        field(async move { source.await?.known_fut().await })
    };
    let secret = {
        let source = source.clone();
        field(async move { source.await?.secret_fut().await })
    };
    let all_resources = field(async move { source.await?.all_fut().await });

    let output = Output::from_fields(
        Arc::new(ResourceSet::new()),
        value,
        known,
        secret,
        all_resources,
    );
    (
        output,
        DeferredResolver {
            tx: Mutex::new(Some(tx)),
        },
    )
}

/// Binds a deferred Output to its source. One-shot.
pub struct DeferredResolver {
    tx: Mutex<Option<oneshot::Sender<Output>>>,
}

impl DeferredResolver {
    /// Bind the deferred Output to `source`.
    ///
    /// Errors with [`OutputError::DeferredAlreadyResolved`] on a second
    /// call. A source whose consumers have all gone away is bound without
    /// complaint — there is simply nobody left to observe it.
    pub fn resolve(&self, source: Output) -> Result<(), OutputError> {
        let tx = self
            .tx
            .lock()
            .take()
            .ok_or(OutputError::DeferredAlreadyResolved)?;
        let _ = tx.send(source);
        trace!("deferred output bound to its source");
        Ok(())
    }
}

impl fmt::Debug for DeferredResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.tx.lock().is_some() {
            "unresolved"
        } else {
            "resolved"
        };
        write!(f, "DeferredResolver({state})")
    }
}
