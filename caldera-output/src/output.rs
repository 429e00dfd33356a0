//! The lazy deferred-value container.
//!
//! An [`Output`] carries an eventual [`Value`] plus three pieces of metadata
//! that travel with it: whether the value is *known* in the current
//! deployment phase, whether it is *secret*, and which *resources* produced
//! it (directly, and transitively). Every field except the direct resource
//! set is lazy — a shared computation that runs once, on first await, and
//! whose outcome every clone observes.
//!
//! ## Knownness and the physical value
//!
//! During a preview many values are not determined yet. An Output whose
//! knownness resolves false may still hold a *physical* value internally
//! (the machinery uses it for dependency tracking), but [`Output::value`]
//! coerces it to `None`: an unknown value is never observable.
//!
//! ## Secrecy
//!
//! Secrecy is a metadata flag, independent of knownness. It survives every
//! transformation — see [`Output::apply`] for the exact propagation rules —
//! and is only ever stripped by [`crate::combinators::unsecret`].
//!
//! ## No string conversion
//!
//! `Output` intentionally implements neither `Display` nor any string
//! conversion, so embedding one into a user-facing string is a compile
//! error rather than a placeholder leaking into output. Transform the value
//! with [`Output::apply`] or build strings with [`crate::interpolate!`].
//! The `Debug` form prints metadata only: the value may be secret.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bedrock::{OutputError, ResourceSet, Value};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::input::Input;
use crate::lift;
use crate::phase;

/// A lazy field: one shared computation, resolved exactly once.
pub(crate) type FieldFuture<T> = Shared<BoxFuture<'static, Result<T, OutputError>>>;

/// Box and share a field computation.
pub(crate) fn field<T, F>(fut: F) -> FieldFuture<T>
where
    T: Clone,
    F: Future<Output = Result<T, OutputError>> + Send + 'static,
{
    fut.boxed().shared()
}

/// A field that is already resolved.
pub(crate) fn ready_field<T>(outcome: Result<T, OutputError>) -> FieldFuture<T>
where
    T: Clone + Send + 'static,
{
    futures::future::ready(outcome).boxed().shared()
}

/// A lazy, asynchronous container for a value still being computed by a
/// resource provider, plus the metadata that travels with it.
///
/// Outputs are immutable: every transformation produces a new Output, and
/// clones are handles on the same underlying computations.
#[derive(Clone)]
pub struct Output {
    /// Direct resource dependencies, fixed at construction.
    resources: Arc<ResourceSet>,
    /// The physical value. May contain the unknown sentinel; public reads
    /// go through knownness first.
    value: FieldFuture<Value>,
    known: FieldFuture<bool>,
    secret: FieldFuture<bool>,
    /// Transitively reachable resources; a superset of `resources`.
    all_resources: FieldFuture<Arc<ResourceSet>>,
}

impl Output {
    /// The raw five-field constructor, used by resource registration.
    ///
    /// The lifting constructor [`crate::output()`] enforces the
    /// unknown-sentinel invariant by walking resolved values; this
    /// constructor trusts its caller the way the registration machinery is
    /// trusted: if `value` can resolve to something containing the unknown
    /// sentinel, `is_known` must resolve false.
    pub fn new(
        resources: ResourceSet,
        value: impl Future<Output = Result<Value, OutputError>> + Send + 'static,
        is_known: impl Future<Output = Result<bool, OutputError>> + Send + 'static,
        is_secret: impl Future<Output = Result<bool, OutputError>> + Send + 'static,
        all_resources: impl Future<Output = Result<ResourceSet, OutputError>> + Send + 'static,
    ) -> Output {
        Output {
            resources: Arc::new(resources),
            value: field(value),
            known: field(is_known),
            secret: field(is_secret),
            all_resources: field(async move { all_resources.await.map(Arc::new) }),
        }
    }

    /// An Output whose fields are all materialized up front.
    ///
    /// The transitive resource set defaults to the direct set. A value that
    /// contains the unknown sentinel forces knownness to false regardless of
    /// the flag passed in.
    pub fn resolved(
        value: impl Into<Value>,
        is_known: bool,
        is_secret: bool,
        resources: ResourceSet,
    ) -> Output {
        let value = value.into();
        let known = is_known && !value.contains_unknown();
        let resources = Arc::new(resources);
        Output {
            resources: Arc::clone(&resources),
            value: ready_field(Ok(value)),
            known: ready_field(Ok(known)),
            secret: ready_field(Ok(is_secret)),
            all_resources: ready_field(Ok(resources)),
        }
    }

    /// A known, non-secret, dependency-free Output of a plain value.
    pub fn known(value: impl Into<Value>) -> Output {
        Output::resolved(value, true, false, ResourceSet::new())
    }

    /// The canonical not-yet-known Output.
    pub fn unknown() -> Output {
        Output::resolved(Value::Unknown, false, false, ResourceSet::new())
    }

    /// An Output with every lazy field rejected.
    pub(crate) fn poisoned(err: OutputError) -> Output {
        Output {
            resources: Arc::new(ResourceSet::new()),
            value: ready_field(Err(err.clone())),
            known: ready_field(Err(err.clone())),
            secret: ready_field(Err(err.clone())),
            all_resources: ready_field(Err(err)),
        }
    }

    /// Build an Output whose four lazy fields project out of one shared
    /// resolution, so they all observe a consistent view.
    pub(crate) fn from_resolution(
        resources: ResourceSet,
        core: Shared<BoxFuture<'static, Result<lift::Resolved, OutputError>>>,
    ) -> Output {
        let value = {
            let core = core.clone();
            field(async move { Ok(core.await?.value) })
        };
        let known = {
            let core = core.clone();
            field(async move { Ok(core.await?.known) })
        };
        let secret = {
            let core = core.clone();
            field(async move { Ok(core.await?.secret) })
        };
        let all_resources = field(async move { Ok(Arc::new(core.await?.all_resources)) });
        Output {
            resources: Arc::new(resources),
            value,
            known,
            secret,
            all_resources,
        }
    }

    /// Assemble from already-shared fields.
    pub(crate) fn from_fields(
        resources: Arc<ResourceSet>,
        value: FieldFuture<Value>,
        known: FieldFuture<bool>,
        secret: FieldFuture<bool>,
        all_resources: FieldFuture<Arc<ResourceSet>>,
    ) -> Output {
        Output {
            resources,
            value,
            known,
            secret,
            all_resources,
        }
    }

    /// The same Output with secrecy forced to the given flag.
    pub(crate) fn with_secrecy(&self, is_secret: bool) -> Output {
        Output {
            resources: Arc::clone(&self.resources),
            value: self.value.clone(),
            known: self.known.clone(),
            secret: ready_field(Ok(is_secret)),
            all_resources: self.all_resources.clone(),
        }
    }

    /// The observable value: `Ok(None)` while the value is not known in the
    /// current phase, the resolved value otherwise.
    pub async fn value(&self) -> Result<Option<Value>, OutputError> {
        if !self.known.clone().await? {
            return Ok(None);
        }
        self.value.clone().await.map(Some)
    }

    /// Whether the value will be materialized in the current phase.
    pub async fn is_known(&self) -> Result<bool, OutputError> {
        self.known.clone().await
    }

    /// Whether the value must be masked in rendered output and logs.
    pub async fn is_secret(&self) -> Result<bool, OutputError> {
        self.secret.clone().await
    }

    /// The direct resource dependencies, as fixed at construction.
    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Every transitively reachable resource dependency.
    pub async fn all_resources(&self) -> Result<Arc<ResourceSet>, OutputError> {
        self.all_resources.clone().await
    }

    pub(crate) fn value_fut(&self) -> FieldFuture<Value> {
        self.value.clone()
    }

    pub(crate) fn known_fut(&self) -> FieldFuture<bool> {
        self.known.clone()
    }

    pub(crate) fn secret_fut(&self) -> FieldFuture<bool> {
        self.secret.clone()
    }

    pub(crate) fn all_fut(&self) -> FieldFuture<Arc<ResourceSet>> {
        self.all_resources.clone()
    }

    /// Transform the eventual value with `f`, producing a new Output.
    ///
    /// The returned Output obeys the propagation rules:
    ///
    /// - **value** — if the source is unknown during a preview, `f` is not
    ///   invoked and the result is unknown. If the source is unknown during
    ///   an update, `f` *is* invoked (its side effects belong to the real
    ///   run) but the result stays unknown. Otherwise `f` runs and whatever
    ///   it returns is lifted; the result adopts the lifted value.
    /// - **knownness** — the result is known only when both the source and
    ///   the value `f` produced are known.
    /// - **secrecy** — a secret source makes the result secret. A known,
    ///   non-secret source lets the inner value's secrecy propagate outward.
    ///   An unknown, non-secret source makes the result non-secret: secrecy
    ///   only propagates through values that actually flow.
    /// - **resources** — the direct set is the source's; the transitive set
    ///   is the union of the source's and the inner value's.
    ///
    /// The deployment phase is captured when `apply` is called and fixed for
    /// this transformation's lifetime.
    pub fn apply<F>(&self, f: F) -> Output
    where
        F: FnOnce(Value) -> Input + Send + 'static,
    {
        self.try_apply(move |v| Ok(f(v)))
    }

    /// [`Output::apply`] for fallible callbacks.
    ///
    /// A callback failure rejects the result's value and knownness; secrecy
    /// and the transitive resource set still resolve, from the source.
    pub fn try_apply<F>(&self, f: F) -> Output
    where
        F: FnOnce(Value) -> Result<Input, OutputError> + Send + 'static,
    {
        let preview = phase::current_phase().is_preview();
        let resources = Arc::clone(&self.resources);
        let src_value = self.value.clone();
        let src_known = self.known.clone();
        let src_secret = self.secret.clone();
        let src_all = self.all_resources.clone();

        let core = async move {
            let known_src = match src_known.await {
                Ok(known) => known,
                Err(e) => return ApplyOutcome::rejected(e),
            };
            let secret_src = src_secret.await;
            let all_src = src_all.await;

            if !known_src && preview {
                // The callback is skipped; the result is unknown solely
                // because the source is.
                return ApplyOutcome {
                    value: Ok(Value::Unknown),
                    known: Ok(false),
                    secret: secret_src,
                    all_resources: all_src,
                };
            }

            let value_src = match src_value.await {
                Ok(v) => v,
                Err(e) => return ApplyOutcome::rejected(e),
            };

            let inner = f(value_src).and_then(lift::checked);
            let inner = match inner {
                Ok(inner) => inner,
                Err(e) => return ApplyOutcome::callback_failed(e, secret_src, all_src),
            };

            let inner_value = inner.value_fut().await;
            let inner_known = inner.known_fut().await;
            let inner_secret = inner.secret_fut().await;
            let inner_all = inner.all_fut().await;

            let known = inner_known.map(|k| known_src && k);
            let secret = match secret_src {
                Ok(true) => Ok(true),
                Ok(false) if known_src => inner_secret,
                Ok(false) => Ok(false),
                Err(e) => Err(e),
            };
            let all_resources = match (all_src, inner_all) {
                (Ok(src), Ok(inner)) => {
                    let mut union = (*src).clone();
                    union.extend(inner.iter().cloned());
                    Ok(Arc::new(union))
                }
                (Err(e), _) | (_, Err(e)) => Err(e),
            };

            ApplyOutcome {
                value: inner_value,
                known,
                secret,
                all_resources,
            }
        }
        .boxed()
        .shared();

        let value = {
            let core = core.clone();
            field(async move { core.await.value })
        };
        let known = {
            let core = core.clone();
            field(async move { core.await.known })
        };
        let secret = {
            let core = core.clone();
            field(async move { core.await.secret })
        };
        let all_resources = field(async move { core.await.all_resources });

        Output {
            resources,
            value,
            known,
            secret,
            all_resources,
        }
    }

    /// The Output of a named sub-value of this Output's eventual record.
    ///
    /// No `apply` needed at the call site: `vpc.get("id")` is
    /// `vpc.apply(|v| v["id"])` with the metadata rules that implies. A
    /// missing key, like any lookup on a non-record value, yields null; a
    /// sub-value that is not yet known yields an unknown Output. The result
    /// is itself accessor-enabled, so chains like `cfg.get("db").get("host")`
    /// traverse nested records.
    pub fn get(&self, key: impl Into<String>) -> Output {
        let key = key.into();
        self.apply(move |v| v.get(&key).cloned().unwrap_or(Value::Null).into())
    }

    /// The Output of an element of this Output's eventual sequence.
    ///
    /// The sequence analogue of [`Output::get`], with the same semantics for
    /// out-of-range indexes and non-sequence values.
    pub fn at(&self, index: usize) -> Output {
        self.apply(move |v| v.at(index).cloned().unwrap_or(Value::Null).into())
    }
}

/// Prints metadata only. The value is never shown: it may be secret, and it
/// is usually not resolved yet.
impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("resources", &self.resources)
            .field("value", &"<deferred>")
            .finish_non_exhaustive()
    }
}

/// The consistent view an apply's four lazy fields project out of.
#[derive(Clone)]
struct ApplyOutcome {
    value: Result<Value, OutputError>,
    known: Result<bool, OutputError>,
    secret: Result<bool, OutputError>,
    all_resources: Result<Arc<ResourceSet>, OutputError>,
}

impl ApplyOutcome {
    /// A source-side failure rejects every field.
    fn rejected(err: OutputError) -> ApplyOutcome {
        ApplyOutcome {
            value: Err(err.clone()),
            known: Err(err.clone()),
            secret: Err(err.clone()),
            all_resources: Err(err),
        }
    }

    /// A callback failure rejects value and knownness; the metadata the
    /// source already carries stays observable.
    fn callback_failed(
        err: OutputError,
        secret: Result<bool, OutputError>,
        all_resources: Result<Arc<ResourceSet>, OutputError>,
    ) -> ApplyOutcome {
        ApplyOutcome {
            value: Err(err.clone()),
            known: Err(err),
            secret,
            all_resources,
        }
    }
}
