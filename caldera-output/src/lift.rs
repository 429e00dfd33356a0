//! The lifting constructor: arbitrary nested inputs to a single Output.
//!
//! Lifting happens in two stages. A synchronous pass walks the non-pending
//! portion of the structure, rejecting back-references by node identity and
//! collecting the direct resource dependencies. The asynchronous stage then
//! resolves every pending sub-structure concurrently, re-checks identities on
//! the resolved graph, and joins the children's metadata: knownness is the
//! conjunction, secrecy the disjunction, dependency sets the union. All four
//! lazy fields of the produced Output project out of this one resolution, so
//! they always observe a consistent view.

use bedrock::{OutputError, ResourceSet, Value};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tracing::debug;

use crate::input::Input;
use crate::output::Output;

/// Lift an arbitrary input into an [`Output`].
///
/// An input that is already an Output is adopted with its fields preserved;
/// in particular `output(output(x))` observes exactly what `output(x)` does.
/// Scalars become known, non-secret, dependency-free Outputs (unless the
/// value contains the unknown sentinel). Composite nodes are walked
/// element-wise and their metadata joined.
///
/// A back-reference detectable without resolving any pending computation is
/// reported synchronously as [`OutputError::CircularStructure`]. A
/// back-reference that only appears once pending parts have resolved
/// surfaces the same error lazily, through the returned Output's fields.
/// Aliasing — the same node referenced from several positions — is accepted.
pub fn output(input: impl Into<Input>) -> Result<Output, OutputError> {
    checked(input.into())
}

/// [`output`] on an already-converted input.
pub(crate) fn checked(input: Input) -> Result<Output, OutputError> {
    let resources = scan(&input, &mut Vec::new())?;
    if let Input::Output(output) = input {
        return Ok(output);
    }
    let core = resolve(input, Vec::new()).shared();
    Ok(Output::from_resolution(resources, core))
}

/// Lift for combinator call sites: structural failures surface through the
/// rejected lazy fields instead of a `Result`, keeping combinators
/// composable.
pub(crate) fn lift(input: impl Into<Input>) -> Output {
    checked(input.into()).unwrap_or_else(Output::poisoned)
}

/// The consistent view a lifted Output's lazy fields project out of.
#[derive(Clone)]
pub(crate) struct Resolved {
    pub(crate) value: Value,
    pub(crate) known: bool,
    pub(crate) secret: bool,
    pub(crate) all_resources: ResourceSet,
}

/// The synchronous pass: reject cycles in the non-pending portion and
/// collect direct resource dependencies. `path` holds the identities of the
/// composite nodes between the root and the node under inspection, so a
/// node reached twice on one path is a back-reference while a node reached
/// on two sibling paths is mere aliasing.
fn scan(input: &Input, path: &mut Vec<usize>) -> Result<ResourceSet, OutputError> {
    match input {
        Input::Value(_) | Input::Pending(_) => Ok(ResourceSet::new()),
        Input::Output(output) => Ok(output.resources().clone()),
        Input::List(list) => {
            let id = list.addr();
            if path.contains(&id) {
                debug!("back-reference detected while lifting a list node");
                return Err(OutputError::CircularStructure);
            }
            path.push(id);
            let mut resources = ResourceSet::new();
            for item in list.snapshot() {
                resources.extend(scan(&item, path)?);
            }
            path.pop();
            Ok(resources)
        }
        Input::Map(map) => {
            let id = map.addr();
            if path.contains(&id) {
                debug!("back-reference detected while lifting a record node");
                return Err(OutputError::CircularStructure);
            }
            path.push(id);
            let mut resources = ResourceSet::new();
            for (_, item) in map.snapshot() {
                resources.extend(scan(&item, path)?);
            }
            path.pop();
            Ok(resources)
        }
    }
}

/// The asynchronous stage: resolve pending parts, re-check identities on the
/// resolved graph, and join child metadata. Children resolve concurrently;
/// each carries its own copy of the ancestor path.
pub(crate) fn resolve(
    input: Input,
    path: Vec<usize>,
) -> BoxFuture<'static, Result<Resolved, OutputError>> {
    async move {
        match input {
            Input::Value(value) => Ok(Resolved {
                known: !value.contains_unknown(),
                secret: false,
                all_resources: ResourceSet::new(),
                value,
            }),
            Input::Output(output) => {
                let value = output.value_fut().await?;
                let known = output.known_fut().await?;
                let secret = output.secret_fut().await?;
                let all_resources = (*output.all_fut().await?).clone();
                Ok(Resolved {
                    known: known && !value.contains_unknown(),
                    secret,
                    all_resources,
                    value,
                })
            }
            Input::Pending(pending) => {
                let inner = pending.resolve().await?;
                resolve(inner, path).await
            }
            Input::List(list) => {
                let id = list.addr();
                if path.contains(&id) {
                    debug!("back-reference detected after resolution in a list node");
                    return Err(OutputError::CircularStructure);
                }
                let mut child_path = path;
                child_path.push(id);
                let children = try_join_all(
                    list.snapshot()
                        .into_iter()
                        .map(|item| resolve(item, child_path.clone())),
                )
                .await?;
                Ok(join(children, Value::Array))
            }
            Input::Map(map) => {
                let id = map.addr();
                if path.contains(&id) {
                    debug!("back-reference detected after resolution in a record node");
                    return Err(OutputError::CircularStructure);
                }
                let mut child_path = path;
                child_path.push(id);
                let (keys, items): (Vec<_>, Vec<_>) = map.snapshot().into_iter().unzip();
                let children = try_join_all(
                    items
                        .into_iter()
                        .map(|item| resolve(item, child_path.clone())),
                )
                .await?;
                Ok(join(children, move |values| {
                    Value::Object(keys.into_iter().zip(values).collect())
                }))
            }
        }
    }
    .boxed()
}

/// The metadata join over a container's resolved children.
fn join(children: Vec<Resolved>, build: impl FnOnce(Vec<Value>) -> Value) -> Resolved {
    let mut known = true;
    let mut secret = false;
    let mut all_resources = ResourceSet::new();
    let mut values = Vec::with_capacity(children.len());
    for child in children {
        known &= child.known;
        secret |= child.secret;
        all_resources.extend(child.all_resources);
        values.push(child.value);
    }
    Resolved {
        value: build(values),
        known,
        secret,
        all_resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputList, InputMap};
    use bedrock::ResourceId;

    fn ids(names: &[&str]) -> ResourceSet {
        names.iter().map(|n| ResourceId::from(*n)).collect()
    }

    #[tokio::test]
    async fn scalars_lift_to_known_values() {
        let out = output("db-host").unwrap();
        assert_eq!(out.value().await.unwrap(), Some(Value::from("db-host")));
        assert_eq!(out.is_known().await.unwrap(), true);
        assert_eq!(out.is_secret().await.unwrap(), false);
        assert!(out.resources().is_empty());
    }

    #[tokio::test]
    async fn the_sentinel_lifts_to_an_unknown_output() {
        let out = output(Value::Unknown).unwrap();
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn lifting_an_output_preserves_its_fields() {
        let inner = Output::resolved("token", false, true, ids(&["vault"]));
        let out = output(&inner).unwrap();
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(out.resources(), &ids(&["vault"]));
        assert_eq!(*out.all_resources().await.unwrap(), ids(&["vault"]));
    }

    #[tokio::test]
    async fn containers_join_child_metadata() {
        let list = InputList::new();
        list.push(Output::resolved("a", true, true, ids(&["kms"])));
        list.push(Output::resolved("b", false, false, ids(&["db"])));
        list.push("c");

        let out = output(list).unwrap();
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(out.resources(), &ids(&["kms", "db"]));
        assert_eq!(*out.all_resources().await.unwrap(), ids(&["kms", "db"]));
    }

    #[tokio::test]
    async fn records_resolve_to_objects() {
        let map = InputMap::new();
        map.insert("host", Output::known("db.internal"));
        map.insert("port", 5432);

        let resolved = output(map).unwrap().value().await.unwrap().unwrap();
        assert_eq!(
            resolved,
            Value::Object(
                [
                    ("host".to_owned(), Value::from("db.internal")),
                    ("port".to_owned(), Value::from(5432)),
                ]
                .into_iter()
                .collect()
            )
        );
    }

    #[tokio::test]
    async fn pending_inputs_chain_through_the_suspension() {
        let input = Input::pending(async {
            Ok(Input::from(Output::resolved("late", true, true, ids(&["cert"]))))
        });
        let out = output(input).unwrap();
        // Direct dependencies are fixed at construction; a pending child can
        // only contribute transitively.
        assert!(out.resources().is_empty());
        assert_eq!(out.value().await.unwrap(), Some(Value::from("late")));
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(*out.all_resources().await.unwrap(), ids(&["cert"]));
    }

    #[tokio::test]
    async fn rejected_pending_inputs_reject_every_field() {
        let input = Input::pending(async { Err(OutputError::Pending("timed out".into())) });
        let out = output(input).unwrap();
        assert!(matches!(
            out.value().await.unwrap_err(),
            OutputError::Pending(_)
        ));
        assert!(matches!(
            out.is_secret().await.unwrap_err(),
            OutputError::Pending(_)
        ));
    }

    #[test]
    fn a_back_reference_fails_synchronously() {
        let map = InputMap::new();
        map.insert("self", map.clone());
        assert!(matches!(
            output(map),
            Err(OutputError::CircularStructure)
        ));

        let list = InputList::new();
        let middle = InputList::new();
        middle.push(list.clone());
        list.push(middle);
        assert!(matches!(
            output(list),
            Err(OutputError::CircularStructure)
        ));
    }

    #[tokio::test]
    async fn a_back_reference_behind_a_pending_fails_lazily() {
        let map = InputMap::new();
        let reentry = map.clone();
        map.insert(
            "self",
            Input::pending(async move { Ok(Input::from(reentry)) }),
        );

        // Nothing to reject synchronously…
        let out = output(map).unwrap();
        // …but resolution walks back into the ancestor.
        assert!(matches!(
            out.value().await.unwrap_err(),
            OutputError::CircularStructure
        ));
        assert!(matches!(
            out.is_known().await.unwrap_err(),
            OutputError::CircularStructure
        ));
    }

    #[tokio::test]
    async fn aliasing_is_not_a_cycle() {
        let shared = InputMap::new();
        shared.insert("v", 1);

        let list = InputList::new();
        list.push(shared.clone());
        list.push(shared);

        let resolved = output(list).unwrap().value().await.unwrap().unwrap();
        let entry = Value::Object([("v".to_owned(), Value::from(1))].into_iter().collect());
        assert_eq!(resolved, Value::Array(vec![entry.clone(), entry]));
    }

    #[tokio::test]
    async fn a_resolved_value_containing_the_sentinel_is_not_known() {
        let list = InputList::new();
        list.push(Value::Array(vec![Value::from(1), Value::Unknown]));
        let out = output(list).unwrap();
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.value().await.unwrap(), None);
    }
}
