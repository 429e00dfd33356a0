//! The lifted-input union: everything [`crate::output()`] accepts.
//!
//! An [`Input`] is the recursive union of concrete values, pending
//! computations, already-lifted [`Output`]s, and composite nodes. The
//! composite nodes ([`InputList`], [`InputMap`]) are shared handles with
//! interior mutability so that deployment programs can build structures
//! incrementally and reference the same node from several positions. Sharing
//! is legal; a node that refers back to one of its own ancestors is not, and
//! the lifting constructor rejects it.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bedrock::{OutputError, Value};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::RwLock;

use crate::output::Output;

/// An arbitrary input to the lifting constructor.
///
/// Built through `From` conversions in the common case:
///
/// ```
/// use caldera_output::Input;
///
/// let scalar: Input = "web-1".into();
/// let list: Input = vec![Input::from(80), Input::from(443)].into();
/// ```
#[non_exhaustive]
#[derive(Clone)]
pub enum Input {
    /// A concrete value (which may itself contain the unknown sentinel).
    Value(Value),
    /// An already-lifted output, adopted with its fields preserved.
    Output(Output),
    /// A computation that will eventually yield another input.
    Pending(PendingInput),
    /// A shared sequence node.
    List(InputList),
    /// A shared record node.
    Map(InputMap),
}

impl Input {
    /// Wrap a computation that eventually yields an input.
    ///
    /// The future is shared: however many outputs end up depending on it, it
    /// runs once and every dependent observes the same outcome.
    pub fn pending<F>(fut: F) -> Input
    where
        F: Future<Output = Result<Input, OutputError>> + Send + 'static,
    {
        Input::Pending(PendingInput {
            fut: fut.boxed().shared(),
        })
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Input::Output(o) => fmt::Debug::fmt(o, f),
            Input::Pending(p) => fmt::Debug::fmt(p, f),
            Input::List(l) => fmt::Debug::fmt(l, f),
            Input::Map(m) => fmt::Debug::fmt(m, f),
        }
    }
}

/// A shared handle on a computation that eventually yields an [`Input`].
#[derive(Clone)]
pub struct PendingInput {
    fut: Shared<BoxFuture<'static, Result<Input, OutputError>>>,
}

impl PendingInput {
    /// Await the eventual input. Clones of the handle share one execution.
    pub(crate) async fn resolve(&self) -> Result<Input, OutputError> {
        self.fut.clone().await
    }
}

impl fmt::Debug for PendingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingInput(<pending>)")
    }
}

/// A shared, growable sequence of inputs.
///
/// Clones are handles on the same node: pushing through one clone is visible
/// through every other, and the node keeps one identity however many
/// positions reference it. This is what makes aliased structures — and,
/// illegally, cyclic ones — expressible at all.
#[derive(Clone, Default)]
pub struct InputList {
    items: Arc<RwLock<Vec<Input>>>,
}

impl InputList {
    /// Create an empty list node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element.
    pub fn push(&self, item: impl Into<Input>) {
        self.items.write().push(item.into());
    }

    /// Number of elements currently in the node.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// True if the node holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Snapshot the current elements.
    pub(crate) fn snapshot(&self) -> Vec<Input> {
        self.items.read().clone()
    }

    /// The node's identity, used by cycle detection.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.items) as usize
    }
}

// Deliberately shallow: a recursive Debug would not terminate on the cyclic
// structures this type can express.
impl fmt::Debug for InputList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputList(<{} items>)", self.len())
    }
}

impl FromIterator<Input> for InputList {
    fn from_iter<T: IntoIterator<Item = Input>>(iter: T) -> Self {
        Self {
            items: Arc::new(RwLock::new(iter.into_iter().collect())),
        }
    }
}

/// A shared, growable record of inputs.
///
/// The record analogue of [`InputList`], with the same identity semantics.
#[derive(Clone, Default)]
pub struct InputMap {
    entries: Arc<RwLock<BTreeMap<String, Input>>>,
}

impl InputMap {
    /// Create an empty record node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous value under the key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Input>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Number of entries currently in the node.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the node holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot the current entries.
    pub(crate) fn snapshot(&self) -> Vec<(String, Input)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The node's identity, used by cycle detection.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.entries) as usize
    }
}

impl fmt::Debug for InputMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputMap(<{} entries>)", self.len())
    }
}

impl FromIterator<(String, Input)> for InputMap {
    fn from_iter<T: IntoIterator<Item = (String, Input)>>(iter: T) -> Self {
        Self {
            entries: Arc::new(RwLock::new(iter.into_iter().collect())),
        }
    }
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Value(v)
    }
}

impl From<Output> for Input {
    fn from(o: Output) -> Self {
        Input::Output(o)
    }
}

impl From<&Output> for Input {
    fn from(o: &Output) -> Self {
        Input::Output(o.clone())
    }
}

impl From<InputList> for Input {
    fn from(l: InputList) -> Self {
        Input::List(l)
    }
}

impl From<InputMap> for Input {
    fn from(m: InputMap) -> Self {
        Input::Map(m)
    }
}

impl From<Vec<Input>> for Input {
    fn from(items: Vec<Input>) -> Self {
        Input::List(items.into_iter().collect())
    }
}

impl From<BTreeMap<String, Input>> for Input {
    fn from(entries: BTreeMap<String, Input>) -> Self {
        Input::Map(entries.into_iter().collect())
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Value(b.into())
    }
}

impl From<i32> for Input {
    fn from(n: i32) -> Self {
        Input::Value(n.into())
    }
}

impl From<i64> for Input {
    fn from(n: i64) -> Self {
        Input::Value(n.into())
    }
}

impl From<u32> for Input {
    fn from(n: u32) -> Self {
        Input::Value(n.into())
    }
}

impl From<u64> for Input {
    fn from(n: u64) -> Self {
        Input::Value(n.into())
    }
}

impl From<f64> for Input {
    fn from(n: f64) -> Self {
        Input::Value(n.into())
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Value(s.into())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Value(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_clones_share_one_node() {
        let list = InputList::new();
        let alias = list.clone();
        list.push(1);
        alias.push(2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.addr(), alias.addr());
    }

    #[test]
    fn separate_nodes_have_separate_identities() {
        let a = InputList::new();
        let b = InputList::new();
        assert_ne!(a.addr(), b.addr());
    }

    #[test]
    fn map_insert_replaces() {
        let map = InputMap::new();
        map.insert("name", "a");
        map.insert("name", "b");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn debug_stays_shallow_on_self_referencing_nodes() {
        let list = InputList::new();
        list.push(list.clone());
        // Must not recurse into the cycle.
        assert_eq!(format!("{:?}", list), "InputList(<1 items>)");
    }

    #[test]
    fn scalar_conversions_produce_values() {
        assert!(matches!(Input::from("s"), Input::Value(Value::String(_))));
        assert!(matches!(Input::from(1.5), Input::Value(Value::Number(_))));
        assert!(matches!(Input::from(false), Input::Value(Value::Bool(false))));
    }
}
