//! Hook argument tuples and handler signatures.
//!
//! A hook chain transforms an ordered tuple of values. The tuple is modelled
//! explicitly as [`HookArgs`] rather than as positional variadic arguments so
//! the same-shape-in/same-shape-out contract can be checked by the dispatcher
//! instead of being assumed by convention.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::BoxError;

/// The ordered argument tuple threaded through a hook chain.
///
/// Each plugin's handler receives the previous handler's output and must
/// return a tuple of the same arity. Elements are raw JSON values; typed
/// plugins deserialize the elements they care about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HookArgs(Vec<Value>);

impl HookArgs {
    /// Creates a tuple from its elements.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Number of elements in the tuple — its "shape" for the dispatch contract.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Returns the elements as a slice.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Consumes the tuple, returning its elements.
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Returns the element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the first element, if any.
    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    /// Returns the last element, if any.
    pub fn last(&self) -> Option<&Value> {
        self.0.last()
    }

    #[doc(hidden)]
    pub fn from_json_array(value: Value) -> Self {
        match value {
            Value::Array(values) => Self(values),
            other => Self(vec![other]),
        }
    }

    /// Replaces the element at `index`, preserving arity.
    ///
    /// Out-of-range indices are ignored; the handler cannot grow the tuple
    /// this way.
    pub fn with_value(mut self, index: usize, value: Value) -> Self {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = value;
        }
        self
    }
}

impl From<Vec<Value>> for HookArgs {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for HookArgs {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for HookArgs {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds a [`HookArgs`] tuple from `serde_json::json!`-compatible elements.
///
/// ```rust,ignore
/// let args = hook_args!["x", 42, { "stage": "dev" }];
/// assert_eq!(args.arity(), 3);
/// ```
#[macro_export]
macro_rules! hook_args {
    ($($tt:tt)*) => {
        $crate::hook::HookArgs::from_json_array(::serde_json::json!([$($tt)*]))
    };
}

/// Future returned by a hook handler.
pub type HookFuture = BoxFuture<'static, Result<HookArgs, BoxError>>;

/// An async hook handler: consumes the tuple, yields the transformed tuple.
pub type HookHandler = Arc<dyn Fn(HookArgs) -> HookFuture + Send + Sync>;

/// Future returned by an extension.
pub type ExtensionFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// A named callable a plugin exposes for direct invocation by key.
pub type ExtensionHandler = Arc<dyn Fn(Vec<Value>) -> ExtensionFuture + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arity_tracks_element_count() {
        assert_eq!(HookArgs::default().arity(), 0);
        assert_eq!(hook_args!["a", 1, null].arity(), 3);
    }

    #[test]
    fn with_value_preserves_arity() {
        let args = hook_args!["a", "b"].with_value(1, json!("c"));
        assert_eq!(args.values(), &[json!("a"), json!("c")]);

        let unchanged = hook_args!["a"].with_value(5, json!("x"));
        assert_eq!(unchanged.arity(), 1);
    }
}
