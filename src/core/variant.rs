//! Purpose: Define what a slot's element type must provide, plus opt-in position hooks.
//! Exports: `Variant`, `Positioned`.
//! Role: Static replacement for runtime capability checks on decoded elements.
//! Invariants: Without an override, `index()` is `None` and the element sorts last.
//! Invariants: `set_index` receives the offset in the original array, skips included.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Element type stored in a container slot.
///
/// Both position methods are optional capabilities. Types that care where
/// they appeared in the input override `set_index`; types that want to
/// control where they land on encode override `index`.
pub trait Variant: Serialize + DeserializeOwned + 'static {
    fn set_index(&mut self, index: usize) {
        let _ = index;
    }

    fn index(&self) -> Option<usize> {
        None
    }
}

impl Variant for serde_json::Value {}

impl<V: Variant> Variant for Box<V> {
    fn set_index(&mut self, index: usize) {
        (**self).set_index(index);
    }

    fn index(&self) -> Option<usize> {
        (**self).index()
    }
}

/// Wraps any serde type with both position capabilities.
///
/// Serializes exactly like the wrapped value; the position never reaches the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Positioned<V> {
    value: V,
    #[serde(skip)]
    position: Option<usize>,
}

impl<V> Positioned<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            position: None,
        }
    }

    pub fn at(value: V, position: usize) -> Self {
        Self {
            value,
            position: Some(position),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V: Serialize + DeserializeOwned + 'static> Variant for Positioned<V> {
    fn set_index(&mut self, index: usize) {
        self.position = Some(index);
    }

    fn index(&self) -> Option<usize> {
        self.position
    }
}
