//! Purpose: Turn a populated container back into one ordered JSON array.
//! Exports: `Flattened`, `flatten`, `flatten_with`, `sort_by_position`, `encode`, `encode_with`.
//! Role: Inverse of the decoder; no discriminator field is synthesized.
//! Invariants: Grouping follows slot declaration order, then in-slot order.
//! Invariants: The position sort is stable; elements without a position sort last.

use serde::{Serialize, Serializer};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Container, Schema};
use crate::core::variant::Variant;
use crate::json::parse;

/// One populated slot value, borrowed from its container.
#[derive(Clone, Copy)]
pub struct Flattened<'a> {
    value: &'a dyn erased_serde::Serialize,
    position: Option<usize>,
}

impl<'a> Flattened<'a> {
    pub fn of<V: Variant>(value: &'a V) -> Self {
        Self {
            value,
            position: value.index(),
        }
    }

    /// The position hint reported by the variant, if it has one.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn sort_key(&self) -> usize {
        self.position.unwrap_or(usize::MAX)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Flattened<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        erased_serde::serialize(self.value, serializer)
    }
}

impl std::fmt::Debug for Flattened<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flattened")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

pub fn flatten<C: Container>(container: &C) -> Vec<Flattened<'_>> {
    flatten_with(container, &Schema::of())
}

pub fn flatten_with<'a, C: 'static>(container: &'a C, schema: &Schema<C>) -> Vec<Flattened<'a>> {
    let mut items = Vec::new();
    for slot in schema.declared() {
        slot.collect(container, &mut items);
    }
    sort_by_position(&mut items);
    tracing::debug!(
        slots = schema.len(),
        items = items.len(),
        "flattened container"
    );
    items
}

/// Stable ascending sort on each item's position hint.
pub fn sort_by_position(items: &mut [Flattened<'_>]) {
    if items.iter().any(|item| item.position.is_some()) {
        items.sort_by_key(Flattened::sort_key);
    }
}

pub fn encode<C: Container>(container: &C) -> Result<Vec<u8>, Error> {
    encode_with(container, &Schema::of())
}

pub fn encode_with<C: 'static>(container: &C, schema: &Schema<C>) -> Result<Vec<u8>, Error> {
    let items = flatten_with(container, schema);
    parse::encode(&items).map_err(|err| {
        Error::new(ErrorKind::Encode)
            .with_message("failed to encode flattened array")
            .with_source(err)
    })
}
