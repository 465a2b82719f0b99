//! Purpose: Let serde drive the decoder and flattener for container-typed values.
//! Exports: `Poly`, `serialize`, `deserialize`.
//! Role: Host serialization hook; usable as a wrapper or via `#[serde(with = ...)]`.
//! Invariants: Deserialization requires serde_json (elements are captured as raw spans).
//! Invariants: A JSON `null` yields the default container, like absent input.

use std::ops::{Deref, DerefMut};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::core::decode::decode;
use crate::core::flatten::flatten;
use crate::core::schema::Container;

/// Newtype that (de)serializes its container as a polymorphic array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Poly<C>(pub C);

impl<C> Poly<C> {
    pub fn into_inner(self) -> C {
        self.0
    }
}

impl<C> Deref for Poly<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C> DerefMut for Poly<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: Container> Serialize for Poly<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

impl<'de, C: Container + Default> Deserialize<'de> for Poly<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Poly)
    }
}

pub fn serialize<C, S>(container: &C, serializer: S) -> Result<S::Ok, S::Error>
where
    C: Container,
    S: Serializer,
{
    serializer.collect_seq(flatten(container))
}

pub fn deserialize<'de, C, D>(deserializer: D) -> Result<C, D::Error>
where
    C: Container + Default,
    D: Deserializer<'de>,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    let mut container = C::default();
    decode(raw.get().as_bytes(), &mut container).map_err(D::Error::custom)?;
    Ok(container)
}
