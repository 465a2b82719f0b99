//! Purpose: Define how each array element reports the tag that selects its slot.
//! Exports: `Discriminator`, `DefaultDiscriminator`, `DEFAULT_TAG_FIELDS`.
//! Role: Probe records decoded ahead of the full element decode.
//! Invariants: An empty tag means "not of interest" and is never an error by itself.
//! Invariants: The default probe checks `type`, `@type`, `Type`, `@Type` in that order.
//! Invariants: A key repeated within one element keeps its last value.

use std::fmt;

use serde::de::{DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Field names consulted by [`DefaultDiscriminator`], highest priority first.
pub const DEFAULT_TAG_FIELDS: [&str; 4] = ["type", "@type", "Type", "@Type"];

/// A lightweight record decoded from every array element to learn its tag.
///
/// Implementors declare only the fields they need; unknown fields are ignored
/// by serde unless the implementor opts into `deny_unknown_fields`. A field
/// whose JSON type does not match the declared type fails the whole decode.
pub trait Discriminator: DeserializeOwned {
    fn tag(&self) -> &str;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DefaultDiscriminator {
    type_lower: Option<String>,
    type_at_lower: Option<String>,
    type_upper: Option<String>,
    type_at_upper: Option<String>,
}

impl<'de> Deserialize<'de> for DefaultDiscriminator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProbeVisitor)
    }
}

struct ProbeVisitor;

impl<'de> Visitor<'de> for ProbeVisitor {
    type Value = DefaultDiscriminator;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut probe = DefaultDiscriminator::default();
        while let Some(key) = map.next_key::<String>()? {
            let field = match key.as_str() {
                "type" => &mut probe.type_lower,
                "@type" => &mut probe.type_at_lower,
                "Type" => &mut probe.type_upper,
                "@Type" => &mut probe.type_at_upper,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            *field = map.next_value()?;
        }
        Ok(probe)
    }
}

impl Discriminator for DefaultDiscriminator {
    fn tag(&self) -> &str {
        [
            &self.type_lower,
            &self.type_at_lower,
            &self.type_upper,
            &self.type_at_upper,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .find(|tag| !tag.is_empty())
        .unwrap_or("")
    }
}
