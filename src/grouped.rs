//! Purpose: A container whose slots are chosen at runtime instead of in source.
//! Exports: `SlotSpec`, `GroupLayout`, `Grouped`.
//! Role: Backs the CLI; any JSON array can be grouped by tag without a Rust type.
//! Invariants: Every slot holds raw JSON values; positions survive decode -> encode.
//! Invariants: The schema is derived from the layout owned by the same `Grouped`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::core::decode::{DecodeOptions, DecodeReport, decode_with};
use crate::core::discriminator::Discriminator;
use crate::core::error::{Error, ErrorKind};
use crate::core::flatten::{Flattened, encode_with, flatten_with};
use crate::core::schema::{Schema, SlotKind};
use crate::core::variant::Positioned;

/// One runtime slot, written `name[=tag][:single|:many]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotSpec {
    pub name: String,
    pub tag: String,
    pub kind: SlotKind,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        let name = name.into();
        Self {
            tag: name.clone(),
            name,
            kind,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl FromStr for SlotSpec {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let (body, kind) = match input.rsplit_once(':') {
            Some((body, "single" | "one")) => (body, SlotKind::Single),
            Some((body, "many" | "collection")) => (body, SlotKind::Collection),
            _ => (input, SlotKind::Collection),
        };
        let (name, tag) = match body.split_once('=') {
            Some((name, tag)) => (name, tag),
            None => (body, body),
        };
        if name.is_empty() || tag.is_empty() {
            return Err(Error::new(ErrorKind::Config)
                .with_message(format!("invalid slot spec `{input}`"))
                .with_hint("Use name[=tag][:single|:many], e.g. pets=pet or owner:single."));
        }
        Ok(Self::new(name, kind).with_tag(tag))
    }
}

impl fmt::Display for SlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.tag != self.name {
            write!(f, "={}", self.tag)?;
        }
        match self.kind {
            SlotKind::Single => f.write_str(":single"),
            SlotKind::Collection => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Placement {
    kind: SlotKind,
    pos: usize,
}

#[derive(Clone, Debug)]
pub struct GroupLayout {
    specs: Vec<SlotSpec>,
    placements: Vec<Placement>,
    singles: usize,
    collections: usize,
}

impl GroupLayout {
    /// Validates `specs`; slot names must be unique, tags may repeat.
    pub fn new(specs: Vec<SlotSpec>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        let mut placements = Vec::with_capacity(specs.len());
        let (mut singles, mut collections) = (0, 0);
        for spec in &specs {
            if spec.name.is_empty() || spec.tag.is_empty() {
                return Err(Error::new(ErrorKind::Config)
                    .with_message("slot name and tag must be non-empty"));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::new(ErrorKind::Config)
                    .with_message(format!("duplicate slot name `{}`", spec.name))
                    .with_tag(spec.tag.clone()));
            }
            let counter = match spec.kind {
                SlotKind::Single => &mut singles,
                SlotKind::Collection => &mut collections,
            };
            placements.push(Placement {
                kind: spec.kind,
                pos: *counter,
            });
            *counter += 1;
        }
        Ok(Self {
            specs,
            placements,
            singles,
            collections,
        })
    }

    pub fn specs(&self) -> &[SlotSpec] {
        &self.specs
    }

    fn schema(&self) -> Schema<Grouped> {
        Schema::build(|builder| {
            for (spec, placement) in self.specs.iter().zip(&self.placements) {
                let pos = placement.pos;
                match placement.kind {
                    SlotKind::Single => {
                        builder
                            .single(
                                spec.name.clone(),
                                move |g: &Grouped| &g.singles[pos],
                                move |g: &mut Grouped| &mut g.singles[pos],
                            )
                            .tag(spec.tag.clone());
                    }
                    SlotKind::Collection => {
                        builder
                            .collection(
                                spec.name.clone(),
                                move |g: &Grouped| &g.collections[pos],
                                move |g: &mut Grouped| &mut g.collections[pos],
                            )
                            .tag(spec.tag.clone());
                    }
                }
            }
        })
    }
}

/// Tagged JSON values grouped into the slots of a [`GroupLayout`].
#[derive(Clone, Debug)]
pub struct Grouped {
    layout: GroupLayout,
    singles: Vec<Positioned<Value>>,
    collections: Vec<Vec<Positioned<Value>>>,
}

impl Grouped {
    pub fn new(layout: GroupLayout) -> Self {
        Self {
            singles: vec![Positioned::default(); layout.singles],
            collections: vec![Vec::new(); layout.collections],
            layout,
        }
    }

    pub fn layout(&self) -> &GroupLayout {
        &self.layout
    }

    pub fn decode<R: Discriminator>(
        &mut self,
        raw: &[u8],
        options: &DecodeOptions,
    ) -> Result<DecodeReport, Error> {
        let schema = self.layout.schema();
        decode_with::<R, _>(raw, self, &schema, options)
    }

    pub fn flatten(&self) -> Vec<Flattened<'_>> {
        flatten_with(self, &self.layout.schema())
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        encode_with(self, &self.layout.schema())
    }

    /// Values held by the slot called `name`, in slot order.
    pub fn values(&self, name: &str) -> Option<Vec<&Value>> {
        let at = self.layout.specs.iter().position(|spec| spec.name == name)?;
        let placement = self.layout.placements[at];
        let values = match placement.kind {
            SlotKind::Single => {
                let slot = &self.singles[placement.pos];
                if *slot == Positioned::default() {
                    Vec::new()
                } else {
                    vec![slot.value()]
                }
            }
            SlotKind::Collection => self.collections[placement.pos]
                .iter()
                .map(Positioned::value)
                .collect(),
        };
        Some(values)
    }

    /// Renders `{name: value}` for single slots and `{name: [values]}` for collections.
    /// Empty single slots are omitted.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (spec, placement) in self.layout.specs.iter().zip(&self.layout.placements) {
            match placement.kind {
                SlotKind::Single => {
                    let slot = &self.singles[placement.pos];
                    if *slot != Positioned::default() {
                        out.insert(spec.name.clone(), slot.value().clone());
                    }
                }
                SlotKind::Collection => {
                    let items = self.collections[placement.pos]
                        .iter()
                        .map(|item| item.value().clone())
                        .collect();
                    out.insert(spec.name.clone(), Value::Array(items));
                }
            }
        }
        Value::Object(out)
    }

    /// Loads the shape produced by [`Grouped::to_json`]; positions are not restored.
    pub fn from_json(layout: GroupLayout, value: &Value) -> Result<Self, Error> {
        let Some(map) = value.as_object() else {
            return Err(Error::new(ErrorKind::Parse)
                .with_message("grouped input must be a JSON object")
                .with_hint("Pass the output of `polyarray group`."));
        };
        let mut grouped = Self::new(layout);
        for (spec, placement) in grouped.layout.specs.iter().zip(&grouped.layout.placements) {
            let Some(entry) = map.get(&spec.name) else {
                continue;
            };
            match placement.kind {
                SlotKind::Single => {
                    grouped.singles[placement.pos] = Positioned::new(entry.clone());
                }
                SlotKind::Collection => {
                    let Some(items) = entry.as_array() else {
                        return Err(Error::new(ErrorKind::Parse)
                            .with_message(format!("slot `{}` must hold an array", spec.name))
                            .with_tag(spec.tag.clone()));
                    };
                    grouped.collections[placement.pos] =
                        items.iter().cloned().map(Positioned::new).collect();
                }
            }
        }
        for key in map.keys() {
            if !grouped.layout.specs.iter().any(|spec| &spec.name == key) {
                tracing::trace!(key = %key, "ignoring key with no slot");
            }
        }
        Ok(grouped)
    }
}
