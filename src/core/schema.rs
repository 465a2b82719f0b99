//! Purpose: Describe a container's slots and map discriminator tags onto them.
//! Exports: `Container`, `Schema`, `SchemaBuilder`, `SlotHandle`, `SlotDescriptor`,
//!          `SlotKind`, `Ownership`.
//! Role: Statically checked replacement for reflecting over a record's fields.
//! Invariants: Slots keep declaration order; that order drives encode grouping.
//! Invariants: A repeated tag resolves to the slot registered last.
//! Invariants: A schema is plain data plus accessors; building one has no side effects.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;

use serde_json::value::RawValue;

use crate::core::flatten::Flattened;
use crate::core::variant::Variant;
use crate::json::parse;

/// A record whose fields are slots for tagged array elements.
///
/// ```
/// use polyarray::{Container, SchemaBuilder, Variant};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, PartialEq, Serialize, Deserialize)]
/// struct Pet { name: String }
/// impl Variant for Pet {}
///
/// #[derive(Default)]
/// struct Household { pets: Vec<Pet> }
///
/// impl Container for Household {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.collection("pets", |h| &h.pets, |h| &mut h.pets).tag("pet");
///     }
/// }
/// ```
pub trait Container: Sized + 'static {
    fn describe(schema: &mut SchemaBuilder<Self>);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotKind {
    /// Holds at most one variant; a later element replaces an earlier one.
    Single,
    /// Holds every matching element in encounter order.
    Collection,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    Owned,
    Boxed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotDescriptor {
    name: String,
    tag: String,
    kind: SlotKind,
    ownership: Ownership,
    variant: &'static str,
}

impl SlotDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Rust type name of the element stored in this slot.
    pub fn variant(&self) -> &'static str {
        self.variant
    }
}

type AssignFn<C> =
    Box<dyn Fn(&mut C, &RawValue, usize) -> Result<(), serde_json::Error> + Send + Sync>;
type CollectFn<C> = Box<dyn for<'a> Fn(&'a C, &mut Vec<Flattened<'a>>) + Send + Sync>;

pub(crate) struct Slot<C> {
    descriptor: SlotDescriptor,
    assign: AssignFn<C>,
    collect: CollectFn<C>,
}

impl<C> Slot<C> {
    pub(crate) fn descriptor(&self) -> &SlotDescriptor {
        &self.descriptor
    }

    /// Decodes `span` into this slot's variant and stores it in `target`.
    pub(crate) fn assign(
        &self,
        target: &mut C,
        span: &RawValue,
        index: usize,
    ) -> Result<(), serde_json::Error> {
        (self.assign)(target, span, index)
    }

    pub(crate) fn collect<'a>(&self, source: &'a C, out: &mut Vec<Flattened<'a>>) {
        (self.collect)(source, out)
    }
}

pub struct Schema<C> {
    slots: Vec<Slot<C>>,
    by_tag: HashMap<String, usize>,
}

impl<C: Container> Schema<C> {
    pub fn of() -> Self {
        Self::build(C::describe)
    }
}

impl<C: 'static> Schema<C> {
    pub fn build(describe: impl FnOnce(&mut SchemaBuilder<C>)) -> Self {
        let mut builder = SchemaBuilder { slots: Vec::new() };
        describe(&mut builder);
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot descriptors in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.slots.iter().map(Slot::descriptor)
    }

    pub fn lookup(&self, tag: &str) -> Option<&SlotDescriptor> {
        self.slot_for(tag).map(Slot::descriptor)
    }

    pub(crate) fn slot_for(&self, tag: &str) -> Option<&Slot<C>> {
        self.by_tag.get(tag).map(|&pos| &self.slots[pos])
    }

    pub(crate) fn declared(&self) -> &[Slot<C>] {
        &self.slots
    }
}

impl<C> fmt::Debug for Schema<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| &slot.descriptor))
            .finish()
    }
}

pub struct SchemaBuilder<C> {
    slots: Vec<Slot<C>>,
}

/// Returned by every registration call so the default tag can be overridden.
pub struct SlotHandle<'a> {
    descriptor: &'a mut SlotDescriptor,
}

impl SlotHandle<'_> {
    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.descriptor.tag = tag.into();
        self
    }
}

impl<C: 'static> SchemaBuilder<C> {
    /// A slot holding one variant by value; the default value counts as empty.
    pub fn single<V, G, M>(&mut self, name: impl Into<String>, get: G, get_mut: M) -> SlotHandle<'_>
    where
        V: Variant + Default + PartialEq,
        G: Fn(&C) -> &V + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut V + Send + Sync + 'static,
    {
        let assign = assigner(move |target: &mut C, span, index| {
            *get_mut(target) = decode_variant::<V>(span, index)?;
            Ok(())
        });
        let collect = collector(move |source: &C, out| {
            let value = get(source);
            if *value != V::default() {
                out.push(Flattened::of(value));
            }
        });
        self.push::<V>(name.into(), SlotKind::Single, Ownership::Owned, assign, collect)
    }

    /// A slot holding at most one heap-allocated variant.
    pub fn single_boxed<V, G, M>(
        &mut self,
        name: impl Into<String>,
        get: G,
        get_mut: M,
    ) -> SlotHandle<'_>
    where
        V: Variant,
        G: Fn(&C) -> &Option<Box<V>> + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut Option<Box<V>> + Send + Sync + 'static,
    {
        let assign = assigner(move |target: &mut C, span, index| {
            *get_mut(target) = Some(Box::new(decode_variant::<V>(span, index)?));
            Ok(())
        });
        let collect = collector(move |source: &C, out| {
            if let Some(value) = get(source) {
                out.push(Flattened::of(value.as_ref()));
            }
        });
        self.push::<V>(name.into(), SlotKind::Single, Ownership::Boxed, assign, collect)
    }

    /// A slot appending every match; default-valued elements are dropped on encode.
    pub fn collection<V, G, M>(
        &mut self,
        name: impl Into<String>,
        get: G,
        get_mut: M,
    ) -> SlotHandle<'_>
    where
        V: Variant + Default + PartialEq,
        G: Fn(&C) -> &Vec<V> + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut Vec<V> + Send + Sync + 'static,
    {
        let assign = assigner(move |target: &mut C, span, index| {
            let value = decode_variant::<V>(span, index)?;
            get_mut(target).push(value);
            Ok(())
        });
        let collect = collector(move |source: &C, out| {
            let empty = V::default();
            out.extend(
                get(source)
                    .iter()
                    .filter(|value| **value != empty)
                    .map(Flattened::of),
            );
        });
        self.push::<V>(name.into(), SlotKind::Collection, Ownership::Owned, assign, collect)
    }

    pub fn collection_boxed<V, G, M>(
        &mut self,
        name: impl Into<String>,
        get: G,
        get_mut: M,
    ) -> SlotHandle<'_>
    where
        V: Variant,
        G: Fn(&C) -> &Vec<Box<V>> + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut Vec<Box<V>> + Send + Sync + 'static,
    {
        let assign = assigner(move |target: &mut C, span, index| {
            let value = decode_variant::<V>(span, index)?;
            get_mut(target).push(Box::new(value));
            Ok(())
        });
        let collect = collector(move |source: &C, out| {
            out.extend(get(source).iter().map(|value| Flattened::of(value.as_ref())));
        });
        self.push::<V>(name.into(), SlotKind::Collection, Ownership::Boxed, assign, collect)
    }

    fn push<V: 'static>(
        &mut self,
        name: String,
        kind: SlotKind,
        ownership: Ownership,
        assign: AssignFn<C>,
        collect: CollectFn<C>,
    ) -> SlotHandle<'_> {
        let descriptor = SlotDescriptor {
            tag: name.clone(),
            name,
            kind,
            ownership,
            variant: type_name::<V>(),
        };
        self.slots.push(Slot {
            descriptor,
            assign,
            collect,
        });
        let last = self.slots.len() - 1;
        SlotHandle {
            descriptor: &mut self.slots[last].descriptor,
        }
    }

    fn finish(self) -> Schema<C> {
        let mut by_tag = HashMap::with_capacity(self.slots.len());
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(previous) = by_tag.insert(slot.descriptor.tag.clone(), pos) {
                tracing::debug!(
                    tag = %slot.descriptor.tag,
                    replaced = %self.slots[previous].descriptor.name,
                    by = %slot.descriptor.name,
                    "duplicate slot tag; later slot wins"
                );
            }
        }
        Schema {
            slots: self.slots,
            by_tag,
        }
    }
}

fn decode_variant<V: Variant>(span: &RawValue, index: usize) -> Result<V, serde_json::Error> {
    let mut value: V = parse::decode_one(span)?;
    value.set_index(index);
    Ok(value)
}

fn assigner<C, F>(f: F) -> AssignFn<C>
where
    F: Fn(&mut C, &RawValue, usize) -> Result<(), serde_json::Error> + Send + Sync + 'static,
{
    Box::new(f)
}

fn collector<C, F>(f: F) -> CollectFn<C>
where
    F: for<'a> Fn(&'a C, &mut Vec<Flattened<'a>>) + Send + Sync + 'static,
{
    Box::new(f)
}
