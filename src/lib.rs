//! Purpose: Library crate for decoding discriminated JSON arrays into typed containers.
//! Exports: `core` (registry, decoder, flattener, errors), `json` (parser seam),
//!          `serde_hook`, `grouped`, plus root re-exports of the public surface.
//! Role: Shared by the `polyarray` CLI and by library callers.
//! Invariants: Decode and encode are synchronous and keep all state call-local.
//! Invariants: No discriminator field is ever added to encoded output.
pub mod core;
pub mod grouped;
pub mod json;
pub mod serde_hook;

pub use crate::core::decode::{
    DecodeOptions, DecodeReport, TagPolicy, decode, decode_custom, decode_with, probe_tags,
};
pub use crate::core::discriminator::{DEFAULT_TAG_FIELDS, DefaultDiscriminator, Discriminator};
pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::flatten::{
    Flattened, encode, encode_with, flatten, flatten_with, sort_by_position,
};
pub use crate::core::schema::{
    Container, Ownership, Schema, SchemaBuilder, SlotDescriptor, SlotHandle, SlotKind,
};
pub use crate::core::variant::{Positioned, Variant};
pub use crate::serde_hook::Poly;
