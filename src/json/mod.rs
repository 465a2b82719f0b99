//! Purpose: JSON collaborator boundary consumed by the decoder and encoder.
//! Exports: `parse` module with array, raw-span, and single-value helpers.
//! Role: The decoder's array parses and the encoder's byte output go through this seam.
//! Notes: Core modules still name `serde_json::Error` and `RawValue` in their signatures,
//!        and `Flattened::to_json` converts to a `Value` directly.
//! Invariants: Helpers are stateless; every call decodes its own input.
//! Invariants: Error mapping to crate errors happens at callsites, not here.

pub mod parse;
