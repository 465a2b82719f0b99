//! Purpose: Provide the JSON decode/encode primitives used by the core.
//! Exports: `is_absent`, `parse_array_of`, `parse_raw_elements`, `decode_one`, `encode`,
//!          `ParseFailureCategory`, `categorize_error`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Raw element spans borrow from the input; nothing is re-encoded.
//! Notes: Error mapping is done by callsites so domain context stays explicit.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::value::RawValue;

/// True for input that carries no array at all: blank, or a bare `null`.
pub fn is_absent(input: &[u8]) -> bool {
    let trimmed = input.trim_ascii();
    trimmed.is_empty() || trimmed == b"null"
}

/// Decodes a top-level JSON array into a typed sequence.
pub fn parse_array_of<T: DeserializeOwned>(input: &[u8]) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_slice(input)
}

/// Decodes a top-level JSON array, keeping each element as an undecoded span.
pub fn parse_raw_elements(input: &[u8]) -> Result<Vec<&RawValue>, serde_json::Error> {
    serde_json::from_slice(input)
}

pub fn decode_one<T: DeserializeOwned>(span: &RawValue) -> Result<T, serde_json::Error> {
    serde_json::from_str(span.get())
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseFailureCategory {
    Syntax,
    Data,
    Eof,
    Io,
}

impl ParseFailureCategory {
    pub fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Data => "data",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Io => "io",
        }
    }
}

pub fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Data => ParseFailureCategory::Data,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Io => ParseFailureCategory::Io,
    }
}

pub fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    let category = categorize_error(err);
    let advice = match category {
        ParseFailureCategory::Syntax => "input is not well-formed JSON",
        ParseFailureCategory::Data => "a value does not match the expected shape",
        ParseFailureCategory::Eof => "input ended before the array was closed",
        ParseFailureCategory::Io => "input could not be read",
    };
    format!(
        "parse category: {}; context: {context}; line {} column {}: {advice}",
        category.label(),
        err.line(),
        err.column()
    )
}
