//! Purpose: Populate a container from a JSON array of tagged elements.
//! Exports: `decode`, `decode_custom`, `decode_with`, `probe_tags`, `DecodeOptions`,
//!          `TagPolicy`, `DecodeReport`.
//! Role: Probe each element for its tag, then decode matches into their slots.
//! Invariants: Blank or `null` input is a no-op; the container is left untouched.
//! Invariants: Element positions count every element, including skipped ones.
//! Invariants: The first failing element aborts the call; earlier assignments remain.

use crate::core::discriminator::{DefaultDiscriminator, Discriminator};
use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Container, Schema};
use crate::json::parse;

/// What to do with an element whose tag is absent or has no slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TagPolicy {
    #[default]
    Skip,
    Reject,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    pub missing_tag: TagPolicy,
    pub unknown_tag: TagPolicy,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects both untagged and unmatched elements.
    pub fn strict() -> Self {
        Self {
            missing_tag: TagPolicy::Reject,
            unknown_tag: TagPolicy::Reject,
        }
    }

    pub fn with_missing_tag(mut self, policy: TagPolicy) -> Self {
        self.missing_tag = policy;
        self
    }

    pub fn with_unknown_tag(mut self, policy: TagPolicy) -> Self {
        self.unknown_tag = policy;
        self
    }
}

/// Per-call counters; `assigned + missing_tag + unmatched == elements` on success.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeReport {
    pub elements: usize,
    pub assigned: usize,
    pub missing_tag: usize,
    pub unmatched: usize,
}

/// Decodes `raw` into `target` using [`DefaultDiscriminator`].
pub fn decode<C: Container>(raw: &[u8], target: &mut C) -> Result<(), Error> {
    decode_custom::<DefaultDiscriminator, C>(raw, target)
}

/// Decodes `raw` into `target`, probing each element with `R`.
pub fn decode_custom<R: Discriminator, C: Container>(
    raw: &[u8],
    target: &mut C,
) -> Result<(), Error> {
    decode_with::<R, C>(raw, target, &Schema::of(), &DecodeOptions::default()).map(|_| ())
}

pub fn decode_with<R: Discriminator, C: 'static>(
    raw: &[u8],
    target: &mut C,
    schema: &Schema<C>,
    options: &DecodeOptions,
) -> Result<DecodeReport, Error> {
    let mut report = DecodeReport::default();
    if parse::is_absent(raw) {
        return Ok(report);
    }

    let probes = parse::parse_array_of::<R>(raw).map_err(|err| parse_error(err, "probe"))?;
    let spans = parse::parse_raw_elements(raw).map_err(|err| parse_error(err, "elements"))?;
    if probes.len() != spans.len() {
        return Err(Error::new(ErrorKind::Parse).with_message(format!(
            "probe count {} does not match element count {}",
            probes.len(),
            spans.len()
        )));
    }
    report.elements = spans.len();

    for (index, (probe, span)) in probes.iter().zip(spans).enumerate() {
        let tag = probe.tag();
        if tag.is_empty() {
            if options.missing_tag == TagPolicy::Reject {
                return Err(Error::new(ErrorKind::MissingTag)
                    .with_message("element has no discriminator tag")
                    .with_index(index));
            }
            tracing::trace!(index, "skipping element without tag");
            report.missing_tag += 1;
            continue;
        }

        let Some(slot) = schema.slot_for(tag) else {
            if options.unknown_tag == TagPolicy::Reject {
                return Err(Error::new(ErrorKind::UnknownTag)
                    .with_message("no slot accepts this tag")
                    .with_index(index)
                    .with_tag(tag));
            }
            tracing::trace!(index, tag, "skipping element with unmatched tag");
            report.unmatched += 1;
            continue;
        };

        slot.assign(target, span, index).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message(format!(
                    "element does not decode into {}",
                    slot.descriptor().variant()
                ))
                .with_hint(parse::hint_for_error(&err, slot.descriptor().name()))
                .with_index(index)
                .with_tag(tag)
                .with_source(err)
        })?;
        report.assigned += 1;
    }

    tracing::debug!(
        elements = report.elements,
        assigned = report.assigned,
        missing_tag = report.missing_tag,
        unmatched = report.unmatched,
        "decoded polymorphic array"
    );
    Ok(report)
}

/// Reports each element's tag in input order; empty strings mark untagged elements.
pub fn probe_tags<R: Discriminator>(raw: &[u8]) -> Result<Vec<String>, Error> {
    if parse::is_absent(raw) {
        return Ok(Vec::new());
    }
    let probes = parse::parse_array_of::<R>(raw).map_err(|err| parse_error(err, "probe"))?;
    Ok(probes.iter().map(|probe| probe.tag().to_string()).collect())
}

fn parse_error(err: serde_json::Error, context: &str) -> Error {
    Error::new(ErrorKind::Parse)
        .with_message("input is not an array of probe records")
        .with_hint(parse::hint_for_error(&err, context))
        .with_source(err)
}
