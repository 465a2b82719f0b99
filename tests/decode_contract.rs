//! Purpose: Lock decoder behavior for tagged arrays against fixed fixtures.
//! Exports: Integration tests only.
//! Role: Cover tag resolution, positions, skips, last-write-wins, and failures.
//! Invariants: Skipped elements still advance the position index.
//! Invariants: Failures leave already-assigned slots populated.

use polyarray::{
    Container, DecodeOptions, Discriminator, ErrorKind, Positioned, Schema, SchemaBuilder,
    TagPolicy, Variant, decode, decode_custom, decode_with,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TypeString {
    value_a: String,
}

impl Variant for TypeString {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TypeFloat {
    value_b: f64,
}

impl Variant for TypeFloat {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TypeInt {
    value_c: i64,
    #[serde(skip)]
    index: usize,
}

impl Variant for TypeInt {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    fn index(&self) -> Option<usize> {
        Some(self.index)
    }
}

#[derive(Debug, Default)]
struct SlicesAbc {
    type_string: Vec<TypeString>,
    type_bravo: Vec<TypeFloat>,
    type_int: TypeInt,
    type_int_p: Option<Box<TypeInt>>,
}

impl Container for SlicesAbc {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema.collection("TypeString", |s| &s.type_string, |s| &mut s.type_string);
        schema
            .collection("TypeBravo", |s| &s.type_bravo, |s| &mut s.type_bravo)
            .tag("TypeFloat");
        schema.single("TypeInt", |s| &s.type_int, |s| &mut s.type_int);
        schema.single_boxed("TypeIntP", |s| &s.type_int_p, |s| &mut s.type_int_p);
    }
}

fn assert_empty(result: &SlicesAbc) {
    assert!(result.type_string.is_empty());
    assert!(result.type_bravo.is_empty());
    assert_eq!(result.type_int, TypeInt::default());
    assert!(result.type_int_p.is_none());
}

#[test]
fn mixed_tag_fields_fill_every_slot_kind() {
    let input = br#"
[
    {"type": "TypeString", "ValueA": "ValueString"},
    {"type": "TypeString", "ValueA": "ValueString2"},
    {"@type": "TypeFloat", "ValueB": 42.23},
    {"Type": "TypeInt", "ValueC": 105},
    {"@Type": "TypeIntP", "ValueC": 123}
]"#;
    let mut result = SlicesAbc::default();
    decode(input, &mut result).expect("decode");

    assert_eq!(result.type_string.len(), 2);
    assert_eq!(result.type_string[0].value_a, "ValueString");
    assert_eq!(result.type_string[1].value_a, "ValueString2");
    assert_eq!(result.type_bravo, [TypeFloat { value_b: 42.23 }]);
    assert_eq!(result.type_int.value_c, 105);
    assert_eq!(result.type_int.index, 3);
    let boxed = result.type_int_p.expect("boxed slot");
    assert_eq!(boxed.value_c, 123);
    assert_eq!(boxed.index, 4);
}

#[test]
fn declared_name_is_not_a_tag_once_overridden() {
    let mut result = SlicesAbc::default();
    decode(br#"[{"type":"TypeBravo","ValueB":1}]"#, &mut result).expect("decode");
    assert!(result.type_bravo.is_empty());
}

#[test]
fn absent_and_empty_input_leave_container_untouched() {
    let mut result = SlicesAbc::default();
    decode(b"", &mut result).expect("absent");
    assert_empty(&result);
    decode(b"[]", &mut result).expect("empty array");
    assert_empty(&result);
}

#[test]
fn null_input_is_treated_as_absent() {
    let mut result = SlicesAbc::default();
    decode(b"null", &mut result).expect("null");
    assert_empty(&result);
    decode(b"  null\n", &mut result).expect("padded null");
    assert_empty(&result);
    decode(b" \n ", &mut result).expect("blank");
    assert_empty(&result);
}

#[test]
fn repeated_tag_key_keeps_the_last_value() {
    let input = br#"[
        {"type": "Mystery", "type": "TypeString", "ValueA": "dup"},
        {"type": "TypeString", "@type": "TypeInt", "@type": "Other", "ValueA": "first"}
    ]"#;
    let mut result = SlicesAbc::default();
    decode(input, &mut result).expect("decode");
    assert_eq!(
        result.type_string,
        [
            TypeString { value_a: "dup".into() },
            TypeString { value_a: "first".into() },
        ]
    );
}

#[test]
fn untagged_elements_are_skipped() {
    let mut result = SlicesAbc::default();
    decode(br#"[{"ValueA": "x"}]"#, &mut result).expect("decode");
    assert_empty(&result);
}

#[test]
fn last_element_wins_for_single_slots() {
    let input = br#"[
        {"type": "TypeInt", "ValueC": 1},
        {"type": "TypeIntP", "ValueC": 2},
        {"type": "TypeInt", "ValueC": 3},
        {"type": "TypeIntP", "ValueC": 4}
    ]"#;
    let mut result = SlicesAbc::default();
    decode(input, &mut result).expect("decode");
    assert_eq!((result.type_int.value_c, result.type_int.index), (3, 2));
    let boxed = result.type_int_p.expect("boxed");
    assert_eq!((boxed.value_c, boxed.index), (4, 3));
}

#[derive(Debug, Default)]
struct FourTags {
    lower: Positioned<TypeString>,
    at_lower: Positioned<TypeString>,
    upper: Positioned<TypeString>,
    at_upper: Positioned<TypeString>,
}

impl Container for FourTags {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema.single("lower", |f| &f.lower, |f| &mut f.lower);
        schema.single("at_lower", |f| &f.at_lower, |f| &mut f.at_lower);
        schema.single("upper", |f| &f.upper, |f| &mut f.upper);
        schema.single("at_upper", |f| &f.at_upper, |f| &mut f.at_upper);
    }
}

#[test]
fn each_conventional_tag_field_records_its_position() {
    let input = br#"[
        {"type": "lower", "ValueA": "a"},
        {"@type": "at_lower", "ValueA": "b"},
        {"Type": "upper", "ValueA": "c"},
        {"@Type": "at_upper", "ValueA": "d"}
    ]"#;
    let mut result = FourTags::default();
    decode(input, &mut result).expect("decode");
    assert_eq!(result.lower.position(), Some(0));
    assert_eq!(result.at_lower.position(), Some(1));
    assert_eq!(result.upper.position(), Some(2));
    assert_eq!(result.at_upper.position(), Some(3));
    assert_eq!(result.at_upper.value().value_a, "d");
}

#[test]
fn malformed_input_is_a_parse_error() {
    let mut result = SlicesAbc::default();
    let err = decode(b"not valid JSON", &mut result).expect_err("parse");
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_empty(&result);
}

#[test]
fn probe_field_type_mismatch_is_a_parse_error() {
    let mut result = SlicesAbc::default();
    let err = decode(
        br#"[{"type":"TypeString","ValueA":"ok"},{"type":7}]"#,
        &mut result,
    )
    .expect_err("probe");
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_empty(&result);
}

#[test]
fn variant_type_mismatch_stops_at_the_failing_element() {
    let input = br#"[
        {"type": "TypeString", "ValueA": "kept"},
        {"type": "TypeString", "ValueA": 42},
        {"type": "TypeString", "ValueA": "never"}
    ]"#;
    let mut result = SlicesAbc::default();
    let err = decode(input, &mut result).expect_err("variant");
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.index(), Some(1));
    assert_eq!(result.type_string, [TypeString { value_a: "kept".into() }]);
}

#[derive(Deserialize)]
struct AnimalProbe {
    #[serde(default)]
    species: Option<String>,
    #[serde(default)]
    legs: Option<u8>,
}

impl Discriminator for AnimalProbe {
    fn tag(&self) -> &str {
        match (self.species.as_deref(), self.legs) {
            (Some(species), _) => species,
            (None, Some(2)) => "TypeString",
            _ => "",
        }
    }
}

#[test]
fn custom_discriminator_may_combine_fields() {
    let input = br#"[
        {"species": "TypeInt", "ValueC": 9},
        {"legs": 2, "ValueA": "bird"},
        {"legs": 4, "ValueA": "dog"}
    ]"#;
    let mut result = SlicesAbc::default();
    decode_custom::<AnimalProbe, _>(input, &mut result).expect("decode");
    assert_eq!(result.type_int.value_c, 9);
    assert_eq!(result.type_string, [TypeString { value_a: "bird".into() }]);
}

#[test]
fn custom_discriminator_field_type_is_enforced() {
    let mut result = SlicesAbc::default();
    let err = decode_custom::<AnimalProbe, _>(br#"[{"legs":"two"}]"#, &mut result)
        .expect_err("probe type");
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn unknown_tag_policy_is_explicit() {
    let input = br#"[{"type":"TypeString","ValueA":"a"},{"type":"Mystery"}]"#;
    let schema = Schema::<SlicesAbc>::of();

    let mut lenient = SlicesAbc::default();
    let report = decode_with::<polyarray::DefaultDiscriminator, _>(
        input,
        &mut lenient,
        &schema,
        &DecodeOptions::new(),
    )
    .expect("lenient");
    assert_eq!(report.unmatched, 1);

    let mut strict = SlicesAbc::default();
    let err = decode_with::<polyarray::DefaultDiscriminator, _>(
        input,
        &mut strict,
        &schema,
        &DecodeOptions::new().with_unknown_tag(TagPolicy::Reject),
    )
    .expect_err("strict");
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
    assert_eq!(err.tag(), Some("Mystery"));
    assert_eq!(strict.type_string.len(), 1);
}

#[test]
fn decoding_into_independent_containers_from_threads() {
    let input: &'static [u8] =
        br#"[{"type":"TypeString","ValueA":"t"},{"type":"TypeInt","ValueC":1}]"#;
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(move || {
                let mut result = SlicesAbc::default();
                decode(input, &mut result).expect("decode");
                (result.type_string.len(), result.type_int.value_c)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("join"), (1, 1));
    }
}
