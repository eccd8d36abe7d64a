//! §4.7 accept/reject table, exercised through the public `validate`
//! entry point against real descriptors rather than handwritten rule
//! checks, since most invalid shapes in the source's model (e.g. `Object`
//! declared with a primitive type) are simply unconstructible here --
//! see `validate.rs`'s module doc for which checks those became.

use std::sync::Arc;

use assert_matches::assert_matches;
use framewire::bits::Endian;
use framewire::codec::CodecTable;
use framewire::descriptor::{ChoiceTable, FieldDescriptor, FieldKind, IntWidth, MessageDescriptor};
use framewire::error::Error;
use framewire::validate::validate;

fn byte_field(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(
        name,
        FieldKind::Integer {
            width: IntWidth::Byte,
            endian: Endian::Big,
            signed: false,
        },
    )
}

#[test]
fn well_formed_descriptor_is_accepted() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Ok").with_field(byte_field("a"));
    assert!(validate(&desc, &codecs).is_ok());
}

#[test]
fn unparsable_condition_is_rejected() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Bad").with_field(byte_field("a").with_condition("x ?? y"));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn unparsable_size_expression_is_rejected() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Bad").with_field(FieldDescriptor::new(
        "bits",
        FieldKind::Bits {
            size_expr: Arc::from("(("),
            endian: Endian::Big,
        },
    ));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn choice_prefix_width_over_32_is_rejected() {
    let codecs = CodecTable::standard();
    let alt = Arc::new(MessageDescriptor::new("Alt").with_field(byte_field("v")));
    let table = ChoiceTable {
        prefix_bits: 64,
        alternatives: vec![(alt.clone(), Arc::from("prefix == 1"))],
        default: None,
    };
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("m", FieldKind::Object { nested: alt, choice: Some(table) }));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn choice_with_empty_alternatives_and_prefix_is_rejected() {
    let codecs = CodecTable::standard();
    let alt = Arc::new(MessageDescriptor::new("Alt").with_field(byte_field("v")));
    let table = ChoiceTable::new(8);
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("m", FieldKind::Object { nested: alt, choice: Some(table) }));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn choice_with_empty_condition_is_rejected() {
    let codecs = CodecTable::standard();
    let alt = Arc::new(MessageDescriptor::new("Alt").with_field(byte_field("v")));
    let table = ChoiceTable::new(8).with_alternative(alt.clone(), "");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("m", FieldKind::Object { nested: alt, choice: Some(table) }));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn choice_without_prefix_referencing_prefix_is_rejected() {
    let codecs = CodecTable::standard();
    let alt = Arc::new(MessageDescriptor::new("Alt").with_field(byte_field("v")));
    let table = ChoiceTable::new(0).with_alternative(alt.clone(), "prefix == 1");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("m", FieldKind::Object { nested: alt, choice: Some(table) }));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn choice_without_prefix_is_accepted_when_conditions_avoid_it() {
    let codecs = CodecTable::standard();
    let alt = Arc::new(MessageDescriptor::new("Alt").with_field(byte_field("v")));
    let table = ChoiceTable::new(0).with_alternative(alt.clone(), "self.kind == 1");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("m", FieldKind::Object { nested: alt, choice: Some(table) }));
    assert!(validate(&desc, &codecs).is_ok());
}

#[test]
fn negative_checksum_skip_literal_is_rejected() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Frame").with_field(FieldDescriptor::new(
        "crc",
        FieldKind::Checksum {
            algorithm: "sum8",
            seed: 0,
            skip_start_expr: Arc::from("-1"),
            skip_end_expr: Arc::from("0"),
            width: IntWidth::Byte,
        },
    ));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}

#[test]
fn array_primitive_with_standard_codecs_is_accepted() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Vec").with_field(FieldDescriptor::new(
        "items",
        FieldKind::ArrayPrimitive {
            element: framewire::descriptor::PrimitiveKind::Int,
            length_expr: Arc::from("3"),
            endian: Endian::Big,
        },
    ));
    assert!(validate(&desc, &codecs).is_ok());
}

#[test]
fn nested_object_descriptor_is_validated_transitively() {
    let codecs = CodecTable::standard();
    let bad_inner = Arc::new(MessageDescriptor::new("Inner").with_field(byte_field("a").with_condition("((")));
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new("inner", FieldKind::Object { nested: bad_inner, choice: None }));
    assert_matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..)));
}
