//! Scenarios A-F from spec.md §8, driven through the public decode/encode
//! entry points and the message driver directly where a scenario needs a
//! descriptor that isn't tied to a `FrameType` impl.

use std::sync::Arc;

use assert_matches::assert_matches;
use framewire::bits::{BitReader, BitWriter, Endian};
use framewire::codec::CodecTable;
use framewire::descriptor::{
    ChecksumSpec, ChoiceTable, EvaluatedFieldDescriptor, FieldDescriptor, FieldKind, Header, IntWidth, MessageDescriptor,
};
use framewire::driver::{decode_message, encode_message};
use framewire::error::Error;
use framewire::value::{Record, Value};

fn int_field(name: &'static str, width: IntWidth, endian: Endian, signed: bool) -> FieldDescriptor {
    FieldDescriptor::new(name, FieldKind::Integer { width, endian, signed })
}

#[test]
fn scenario_a_fixed_integers() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Pair")
        .with_field(int_field("a", IntWidth::Int, Endian::Big, true))
        .with_field(int_field("b", IntWidth::Short, Endian::Little, true));

    let bytes = [0x00, 0x00, 0x01, 0x2C, 0x34, 0x12];
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("a"), Some(&Value::I32(300)));
    assert_eq!(decoded.get("b"), Some(&Value::I16(0x1234)));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn scenario_b_terminated_string() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Greeting").with_field(FieldDescriptor::new(
        "s",
        FieldKind::StringTerminated {
            terminator: 0x00,
            consume_terminator: true,
            charset: framewire::charset::Charset::Utf8,
        },
    ));

    let bytes = b"Hello\x00";
    let mut reader = BitReader::new(bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("s"), Some(&Value::Str("Hello".to_string())));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn string_fixed_is_a_plain_byte_count() {
    // `size` is a byte count, not a bit count -- an odd byte length must
    // decode cleanly with no "whole number of bytes" rejection.
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Label").with_field(FieldDescriptor::new(
        "s",
        FieldKind::StringFixed {
            size_expr: Arc::from("5"),
            charset: framewire::charset::Charset::Ascii,
        },
    ));

    let bytes = b"Hello";
    let mut reader = BitReader::new(bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("s"), Some(&Value::Str("Hello".to_string())));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn string_fixed_truncates_longer_text_and_zero_pads_shorter_text() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Label").with_field(FieldDescriptor::new(
        "s",
        FieldKind::StringFixed {
            size_expr: Arc::from("3"),
            charset: framewire::charset::Charset::Ascii,
        },
    ));

    let mut long = Record::new("Label");
    long.set("s", Value::Str("abcdef".to_string()));
    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &long, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), b"abc");

    let mut short = Record::new("Label");
    short.set("s", Value::Str("ab".to_string()));
    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &short, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), [b'a', b'b', 0x00]);
}

#[test]
fn scenario_c_bit_set_little_endian() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Flags").with_field(FieldDescriptor::new(
        "bs",
        FieldKind::BitSet {
            size_expr: Arc::from("12"),
            endian: Endian::Little,
        },
    ));

    let bytes = [0xF0, 0x0F];
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("bs"), Some(&Value::BitSet(vec![0, 1, 2, 3])));
}

#[test]
fn scenario_d_choice_with_prefix() {
    let codecs = CodecTable::standard();
    let variant_a = Arc::new(MessageDescriptor::new("A").with_field(int_field("value", IntWidth::Byte, Endian::Big, false)));
    let variant_b = Arc::new(MessageDescriptor::new("B").with_field(int_field("value", IntWidth::Short, Endian::Big, false)));
    let table = ChoiceTable::new(8)
        .with_alternative(variant_a.clone(), "prefix == 1")
        .with_alternative(variant_b.clone(), "prefix == 2");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
        "m",
        FieldKind::Object {
            nested: variant_a,
            choice: Some(table),
        },
    ));

    let bytes_a = [0x01, 0x2A];
    let mut reader = BitReader::new(&bytes_a);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    let obj = decoded.get("m").unwrap().as_object().unwrap();
    assert_eq!(obj.type_name, "A");
    assert_eq!(obj.get("value"), Some(&Value::U8(0x2A)));

    let bytes_b = [0x02, 0x00, 0x2A];
    let mut reader = BitReader::new(&bytes_b);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    let obj = decoded.get("m").unwrap().as_object().unwrap();
    assert_eq!(obj.type_name, "B");

    let bytes_unknown = [0x03, 0x00];
    let mut reader = BitReader::new(&bytes_unknown);
    assert_matches!(decode_message(&codecs, &desc, &mut reader, None), Err(Error::NoMatchingAlternative(_)));

    // Re-encoding variant B writes its prefix back and round-trips exactly.
    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes_b);
}

#[test]
fn scenario_e_crc16_ccitt_false_checksum() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Frame")
        .with_field(int_field("a", IntWidth::Byte, Endian::Big, false))
        .with_field(int_field("b", IntWidth::Byte, Endian::Big, false))
        .with_field(FieldDescriptor::new(
            "crc",
            FieldKind::Checksum {
                algorithm: "crc16-ccitt-false",
                seed: 0xFFFF,
                skip_start_expr: Arc::from("0"),
                skip_end_expr: Arc::from("2"),
                width: IntWidth::Short,
            },
        ));

    let good_crc = framewire::codec::checksum::compute("crc16-ccitt-false", &[0x12, 0x34], 0, 2, 0xFFFF).unwrap();
    let mut bytes = vec![0x12, 0x34];
    bytes.extend_from_slice(&(good_crc as u16).to_be_bytes());

    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("a"), Some(&Value::U8(0x12)));

    let mut bad_bytes = bytes.clone();
    bad_bytes[2] ^= 0xFF;
    let mut reader = BitReader::new(&bad_bytes);
    assert_matches!(decode_message(&codecs, &desc, &mut reader, None), Err(Error::ChecksumMismatch { .. }));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn scenario_f_evaluated_field() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Sum")
        .with_field(int_field("x", IntWidth::Int, Endian::Big, true))
        .with_field(int_field("y", IntWidth::Int, Endian::Big, true))
        .with_evaluated(EvaluatedFieldDescriptor {
            name: "sum",
            condition: Arc::from(""),
            value_expr: Arc::from("x + y"),
        });

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2i32.to_be_bytes());
    bytes.extend_from_slice(&3i32.to_be_bytes());
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("sum").and_then(Value::as_i64), Some(5));

    // Evaluated fields never emit bytes: encoding decoded-back-in record
    // reproduces exactly the 8 input bytes.
    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn checksum_covers_only_the_declared_range_with_a_trailing_field() {
    // Regression for the checksum range math: `end` must be the current
    // stream position minus `skipEnd`, not the literal `skipEnd` value,
    // and must account for bytes written after the checksum field. Here
    // the checksum only covers `a`; `b` follows it and must be excluded.
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Frame")
        .with_field(int_field("a", IntWidth::Byte, Endian::Big, false))
        .with_field(FieldDescriptor::new(
            "crc",
            FieldKind::Checksum {
                algorithm: "crc16-ccitt-false",
                seed: 0xFFFF,
                skip_start_expr: Arc::from("0"),
                skip_end_expr: Arc::from("3"),
                width: IntWidth::Short,
            },
        ))
        .with_field(int_field("b", IntWidth::Byte, Endian::Big, false));

    let crc = framewire::codec::checksum::compute("crc16-ccitt-false", &[0x12], 0, 1, 0xFFFF).unwrap();
    let mut bytes = vec![0x12];
    bytes.extend_from_slice(&(crc as u16).to_be_bytes());
    bytes.push(0x99);

    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("a"), Some(&Value::U8(0x12)));
    assert_eq!(decoded.get("b"), Some(&Value::U8(0x99)));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn header_start_and_end_round_trip() {
    let codecs = CodecTable::standard();
    let desc = MessageDescriptor::new("Framed")
        .with_header(Header {
            start: vec![0xCA, 0xFE],
            end: vec![0x00, 0xFF],
        })
        .with_field(int_field("x", IntWidth::Byte, Endian::Big, false));

    let bytes = [0xCA, 0xFE, 0x07, 0x00, 0xFF];
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    assert_eq!(decoded.get("x"), Some(&Value::U8(7)));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn checksum_spec_is_reachable_from_descriptor() {
    let desc = MessageDescriptor::new("Frame").with_field(FieldDescriptor::new(
        "crc",
        FieldKind::Checksum {
            algorithm: "sum8",
            seed: 0,
            skip_start_expr: Arc::from("0"),
            skip_end_expr: Arc::from("0"),
            width: IntWidth::Byte,
        },
    ));
    let (_, spec): (_, ChecksumSpec) = desc.checksum_field().unwrap();
    assert_eq!(spec.algorithm, "sum8");
}

#[test]
fn array_object_choice_with_no_matching_alternative_is_fatal() {
    let codecs = CodecTable::standard();
    let variant_a = Arc::new(MessageDescriptor::new("A").with_field(int_field("value", IntWidth::Byte, Endian::Big, false)));
    let table = ChoiceTable::new(8).with_alternative(variant_a.clone(), "prefix == 1");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
        "items",
        FieldKind::ArrayObject {
            element: variant_a,
            length_expr: Arc::from("2"),
            choice: Some(table),
        },
    ));

    // First element matches (prefix 1), second matches no alternative and
    // has no default -- the whole decode fails, matching `decode_object`'s
    // non-array behavior for the same error.
    let bytes = [0x01, 0x2A, 0x09, 0x00];
    let mut reader = BitReader::new(&bytes);
    assert_matches!(decode_message(&codecs, &desc, &mut reader, None), Err(Error::NoMatchingAlternative(_)));
}

#[test]
fn root_record_is_visible_to_nested_conditions() {
    let codecs = CodecTable::standard();
    let inner = Arc::new(
        MessageDescriptor::new("Inner").with_field(
            FieldDescriptor::new("guarded", FieldKind::Integer {
                width: IntWidth::Byte,
                endian: Endian::Big,
                signed: false,
            })
            .with_condition("root.flag == 1"),
        ),
    );
    let desc = MessageDescriptor::new("Outer")
        .with_field(int_field("flag", IntWidth::Byte, Endian::Big, false))
        .with_field(FieldDescriptor::new("inner", FieldKind::Object { nested: inner, choice: None }));

    let bytes = [0x01, 0x09];
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    let inner_record: &Record = decoded.get("inner").unwrap().as_object().unwrap();
    assert_eq!(inner_record.get("guarded"), Some(&Value::U8(0x09)));
}

#[test]
fn choice_with_zero_prefix_bits_selects_by_condition_only() {
    // prefixSize == 0: no prefix bits read or written, selection (and its
    // inverse on encode) goes purely by condition, per spec.md's
    // condition-only choice shape.
    let codecs = CodecTable::standard();
    let variant_a = Arc::new(MessageDescriptor::new("A").with_field(int_field("kind", IntWidth::Byte, Endian::Big, false)));
    let table = ChoiceTable::new(0).with_alternative(variant_a.clone(), "self.kind == 1");
    let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
        "m",
        FieldKind::Object {
            nested: variant_a,
            choice: Some(table),
        },
    ));

    let bytes = [0x01];
    let mut reader = BitReader::new(&bytes);
    let decoded = decode_message(&codecs, &desc, &mut reader, None).unwrap();
    let obj = decoded.get("m").unwrap().as_object().unwrap();
    assert_eq!(obj.get("kind"), Some(&Value::U8(0x01)));

    let mut writer = BitWriter::new();
    encode_message(&codecs, &desc, &decoded, &mut writer, None).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}
