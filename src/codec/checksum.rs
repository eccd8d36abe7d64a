//! The `Checksum` field kind and its pluggable algorithm registry.
//! Decoding just reads the declared-width integer; verifying it against
//! the message bytes and back-patching it on encode are the driver's
//! job (§4.6) since both need the whole message's byte span.

use super::CodecTable;
use crate::bits::{BitReader, BitString, BitWriter, Endian};
use crate::descriptor::{FieldDescriptor, FieldKind, IntWidth};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &FieldDescriptor) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field.name,
    }
}

pub fn decode_checksum(
    _codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::Checksum { width, .. } = &field.kind else {
        unreachable!()
    };
    let raw = match width {
        IntWidth::Byte => reader.get_u8(Endian::Big)? as u64,
        IntWidth::Short => reader.get_u16(Endian::Big)? as u64,
        IntWidth::Int => reader.get_u32(Endian::Big)? as u64,
        IntWidth::Long => reader.get_u64(Endian::Big)?,
    };
    let wire = Value::U64(raw);
    let scope = crate::context::Scope::nested(root, current, None);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

/// Reserves the field's declared width with zero bits. The driver
/// overwrites this span once the real checksum is known.
pub fn encode_checksum(
    _codecs: &CodecTable,
    _msg_type: &'static str,
    field: &FieldDescriptor,
    _value: &Value,
    writer: &mut BitWriter,
    _root: &Record,
    _current: &Record,
) -> Result<()> {
    let FieldKind::Checksum { width, .. } = &field.kind else {
        unreachable!()
    };
    writer.put_bits(&BitString(vec![false; width.bits()]));
    Ok(())
}

/// Computes a named checksum algorithm over `bytes[start..end]`, seeded
/// by `seed`. Returns `None` for an algorithm name the registry doesn't
/// recognize.
pub fn compute(algorithm: &str, bytes: &[u8], start: usize, end: usize, seed: u64) -> Option<u64> {
    let span = bytes.get(start..end)?;
    match algorithm {
        "crc16-ccitt-false" => Some(crc16_ccitt_false(span, seed as u16) as u64),
        "crc32" => Some(crc32(span, seed as u32) as u64),
        "sum8" => Some(span.iter().fold(seed as u8, |acc, &b| acc.wrapping_add(b)) as u64),
        _ => None,
    }
}

/// CRC-16/CCITT-FALSE: polynomial 0x1021, no input/output reflection,
/// `seed` as the initial register value (conventionally 0xFFFF).
fn crc16_ccitt_false(data: &[u8], seed: u16) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

/// CRC-32 (IEEE 802.3), reflected, polynomial 0xEDB88320.
fn crc32(data: &[u8], seed: u32) -> u32 {
    let mut crc = seed;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB88320 } else { crc >> 1 };
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc16_ccitt_false_known_vector() {
        // "123456789" -> 0x29B1 is the standard CRC-16/CCITT-FALSE check value.
        assert_eq!(crc16_ccitt_false(b"123456789", 0xFFFF), 0x29B1);
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32(b"123456789", 0xFFFF_FFFF), 0xCBF4_3926);
    }
}
