use num_bigint::BigInt;

use crate::bits::{BitReader, BitWriter, Endian};
use crate::context::Scope;
use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &FieldDescriptor) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field.name,
    }
}

fn endian_of(kind: &FieldKind) -> Endian {
    match kind {
        FieldKind::Integer { endian, .. } => *endian,
        FieldKind::BigInteger { endian, .. } => *endian,
        _ => unreachable!("integer codec invoked on non-integer descriptor"),
    }
}

macro_rules! int_codec {
    ($decode_name:ident, $encode_name:ident, $get:ident, $get_signed:ident, $put:ident, $put_signed:ident, $value_variant:ident, $unsigned:ty, $signed:ty) => {
        pub fn $decode_name(
            _codecs: &super::CodecTable,
            msg_type: &'static str,
            field: &FieldDescriptor,
            reader: &mut BitReader,
            root: &Record,
            current: &Record,
        ) -> Result<Value> {
            let FieldKind::Integer { endian, signed, .. } = &field.kind else {
                unreachable!()
            };
            let wire = if *signed {
                Value::$value_variant(reader.$get_signed(*endian)? as $signed as _)
            } else {
                Value::from(reader.$get(*endian)?)
            };
            let scope = Scope::nested(root, current, None);
            let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
            field.validator.validate(&converted, at(msg_type, field))?;
            Ok(converted)
        }

        pub fn $encode_name(
            _codecs: &super::CodecTable,
            msg_type: &'static str,
            field: &FieldDescriptor,
            value: &Value,
            writer: &mut BitWriter,
            root: &Record,
            current: &Record,
        ) -> Result<()> {
            let FieldKind::Integer { endian, signed, .. } = &field.kind else {
                unreachable!()
            };
            field.validator.validate(value, at(msg_type, field))?;
            let scope = Scope::nested(root, current, None);
            let wire = field
                .converters
                .encode(value.clone(), &scope, at(msg_type, field))?;
            if *signed {
                let n = wire
                    .as_i64()
                    .ok_or_else(|| Error::encode(at(msg_type, field), "expected an integer value"))?;
                writer.$put_signed(n as $signed, *endian);
            } else {
                let n = wire
                    .as_i64()
                    .ok_or_else(|| Error::encode(at(msg_type, field), "expected an integer value"))?;
                writer.$put(n as $unsigned, *endian);
            }
            Ok(())
        }
    };
}

int_codec!(decode_byte, encode_byte, get_u8, get_i8, put_u8, put_i8, I8, u8, i8);
int_codec!(decode_short, encode_short, get_u16, get_i16, put_u16, put_i16, I16, u16, i16);
int_codec!(decode_int, encode_int, get_u32, get_i32, put_u32, put_i32, I32, u32, i32);
int_codec!(decode_long, encode_long, get_u64, get_i64, put_u64, put_i64, I64, u64, i64);

pub fn decode_big_integer(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::BigInteger { size_expr, signed, .. } = &field.kind else {
        unreachable!()
    };
    let endian = endian_of(&field.kind);
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let bytes = reader.get_big_int_bytes(n_bits, endian)?;
    let magnitude = BigInt::from_bytes_be(num_bigint::Sign::Plus, &bytes);
    let value = if *signed && n_bits > 0 && bit_is_set(&bytes, n_bits) {
        magnitude - (BigInt::from(1u8) << n_bits)
    } else {
        magnitude
    };
    let wire = Value::BigInt(value);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

fn bit_is_set(bytes: &[u8], n_bits: usize) -> bool {
    if bytes.is_empty() || n_bits == 0 {
        return false;
    }
    let pad = bytes.len() * 8 - n_bits;
    (bytes[0] >> (7 - pad)) & 1 == 1
}

pub fn encode_big_integer(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::BigInteger { size_expr, .. } = &field.kind else {
        unreachable!()
    };
    let endian = endian_of(&field.kind);
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::encode(at(msg_type, field), e.to_string()))?;
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let Value::BigInt(n) = wire else {
        return Err(Error::encode(at(msg_type, field), "expected a BigInteger value"));
    };
    let n_bytes = n_bits.div_ceil(8);
    let normalized = if n.sign() == num_bigint::Sign::Minus {
        n.clone() + (BigInt::from(1u8) << n_bits)
    } else {
        n
    };
    let (_, mut bytes) = normalized.to_bytes_be();
    while bytes.len() < n_bytes {
        bytes.insert(0, 0);
    }
    if bytes.len() > n_bytes {
        bytes = bytes[bytes.len() - n_bytes..].to_vec();
    }
    writer.put_big_int_bytes(&bytes, n_bits, endian);
    Ok(())
}
