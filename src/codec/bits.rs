use crate::bits::{BitReader, BitString, BitWriter, Endian};
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

/// Little-endian `Bits`/`BitSet` semantics are realized by reversing the
/// run read in wire (MSB-first) order across its *full* length -- not a
/// per-byte swap -- per the bit-order note in §3.
fn oriented(bits: BitString, endian: Endian) -> BitString {
    match endian {
        Endian::Big => bits,
        Endian::Little => bits.reversed(),
    }
}

pub fn decode_bits(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::Bits { size_expr, endian } = &field.kind else {
        unreachable!()
    };
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let raw = reader.get_bits(n_bits)?;
    let wire = Value::Bits(oriented(raw, *endian));
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_bits(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::Bits { size_expr, endian } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::encode(at(msg_type, field), e.to_string()))?;
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let Value::Bits(bits) = wire else {
        return Err(Error::encode(at(msg_type, field), "expected a Bits value"));
    };
    if bits.len() != n_bits {
        return Err(Error::SizeMismatch {
            at: at(msg_type, field),
            declared: n_bits,
            actual: bits.len(),
        });
    }
    writer.put_bits(&oriented(bits, *endian));
    Ok(())
}

pub fn decode_bit_set(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::BitSet { size_expr, endian } = &field.kind else {
        unreachable!()
    };
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let raw = reader.get_bits(n_bits)?;
    let oriented = oriented(raw, *endian);
    let wire = Value::BitSet(oriented.set_indices());
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_bit_set(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::BitSet { size_expr, endian } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let n_bits = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::encode(at(msg_type, field), e.to_string()))?;
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let Value::BitSet(indices) = wire else {
        return Err(Error::encode(at(msg_type, field), "expected a BitSet value"));
    };
    let bits = BitString::from_indices(&indices, n_bits);
    writer.put_bits(&oriented(bits, *endian));
    Ok(())
}
