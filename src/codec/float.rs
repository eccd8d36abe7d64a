use bigdecimal::BigDecimal;

use crate::bits::{BitReader, BitWriter};
use crate::context::Scope;
use crate::descriptor::{FieldDescriptor, FieldKind, FloatWidth};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &FieldDescriptor) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field.name,
    }
}

pub fn decode_float(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::Float { endian, .. } = &field.kind else {
        unreachable!()
    };
    let wire = Value::F32(reader.get_f32(*endian)?);
    let scope = Scope::nested(root, current, None);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_float(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::Float { endian, .. } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let n = wire
        .as_f64()
        .ok_or_else(|| Error::encode(at(msg_type, field), "expected a float value"))?;
    writer.put_f32(n as f32, *endian);
    Ok(())
}

pub fn decode_double(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::Float { endian, .. } = &field.kind else {
        unreachable!()
    };
    let wire = Value::F64(reader.get_f64(*endian)?);
    let scope = Scope::nested(root, current, None);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_double(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::Float { endian, .. } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let n = wire
        .as_f64()
        .ok_or_else(|| Error::encode(at(msg_type, field), "expected a double value"))?;
    writer.put_f64(n, *endian);
    Ok(())
}

/// Decodes the underlying float/double then lifts to arbitrary precision
/// exactly -- no rounding, per §4.4.
pub fn decode_big_decimal(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::BigDecimal { width, endian } = &field.kind else {
        unreachable!()
    };
    let exact = match width {
        FloatWidth::Float => BigDecimal::try_from(reader.get_f32(*endian)?),
        FloatWidth::Double => BigDecimal::try_from(reader.get_f64(*endian)?),
    }
    .map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let wire = Value::BigDecimal(exact);
    let scope = Scope::nested(root, current, None);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_big_decimal(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::BigDecimal { width, endian } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let Value::BigDecimal(d) = wire else {
        return Err(Error::encode(at(msg_type, field), "expected a BigDecimal value"));
    };
    use bigdecimal::ToPrimitive;
    match width {
        FloatWidth::Float => {
            let n = d
                .to_f32()
                .ok_or_else(|| Error::encode(at(msg_type, field), "BigDecimal out of f32 range"))?;
            writer.put_f32(n, *endian);
        }
        FloatWidth::Double => {
            let n = d
                .to_f64()
                .ok_or_else(|| Error::encode(at(msg_type, field), "BigDecimal out of f64 range"))?;
            writer.put_f64(n, *endian);
        }
    }
    Ok(())
}
