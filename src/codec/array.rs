use super::CodecTable;
use crate::bits::{BitReader, BitWriter, Endian};
use crate::context::Scope;
use crate::descriptor::{FieldDescriptor, FieldKind, PrimitiveKind};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &FieldDescriptor) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field.name,
    }
}

fn read_element(reader: &mut BitReader, element: PrimitiveKind, endian: Endian) -> Result<Value> {
    Ok(match element {
        PrimitiveKind::Byte => Value::U8(reader.get_u8(endian)?),
        PrimitiveKind::Short => Value::U16(reader.get_u16(endian)?),
        PrimitiveKind::Int => Value::U32(reader.get_u32(endian)?),
        PrimitiveKind::Long => Value::U64(reader.get_u64(endian)?),
        PrimitiveKind::Float => Value::F32(reader.get_f32(endian)?),
        PrimitiveKind::Double => Value::F64(reader.get_f64(endian)?),
    })
}

fn write_element(writer: &mut BitWriter, element: PrimitiveKind, endian: Endian, value: &Value, at: FieldError) -> Result<()> {
    match element {
        PrimitiveKind::Byte => writer.put_u8(value.as_i64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))? as u8, endian),
        PrimitiveKind::Short => writer.put_u16(value.as_i64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))? as u16, endian),
        PrimitiveKind::Int => writer.put_u32(value.as_i64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))? as u32, endian),
        PrimitiveKind::Long => writer.put_u64(value.as_i64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))? as u64, endian),
        PrimitiveKind::Float => writer.put_f32(value.as_f64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))? as f32, endian),
        PrimitiveKind::Double => writer.put_f64(value.as_f64().ok_or_else(|| Error::encode(at, "expected a numeric array element"))?, endian),
    }
    Ok(())
}

/// Reads `length_expr` raw elements, then runs the field's converter
/// pipeline and validator once over the whole array -- element-level
/// conversion is not part of this kind; a converter sees `Value::Array`.
pub fn decode_primitive_array(
    _codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::ArrayPrimitive {
        element,
        length_expr,
        endian,
    } = &field.kind
    else {
        unreachable!()
    };
    let scope = Scope::nested(root, current, None);
    let len = crate::eval::eval_size(length_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let mut elements = Vec::with_capacity(len);
    for _ in 0..len {
        elements.push(read_element(reader, *element, *endian)?);
    }
    let wire = Value::Array(elements);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_primitive_array(
    _codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::ArrayPrimitive {
        element,
        length_expr,
        endian,
    } = &field.kind
    else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let len = crate::eval::eval_size(length_expr, &scope).map_err(|e| Error::encode(at(msg_type, field), e.to_string()))?;
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let Value::Array(elements) = wire else {
        return Err(Error::encode(at(msg_type, field), "expected an array value"));
    };
    if elements.len() != len {
        return Err(Error::SizeMismatch {
            at: at(msg_type, field),
            declared: len,
            actual: elements.len(),
        });
    }
    for el in &elements {
        write_element(writer, *element, *endian, el, at(msg_type, field))?;
    }
    Ok(())
}

pub fn decode_object_array(
    codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::ArrayObject {
        element,
        length_expr,
        choice,
    } = &field.kind
    else {
        unreachable!()
    };
    let scope = Scope::nested(root, current, None);
    let len = crate::eval::eval_size(length_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let mut elements = Vec::with_capacity(len);
    for _ in 0..len {
        let resolved = super::object::resolve_choice(msg_type, field.name, element, choice.as_ref(), reader)?;
        elements.push(Value::Object(crate::driver::decode_message(codecs, &resolved, reader, Some(root))?));
    }
    Ok(Value::Array(elements))
}

pub fn encode_object_array(
    codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    _current: &Record,
) -> Result<()> {
    let FieldKind::ArrayObject { element, choice, .. } = &field.kind else {
        unreachable!()
    };
    let Value::Array(elements) = value else {
        return Err(Error::encode(at(msg_type, field), "expected an array value"));
    };
    for el in elements {
        let Value::Object(obj) = el else {
            return Err(Error::encode(at(msg_type, field), "expected an array of objects"));
        };
        super::object::encode_with_choice(codecs, msg_type, field.name, element, choice.as_ref(), obj, writer, root)?;
    }
    Ok(())
}
