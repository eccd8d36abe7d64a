use crate::bits::{BitReader, BitWriter};
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

pub fn decode_fixed(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::StringFixed { size_expr, charset } = &field.kind else {
        unreachable!()
    };
    let scope = Scope::nested(root, current, None);
    let n_bytes = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::decode(at(msg_type, field), e.to_string()))?;
    let bytes = reader.get_text(n_bytes)?;
    let text = charset.decode(&bytes, at(msg_type, field))?;
    let wire = Value::Str(text);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_fixed(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::StringFixed { size_expr, charset } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let n_bytes = crate::eval::eval_size(size_expr, &scope).map_err(|e| Error::encode(at(msg_type, field), e.to_string()))?;
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let text = wire
        .as_str()
        .ok_or_else(|| Error::encode(at(msg_type, field), "expected a string value"))?;
    let mut bytes = charset.encode(text, at(msg_type, field))?;
    // Truncating encode per §4.4: longer text is cut to the declared
    // width, shorter text is zero-padded.
    bytes.resize(n_bytes, 0);
    writer.put_text(&bytes);
    Ok(())
}

pub fn decode_terminated(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    current: &Record,
) -> Result<Value> {
    let FieldKind::StringTerminated {
        terminator,
        consume_terminator,
        charset,
    } = &field.kind
    else {
        unreachable!()
    };
    let bytes = reader.get_bytes_until(*terminator, *consume_terminator)?;
    let text = charset.decode(&bytes, at(msg_type, field))?;
    let wire = Value::Str(text);
    let scope = Scope::nested(root, current, None);
    let converted = field.converters.decode(wire, &scope, at(msg_type, field))?;
    field.validator.validate(&converted, at(msg_type, field))?;
    Ok(converted)
}

pub fn encode_terminated(
    _codecs: &super::CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    current: &Record,
) -> Result<()> {
    let FieldKind::StringTerminated { terminator, charset, .. } = &field.kind else {
        unreachable!()
    };
    field.validator.validate(value, at(msg_type, field))?;
    let scope = Scope::nested(root, current, None);
    let wire = field.converters.encode(value.clone(), &scope, at(msg_type, field))?;
    let text = wire
        .as_str()
        .ok_or_else(|| Error::encode(at(msg_type, field), "expected a string value"))?;
    let bytes = charset.encode(text, at(msg_type, field))?;
    writer.put_text(&bytes);
    // The terminator is always written regardless of whether it was
    // consumed on read -- §4.4.
    writer.put_terminator(*terminator);
    Ok(())
}
