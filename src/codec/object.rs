use std::sync::Arc;

use super::CodecTable;
use crate::bits::{BitReader, BitString, BitWriter};
use crate::descriptor::{ChoiceTable, FieldDescriptor, FieldKind, MessageDescriptor};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &FieldDescriptor) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field.name,
    }
}

pub fn decode_object(
    codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    reader: &mut BitReader,
    root: &Record,
    _current: &Record,
) -> Result<Value> {
    let FieldKind::Object { nested, choice } = &field.kind else {
        unreachable!()
    };
    let resolved = resolve_choice(msg_type, field.name, nested, choice.as_ref(), reader)?;
    let obj = crate::driver::decode_message(codecs, &resolved, reader, Some(root))?;
    Ok(Value::Object(obj))
}

pub fn encode_object(
    codecs: &CodecTable,
    msg_type: &'static str,
    field: &FieldDescriptor,
    value: &Value,
    writer: &mut BitWriter,
    root: &Record,
    _current: &Record,
) -> Result<()> {
    let FieldKind::Object { nested, choice } = &field.kind else {
        unreachable!()
    };
    let Value::Object(obj) = value else {
        return Err(Error::encode(at(msg_type, field), "expected an object value"));
    };
    encode_with_choice(codecs, msg_type, field.name, nested, choice.as_ref(), obj, writer, root)
}

/// Reads the choice prefix (if any) and picks the alternative whose
/// condition it satisfies, falling back to `default`. With no choice
/// table, the field's single declared type is used unconditionally.
pub(super) fn resolve_choice(
    msg_type: &'static str,
    field_name: &'static str,
    declared: &Arc<MessageDescriptor>,
    choice: Option<&ChoiceTable>,
    reader: &mut BitReader,
) -> Result<Arc<MessageDescriptor>> {
    let Some(table) = choice else {
        return Ok(declared.clone());
    };
    let empty = Record::new(declared.type_name);
    let raw = reader.get_bits(table.prefix_bits as usize)?;
    let prefix = raw.to_u64() as i64;
    let scope = crate::context::Scope::nested(&empty, &empty, None).with_prefix(prefix);
    for (candidate, condition) in &table.alternatives {
        if crate::eval::eval_bool(condition, &scope).map_err(|e| {
            Error::decode(
                FieldError {
                    type_name: msg_type,
                    field_name,
                },
                e.to_string(),
            )
        })? {
            return Ok(candidate.clone());
        }
    }
    if let Some(default) = &table.default {
        return Ok(default.clone());
    }
    Err(Error::NoMatchingAlternative(FieldError {
        type_name: msg_type,
        field_name,
    }))
}

/// Writes `record` under `choice`'s table, first matching it to an
/// alternative by its runtime type name and writing that alternative's
/// prefix value, or encodes directly against `declared` with no choice
/// table at all.
pub(super) fn encode_with_choice(
    codecs: &CodecTable,
    msg_type: &'static str,
    field_name: &'static str,
    declared: &Arc<MessageDescriptor>,
    choice: Option<&ChoiceTable>,
    record: &Record,
    writer: &mut BitWriter,
    root: &Record,
) -> Result<()> {
    let Some(table) = choice else {
        return crate::driver::encode_message(codecs, declared, record, writer, Some(root));
    };
    let (resolved, condition) = table
        .alternatives
        .iter()
        .find(|(desc, _)| desc.type_name == record.type_name)
        .map(|(desc, condition)| (desc.clone(), condition.clone()))
        .or_else(|| table.default.clone().map(|desc| (desc, Arc::from(""))))
        .ok_or_else(|| {
            Error::NoMatchingAlternative(FieldError {
                type_name: msg_type,
                field_name,
            })
        })?;
    if table.prefix_bits > 0 {
        let prefix = literal_prefix_value(&condition).ok_or_else(|| {
            Error::encode(
                FieldError {
                    type_name: msg_type,
                    field_name,
                },
                format!("choice condition `{condition}` is not a literal `prefix == N` equality the encoder can invert"),
            )
        })?;
        writer.put_bits(&BitString::from_u64(prefix, table.prefix_bits as usize));
    }
    crate::driver::encode_message(codecs, &resolved, record, writer, Some(root))
}

/// Recovers the concrete prefix value a choice alternative's condition
/// demands, for the small closed vocabulary (`prefix == N` / `N == prefix`)
/// the descriptor builder emits. A descriptor with a richer condition can
/// still decode but cannot be inverted for encoding.
fn literal_prefix_value(condition: &str) -> Option<u64> {
    use crate::eval::{BinOp, Expr};
    let expr = Expr::parse(condition).ok()?;
    let Expr::Binary(lhs, BinOp::Eq, rhs) = expr else {
        return None;
    };
    match (*lhs, *rhs) {
        (Expr::Ident(name), Expr::Number(n)) if name == "prefix" => Some(n as u64),
        (Expr::Number(n), Expr::Ident(name)) if name == "prefix" => Some(n as u64),
        _ => None,
    }
}
