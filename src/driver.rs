//! The message driver (§4.6): walks a [`MessageDescriptor`]'s fields in
//! declaration order, dispatching each through the codec table, running
//! skips and conditions, verifying or back-patching the checksum field,
//! and finally populating evaluated fields once every byte-consuming
//! field has been read or written. Choice-table polymorphism for
//! `Object`/`ArrayObject` fields is resolved inside their own codecs
//! (`codec::object`, `codec::array`), which recurse back into
//! [`decode_message`]/[`encode_message`].

use crate::bits::{BitReader, BitWriter};
use crate::codec::{CodecKind, CodecTable};
use crate::context::Scope;
use crate::descriptor::{FieldKind, MessageDescriptor, Skip};
use crate::error::{Error, FieldError, Result};
use crate::value::{Record, Value};

fn at(msg_type: &'static str, field: &'static str) -> FieldError {
    FieldError {
        type_name: msg_type,
        field_name: field,
    }
}

fn process_skips(msg_type: &'static str, field_name: &'static str, skips: &[Skip], reader: &mut BitReader, scope: &Scope) -> Result<()> {
    for skip in skips {
        match skip {
            Skip::Size { size_expr, condition } => {
                if crate::eval::eval_bool(condition, scope).map_err(|e| Error::decode(at(msg_type, field_name), e.to_string()))? {
                    let n_bits = crate::eval::eval_size(size_expr, scope).map_err(|e| Error::decode(at(msg_type, field_name), e.to_string()))?;
                    reader.skip(n_bits)?;
                }
            }
            Skip::Terminator {
                terminator,
                consume,
                condition,
            } => {
                if crate::eval::eval_bool(condition, scope).map_err(|e| Error::decode(at(msg_type, field_name), e.to_string()))? {
                    reader.skip_until(*terminator, *consume)?;
                }
            }
        }
    }
    Ok(())
}

fn write_skips(msg_type: &'static str, field_name: &'static str, skips: &[Skip], writer: &mut BitWriter, scope: &Scope) -> Result<()> {
    for skip in skips {
        match skip {
            Skip::Size { size_expr, condition } => {
                if crate::eval::eval_bool(condition, scope).map_err(|e| Error::encode(at(msg_type, field_name), e.to_string()))? {
                    let n_bits = crate::eval::eval_size(size_expr, scope).map_err(|e| Error::encode(at(msg_type, field_name), e.to_string()))?;
                    writer.put_bits(&crate::bits::BitString(vec![false; n_bits]));
                }
            }
            Skip::Terminator { terminator, .. } => {
                writer.put_terminator(*terminator);
            }
        }
    }
    Ok(())
}

/// Reads `desc`'s fields from `reader` into a fresh [`Record`]. `root` is
/// the outermost record of the current decode call; `None` at the top
/// level means "this call establishes the root", which recursive
/// `Object`/`ArrayObject` codecs never pass -- they always thread their
/// own `root` down.
pub fn decode_message(codecs: &CodecTable, desc: &MessageDescriptor, reader: &mut BitReader, root: Option<&Record>) -> Result<Record> {
    if !desc.header.start.is_empty() {
        let got = reader.get_text(desc.header.start.len())?;
        if got != desc.header.start {
            return Err(Error::BadTerminator {
                expected: desc.header.start.clone(),
                actual: got,
            });
        }
    }

    let message_start = reader.position() / 8;
    let mut record = Record::new(desc.type_name);
    for field in &desc.fields {
        let scope = Scope::nested(root.unwrap_or(&record), &record, None);
        if !crate::eval::eval_bool(&field.condition, &scope).map_err(|e| Error::decode(at(desc.type_name, field.name), e.to_string()))? {
            continue;
        }
        process_skips(desc.type_name, field.name, &field.skips, reader, &scope)?;

        let kind = field.kind.codec_kind();
        let entry = codecs.get(kind).ok_or(Error::NoCodec(kind))?;
        let value = (entry.decode)(codecs, desc.type_name, field, reader, root.unwrap_or(&record), &record)?;
        record.set(field.name, value);
    }

    if let Some((field, spec)) = desc.checksum_field() {
        verify_checksum(desc.type_name, field.name, &spec, message_start, reader, &record, root.unwrap_or(&record))?;
    }

    for evaluated in &desc.evaluated {
        let scope = Scope::nested(root.unwrap_or(&record), &record, None);
        if crate::eval::eval_bool(&evaluated.condition, &scope).map_err(|e| Error::decode(at(desc.type_name, evaluated.name), e.to_string()))? {
            let value = crate::eval::Expr::parse(&evaluated.value_expr)
                .and_then(|expr| expr.eval(&scope))
                .map_err(|e| Error::decode(at(desc.type_name, evaluated.name), e.to_string()))?;
            record.set(evaluated.name, value);
        }
    }

    if !desc.header.end.is_empty() {
        let got = reader.get_text(desc.header.end.len())?;
        if got != desc.header.end {
            return Err(Error::BadTerminator {
                expected: desc.header.end.clone(),
                actual: got,
            });
        }
    }

    Ok(record)
}

fn verify_checksum(
    msg_type: &'static str,
    field_name: &'static str,
    spec: &crate::descriptor::ChecksumSpec,
    message_start: usize,
    reader: &BitReader,
    record: &Record,
    root: &Record,
) -> Result<()> {
    let scope = Scope::nested(root, record, None);
    let skip_start = crate::eval::eval_size(&spec.skip_start_expr, &scope).map_err(|e| Error::decode(at(msg_type, field_name), e.to_string()))?;
    let skip_end = crate::eval::eval_size(&spec.skip_end_expr, &scope).map_err(|e| Error::decode(at(msg_type, field_name), e.to_string()))?;
    let start = message_start + skip_start;
    let end = reader.position() / 8 - skip_end;
    let expected = record
        .get(spec.field_name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::decode(at(msg_type, field_name), "checksum field did not decode to an integer"))? as u64;
    let actual = crate::codec::checksum::compute(spec.algorithm, reader.bytes(), start, end, spec.seed)
        .ok_or_else(|| Error::decode(at(msg_type, field_name), format!("unknown checksum algorithm `{}`", spec.algorithm)))?;
    if expected != actual {
        return Err(Error::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Writes `record` against `desc` into `writer`. A checksum field is
/// reserved at its declared width during the main pass, then the whole
/// span is hashed and back-patched once the message (and its `end`
/// header) is fully written.
pub fn encode_message(codecs: &CodecTable, desc: &MessageDescriptor, record: &Record, writer: &mut BitWriter, root: Option<&Record>) -> Result<()> {
    if !desc.header.start.is_empty() {
        writer.put_text(&desc.header.start);
    }

    let message_start = writer.bytes().len();
    let mut checksum_patch: Option<(usize, crate::descriptor::ChecksumSpec)> = None;

    for field in &desc.fields {
        let scope = Scope::nested(root.unwrap_or(record), record, None);
        if !crate::eval::eval_bool(&field.condition, &scope).map_err(|e| Error::encode(at(desc.type_name, field.name), e.to_string()))? {
            continue;
        }
        write_skips(desc.type_name, field.name, &field.skips, writer, &scope)?;

        let kind = field.kind.codec_kind();
        let entry = codecs.get(kind).ok_or(Error::NoCodec(kind))?;
        let value = record.get(field.name).cloned().unwrap_or(Value::Null);

        if kind == CodecKind::Checksum {
            let patch_at = writer.bytes().len();
            (entry.encode)(codecs, desc.type_name, field, &value, writer, root.unwrap_or(record), record)?;
            let spec = desc.checksum_field().map(|(_, s)| s).expect("checksum field kind implies checksum_field()");
            checksum_patch = Some((patch_at, spec));
        } else {
            (entry.encode)(codecs, desc.type_name, field, &value, writer, root.unwrap_or(record), record)?;
        }
    }

    if !desc.header.end.is_empty() {
        writer.put_text(&desc.header.end);
    }

    if let Some((patch_at, spec)) = checksum_patch {
        let scope = Scope::nested(root.unwrap_or(record), record, None);
        let skip_start =
            crate::eval::eval_size(&spec.skip_start_expr, &scope).map_err(|e| Error::encode(at(desc.type_name, spec.field_name), e.to_string()))?;
        let skip_end =
            crate::eval::eval_size(&spec.skip_end_expr, &scope).map_err(|e| Error::encode(at(desc.type_name, spec.field_name), e.to_string()))?;
        let start = message_start + skip_start;
        let end = writer.bytes().len() - skip_end;
        let checksum = crate::codec::checksum::compute(spec.algorithm, writer.bytes(), start, end, spec.seed)
            .ok_or_else(|| Error::encode(at(desc.type_name, spec.field_name), format!("unknown checksum algorithm `{}`", spec.algorithm)))?;
        let width_bytes = spec.width.bits() / 8;
        let bytes = checksum.to_be_bytes();
        writer.patch_bytes(patch_at, &bytes[bytes.len() - width_bytes..]);
    }

    Ok(())
}
