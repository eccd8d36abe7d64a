//! Descriptor validator (§4.7): structural and semantic checks run once
//! on a descriptor list before first use. A descriptor list that fails
//! here is rejected at load time with `Error::AnnotationError` rather
//! than surfacing as a decode/encode-time panic or silent misbehavior.
//!
//! Several checks §4.7 lists are structurally unrepresentable in this
//! model and so need no runtime check: `Object`'s nested type is always
//! an `Arc<MessageDescriptor>` (never a primitive), `ArrayPrimitive`'s
//! element is always a `PrimitiveKind` and `ArrayObject`'s is always an
//! `Arc<MessageDescriptor>`, `Checksum`'s width is always an `IntWidth`,
//! and `BigDecimal`'s underlying width is always `FloatWidth::Float` or
//! `::Double` -- Rust's enums make the invalid states unconstructible.
//! What remains are the checks a type system alone can't give us: every
//! kind actually has a registered codec, choice tables are internally
//! consistent, and every expression a descriptor carries at least
//! parses.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::CodecTable;
use crate::descriptor::{ChoiceTable, FieldKind, MessageDescriptor};
use crate::error::{Error, Result};
use crate::eval::Expr;

/// Validates `desc` and everything it reaches transitively through
/// `Object`/`ArrayObject` fields and choice-table alternatives. Shared
/// submessages (the same `Arc<MessageDescriptor>` reachable through more
/// than one path) are validated once; message graphs are assumed to be a
/// DAG (§9), so pointer-identity tracking is sufficient to terminate.
pub fn validate(desc: &MessageDescriptor, codecs: &CodecTable) -> Result<()> {
    let mut seen = HashSet::new();
    validate_one(desc, codecs, &mut seen)?;
    crate::log::descriptor_validated(desc.type_name, desc.fields.len());
    Ok(())
}

fn validate_one(desc: &MessageDescriptor, codecs: &CodecTable, seen: &mut HashSet<*const MessageDescriptor>) -> Result<()> {
    if !seen.insert(desc as *const MessageDescriptor) {
        return Ok(());
    }

    for field in &desc.fields {
        reject(desc, field.name, parse_check(&field.condition))?;
        for condition in field.converters.conditions() {
            reject(desc, field.name, parse_check(condition))?;
        }

        let kind = field.kind.codec_kind();
        if codecs.get(kind).is_none() {
            return Err(Error::AnnotationError(desc.type_name, format!("field `{}`: no codec registered for {kind:?}", field.name)));
        }

        for skip in &field.skips {
            match skip {
                crate::descriptor::Skip::Size { size_expr, condition } => {
                    reject(desc, field.name, parse_check(size_expr))?;
                    reject(desc, field.name, parse_check(condition))?;
                }
                crate::descriptor::Skip::Terminator { condition, .. } => {
                    reject(desc, field.name, parse_check(condition))?;
                }
            }
        }

        match &field.kind {
            FieldKind::BigInteger { size_expr, .. } | FieldKind::Bits { size_expr, .. } | FieldKind::BitSet { size_expr, .. } => {
                reject(desc, field.name, parse_check(size_expr))?;
            }
            FieldKind::StringFixed { size_expr, .. } => {
                reject(desc, field.name, parse_check(size_expr))?;
            }
            FieldKind::ArrayPrimitive { element, length_expr, .. } => {
                reject(desc, field.name, parse_check(length_expr))?;
                if codecs.get(element.codec_kind()).is_none() {
                    return Err(Error::AnnotationError(
                        desc.type_name,
                        format!("field `{}`: no codec registered for array element kind {:?}", field.name, element.codec_kind()),
                    ));
                }
            }
            FieldKind::ArrayObject { element, length_expr, choice } => {
                reject(desc, field.name, parse_check(length_expr))?;
                validate_choice(desc, field.name, element, choice.as_ref())?;
                validate_one(element, codecs, seen)?;
                if let Some(table) = choice {
                    for (alt, _) in &table.alternatives {
                        validate_one(alt, codecs, seen)?;
                    }
                    if let Some(default) = &table.default {
                        validate_one(default, codecs, seen)?;
                    }
                }
            }
            FieldKind::Object { nested, choice } => {
                validate_choice(desc, field.name, nested, choice.as_ref())?;
                validate_one(nested, codecs, seen)?;
                if let Some(table) = choice {
                    for (alt, _) in &table.alternatives {
                        validate_one(alt, codecs, seen)?;
                    }
                    if let Some(default) = &table.default {
                        validate_one(default, codecs, seen)?;
                    }
                }
            }
            FieldKind::Checksum {
                skip_start_expr,
                skip_end_expr,
                ..
            } => {
                reject(desc, field.name, parse_check(skip_start_expr))?;
                reject(desc, field.name, parse_check(skip_end_expr))?;
                check_non_negative_literal(desc, field.name, skip_start_expr)?;
                check_non_negative_literal(desc, field.name, skip_end_expr)?;
            }
            _ => {}
        }
    }

    for evaluated in &desc.evaluated {
        reject(desc, evaluated.name, parse_check(&evaluated.condition))?;
        reject(desc, evaluated.name, parse_check(&evaluated.value_expr))?;
    }

    Ok(())
}

fn reject(desc: &MessageDescriptor, field_name: &'static str, outcome: std::result::Result<(), String>) -> Result<()> {
    outcome.map_err(|message| Error::AnnotationError(desc.type_name, format!("field `{field_name}`: {message}")))
}

fn parse_check(expr: &str) -> std::result::Result<(), String> {
    Expr::parse(expr).map(|_| ()).map_err(|e| e.to_string())
}

/// `skipStart`/`skipEnd` are only checkable at load time when they are
/// literal (all-digit) sizes; descriptor-driven ones are checked
/// post-hoc during decode, since their value depends on the message.
fn check_non_negative_literal(desc: &MessageDescriptor, field_name: &'static str, expr: &str) -> Result<()> {
    let trimmed = expr.trim();
    if trimmed.is_empty() || trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        if n < 0 {
            return Err(Error::AnnotationError(
                desc.type_name,
                format!("field `{field_name}`: checksum skip `{trimmed}` is negative"),
            ));
        }
    }
    Ok(())
}

/// §3's choice-table invariant: `prefixSize > 0 ⇔` every condition
/// references `prefix`; a zero-width prefix means no alternative may
/// reference it either, since nothing ever binds it in scope.
fn validate_choice(desc: &MessageDescriptor, field_name: &'static str, _declared: &Arc<MessageDescriptor>, choice: Option<&ChoiceTable>) -> Result<()> {
    let Some(table) = choice else {
        return Ok(());
    };
    if table.prefix_bits > 32 {
        return Err(Error::AnnotationError(
            desc.type_name,
            format!("field `{field_name}`: choice prefix width {} exceeds 32 bits", table.prefix_bits),
        ));
    }
    if table.prefix_bits > 0 && table.alternatives.is_empty() {
        return Err(Error::AnnotationError(
            desc.type_name,
            format!("field `{field_name}`: choice table declares a prefix but has no alternatives"),
        ));
    }
    for (_, condition) in &table.alternatives {
        if condition.trim().is_empty() {
            return Err(Error::AnnotationError(desc.type_name, format!("field `{field_name}`: choice alternative has an empty condition")));
        }
        let references_prefix = references_ident(condition, "prefix")?;
        if (table.prefix_bits > 0) != references_prefix {
            return Err(Error::AnnotationError(
                desc.type_name,
                format!(
                    "field `{field_name}`: condition `{condition}` {} `prefix`, but the table's prefix width is {}",
                    if references_prefix { "references" } else { "must reference" },
                    table.prefix_bits
                ),
            ));
        }
    }
    Ok(())
}

fn references_ident(expr: &str, name: &str) -> Result<bool> {
    fn walk(expr: &Expr, name: &str) -> bool {
        match expr {
            Expr::Ident(n) => n == name,
            Expr::Member(base, _) => walk(base, name),
            Expr::Unary(_, inner) => walk(inner, name),
            Expr::Binary(lhs, _, rhs) => walk(lhs, name) || walk(rhs, name),
            Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) => false,
        }
    }
    let parsed = Expr::parse(expr).map_err(|e| Error::AnnotationError("ChoiceTable", e.to_string()))?;
    Ok(walk(&parsed, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Endian;
    use crate::descriptor::{FieldDescriptor, IntWidth};

    fn leaf(name: &'static str) -> MessageDescriptor {
        MessageDescriptor::new(name).with_field(FieldDescriptor::new(
            "a",
            FieldKind::Integer {
                width: IntWidth::Byte,
                endian: Endian::Big,
                signed: false,
            },
        ))
    }

    #[test]
    fn flat_descriptor_is_valid() {
        let codecs = CodecTable::standard();
        assert!(validate(&leaf("Leaf"), &codecs).is_ok());
    }

    #[test]
    fn malformed_condition_is_rejected() {
        let codecs = CodecTable::standard();
        let desc = MessageDescriptor::new("Bad").with_field(
            FieldDescriptor::new(
                "a",
                FieldKind::Integer {
                    width: IntWidth::Byte,
                    endian: Endian::Big,
                    signed: false,
                },
            )
            .with_condition("x ==="),
        );
        assert!(matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..))));
    }

    #[test]
    fn choice_prefix_without_reference_is_rejected() {
        let codecs = CodecTable::standard();
        let a = Arc::new(leaf("A"));
        let table = ChoiceTable::new(8).with_alternative(a.clone(), "self.x == 1");
        let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
            "m",
            FieldKind::Object { nested: a, choice: Some(table) },
        ));
        assert!(matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..))));
    }

    #[test]
    fn choice_prefix_with_reference_is_accepted() {
        let codecs = CodecTable::standard();
        let a = Arc::new(leaf("A"));
        let table = ChoiceTable::new(8).with_alternative(a.clone(), "prefix == 1");
        let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
            "m",
            FieldKind::Object { nested: a, choice: Some(table) },
        ));
        assert!(validate(&desc, &codecs).is_ok());
    }

    #[test]
    fn zero_width_prefix_referencing_prefix_is_rejected() {
        let codecs = CodecTable::standard();
        let a = Arc::new(leaf("A"));
        let table = ChoiceTable::new(0).with_alternative(a.clone(), "prefix == 1");
        let desc = MessageDescriptor::new("Outer").with_field(FieldDescriptor::new(
            "m",
            FieldKind::Object { nested: a, choice: Some(table) },
        ));
        assert!(matches!(validate(&desc, &codecs), Err(Error::AnnotationError(..))));
    }

    #[test]
    fn shared_submessage_is_validated_once() {
        let codecs = CodecTable::standard();
        let shared = Arc::new(leaf("Shared"));
        let desc = MessageDescriptor::new("Outer")
            .with_field(FieldDescriptor::new(
                "first",
                FieldKind::Object {
                    nested: shared.clone(),
                    choice: None,
                },
            ))
            .with_field(FieldDescriptor::new("second", FieldKind::Object { nested: shared, choice: None }));
        assert!(validate(&desc, &codecs).is_ok());
    }
}
