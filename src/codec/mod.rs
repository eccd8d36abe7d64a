//! Codec dispatch table (§4.3): maps a descriptor-kind tag to its
//! `(decode, encode)` pair. Lookup is O(1); a kind used by a descriptor
//! with no registered entry is a load-time `NoCodec` error.

mod array;
mod bits;
pub(crate) mod checksum;
mod float;
mod integer;
mod object;
mod string;

use std::collections::HashMap;

use crate::bits::{BitReader, BitWriter};
use crate::descriptor::FieldDescriptor;
use crate::error::Result;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Byte,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Bits,
    BitSet,
    StringFixed,
    StringTerminated,
    ArrayPrimitive,
    ArrayObject,
    Object,
    Checksum,
}

/// `(codecs, msg_type, field, reader, root, current)`. `current` is the
/// partially-populated record the field's value will be stored on, used
/// for condition/size evaluation scoped to `self`. `codecs` is threaded
/// through so `Object`/`ArrayObject` can recurse into the driver without
/// the dispatch table needing to know about recursion itself.
pub type DecodeFn = fn(&CodecTable, &'static str, &FieldDescriptor, &mut BitReader, &Record, &Record) -> Result<Value>;
/// `(codecs, msg_type, field, value, writer, root, current)`.
pub type EncodeFn = fn(&CodecTable, &'static str, &FieldDescriptor, &Value, &mut BitWriter, &Record, &Record) -> Result<()>;

#[derive(Clone, Copy)]
pub struct CodecEntry {
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

/// The dispatch table itself. Built once via [`CodecTable::standard`]
/// and shared (it holds only function pointers, no mutable state).
pub struct CodecTable(HashMap<CodecKind, CodecEntry>);

impl CodecTable {
    pub fn standard() -> Self {
        let mut table = HashMap::new();
        table.insert(
            CodecKind::Byte,
            CodecEntry {
                decode: integer::decode_byte,
                encode: integer::encode_byte,
            },
        );
        table.insert(
            CodecKind::Short,
            CodecEntry {
                decode: integer::decode_short,
                encode: integer::encode_short,
            },
        );
        table.insert(
            CodecKind::Int,
            CodecEntry {
                decode: integer::decode_int,
                encode: integer::encode_int,
            },
        );
        table.insert(
            CodecKind::Long,
            CodecEntry {
                decode: integer::decode_long,
                encode: integer::encode_long,
            },
        );
        table.insert(
            CodecKind::BigInteger,
            CodecEntry {
                decode: integer::decode_big_integer,
                encode: integer::encode_big_integer,
            },
        );
        table.insert(
            CodecKind::Float,
            CodecEntry {
                decode: float::decode_float,
                encode: float::encode_float,
            },
        );
        table.insert(
            CodecKind::Double,
            CodecEntry {
                decode: float::decode_double,
                encode: float::encode_double,
            },
        );
        table.insert(
            CodecKind::BigDecimal,
            CodecEntry {
                decode: float::decode_big_decimal,
                encode: float::encode_big_decimal,
            },
        );
        table.insert(
            CodecKind::Bits,
            CodecEntry {
                decode: bits::decode_bits,
                encode: bits::encode_bits,
            },
        );
        table.insert(
            CodecKind::BitSet,
            CodecEntry {
                decode: bits::decode_bit_set,
                encode: bits::encode_bit_set,
            },
        );
        table.insert(
            CodecKind::StringFixed,
            CodecEntry {
                decode: string::decode_fixed,
                encode: string::encode_fixed,
            },
        );
        table.insert(
            CodecKind::StringTerminated,
            CodecEntry {
                decode: string::decode_terminated,
                encode: string::encode_terminated,
            },
        );
        table.insert(
            CodecKind::ArrayPrimitive,
            CodecEntry {
                decode: array::decode_primitive_array,
                encode: array::encode_primitive_array,
            },
        );
        table.insert(
            CodecKind::ArrayObject,
            CodecEntry {
                decode: array::decode_object_array,
                encode: array::encode_object_array,
            },
        );
        table.insert(
            CodecKind::Object,
            CodecEntry {
                decode: object::decode_object,
                encode: object::encode_object,
            },
        );
        table.insert(
            CodecKind::Checksum,
            CodecEntry {
                decode: checksum::decode_checksum,
                encode: checksum::encode_checksum,
            },
        );
        CodecTable(table)
    }

    pub fn get(&self, kind: CodecKind) -> Option<&CodecEntry> {
        self.0.get(&kind)
    }
}

impl Default for CodecTable {
    fn default() -> Self {
        Self::standard()
    }
}
