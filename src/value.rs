//! The dynamic value carrier that flows between the wire and the user's
//! object graph. Since the descriptor-authoring surface (how a concrete
//! Rust struct attaches descriptors to its fields) is out of scope, the
//! engine operates on [`Record`]s -- named bags of [`Value`] -- and lets
//! the host convert to/from its own types at the boundary.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::bits::BitString;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    /// Raw bit run, exposed prior to conversion by a `Bits` field.
    Bits(BitString),
    /// Decoded indices of set bits, exposed by a `BitSet` field.
    BitSet(Vec<u32>),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<Value>),
    Object(Record),
    Null,
}

macro_rules! value_conv {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = Value;

            fn try_from(v: Value) -> Result<Self, Value> {
                match v {
                    Value::$variant(x) => Ok(x),
                    other => Err(other),
                }
            }
        }
    };
}

value_conv!(Bool, bool);
value_conv!(I8, i8);
value_conv!(I16, i16);
value_conv!(I32, i32);
value_conv!(I64, i64);
value_conv!(U8, u8);
value_conv!(U16, u16);
value_conv!(U32, u32);
value_conv!(U64, u64);
value_conv!(F32, f32);
value_conv!(F64, f64);
value_conv!(BigInt, BigInt);
value_conv!(BigDecimal, BigDecimal);
value_conv!(Str, String);

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::BigInt(_) => "BigInteger",
            Value::BigDecimal(_) => "BigDecimal",
            Value::Bits(_) => "Bits",
            Value::BitSet(_) => "BitSet",
            Value::Bytes(_) => "Bytes",
            Value::Str(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
            Value::Null => "null",
        }
    }

    /// Numeric coercion used by the expression evaluator; integers and
    /// floats alike are treated as `f64` for arithmetic/comparison.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as u8 as f64),
            Value::I8(n) => Some(*n as f64),
            Value::I16(n) => Some(*n as f64),
            Value::I32(n) => Some(*n as f64),
            Value::I64(n) => Some(*n as f64),
            Value::U8(n) => Some(*n as f64),
            Value::U16(n) => Some(*n as f64),
            Value::U32(n) => Some(*n as f64),
            Value::U64(n) => Some(*n as f64),
            Value::F32(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            Value::BigInt(n) => bigdecimal::ToPrimitive::to_f64(n),
            Value::BigDecimal(n) => bigdecimal::ToPrimitive::to_f64(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|f| f as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Value::Object(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// An ordered bag of named field values: the engine's stand-in for "a
/// populated instance of a user type". A `Record` also carries the
/// runtime type name of the message it was decoded from/for, used in
/// error annotations and by the choice-table encoder (which picks an
/// alternative by matching this name against each alternative's
/// declared type).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub type_name: &'static str,
    fields: HashMap<String, Value>,
    order: Vec<String>,
}

impl Record {
    pub fn new(type_name: &'static str) -> Self {
        Record {
            type_name,
            fields: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        if !self.fields.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.fields.insert(name.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order.iter().map(|k| (k.as_str(), &self.fields[k]))
    }
}
