//! In-memory descriptor model (§3): the contract for one field, and the
//! message-level list of fields plus header/checksum/evaluated fields.
//! Built once at load time, immutable and freely shared thereafter.

use std::sync::Arc;

use crate::bits::Endian;
use crate::charset::Charset;
use crate::codec::CodecKind;
use crate::convert::{ConverterSet, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    Byte,
    Short,
    Int,
    Long,
}

impl IntWidth {
    pub fn bits(self) -> usize {
        match self {
            IntWidth::Byte => 8,
            IntWidth::Short => 16,
            IntWidth::Int => 32,
            IntWidth::Long => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    Float,
    Double,
}

/// A directive to advance the cursor before a field is processed, either
/// by a fixed/evaluated bit count or up to a terminator.
#[derive(Clone)]
pub enum Skip {
    Size {
        size_expr: Arc<str>,
        condition: Arc<str>,
    },
    Terminator {
        terminator: u8,
        consume: bool,
        condition: Arc<str>,
    },
}

/// `prefixSize` + ordered alternatives + optional default, selecting a
/// message subtype (§4.5).
#[derive(Clone)]
pub struct ChoiceTable {
    pub prefix_bits: u8,
    pub alternatives: Vec<(Arc<MessageDescriptor>, Arc<str>)>,
    pub default: Option<Arc<MessageDescriptor>>,
}

impl ChoiceTable {
    pub fn new(prefix_bits: u8) -> Self {
        ChoiceTable {
            prefix_bits,
            alternatives: Vec::new(),
            default: None,
        }
    }

    pub fn with_alternative(mut self, ty: Arc<MessageDescriptor>, condition: impl Into<Arc<str>>) -> Self {
        self.alternatives.push((ty, condition.into()));
        self
    }

    pub fn with_default(mut self, ty: Arc<MessageDescriptor>) -> Self {
        self.default = Some(ty);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn codec_kind(self) -> CodecKind {
        match self {
            PrimitiveKind::Byte => CodecKind::Byte,
            PrimitiveKind::Short => CodecKind::Short,
            PrimitiveKind::Int => CodecKind::Int,
            PrimitiveKind::Long => CodecKind::Long,
            PrimitiveKind::Float => CodecKind::Float,
            PrimitiveKind::Double => CodecKind::Double,
        }
    }
}

pub enum FieldKind {
    Integer {
        width: IntWidth,
        endian: Endian,
        signed: bool,
    },
    BigInteger {
        size_expr: Arc<str>,
        endian: Endian,
        signed: bool,
    },
    Float {
        width: FloatWidth,
        endian: Endian,
    },
    BigDecimal {
        width: FloatWidth,
        endian: Endian,
    },
    Bits {
        size_expr: Arc<str>,
        endian: Endian,
    },
    BitSet {
        size_expr: Arc<str>,
        endian: Endian,
    },
    StringFixed {
        size_expr: Arc<str>,
        charset: Charset,
    },
    StringTerminated {
        terminator: u8,
        consume_terminator: bool,
        charset: Charset,
    },
    ArrayPrimitive {
        element: PrimitiveKind,
        length_expr: Arc<str>,
        endian: Endian,
    },
    ArrayObject {
        element: Arc<MessageDescriptor>,
        length_expr: Arc<str>,
        choice: Option<ChoiceTable>,
    },
    Object {
        nested: Arc<MessageDescriptor>,
        choice: Option<ChoiceTable>,
    },
    Checksum {
        algorithm: &'static str,
        seed: u64,
        skip_start_expr: Arc<str>,
        skip_end_expr: Arc<str>,
        width: IntWidth,
    },
}

impl FieldKind {
    pub fn codec_kind(&self) -> CodecKind {
        match self {
            FieldKind::Integer { width, .. } => match width {
                IntWidth::Byte => CodecKind::Byte,
                IntWidth::Short => CodecKind::Short,
                IntWidth::Int => CodecKind::Int,
                IntWidth::Long => CodecKind::Long,
            },
            FieldKind::BigInteger { .. } => CodecKind::BigInteger,
            FieldKind::Float { width, .. } => match width {
                FloatWidth::Float => CodecKind::Float,
                FloatWidth::Double => CodecKind::Double,
            },
            FieldKind::BigDecimal { .. } => CodecKind::BigDecimal,
            FieldKind::Bits { .. } => CodecKind::Bits,
            FieldKind::BitSet { .. } => CodecKind::BitSet,
            FieldKind::StringFixed { .. } => CodecKind::StringFixed,
            FieldKind::StringTerminated { .. } => CodecKind::StringTerminated,
            FieldKind::ArrayPrimitive { .. } => CodecKind::ArrayPrimitive,
            FieldKind::ArrayObject { .. } => CodecKind::ArrayObject,
            FieldKind::Object { .. } => CodecKind::Object,
            FieldKind::Checksum { .. } => CodecKind::Checksum,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, FieldKind::Object { .. } | FieldKind::ArrayObject { .. })
    }
}

/// One field's full contract: kind, converters, validator, condition
/// and preceding skips.
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub converters: ConverterSet,
    pub validator: Validator,
    pub condition: Arc<str>,
    pub skips: Vec<Skip>,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldDescriptor {
            name,
            kind,
            converters: ConverterSet::identity(),
            validator: Validator::none(),
            condition: Arc::from(""),
            skips: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<Arc<str>>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_converters(mut self, converters: ConverterSet) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_skip(mut self, skip: Skip) -> Self {
        self.skips.push(skip);
        self
    }
}

/// `(name, type, condition, value-expression)`, populated after all
/// byte-consuming fields (§3).
pub struct EvaluatedFieldDescriptor {
    pub name: &'static str,
    pub condition: Arc<str>,
    pub value_expr: Arc<str>,
}

#[derive(Clone, Default)]
pub struct Header {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

pub struct ChecksumSpec {
    pub algorithm: &'static str,
    pub seed: u64,
    pub skip_start_expr: Arc<str>,
    pub skip_end_expr: Arc<str>,
    pub width: IntWidth,
    pub field_name: &'static str,
}

/// The ordered list of field descriptors for one message type, plus
/// header/checksum/evaluated-field metadata.
pub struct MessageDescriptor {
    pub type_name: &'static str,
    pub header: Header,
    pub fields: Vec<FieldDescriptor>,
    pub evaluated: Vec<EvaluatedFieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(type_name: &'static str) -> Self {
        MessageDescriptor {
            type_name,
            header: Header::default(),
            fields: Vec::new(),
            evaluated: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_evaluated(mut self, field: EvaluatedFieldDescriptor) -> Self {
        self.evaluated.push(field);
        self
    }

    pub fn checksum_field(&self) -> Option<(&FieldDescriptor, ChecksumSpec)> {
        self.fields.iter().find_map(|f| match &f.kind {
            FieldKind::Checksum {
                algorithm,
                seed,
                skip_start_expr,
                skip_end_expr,
                width,
            } => Some((
                f,
                ChecksumSpec {
                    algorithm,
                    seed: *seed,
                    skip_start_expr: skip_start_expr.clone(),
                    skip_end_expr: skip_end_expr.clone(),
                    width: *width,
                    field_name: f.name,
                },
            )),
            _ => None,
        })
    }
}
