use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

/// Identifies the descriptor and field a decode/encode failure occurred in,
/// per the `(className, fieldName)` annotation required by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub type_name: &'static str,
    pub field_name: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("descriptor for {0} rejected by validator: {1}")]
    AnnotationError(&'static str, String),
    #[error("no codec registered for kind {0:?}")]
    NoCodec(crate::codec::CodecKind),
    #[error("insufficient bytes at bit position {0}")]
    InsufficientBytes(usize),
    #[error("decode error at {at}: {message}")]
    DecodeError { at: FieldError, message: String },
    #[error("converter failed at {at}: {message}")]
    ConverterError { at: FieldError, message: String },
    #[error("validation failed at {at}: {message}")]
    ValidationError { at: FieldError, message: String },
    #[error("no alternative in choice table at {0} matched and no default was set")]
    NoMatchingAlternative(FieldError),
    #[error("header end mismatch: expected {expected:?}, got {actual:?}")]
    BadTerminator { expected: Vec<u8>, actual: Vec<u8> },
    #[error("checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u64, actual: u64 },
    #[error("array size mismatch at {at}: descriptor size {declared}, value has {actual}")]
    SizeMismatch {
        at: FieldError,
        declared: usize,
        actual: usize,
    },
    #[error("encode error at {at}: {message}")]
    EncodeError { at: FieldError, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn decode(at: FieldError, message: impl Into<String>) -> Self {
        Error::DecodeError {
            at,
            message: message.into(),
        }
    }

    pub fn converter(at: FieldError, message: impl Into<String>) -> Self {
        Error::ConverterError {
            at,
            message: message.into(),
        }
    }

    pub fn validation(at: FieldError, message: impl Into<String>) -> Self {
        Error::ValidationError {
            at,
            message: message.into(),
        }
    }

    pub fn encode(at: FieldError, message: impl Into<String>) -> Self {
        Error::EncodeError {
            at,
            message: message.into(),
        }
    }
}
