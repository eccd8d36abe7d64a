//! `framewire`: a declarative, bidirectional binary message codec
//! engine. Callers describe a wire layout as a [`descriptor::MessageDescriptor`]
//! tree (kinds, endianness, choice tables, checksums, evaluated fields)
//! and get back exact round-trip decode/encode over a [`value::Record`] --
//! the engine's stand-in for "an instance of a user type", since
//! attaching descriptors to a concrete Rust struct is a metadata-authoring
//! concern this crate treats as an external collaborator (§1).

pub mod bits;
pub mod charset;
pub mod codec;
pub mod context;
pub mod convert;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod eval;
mod log;
pub mod validate;
pub mod value;

use std::sync::Arc;

use bits::{BitReader, BitWriter};
use codec::CodecTable;
use descriptor::MessageDescriptor;
use error::Result;
use value::Record;

/// Binds a Rust-side type to the [`MessageDescriptor`] that lays it out
/// on the wire. Implementing this is the one piece of descriptor
/// authoring this crate leaves to the caller; everything downstream
/// (dispatch, skips, checksums, choice resolution) is provided.
pub trait FrameType {
    fn type_descriptor() -> Arc<MessageDescriptor>;
}

/// Validates `T`'s descriptor, then decodes `bytes` against it.
/// Validation runs on every call rather than being cached by this
/// function, since descriptor construction is the caller's
/// responsibility and may differ per call; callers with a hot path
/// should validate once via [`validate::validate`] and call
/// [`driver::decode_message`] directly.
pub fn decode<T: FrameType>(codecs: &CodecTable, bytes: &[u8]) -> Result<Record> {
    let desc = T::type_descriptor();
    validate::validate(&desc, codecs)?;
    let mut reader = BitReader::new(bytes);
    driver::decode_message(codecs, &desc, &mut reader, None)
}

/// Validates `T`'s descriptor, then encodes `record` against it.
pub fn encode<T: FrameType>(codecs: &CodecTable, record: &Record) -> Result<Vec<u8>> {
    let desc = T::type_descriptor();
    validate::validate(&desc, codecs)?;
    let mut writer = BitWriter::new();
    driver::encode_message(codecs, &desc, record, &mut writer, None)?;
    Ok(writer.into_bytes())
}
