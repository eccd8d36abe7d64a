//! Charset registry for `StringFixed`/`StringTerminated`/header text.
//! Kept deliberately small: the set the validator (§4.7) recognizes.

use crate::error::{Error, FieldError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    Utf8,
    Latin1,
}

impl Charset {
    pub fn parse(name: &str) -> Option<Charset> {
        match name {
            "US-ASCII" | "ASCII" => Some(Charset::Ascii),
            "UTF-8" => Some(Charset::Utf8),
            "ISO-8859-1" | "Latin-1" => Some(Charset::Latin1),
            _ => None,
        }
    }

    pub fn decode(self, bytes: &[u8], at: FieldError) -> Result<String> {
        match self {
            Charset::Utf8 => {
                std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| Error::decode(at, e.to_string()))
            }
            Charset::Ascii => {
                if bytes.iter().any(|b| !b.is_ascii()) {
                    return Err(Error::decode(at, "non-ASCII byte in US-ASCII field"));
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(self, text: &str, at: FieldError) -> Result<Vec<u8>> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Ascii => {
                if !text.is_ascii() {
                    return Err(Error::encode(at, "non-ASCII text in US-ASCII field"));
                }
                Ok(text.as_bytes().to_vec())
            }
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c as u32).map_err(|_| Error::encode(at, "character outside Latin-1 range")))
                .collect(),
        }
    }
}
