//! Text encodings used for the raw CSV tier
//!
//! The raw dataset is distributed in Latin-1, while files edited by hand or
//! produced by other tools are usually UTF-8. Only these two encodings are
//! needed, so they are implemented directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding bytes or encoding text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Input bytes are not valid in the requested encoding
    #[error("bytes are not valid {encoding} (first invalid byte at offset {offset})")]
    Undecodable { encoding: TextEncoding, offset: usize },

    /// A character has no representation in the requested encoding
    #[error("character {character:?} cannot be encoded as {encoding}")]
    Unencodable { encoding: TextEncoding, character: char },
}

/// A character encoding for CSV text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value
    Latin1,
}

impl TextEncoding {
    /// Decodes bytes into a string
    ///
    /// Latin-1 decoding never fails; UTF-8 decoding fails on the first
    /// invalid sequence.
    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                EncodingError::Undecodable {
                    encoding: self,
                    offset: e.utf8_error().valid_up_to(),
                }
            }),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encodes a string into bytes
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| EncodingError::Unencodable {
                        encoding: self,
                        character: c,
                    })
                })
                .collect(),
        }
    }

    /// Returns the conventional label for this encoding
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
