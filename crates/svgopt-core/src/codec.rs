//! Transport encodings used to move file content across the content service.
//!
//! Content services report the encoding of every file they return. The set of
//! encodings understood here is closed: adding one means adding a variant to
//! [`Encoding`] and its arms in `decode`/`encode`.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Supported transport encodings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Standard base64 alphabet with padding, carrying UTF-8 text.
    Base64,

    /// Plain UTF-8 text (identity).
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
}

impl Encoding {
    /// Every supported encoding.
    pub const ALL: [Encoding; 2] = [Encoding::Base64, Encoding::Utf8];

    /// Canonical wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::Utf8 => "utf-8",
        }
    }

    /// Convert `data` in this encoding to plain text.
    pub fn decode(&self, data: &str) -> Result<String, CodecError> {
        match self {
            Encoding::Base64 => {
                // Content services wrap long base64 payloads across lines.
                let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| self.malformed(e))?;
                String::from_utf8(bytes).map_err(|e| self.malformed(e))
            }
            Encoding::Utf8 => Ok(data.to_string()),
        }
    }

    /// Convert plain `text` to this encoding.
    pub fn encode(&self, text: &str) -> String {
        match self {
            Encoding::Base64 => STANDARD.encode(text.as_bytes()),
            Encoding::Utf8 => text.to_string(),
        }
    }

    fn malformed(&self, reason: impl fmt::Display) -> CodecError {
        CodecError::Malformed {
            encoding: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(Encoding::Base64),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            _ => Err(CodecError::UnsupportedEncoding(name.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode `data` from the encoding named `encoding`.
pub fn decode(data: &str, encoding: &str) -> Result<String, CodecError> {
    encoding.parse::<Encoding>()?.decode(data)
}

/// Encode `text` into the encoding named `encoding`.
pub fn encode(text: &str, encoding: &str) -> Result<String, CodecError> {
    Ok(encoding.parse::<Encoding>()?.encode(text))
}
