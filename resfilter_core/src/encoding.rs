use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ResfilterError;
use crate::ResfilterResult;

/// Text encodings understood when decoding and re-encoding filtered
/// resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
#[non_exhaustive]
pub enum TextEncoding {
	#[default]
	Utf8,
	/// ISO-8859-1. Every byte maps to the code point of the same value.
	Latin1,
	Ascii,
}

impl TextEncoding {
	/// Canonical name, as it would be written in configuration.
	pub fn name(self) -> &'static str {
		match self {
			Self::Utf8 => "UTF-8",
			Self::Latin1 => "ISO-8859-1",
			Self::Ascii => "US-ASCII",
		}
	}

	/// Decode `bytes` read from `path`.
	///
	/// A UTF-8 byte order mark is kept as a leading `U+FEFF` so that
	/// [`TextEncoding::encode`] writes it back.
	pub fn decode(self, bytes: &[u8], path: &str) -> ResfilterResult<String> {
		match self {
			Self::Utf8 => {
				String::from_utf8(bytes.to_vec()).map_err(|e| {
					ResfilterError::Decode {
						path: path.to_string(),
						encoding: self.name().to_string(),
						reason: e.utf8_error().to_string(),
					}
				})
			}
			Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
			Self::Ascii => {
				if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
					return Err(ResfilterError::Decode {
						path: path.to_string(),
						encoding: self.name().to_string(),
						reason: format!("non-ASCII byte 0x{:02X} at offset {offset}", bytes[offset]),
					});
				}
				Ok(bytes.iter().map(|&b| char::from(b)).collect())
			}
		}
	}

	/// Encode `text` for writing to `path`.
	pub fn encode(self, text: &str, path: &str) -> ResfilterResult<Vec<u8>> {
		let limit = match self {
			Self::Utf8 => return Ok(text.as_bytes().to_vec()),
			Self::Latin1 => 0xFF,
			Self::Ascii => 0x7F,
		};

		text.chars()
			.map(|c| {
				u8::try_from(u32::from(c))
					.ok()
					.filter(|b| u32::from(*b) <= limit)
					.ok_or_else(|| {
						ResfilterError::Encode {
							path: path.to_string(),
							encoding: self.name().to_string(),
							reason: format!("character `{c}` (U+{:04X}) is not representable", u32::from(c)),
						}
					})
			})
			.collect()
	}
}

impl fmt::Display for TextEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for TextEncoding {
	type Err = ResfilterError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
		match normalized.as_str() {
			"utf-8" | "utf8" => Ok(Self::Utf8),
			"iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Ok(Self::Latin1),
			"us-ascii" | "ascii" => Ok(Self::Ascii),
			_ => Err(ResfilterError::UnsupportedEncoding(s.to_string())),
		}
	}
}

impl TryFrom<String> for TextEncoding {
	type Error = ResfilterError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
