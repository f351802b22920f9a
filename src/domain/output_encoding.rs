//! Text encodings for result files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Encoding used by the primary result write path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "ascii")]
    Ascii,
}

/// A character the target encoding cannot represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unrepresentable {
    pub encoding: OutputEncoding,
    pub character: char,
    /// Character offset within the text.
    pub position: usize,
}

impl fmt::Display for Unrepresentable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (U+{:04X}) at position {} cannot be encoded as {}",
            self.character, self.character as u32, self.position, self.encoding
        )
    }
}

impl OutputEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputEncoding::Utf8 => "utf-8",
            OutputEncoding::Latin1 => "latin-1",
            OutputEncoding::Ascii => "ascii",
        }
    }

    fn max_code_point(&self) -> u32 {
        match self {
            OutputEncoding::Utf8 => char::MAX as u32,
            OutputEncoding::Latin1 => 0xFF,
            OutputEncoding::Ascii => 0x7F,
        }
    }

    /// Encode `text`, failing on the first unrepresentable character.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Unrepresentable> {
        if *self == OutputEncoding::Utf8 {
            return Ok(text.as_bytes().to_vec());
        }

        let limit = self.max_code_point();
        let mut bytes = Vec::with_capacity(text.len());
        for (position, character) in text.chars().enumerate() {
            let code = character as u32;
            if code > limit {
                return Err(Unrepresentable { encoding: *self, character, position });
            }
            bytes.push(code as u8);
        }
        Ok(bytes)
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(OutputEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(OutputEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(OutputEncoding::Ascii),
            other => Err(format!("unsupported output encoding '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_encodes_everything() {
        assert_eq!(OutputEncoding::Utf8.encode("☕ ok").unwrap(), "☕ ok".as_bytes());
    }

    #[test]
    fn latin1_maps_code_points_to_bytes() {
        assert_eq!(OutputEncoding::Latin1.encode("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn ascii_rejects_first_non_ascii_character() {
        let err = OutputEncoding::Ascii.encode("naïve").unwrap_err();
        assert_eq!(err.character, 'ï');
        assert_eq!(err.position, 2);
        assert!(err.to_string().contains("U+00EF"));
    }

    #[test]
    fn parses_common_labels() {
        assert_eq!("UTF8".parse::<OutputEncoding>().unwrap(), OutputEncoding::Utf8);
        assert_eq!("iso-8859-1".parse::<OutputEncoding>().unwrap(), OutputEncoding::Latin1);
        assert_eq!("latin_1".parse::<OutputEncoding>().unwrap(), OutputEncoding::Latin1);
        assert!("ebcdic".parse::<OutputEncoding>().is_err());
    }
}
