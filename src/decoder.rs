//! Document decoders
//!
//! A decoder turns the bytes under a [`ByteCursor`] into characters. End of
//! input is `Ok(None)`; malformed bytes are a fatal [`DecodeError`].

use crate::error::DecodeError;
use crate::source::ByteCursor;

/// Byte-to-character boundary used by the matcher
pub trait DocumentDecoder {
    /// Decode the next character and advance the cursor past it
    fn next_char(&self, cursor: &mut dyn ByteCursor) -> Result<Option<char>, DecodeError>;

    /// Short name used in diagnostics
    fn name(&self) -> &'static str;
}

/// Identity decoder: every byte is the character with the same code point
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteDecoder;

impl DocumentDecoder for ByteDecoder {
    #[inline]
    fn next_char(&self, cursor: &mut dyn ByteCursor) -> Result<Option<char>, DecodeError> {
        Ok(cursor.read_byte()?.map(char::from))
    }

    fn name(&self) -> &'static str {
        "bytes"
    }
}

/// Strict UTF-8 decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder;

impl Utf8Decoder {
    fn sequence_len(lead: u8) -> Option<usize> {
        match lead {
            0x00..=0x7F => Some(1),
            0xC2..=0xDF => Some(2),
            0xE0..=0xEF => Some(3),
            0xF0..=0xF4 => Some(4),
            _ => None,
        }
    }
}

impl DocumentDecoder for Utf8Decoder {
    fn next_char(&self, cursor: &mut dyn ByteCursor) -> Result<Option<char>, DecodeError> {
        let start = cursor.position();
        let lead = match cursor.read_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };
        let len = Self::sequence_len(lead).ok_or_else(|| DecodeError::Malformed {
            offset: start,
            message: format!("invalid UTF-8 lead byte 0x{:02X}", lead),
        })?;

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(len).skip(1) {
            *slot = cursor.read_byte()?.ok_or_else(|| DecodeError::Malformed {
                offset: start,
                message: "truncated UTF-8 sequence".to_string(),
            })?;
        }

        std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or_else(|| DecodeError::Malformed {
                offset: start,
                message: format!("invalid UTF-8 sequence {:02X?}", &buf[..len]),
            })
    }

    fn name(&self) -> &'static str {
        "utf-8"
    }
}
