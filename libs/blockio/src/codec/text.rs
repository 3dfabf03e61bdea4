//! Framed text slots with heuristic charset handling
//!
//! Field devices in this family store text in a fixed slot as one or more
//! frames packed back to back: a two-byte header (declared data capacity,
//! actual segment length) followed by the raw encoded bytes. The character
//! encoding is not declared anywhere in the frame, so decoding falls back
//! to detection, decoded output is clamped to U+0020..=U+9FA5 (basic
//! Latin, punctuation and CJK; drops controls and symbols above), and an
//! underscore joins consecutively packed segments. These are compatibility
//! behaviors observed on real devices and are deliberately kept as-is; do
//! not generalize them without evidence of the actual wire format.
//!
//! Decoding is best effort and never fails: malformed trailing bytes end
//! the frame walk and whatever was accumulated is returned.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030, WINDOWS_1252};

use super::scalar::BytesCodec;
use crate::buffer::BlockBuffer;
use crate::error::{BlockIoError, Result};
use crate::value::PointValue;

/// Framed string codec composed over a raw byte-array codec
#[derive(Debug, Clone)]
pub struct TextCodec {
    inner: BytesCodec,
    charset: Option<&'static Encoding>,
}

impl TextCodec {
    /// `capacity` is the usable text byte capacity; the slot occupies
    /// `capacity + 2` bytes in the block (two header bytes per frame).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BytesCodec::new(capacity + 2),
            charset: None,
        }
    }

    /// Fixed charset variant; skips detection entirely
    pub fn with_charset(capacity: usize, charset: &'static Encoding) -> Self {
        Self {
            inner: BytesCodec::new(capacity + 2),
            charset: Some(charset),
        }
    }

    /// Slot size in buffer bytes (header included)
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Usable text byte capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.size() - 2
    }

    /// Encode `value` as one frame into `buf` at `offset`
    ///
    /// A missing string encodes as the empty string. Segment length is
    /// masked to 0..=255; a single segment must not exceed 255 encoded
    /// bytes or the declared length is truncated.
    pub fn write(&self, buf: &mut BlockBuffer, offset: usize, value: &PointValue) -> Result<()> {
        let text = match value {
            PointValue::String(s) => s.as_ref(),
            other => {
                return Err(BlockIoError::encode(format!(
                    "cannot encode {:?} as text",
                    other
                )))
            },
        };
        let encoded = self.encode_text(text);
        let mut frame = vec![0u8; self.inner.size()];
        frame[0] = self.capacity() as u8;
        frame[1] = encoded.len() as u8;
        let n = encoded.len().min(self.capacity());
        frame[2..2 + n].copy_from_slice(&encoded[..n]);
        self.inner.write_raw(buf, offset, &frame)
    }

    /// Decode every valid frame in the slot at `offset`, best effort
    pub fn read(&self, buf: &BlockBuffer, offset: usize) -> Result<PointValue> {
        let raw = self.inner.read_raw(buf, offset)?;
        Ok(PointValue::String(self.decode_frames(raw).into()))
    }

    fn encode_text(&self, text: &str) -> Vec<u8> {
        if let Some(enc) = self.charset {
            return enc.encode(text).0.into_owned();
        }
        // No configured charset: ASCII stays ASCII, anything else is
        // assumed GB18030 (the CJK encoding these devices ship with)
        if text.is_ascii() {
            return text.as_bytes().to_vec();
        }
        GB18030.encode(text).0.into_owned()
    }

    fn detect(bytes: &[u8]) -> &'static Encoding {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    }

    fn decode_segment(&self, segment: &[u8]) -> String {
        if segment.is_empty() {
            return String::new();
        }
        if let Some(enc) = self.charset {
            return enc.decode(segment).0.into_owned();
        }
        let (text, _, malformed) = Self::detect(segment).decode(segment);
        if !malformed {
            return text.into_owned();
        }
        // Retry detection without the final byte; slots are zero padded
        // and a trailing pad byte routinely confuses detection on short
        // segments.
        if segment.len() > 1 {
            let enc = Self::detect(&segment[..segment.len() - 1]);
            let (text, _, malformed) = enc.decode(segment);
            if !malformed {
                return text.into_owned();
            }
        }
        // ASCII-compatible single-byte fallback, never fails
        WINDOWS_1252.decode(segment).0.into_owned()
    }

    fn filter_printable(text: &str) -> String {
        text.chars()
            .filter(|&c| ('\u{0020}'..='\u{9FA5}').contains(&c))
            .collect()
    }

    fn decode_frames(&self, raw: &[u8]) -> String {
        if raw.len() <= 2 {
            return String::new();
        }
        let mut out = String::new();
        let mut cursor = 0usize;
        let mut first = true;
        while cursor + 2 <= raw.len() {
            let total = raw[cursor] as usize;
            if total == 0 {
                // No data declared
                break;
            }
            let seg_len = raw[cursor + 1] as usize;
            if seg_len == 0 {
                break;
            }
            if !first && total < seg_len {
                // A frame claiming less space than its segment length is
                // ambiguous trailing data; stop cleanly
                break;
            }
            let remaining = raw.len() - cursor;
            let length = seg_len.min(remaining - 2);
            let segment = &raw[cursor + 2..cursor + 2 + length];
            let text = Self::filter_printable(&self.decode_segment(segment));
            if !out.is_empty() && !text.is_empty() {
                out.push('_');
            }
            out.push_str(&text);
            first = false;
            cursor += total + 2;
        }
        out
    }
}
