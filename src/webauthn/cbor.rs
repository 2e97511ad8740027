//! CBOR processing for `WebAuthn`
//!
//! This module handles the CBOR (Concise Binary Object Representation)
//! processing needed for `WebAuthn` attestation objects and authenticator data.
//! Every length prefix is checked against the remaining input before anything
//! is allocated, and callers that decode a concatenated stream get the number
//! of bytes each item consumed.

use std::fmt;

use super::errors::WebAuthnError;

// CBOR Major Types
const MT_UNSIGNED: u8 = 0;
const MT_NEGATIVE: u8 = 1;
const MT_BYTE_STRING: u8 = 2;
const MT_TEXT_STRING: u8 = 3;
const MT_ARRAY: u8 = 4;
const MT_MAP: u8 = 5;
const MT_TAG: u8 = 6;
const MT_SIMPLE: u8 = 7;

// Simple values and float widths (major type 7)
const SIMPLE_FALSE: u8 = 20;
const SIMPLE_TRUE: u8 = 21;
const SIMPLE_NULL: u8 = 22;
const FLOAT_HALF: u8 = 25;
const FLOAT_SINGLE: u8 = 26;
const FLOAT_DOUBLE: u8 = 27;
const INDEFINITE: u8 = 31;

/// Maximum nesting of arrays and maps accepted by the decoder
pub const MAX_NESTING_DEPTH: usize = 64;

/// A decoded CBOR data item
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Unsigned integer (major type 0)
    UnsignedInt(u64),
    /// Negative integer (major type 1), stored as its actual value.
    /// A non-negative value here encodes as an unsigned integer.
    NegativeInt(i64),
    /// Byte string (major type 2)
    ByteString(Vec<u8>),
    /// Text string (major type 3)
    TextString(String),
    /// Array of CBOR values (major type 4)
    Array(Vec<CborValue>),
    /// Map of key-value pairs in wire order (major type 5)
    Map(Vec<(CborValue, CborValue)>),
    /// Boolean simple value
    Bool(bool),
    /// Null simple value
    Null,
    /// Half, single or double precision float, widened to `f64`
    Float(f64),
}

impl CborValue {
    /// Create from a signed integer, choosing unsigned or negative encoding.
    #[must_use]
    pub fn from_int(value: i64) -> Self {
        match u64::try_from(value) {
            Ok(unsigned) => CborValue::UnsignedInt(unsigned),
            Err(_) => CborValue::NegativeInt(value),
        }
    }

    /// Name of the variant, used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            CborValue::UnsignedInt(_) => "unsigned integer",
            CborValue::NegativeInt(_) => "negative integer",
            CborValue::ByteString(_) => "byte string",
            CborValue::TextString(_) => "text string",
            CborValue::Array(_) => "array",
            CborValue::Map(_) => "map",
            CborValue::Bool(_) => "boolean",
            CborValue::Null => "null",
            CborValue::Float(_) => "float",
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CborValue::UnsignedInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value if it fits in an `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CborValue::UnsignedInt(v) => i64::try_from(*v).ok(),
            CborValue::NegativeInt(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::ByteString(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::TextString(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CborValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CborValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CborValue::Null)
    }

    /// Byte string contents, or a `DecodeError` naming `field` on type mismatch
    ///
    /// # Errors
    /// Returns `WebAuthnError::DecodeError` if the value is not a byte string
    pub fn expect_bytes(&self, field: &str) -> Result<&[u8], WebAuthnError> {
        self.as_bytes().ok_or_else(|| self.type_mismatch(field, "byte string"))
    }

    /// Text string contents, or a `DecodeError` naming `field` on type mismatch
    ///
    /// # Errors
    /// Returns `WebAuthnError::DecodeError` if the value is not a text string
    pub fn expect_text(&self, field: &str) -> Result<&str, WebAuthnError> {
        self.as_text().ok_or_else(|| self.type_mismatch(field, "text string"))
    }

    /// Map entries, or a `DecodeError` naming `field` on type mismatch
    ///
    /// # Errors
    /// Returns `WebAuthnError::DecodeError` if the value is not a map
    pub fn expect_map(&self, field: &str) -> Result<&[(CborValue, CborValue)], WebAuthnError> {
        self.as_map().ok_or_else(|| self.type_mismatch(field, "map"))
    }

    /// Look up a text key in a map. The first matching entry wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CborValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }

    fn type_mismatch(&self, field: &str, expected: &str) -> WebAuthnError {
        WebAuthnError::DecodeError(format!(
            "{field}: expected {expected}, found {}",
            self.type_name()
        ))
    }
}

/// Diagnostic notation (RFC 8949 section 8)
impl fmt::Display for CborValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CborValue::UnsignedInt(v) => write!(f, "{v}"),
            CborValue::NegativeInt(v) => write!(f, "{v}"),
            CborValue::ByteString(bytes) => {
                f.write_str("h'")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            CborValue::TextString(text) => write!(f, "{text:?}"),
            CborValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            CborValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            CborValue::Bool(b) => write!(f, "{b}"),
            CborValue::Null => f.write_str("null"),
            CborValue::Float(v) if v.is_nan() => f.write_str("NaN"),
            CborValue::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            CborValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

#[cfg(feature = "cose")]
impl From<CborValue> for ciborium::value::Value {
    fn from(value: CborValue) -> Self {
        use ciborium::value::Value;

        match value {
            CborValue::UnsignedInt(v) => Value::Integer(v.into()),
            CborValue::NegativeInt(v) => Value::Integer(v.into()),
            CborValue::ByteString(bytes) => Value::Bytes(bytes),
            CborValue::TextString(text) => Value::Text(text),
            CborValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            CborValue::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            CborValue::Bool(b) => Value::Bool(b),
            CborValue::Null => Value::Null,
            CborValue::Float(v) => Value::Float(v),
        }
    }
}

/// Top-level CBOR map whose keys are all text strings, in wire order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringKeyMap {
    entries: Vec<(String, CborValue)>,
}

impl StringKeyMap {
    /// Value of the first entry with this key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CborValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Value of the first entry with this key, or `MissingField`
    ///
    /// # Errors
    /// Returns `WebAuthnError::MissingField` if no entry has this key
    pub fn require(&self, key: &str) -> Result<&CborValue, WebAuthnError> {
        self.get(key)
            .ok_or_else(|| WebAuthnError::MissingField(key.to_string()))
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CborValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode exactly one CBOR item spanning the whole input
///
/// # Errors
/// Returns `WebAuthnError::LengthError` if a length prefix runs past the end of
/// the input, or `WebAuthnError::DecodeError` for malformed or unsupported
/// items and for trailing bytes after the item
pub fn decode(bytes: &[u8]) -> Result<CborValue, WebAuthnError> {
    let (value, consumed) = decode_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(WebAuthnError::DecodeError(format!(
            "{} trailing bytes after CBOR item",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// Decode one CBOR item from the start of the input
///
/// Returns the value and the number of bytes it occupied, so that callers can
/// keep decoding a concatenated stream.
///
/// # Errors
/// Returns `WebAuthnError::LengthError` if a length prefix runs past the end of
/// the input, or `WebAuthnError::DecodeError` for malformed or unsupported items
pub fn decode_prefix(bytes: &[u8]) -> Result<(CborValue, usize), WebAuthnError> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_item(0)?;
    Ok((value, decoder.position()))
}

/// Decode a top-level CBOR map whose keys are all text strings
///
/// # Errors
/// Returns `WebAuthnError::DecodeError` if the top-level item is not a map or
/// any key is not a text string, plus any error from [`decode`]
pub fn read_string_key_map(bytes: &[u8]) -> Result<StringKeyMap, WebAuthnError> {
    let CborValue::Map(pairs) = decode(bytes)? else {
        return Err(WebAuthnError::DecodeError(
            "Top-level CBOR item is not a map".to_string(),
        ));
    };

    let entries = pairs
        .into_iter()
        .map(|(key, value)| match key {
            CborValue::TextString(key) => Ok((key, value)),
            other => Err(WebAuthnError::DecodeError(format!(
                "Map key is a {}, expected text string",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StringKeyMap { entries })
}

/// Encode a CBOR value using shortest-form definite-length heads
///
/// Map entries are written in their stored order and floats as 64-bit.
#[must_use]
pub fn encode(value: &CborValue) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    encode_into(&mut buf, value);
    buf
}

/// Append the encoding of a CBOR value to a buffer
pub fn encode_into(buf: &mut Vec<u8>, value: &CborValue) {
    match value {
        CborValue::UnsignedInt(v) => encode_head(buf, MT_UNSIGNED, *v),
        // A non-negative payload is written as the integer it holds
        CborValue::NegativeInt(v) => match u64::try_from(*v) {
            Ok(unsigned) => encode_head(buf, MT_UNSIGNED, unsigned),
            Err(_) => encode_head(buf, MT_NEGATIVE, (-1 - *v).unsigned_abs()),
        },
        CborValue::ByteString(bytes) => {
            encode_head(buf, MT_BYTE_STRING, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
        CborValue::TextString(text) => {
            encode_head(buf, MT_TEXT_STRING, text.len() as u64);
            buf.extend_from_slice(text.as_bytes());
        }
        CborValue::Array(items) => {
            encode_head(buf, MT_ARRAY, items.len() as u64);
            for item in items {
                encode_into(buf, item);
            }
        }
        CborValue::Map(entries) => {
            encode_head(buf, MT_MAP, entries.len() as u64);
            for (key, value) in entries {
                encode_into(buf, key);
                encode_into(buf, value);
            }
        }
        CborValue::Bool(b) => {
            let simple = if *b { SIMPLE_TRUE } else { SIMPLE_FALSE };
            buf.push((MT_SIMPLE << 5) | simple);
        }
        CborValue::Null => buf.push((MT_SIMPLE << 5) | SIMPLE_NULL),
        CborValue::Float(v) => {
            buf.push((MT_SIMPLE << 5) | FLOAT_DOUBLE);
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
    }
}

fn encode_head(buf: &mut Vec<u8>, major_type: u8, value: u64) {
    let mt = major_type << 5;
    if let Ok(small) = u8::try_from(value) {
        if small < 24 {
            buf.push(mt | small);
        } else {
            buf.extend_from_slice(&[mt | 24, small]);
        }
    } else if let Ok(short) = u16::try_from(value) {
        buf.push(mt | 25);
        buf.extend_from_slice(&short.to_be_bytes());
    } else if let Ok(word) = u32::try_from(value) {
        buf.push(mt | 26);
        buf.extend_from_slice(&word.to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

/// Cursor over a borrowed input buffer
struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WebAuthnError> {
        if len > self.remaining() {
            return Err(WebAuthnError::LengthError(format!(
                "need {len} bytes at offset {}, {} remaining",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WebAuthnError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, WebAuthnError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Argument of an item head for the given additional information
    fn read_argument(&mut self, info: u8) -> Result<u64, WebAuthnError> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => Ok(u64::from(self.read_u8()?)),
            25 => Ok(u64::from(u16::from_be_bytes(self.take_array()?))),
            26 => Ok(u64::from(u32::from_be_bytes(self.take_array()?))),
            27 => Ok(u64::from_be_bytes(self.take_array()?)),
            INDEFINITE => Err(WebAuthnError::DecodeError(format!(
                "indefinite-length item at offset {} is not supported",
                self.pos - 1
            ))),
            _ => Err(WebAuthnError::DecodeError(format!(
                "reserved additional information {info} at offset {}",
                self.pos - 1
            ))),
        }
    }

    /// Read a byte length and check it against the remaining input
    fn read_length(&mut self, info: u8) -> Result<usize, WebAuthnError> {
        let declared = self.read_argument(info)?;
        match usize::try_from(declared) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(WebAuthnError::LengthError(format!(
                "declared length {declared} at offset {} exceeds {} remaining bytes",
                self.pos,
                self.remaining()
            ))),
        }
    }

    /// Read an element count; every element needs at least `min_item_len` bytes
    fn read_count(&mut self, info: u8, min_item_len: usize) -> Result<usize, WebAuthnError> {
        let declared = self.read_argument(info)?;
        match usize::try_from(declared) {
            Ok(count) if count <= self.remaining() / min_item_len => Ok(count),
            _ => Err(WebAuthnError::LengthError(format!(
                "declared {declared} elements at offset {} but only {} bytes remain",
                self.pos,
                self.remaining()
            ))),
        }
    }

    fn decode_item(&mut self, depth: usize) -> Result<CborValue, WebAuthnError> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(WebAuthnError::DecodeError(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }

        let offset = self.pos;
        let head = self.read_u8()?;
        let major_type = head >> 5;
        let info = head & 0x1f;

        match major_type {
            MT_UNSIGNED => Ok(CborValue::UnsignedInt(self.read_argument(info)?)),
            MT_NEGATIVE => {
                let magnitude = self.read_argument(info)?;
                let magnitude = i64::try_from(magnitude).map_err(|_| {
                    WebAuthnError::DecodeError(format!(
                        "negative integer at offset {offset} is out of range"
                    ))
                })?;
                Ok(CborValue::NegativeInt(-1 - magnitude))
            }
            MT_BYTE_STRING => {
                let len = self.read_length(info)?;
                Ok(CborValue::ByteString(self.take(len)?.to_vec()))
            }
            MT_TEXT_STRING => {
                let len = self.read_length(info)?;
                let text = std::str::from_utf8(self.take(len)?).map_err(|e| {
                    WebAuthnError::DecodeError(format!(
                        "invalid UTF-8 in text string at offset {offset}: {e}"
                    ))
                })?;
                Ok(CborValue::TextString(text.to_owned()))
            }
            MT_ARRAY => {
                let count = self.read_count(info, 1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.decode_item(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
            MT_MAP => {
                let count = self.read_count(info, 2)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = self.decode_item(depth + 1)?;
                    let value = self.decode_item(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(CborValue::Map(entries))
            }
            MT_TAG => Err(WebAuthnError::DecodeError(format!(
                "tagged item at offset {offset} is not supported"
            ))),
            _ => self.decode_simple(info, offset),
        }
    }

    fn decode_simple(&mut self, info: u8, offset: usize) -> Result<CborValue, WebAuthnError> {
        match info {
            SIMPLE_FALSE => Ok(CborValue::Bool(false)),
            SIMPLE_TRUE => Ok(CborValue::Bool(true)),
            SIMPLE_NULL => Ok(CborValue::Null),
            FLOAT_HALF => Ok(CborValue::Float(half_to_f64(u16::from_be_bytes(
                self.take_array()?,
            )))),
            FLOAT_SINGLE => Ok(CborValue::Float(f64::from(f32::from_be_bytes(
                self.take_array()?,
            )))),
            FLOAT_DOUBLE => Ok(CborValue::Float(f64::from_be_bytes(self.take_array()?))),
            INDEFINITE => Err(WebAuthnError::DecodeError(format!(
                "unexpected break at offset {offset}"
            ))),
            _ => Err(WebAuthnError::DecodeError(format!(
                "unsupported simple value {info} at offset {offset}"
            ))),
        }
    }
}

/// Widen an IEEE 754 half-precision float
fn half_to_f64(bits: u16) -> f64 {
    let negative = bits & 0x8000 != 0;
    let exponent = i32::from((bits >> 10) & 0x1f);
    let mantissa = bits & 0x03ff;

    let magnitude = match exponent {
        0 => f64::from(mantissa) * 2f64.powi(-24),
        31 if mantissa == 0 => f64::INFINITY,
        31 => f64::NAN,
        _ => (1.0 + f64::from(mantissa) / 1024.0) * 2f64.powi(exponent - 15),
    };

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CborValue {
        CborValue::TextString(s.to_string())
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode(&[0x00]).unwrap(), CborValue::UnsignedInt(0));
        assert_eq!(decode(&[0x17]).unwrap(), CborValue::UnsignedInt(23));
        assert_eq!(decode(&[0x18, 0x18]).unwrap(), CborValue::UnsignedInt(24));
        assert_eq!(
            decode(&[0x19, 0x03, 0xe8]).unwrap(),
            CborValue::UnsignedInt(1000)
        );
        assert_eq!(
            decode(&[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            CborValue::UnsignedInt(u64::MAX)
        );
        assert_eq!(decode(&[0x20]).unwrap(), CborValue::NegativeInt(-1));
        assert_eq!(decode(&[0x38, 0x63]).unwrap(), CborValue::NegativeInt(-100));
        assert_eq!(
            decode(&[0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            CborValue::NegativeInt(i64::MIN)
        );
    }

    #[test]
    fn test_negative_integer_out_of_range() {
        let err = decode(&[0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, WebAuthnError::DecodeError(_)));
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(
            decode(&[0x44, 0x01, 0x02, 0x03, 0x04]).unwrap(),
            CborValue::ByteString(vec![1, 2, 3, 4])
        );
        assert_eq!(
            decode(&[0x64, 0x49, 0x45, 0x54, 0x46]).unwrap(),
            text("IETF")
        );
        assert_eq!(decode(&[0x40]).unwrap(), CborValue::ByteString(vec![]));
        assert_eq!(decode(&[0x60]).unwrap(), text(""));
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let err = decode(&[0x62, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, WebAuthnError::DecodeError(_)));
    }

    #[test]
    fn test_decode_containers() {
        assert_eq!(
            decode(&[0x83, 0x01, 0x02, 0x03]).unwrap(),
            CborValue::Array(vec![
                CborValue::UnsignedInt(1),
                CborValue::UnsignedInt(2),
                CborValue::UnsignedInt(3),
            ])
        );
        assert_eq!(
            decode(&[0xa2, 0x01, 0x02, 0x03, 0x04]).unwrap(),
            CborValue::Map(vec![
                (CborValue::UnsignedInt(1), CborValue::UnsignedInt(2)),
                (CborValue::UnsignedInt(3), CborValue::UnsignedInt(4)),
            ])
        );
        assert_eq!(decode(&[0x80]).unwrap(), CborValue::Array(vec![]));
        assert_eq!(decode(&[0xa0]).unwrap(), CborValue::Map(vec![]));
    }

    #[test]
    fn test_decode_simple_values_and_floats() {
        assert_eq!(decode(&[0xf4]).unwrap(), CborValue::Bool(false));
        assert_eq!(decode(&[0xf5]).unwrap(), CborValue::Bool(true));
        assert_eq!(decode(&[0xf6]).unwrap(), CborValue::Null);
        assert_eq!(decode(&[0xf9, 0x3c, 0x00]).unwrap(), CborValue::Float(1.0));
        assert_eq!(
            decode(&[0xf9, 0x7b, 0xff]).unwrap(),
            CborValue::Float(65504.0)
        );
        assert_eq!(
            decode(&[0xf9, 0x00, 0x01]).unwrap(),
            CborValue::Float(5.960_464_477_539_063e-8)
        );
        assert_eq!(
            decode(&[0xf9, 0xfc, 0x00]).unwrap(),
            CborValue::Float(f64::NEG_INFINITY)
        );
        assert!(decode(&[0xf9, 0x7e, 0x00])
            .unwrap()
            .as_f64()
            .is_some_and(f64::is_nan));
        assert_eq!(
            decode(&[0xfa, 0x47, 0xc3, 0x50, 0x00]).unwrap(),
            CborValue::Float(100_000.0)
        );
        assert_eq!(
            decode(&[0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]).unwrap(),
            CborValue::Float(1.1)
        );
    }

    #[test]
    fn test_unsupported_items_are_decode_errors() {
        // Tag 1 wrapping an integer
        assert!(matches!(
            decode(&[0xc1, 0x01]),
            Err(WebAuthnError::DecodeError(_))
        ));
        // Indefinite-length byte string
        assert!(matches!(
            decode(&[0x5f, 0x41, 0x01, 0xff]),
            Err(WebAuthnError::DecodeError(_))
        ));
        // Undefined
        assert!(matches!(decode(&[0xf7]), Err(WebAuthnError::DecodeError(_))));
        // Reserved additional information
        assert!(matches!(decode(&[0x1c]), Err(WebAuthnError::DecodeError(_))));
        // Lone break
        assert!(matches!(decode(&[0xff]), Err(WebAuthnError::DecodeError(_))));
    }

    #[test]
    fn test_truncated_input_is_length_error() {
        assert!(matches!(decode(&[]), Err(WebAuthnError::LengthError(_))));
        assert!(matches!(
            decode(&[0x18]),
            Err(WebAuthnError::LengthError(_))
        ));
        assert!(matches!(
            decode(&[0x44, 0x01, 0x02]),
            Err(WebAuthnError::LengthError(_))
        ));
        assert!(matches!(
            decode(&[0x83, 0x01, 0x02]),
            Err(WebAuthnError::LengthError(_))
        ));
        assert!(matches!(
            decode(&[0xa1, 0x01]),
            Err(WebAuthnError::LengthError(_))
        ));
    }

    #[test]
    fn test_huge_declared_lengths_fail_before_allocation() {
        // Byte string claiming u64::MAX bytes
        assert!(matches!(
            decode(&[0x5b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
            Err(WebAuthnError::LengthError(_))
        ));
        // Array claiming 2^32 - 1 elements
        assert!(matches!(
            decode(&[0x9a, 0xff, 0xff, 0xff, 0xff]),
            Err(WebAuthnError::LengthError(_))
        ));
        // Map claiming 2 entries with 3 bytes left
        assert!(matches!(
            decode(&[0xa2, 0x01, 0x02, 0x03]),
            Err(WebAuthnError::LengthError(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected_by_decode() {
        let err = decode(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, WebAuthnError::DecodeError(_)));
    }

    #[test]
    fn test_decode_prefix_reports_consumed_length() {
        let stream = [0x43, 0xaa, 0xbb, 0xcc, 0xa1, 0x61, 0x6b, 0xf5];
        let (first, consumed) = decode_prefix(&stream).unwrap();
        assert_eq!(first, CborValue::ByteString(vec![0xaa, 0xbb, 0xcc]));
        assert_eq!(consumed, 4);

        let (second, consumed_second) = decode_prefix(&stream[consumed..]).unwrap();
        assert_eq!(second.get("k"), Some(&CborValue::Bool(true)));
        assert_eq!(consumed + consumed_second, stream.len());
    }

    #[test]
    fn test_nesting_limit() {
        let mut shallow = vec![0x81; 10];
        shallow.push(0x80);
        assert!(decode(&shallow).is_ok());

        let mut deep = vec![0x81; MAX_NESTING_DEPTH + 10];
        deep.push(0x80);
        assert!(matches!(decode(&deep), Err(WebAuthnError::DecodeError(_))));
    }

    #[test]
    fn test_nesting_limit_boundary() {
        // MAX_NESTING_DEPTH arrays in total, the innermost one empty
        let mut at_limit = vec![0x81; MAX_NESTING_DEPTH - 1];
        at_limit.push(0x80);
        assert!(decode(&at_limit).is_ok());

        let mut past_limit = vec![0x81; MAX_NESTING_DEPTH];
        past_limit.push(0x80);
        assert!(matches!(
            decode(&past_limit),
            Err(WebAuthnError::DecodeError(_))
        ));
    }

    #[test]
    fn test_read_string_key_map() {
        // {"fmt": "none", "authData": h'0102'}
        let bytes = [
            0xa2, 0x63, b'f', b'm', b't', 0x64, b'n', b'o', b'n', b'e', 0x68, b'a', b'u', b't',
            b'h', b'D', b'a', b't', b'a', 0x42, 0x01, 0x02,
        ];
        let map = read_string_key_map(&bytes).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["fmt", "authData"]);
        assert_eq!(map.get("fmt"), Some(&text("none")));
        assert_eq!(
            map.require("authData").unwrap().expect_bytes("authData").unwrap(),
            &[0x01, 0x02]
        );
        assert!(matches!(
            map.require("attStmt"),
            Err(WebAuthnError::MissingField(_))
        ));
    }

    #[test]
    fn test_read_string_key_map_first_occurrence_wins() {
        // {"a": 1, "a": 2}
        let bytes = [0xa2, 0x61, b'a', 0x01, 0x61, b'a', 0x02];
        let map = read_string_key_map(&bytes).unwrap();
        assert_eq!(map.get("a"), Some(&CborValue::UnsignedInt(1)));
    }

    #[test]
    fn test_read_string_key_map_rejects_non_maps_and_non_text_keys() {
        assert!(matches!(
            read_string_key_map(&[0x83, 0x01, 0x02, 0x03]),
            Err(WebAuthnError::DecodeError(_))
        ));
        assert!(matches!(
            read_string_key_map(&[0xa1, 0x01, 0x02]),
            Err(WebAuthnError::DecodeError(_))
        ));
    }

    #[test]
    fn test_expect_accessors_name_the_field() {
        let value = CborValue::UnsignedInt(7);
        let err = value.expect_bytes("authData").unwrap_err();
        assert_eq!(
            err,
            WebAuthnError::DecodeError(
                "authData: expected byte string, found unsigned integer".to_string()
            )
        );
        assert!(value.expect_text("fmt").is_err());
        assert!(value.expect_map("attStmt").is_err());
        assert_eq!(value.as_i64(), Some(7));
        assert_eq!(CborValue::UnsignedInt(u64::MAX).as_i64(), None);
    }

    #[test]
    fn test_encode_shortest_form() {
        assert_eq!(encode(&CborValue::UnsignedInt(23)), vec![0x17]);
        assert_eq!(encode(&CborValue::UnsignedInt(24)), vec![0x18, 0x18]);
        assert_eq!(encode(&CborValue::UnsignedInt(256)), vec![0x19, 0x01, 0x00]);
        assert_eq!(
            encode(&CborValue::UnsignedInt(65536)),
            vec![0x1a, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(encode(&CborValue::from_int(-1)), vec![0x20]);
        assert_eq!(encode(&CborValue::from_int(-100)), vec![0x38, 0x63]);
        assert_eq!(
            encode(&CborValue::NegativeInt(i64::MIN)),
            vec![0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(encode(&CborValue::Null), vec![0xf6]);
        assert_eq!(encode(&CborValue::Bool(true)), vec![0xf5]);
    }

    #[test]
    fn test_encode_non_negative_payload_of_negative_variant() {
        assert_eq!(encode(&CborValue::NegativeInt(0)), vec![0x00]);
        assert_eq!(encode(&CborValue::NegativeInt(24)), vec![0x18, 0x18]);
        assert_eq!(
            decode(&encode(&CborValue::NegativeInt(0))).unwrap(),
            CborValue::UnsignedInt(0)
        );
        assert_eq!(encode(&CborValue::NegativeInt(-1)), vec![0x20]);
        assert_eq!(
            decode(&encode(&CborValue::NegativeInt(i64::MIN))).unwrap(),
            CborValue::NegativeInt(i64::MIN)
        );
    }

    #[test]
    fn test_encode_then_decode_cose_key() {
        // EC2 P-256 COSE key shape
        let key = CborValue::Map(vec![
            (CborValue::from_int(1), CborValue::from_int(2)),
            (CborValue::from_int(3), CborValue::from_int(-7)),
            (CborValue::from_int(-1), CborValue::from_int(1)),
            (CborValue::from_int(-2), CborValue::ByteString(vec![0x11; 32])),
            (CborValue::from_int(-3), CborValue::ByteString(vec![0x22; 32])),
        ]);
        let bytes = encode(&key);
        assert_eq!(bytes[0], 0xa5);
        assert_eq!(decode(&bytes).unwrap(), key);
    }

    #[cfg(feature = "cose")]
    #[test]
    fn test_decode_matches_ciborium_encoding() {
        use ciborium::value::Value;

        let value = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("packed".into())),
            (
                Value::Text("attStmt".into()),
                Value::Map(vec![
                    (Value::Text("alg".into()), Value::Integer((-7i64).into())),
                    (Value::Text("sig".into()), Value::Bytes(vec![0x30, 0x45])),
                ]),
            ),
            (
                Value::Text("flags".into()),
                Value::Array(vec![Value::Bool(true), Value::Null, Value::Float(1.5)]),
            ),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes).unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.get("fmt"), Some(&text("packed")));
        assert_eq!(
            decoded.get("attStmt").and_then(|s| s.get("alg")),
            Some(&CborValue::NegativeInt(-7))
        );
        assert_eq!(Value::from(decoded), value);
    }

    #[test]
    fn test_diagnostic_notation() {
        let value = CborValue::Map(vec![
            (text("id"), CborValue::ByteString(vec![0xde, 0xad])),
            (
                CborValue::from_int(-7),
                CborValue::Array(vec![CborValue::Null, CborValue::Float(1.5)]),
            ),
        ]);
        assert_eq!(value.to_string(), r#"{"id": h'dead', -7: [null, 1.5]}"#);
        assert_eq!(CborValue::Float(f64::INFINITY).to_string(), "Infinity");
    }
}
