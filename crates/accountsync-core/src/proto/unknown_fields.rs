//! Unknown-field passthrough for protobuf records
//!
//! prost discards fields it has no declaration for. Records written by newer
//! clients carry such fields and this client must hand them back untouched, so
//! every record payload is decoded twice: once through prost for the fields we
//! know, once through [`FieldIter`] to collect the raw bytes (key + value) of
//! everything else, in wire order. On encode those bytes are appended after the
//! known fields, which any protobuf parser reads as the same message.

use bytes::{Buf, BufMut};
use prost::Message;

use crate::error::{SyncError, SyncResult};

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
pub const WIRE_LEN: u8 = 2;
const WIRE_START_GROUP: u8 = 3;
const WIRE_END_GROUP: u8 = 4;
const WIRE_FIXED32: u8 = 5;

const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;
const MAX_GROUP_DEPTH: usize = 100;

/// Field numbers a prost message declares
pub trait KnownFields {
    const KNOWN_TAGS: &'static [u32];
}

/// One top-level field as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    pub number: u32,
    pub wire_type: u8,
    /// Key and value bytes exactly as read
    pub raw: &'a [u8],
    /// Contents of a length-delimited field, the value bytes otherwise
    pub payload: &'a [u8],
}

/// Iterator over the top-level fields of an encoded message.
///
/// Yields an error and then stops on malformed input.
pub struct FieldIter<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> FieldIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    fn next_field(&mut self) -> SyncResult<RawField<'a>> {
        let start = self.offset;
        let mut buf = &self.data[start..];
        let before = buf.remaining();

        let (number, wire_type) = read_key(&mut buf)?;
        let value_start = start + (before - buf.remaining());
        let payload_start;
        match wire_type {
            WIRE_LEN => {
                let len = read_len(&mut buf)?;
                payload_start = start + (before - buf.remaining());
                buf.advance(len);
            }
            WIRE_START_GROUP => {
                payload_start = value_start;
                skip_group(&mut buf, number, 0)?;
            }
            other => {
                payload_start = value_start;
                skip_value(&mut buf, other)?;
            }
        }

        let end = start + (before - buf.remaining());
        self.offset = end;

        Ok(RawField {
            number,
            wire_type,
            raw: &self.data[start..end],
            payload: &self.data[payload_start..end],
        })
    }
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = SyncResult<RawField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        let field = self.next_field();
        if field.is_err() {
            self.failed = true;
        }
        Some(field)
    }
}

fn read_varint(buf: &mut &[u8]) -> SyncResult<u64> {
    let mut value = 0u64;
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(SyncError::Decode("truncated varint".to_string()));
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(SyncError::Decode("varint longer than 10 bytes".to_string()))
}

fn read_key(buf: &mut &[u8]) -> SyncResult<(u32, u8)> {
    let key = read_varint(buf)?;
    let number = key >> 3;
    if number == 0 || number > MAX_FIELD_NUMBER {
        return Err(SyncError::Decode(format!("invalid field number {}", number)));
    }
    Ok((number as u32, (key & 0x07) as u8))
}

fn read_len(buf: &mut &[u8]) -> SyncResult<usize> {
    let len = read_varint(buf)?;
    if len > buf.remaining() as u64 {
        return Err(SyncError::Decode(format!(
            "length {} exceeds remaining {} bytes",
            len,
            buf.remaining()
        )));
    }
    Ok(len as usize)
}

fn skip_fixed(buf: &mut &[u8], width: usize) -> SyncResult<()> {
    if buf.remaining() < width {
        return Err(SyncError::Decode("truncated fixed-width value".to_string()));
    }
    buf.advance(width);
    Ok(())
}

fn skip_value(buf: &mut &[u8], wire_type: u8) -> SyncResult<()> {
    match wire_type {
        WIRE_VARINT => read_varint(buf).map(|_| ()),
        WIRE_FIXED64 => skip_fixed(buf, 8),
        WIRE_FIXED32 => skip_fixed(buf, 4),
        WIRE_LEN => {
            let len = read_len(buf)?;
            buf.advance(len);
            Ok(())
        }
        other => Err(SyncError::Decode(format!("invalid wire type {}", other))),
    }
}

fn skip_group(buf: &mut &[u8], number: u32, depth: usize) -> SyncResult<()> {
    if depth >= MAX_GROUP_DEPTH {
        return Err(SyncError::Decode("group nesting too deep".to_string()));
    }
    loop {
        let (inner, wire_type) = read_key(buf)?;
        match wire_type {
            WIRE_END_GROUP if inner == number => return Ok(()),
            WIRE_END_GROUP => {
                return Err(SyncError::Decode(format!(
                    "mismatched end group {} inside {}",
                    inner, number
                )))
            }
            WIRE_START_GROUP => skip_group(buf, inner, depth + 1)?,
            other => skip_value(buf, other)?,
        }
    }
}

/// Write a base-128 varint
pub fn put_varint(out: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        out.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    out.put_u8(value as u8);
}

/// Encode `payload` as a length-delimited field with the given number
pub fn encode_len_field(number: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    put_varint(&mut out, (u64::from(number) << 3) | u64::from(WIRE_LEN));
    put_varint(&mut out, payload.len() as u64);
    out.put_slice(payload);
    out
}

/// Collect the raw bytes of every field not listed in `known_tags`.
///
/// Returns `None` when there are none, so records without unknown fields
/// compare equal regardless of where they came from.
pub fn split_unknown_fields(data: &[u8], known_tags: &[u32]) -> SyncResult<Option<Vec<u8>>> {
    let mut unknown = Vec::new();
    for field in FieldIter::new(data) {
        let field = field?;
        if !known_tags.contains(&field.number) {
            unknown.extend_from_slice(field.raw);
        }
    }
    Ok(if unknown.is_empty() { None } else { Some(unknown) })
}

/// Decode a record payload into its known fields and its unknown-field blob
pub fn decode_with_unknown<M>(data: &[u8]) -> SyncResult<(M, Option<Vec<u8>>)>
where
    M: Message + Default + KnownFields,
{
    let message = M::decode(data)?;
    let unknown = split_unknown_fields(data, M::KNOWN_TAGS)?;
    Ok((message, unknown))
}

/// Encode the known fields, then splice the unknown-field blob back in
pub fn encode_with_unknown<M: Message>(message: &M, unknown: Option<&[u8]>) -> Vec<u8> {
    let mut out = message.encode_to_vec();
    if let Some(unknown) = unknown {
        out.extend_from_slice(unknown);
    }
    out
}

/// Encode a nested message in place of `previous`, keeping whatever unknown
/// fields `previous` carried.
///
/// Malformed previous bytes contribute nothing.
pub fn reencode_nested<M>(message: &M, previous: Option<&[u8]>) -> Vec<u8>
where
    M: Message + KnownFields,
{
    let unknown = previous.and_then(|p| split_unknown_fields(p, M::KNOWN_TAGS).ok().flatten());
    encode_with_unknown(message, unknown.as_deref())
}
