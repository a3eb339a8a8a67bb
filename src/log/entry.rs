//! Log entry definitions
//!
//! Defines the structure of individual log records and their binary codec.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

/// Header size: KeySize (4) + ValueSize (4) + Mark (2) = 10 bytes
pub const HEADER_SIZE: usize = 10;

/// Operation recorded by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Mark {
    /// Key now maps to the entry's value
    Set = 0,

    /// Tombstone: key was removed
    Delete = 1,
}

impl Mark {
    /// Map a raw on-disk mark, `None` for values no writer produces
    pub fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Mark::Set),
            1 => Some(Mark::Delete),
            _ => None,
        }
    }
}

/// Decoded fixed-size header of an entry
///
/// Decoding stops here; the caller fetches `key_size + value_size` payload
/// bytes separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub key_size: u32,
    pub value_size: u32,
    pub mark: Mark,
}

impl EntryHeader {
    /// Decode a header read from `offset` (the offset is only used for errors)
    pub fn decode(raw: &[u8; HEADER_SIZE], offset: u64) -> Result<Self> {
        let mut buf = &raw[..];
        let key_size = buf.get_u32();
        let value_size = buf.get_u32();
        let raw_mark = buf.get_u16();

        let mark = Mark::from_u16(raw_mark).ok_or_else(|| CaskError::Corruption {
            offset,
            reason: format!("unknown mark {}", raw_mark),
        })?;

        Ok(Self {
            key_size,
            value_size,
            mark,
        })
    }

    /// Bytes following the header
    pub fn payload_size(&self) -> u64 {
        self.key_size as u64 + self.value_size as u64
    }

    /// Header plus payload
    pub fn encoded_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_size()
    }
}

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub mark: Mark,
}

impl Entry {
    pub fn set(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            mark: Mark::Set,
        }
    }

    /// A tombstone carries the key and an empty value
    pub fn delete(key: Vec<u8>) -> Self {
        Self {
            key,
            value: Vec::new(),
            mark: Mark::Delete,
        }
    }

    pub fn key_size(&self) -> u32 {
        self.key.len() as u32
    }

    pub fn value_size(&self) -> u32 {
        self.value.len() as u32
    }

    /// Size on disk; the step a sequential scan advances by
    pub fn encoded_size(&self) -> u64 {
        (HEADER_SIZE + self.key.len() + self.value.len()) as u64
    }

    /// Encode into one contiguous buffer: header, key, value
    pub fn encode(&self) -> Result<Bytes> {
        for len in [self.key.len(), self.value.len()] {
            if u32::try_from(len).is_err() {
                return Err(CaskError::EntryTooLarge(len));
            }
        }

        let mut buf = BytesMut::with_capacity(self.encoded_size() as usize);
        buf.put_u32(self.key_size());
        buf.put_u32(self.value_size());
        buf.put_u16(self.mark as u16);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);

        Ok(buf.freeze())
    }
}
