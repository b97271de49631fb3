//! ALS record layer.
//!
//! Record format:
//!   ContentType (1 byte)
//!   ProtocolVersion (1 byte): selects the AEAD family
//!   Length (2 bytes, big-endian)
//!   Payload (Length bytes)

use crate::crypto::RecordCipher;
use crate::error::Error;

/// Record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 0x11,
    Alert = 0x12,
    Handshake = 0x13,
    ApplicationData = 0x14,
}

impl ContentType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x11 => Some(Self::ChangeCipherSpec),
            0x12 => Some(Self::Alert),
            0x13 => Some(Self::Handshake),
            0x14 => Some(Self::ApplicationData),
            _ => None,
        }
    }
}

/// Record protocol version, one per AEAD family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolVersion {
    /// AES-128-GCM with XOR nonces and 13-byte AAD.
    AesGcm = 0b01,
    /// NaCl box (X25519 + XSalsa20-Poly1305).
    XSalsa20Poly1305 = 0b10,
}

impl ProtocolVersion {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0b01 => Some(Self::AesGcm),
            0b10 => Some(Self::XSalsa20Poly1305),
            _ => None,
        }
    }
}

/// Record header size.
pub const RECORD_HEADER_LEN: usize = 4;

/// Largest payload the 16-bit length field can describe.
pub const MAX_RECORD_PAYLOAD: usize = u16::MAX as usize;

/// A single ALS record.
///
/// The wire length is always the payload length; sealing and opening
/// change both together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    content_type: ContentType,
    version: ProtocolVersion,
    payload: Vec<u8>,
}

impl Record {
    /// Build a record, rejecting payloads the length field cannot carry.
    pub fn new(
        content_type: ContentType,
        version: ProtocolVersion,
        payload: Vec<u8>,
    ) -> Result<Self, Error> {
        if payload.len() > MAX_RECORD_PAYLOAD {
            return Err(Error::RecordTooLarge);
        }
        Ok(Self {
            content_type,
            version,
            payload,
        })
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Payload length, as carried in the header.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Vec<u8> {
        &mut self.payload
    }

    /// Append the wire encoding to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(RECORD_HEADER_LEN + self.payload.len());
        out.push(self.content_type as u8);
        out.push(self.version as u8);
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
    }

    /// Wire encoding of this record.
    pub fn marshal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_HEADER_LEN + self.payload.len());
        self.write_to(&mut out);
        out
    }

    /// Read one record from the front of `input`, advancing it past the record.
    ///
    /// Fails with [`Error::DataCorrupted`] if the header or payload is
    /// truncated, or if the type or version byte is unknown.
    pub fn read(input: &mut &[u8]) -> Result<Self, Error> {
        let data = *input;
        if data.len() < RECORD_HEADER_LEN {
            return Err(Error::DataCorrupted);
        }
        let content_type = ContentType::from_byte(data[0]).ok_or(Error::DataCorrupted)?;
        let version = ProtocolVersion::from_byte(data[1]).ok_or(Error::DataCorrupted)?;
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;

        let rest = &data[RECORD_HEADER_LEN..];
        if rest.len() < length {
            return Err(Error::DataCorrupted);
        }
        *input = &rest[length..];

        Ok(Self {
            content_type,
            version,
            payload: rest[..length].to_vec(),
        })
    }

    /// Parse exactly one record; trailing bytes are rejected.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut input = data;
        let record = Self::read(&mut input)?;
        if !input.is_empty() {
            return Err(Error::DataCorrupted);
        }
        Ok(record)
    }

    /// Encrypt the payload in place under `cipher` at sequence number `seq`.
    pub fn seal<C: RecordCipher>(&mut self, cipher: &C, seq: u32) -> Result<(), Error> {
        if self.version != C::VERSION {
            return Err(Error::VersionMismatch);
        }
        cipher.seal(self, seq)?;
        if self.payload.len() > MAX_RECORD_PAYLOAD {
            return Err(Error::RecordTooLarge);
        }
        Ok(())
    }

    /// Decrypt and authenticate the payload in place.
    pub fn open<C: RecordCipher>(&mut self, cipher: &C, seq: u32) -> Result<(), Error> {
        if self.version != C::VERSION {
            return Err(Error::VersionMismatch);
        }
        cipher.open(self, seq)
    }
}

/// Per-direction record sequence counter.
///
/// Every record sent (or received) in one direction consumes exactly one
/// value, whether or not it is encrypted. Values start at zero and never
/// wrap.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u32,
    exhausted: bool,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the sequence number for the next record.
    pub fn next(&mut self) -> Result<u32, Error> {
        if self.exhausted {
            return Err(Error::SequenceExhausted);
        }
        let seq = self.next;
        match self.next.checked_add(1) {
            Some(n) => self.next = n,
            None => self.exhausted = true,
        }
        Ok(seq)
    }
}
