//! Minimal DAG-CBOR encoding for messages.
//!
//! Only the subset messages use is supported: unsigned and negative integers,
//! byte strings and arrays. Headers always use the shortest form, and the
//! decoder rejects anything else so every value has one encoding.

use crate::error::MessageError;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_ARRAY: u8 = 4;

/// Append-only CBOR writer.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&mut self, major: u8, value: u64) {
        let m = major << 5;
        match value {
            0..=23 => self.buf.push(m | value as u8),
            24..=0xff => self.buf.extend_from_slice(&[m | 24, value as u8]),
            0x100..=0xffff => {
                self.buf.push(m | 25);
                self.buf.extend_from_slice(&(value as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(m | 26);
                self.buf.extend_from_slice(&(value as u32).to_be_bytes());
            }
            _ => {
                self.buf.push(m | 27);
                self.buf.extend_from_slice(&value.to_be_bytes());
            }
        }
    }

    pub fn array(&mut self, len: usize) -> &mut Self {
        self.header(MAJOR_ARRAY, len as u64);
        self
    }

    pub fn uint(&mut self, value: u64) -> &mut Self {
        self.header(MAJOR_UNSIGNED, value);
        self
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        if value >= 0 {
            self.header(MAJOR_UNSIGNED, value as u64);
        } else {
            self.header(MAJOR_NEGATIVE, (-1 - value) as u64);
        }
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.header(MAJOR_BYTES, data.len() as u64);
        self.buf.extend_from_slice(data);
        self
    }

    /// Append an already-encoded item.
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Cursor over canonical CBOR produced by [`Encoder`].
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], MessageError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| MessageError::Malformed("unexpected end of input".into()))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn header(&mut self) -> Result<(u8, u64), MessageError> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let (value, min) = match info {
            0..=23 => return Ok((major, info as u64)),
            24 => (self.take(1)?[0] as u64, 24),
            25 => (u16::from_be_bytes([self.take(1)?[0], self.take(1)?[0]]) as u64, 0x100),
            26 => {
                let mut b = [0u8; 4];
                b.copy_from_slice(self.take(4)?);
                (u32::from_be_bytes(b) as u64, 0x1_0000)
            }
            27 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(self.take(8)?);
                (u64::from_be_bytes(b), 0x1_0000_0000)
            }
            _ => {
                return Err(MessageError::Malformed(format!(
                    "unsupported additional info {info}"
                )))
            }
        };
        if value < min {
            return Err(MessageError::Malformed("non-minimal integer header".into()));
        }
        Ok((major, value))
    }

    fn expect(&mut self, major: u8) -> Result<u64, MessageError> {
        let (found, value) = self.header()?;
        if found != major {
            return Err(MessageError::Malformed(format!(
                "expected major type {major}, found {found}"
            )));
        }
        Ok(value)
    }

    pub fn array(&mut self) -> Result<usize, MessageError> {
        let len = self.expect(MAJOR_ARRAY)?;
        usize::try_from(len).map_err(|_| MessageError::Malformed("array too long".into()))
    }

    pub fn uint(&mut self) -> Result<u64, MessageError> {
        self.expect(MAJOR_UNSIGNED)
    }

    pub fn int(&mut self) -> Result<i64, MessageError> {
        let (major, value) = self.header()?;
        let out_of_range = || MessageError::Malformed("integer out of range".into());
        match major {
            MAJOR_UNSIGNED => i64::try_from(value).map_err(|_| out_of_range()),
            MAJOR_NEGATIVE => i64::try_from(value)
                .map(|v| -1 - v)
                .map_err(|_| out_of_range()),
            _ => Err(MessageError::Malformed(format!(
                "expected integer, found major type {major}"
            ))),
        }
    }

    pub fn bytes(&mut self) -> Result<&'a [u8], MessageError> {
        let len = self.expect(MAJOR_BYTES)?;
        let len =
            usize::try_from(len).map_err(|_| MessageError::Malformed("bytes too long".into()))?;
        self.take(len)
    }

    /// Fails unless all input was consumed.
    pub fn finish(&self) -> Result<(), MessageError> {
        if self.pos != self.data.len() {
            return Err(MessageError::Malformed(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}
