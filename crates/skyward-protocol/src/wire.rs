//! Primitive readers and writers for the big-endian wire scalars.

use crate::message::WireError;

/// Appends big-endian scalars to a byte buffer.
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new(tag: u8) -> Self {
        Self { buf: vec![tag] }
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Consumes big-endian scalars from a byte slice, tracking the cursor.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated { field });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, WireError> {
        Ok(self.take(1, field)?[0])
    }

    pub fn i8(&mut self, field: &'static str) -> Result<i8, WireError> {
        Ok(self.take(1, field)?[0] as i8)
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, WireError> {
        let bytes = self.take(2, field)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, WireError> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn i64(&mut self, field: &'static str) -> Result<i64, WireError> {
        let bytes = self.take(8, field)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_be_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_emits_big_endian() {
        let mut w = Writer::new(7);
        w.u16(0x0102);
        w.u32(0x03040506);
        w.i64(-2);
        let bytes = w.finish();
        assert_eq!(&bytes[..7], &[7, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(&bytes[7..], &(-2i64).to_be_bytes());
    }

    #[test]
    fn reader_roundtrips_writer() {
        let mut w = Writer::new(0);
        w.u8(200);
        w.i8(-5);
        w.u16(40000);
        w.u32(123_456_789);
        w.i64(-9_000_000_000);
        let bytes = w.finish();

        let mut r = Reader::new(&bytes[1..]);
        assert_eq!(r.u8("a").unwrap(), 200);
        assert_eq!(r.i8("b").unwrap(), -5);
        assert_eq!(r.u16("c").unwrap(), 40000);
        assert_eq!(r.u32("d").unwrap(), 123_456_789);
        assert_eq!(r.i64("e").unwrap(), -9_000_000_000);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn reader_reports_truncation() {
        let mut r = Reader::new(&[0x01]);
        let err = r.u32("pos_x").unwrap_err();
        assert!(matches!(err, WireError::Truncated { field: "pos_x" }));
    }
}
