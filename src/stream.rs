//! Little-endian binary stream — the primitive codec every block encoder
//! and decoder is built on.
//!
//! A [`BinStream`] owns a growable byte buffer plus a read cursor.  Writes
//! always append at the end; reads advance the cursor.  All integers are
//! little-endian, strings are a `u32` byte length followed by raw UTF-8
//! (no terminator), and reading past the end fails with
//! [`Error::TruncatedStream`] rather than panicking.

use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3};

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone)]
pub struct BinStream {
    data: Vec<u8>,
    pos: usize,
}

impl BinStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing buffer; the read cursor starts at offset 0.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the read cursor to an absolute offset (clamped to the buffer end).
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Advance the read cursor by `n` bytes without copying.  Used to skip
    /// unknown block payloads.
    pub fn shift(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance the cursor past them.
    pub fn take(&mut self, n: usize) -> Result<&[u8]> {
        let left = self.remaining();
        if n > left {
            return Err(Error::TruncatedStream { needed: n, left });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    // ── Scalar writes ────────────────────────────────────────────────────────

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.data.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, v);
        self.write_bytes(&buf)
    }

    pub fn write_i16(&mut self, v: i16) -> &mut Self {
        self.write_u16(v as u16)
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v);
        self.write_bytes(&buf)
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.write_u32(v as u32)
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, v);
        self.write_bytes(&buf)
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, v);
        self.write_bytes(&buf)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// `u32` byte length followed by raw UTF-8.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes())
    }

    pub fn write_vec2(&mut self, v: Vec2) -> &mut Self {
        self.write_f32(v.x).write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> &mut Self {
        self.write_f32(v.x).write_f32(v.y).write_f32(v.z)
    }

    // ── Scalar reads ─────────────────────────────────────────────────────────

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    // ── Primitive runs ───────────────────────────────────────────────────────

    /// `u32` element count followed by a contiguous `u32` run.
    pub fn write_u32_seq(&mut self, values: &[u32]) -> &mut Self {
        self.write_u32(values.len() as u32);
        for &v in values {
            self.write_u32(v);
        }
        self
    }

    pub fn read_u32_seq(&mut self) -> Result<Vec<u32>> {
        let count = self.read_u32()? as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }

    /// `u32` element count followed by a contiguous `u64` run.
    pub fn write_u64_seq(&mut self, values: &[u64]) -> &mut Self {
        self.write_u32(values.len() as u32);
        for &v in values {
            self.write_u64(v);
        }
        self
    }

    pub fn read_u64_seq(&mut self) -> Result<Vec<u64>> {
        let count = self.read_u32()? as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining() / 8));
        for _ in 0..count {
            values.push(self.read_u64()?);
        }
        Ok(values)
    }
}
