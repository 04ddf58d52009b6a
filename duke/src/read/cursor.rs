//! A position-tracked big-endian byte reader over a borrowed `.class` file buffer.

use anyhow::{bail, Result};

pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	pub(crate) fn new(bytes: &'a [u8]) -> Cursor<'a> {
		Cursor { bytes, pos: 0 }
	}

	pub(crate) fn position(&self) -> usize {
		self.pos
	}

	pub(crate) fn seek(&mut self, pos: usize) {
		self.pos = pos;
	}

	pub(crate) fn remaining(&self) -> usize {
		self.bytes.len() - self.pos
	}

	pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
		if self.remaining() < n {
			bail!("unexpected end of class file at offset {} (wanted {n} more bytes)", self.pos);
		}
		let slice = &self.bytes[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	pub(crate) fn u8(&mut self) -> Result<u8> {
		Ok(self.bytes(1)?[0])
	}

	pub(crate) fn i8(&mut self) -> Result<i8> {
		Ok(self.u8()? as i8)
	}

	pub(crate) fn u16(&mut self) -> Result<u16> {
		let b = self.bytes(2)?;
		Ok(u16::from_be_bytes([b[0], b[1]]))
	}

	pub(crate) fn i16(&mut self) -> Result<i16> {
		Ok(self.u16()? as i16)
	}

	pub(crate) fn u32(&mut self) -> Result<u32> {
		let b = self.bytes(4)?;
		Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
	}

	pub(crate) fn i32(&mut self) -> Result<i32> {
		Ok(self.u32()? as i32)
	}

	pub(crate) fn u64(&mut self) -> Result<u64> {
		let b = self.bytes(8)?;
		Ok(u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
	}

	pub(crate) fn i64(&mut self) -> Result<i64> {
		Ok(self.u64()? as i64)
	}

	pub(crate) fn f32(&mut self) -> Result<f32> {
		Ok(f32::from_bits(self.u32()?))
	}

	pub(crate) fn f64(&mut self) -> Result<f64> {
		Ok(f64::from_bits(self.u64()?))
	}
}
