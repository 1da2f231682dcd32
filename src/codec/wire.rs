//! Packed little-endian field access for wire records

use crate::types::WireType;

/// A fixed-size wire record.
///
/// Implemented for byte arrays so each group declares its exact record size
/// in its type.
pub trait WireRecord: AsRef<[u8]> + AsMut<[u8]> + Copy + Send + 'static {
    /// Size in bytes of the record
    const SIZE: usize;

    /// All-zero record; no uninitialized bytes ever reach the backend.
    fn zeroed() -> Self;

    /// Copy from a slice of exactly [`SIZE`](Self::SIZE) bytes.
    fn from_slice(bytes: &[u8]) -> Option<Self>;
}

impl<const N: usize> WireRecord for [u8; N] {
    const SIZE: usize = N;

    fn zeroed() -> Self {
        [0; N]
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok()
    }
}

/// Sum of field widths for a packed field list.
pub const fn packed_size(fields: &[(&str, &str, WireType)]) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < fields.len() {
        size += fields[i].2.size();
        i += 1;
    }
    size
}

/// Sequential reader over a packed record.
///
/// Fields are read in declaration order. Record sizes are fixed by the
/// layout, so reads never run past the end of a well-typed record.
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take<const W: usize>(&mut self) -> [u8; W] {
        let mut buf = [0u8; W];
        buf.copy_from_slice(&self.bytes[self.offset..self.offset + W]);
        self.offset += W;
        buf
    }

    pub fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    pub fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }

    pub fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    pub fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.take())
    }

    /// Simulator booleans travel as INT32, any non-zero value is true.
    pub fn bool(&mut self) -> bool {
        self.i32() != 0
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }
}

/// Sequential writer into a zeroed packed record.
pub struct FieldWriter<R: WireRecord> {
    record: R,
    offset: usize,
}

impl<R: WireRecord> FieldWriter<R> {
    pub fn new() -> Self {
        Self { record: R::zeroed(), offset: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> &mut Self {
        let end = self.offset + bytes.len();
        self.record.as_mut()[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.i32(i32::from(value))
    }

    /// Finish the record. Every byte must have been written.
    pub fn finish(&mut self) -> R {
        debug_assert_eq!(self.offset, R::SIZE, "record not fully written");
        self.record
    }
}

impl<R: WireRecord> Default for FieldWriter<R> {
    fn default() -> Self {
        Self::new()
    }
}
