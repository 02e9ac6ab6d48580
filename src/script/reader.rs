use crate::error::{ScriptError, ScriptResult};

use super::types::{Vec2f, Vec2i, Vec3f, Vec3i};

/* Bounds-checked little-endian cursor over a script buffer.
 *
 * A read of N bytes fails only if fewer than N bytes remain, so reading the final byte of the
 * buffer is fine. Failed reads leave the cursor where it was.
 */
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

macro_rules! read_le {
    ($name: ident, $t: ty) => {
        pub fn $name(&mut self) -> ScriptResult<$t> {
            let bytes = self.take(std::mem::size_of::<$t>())?;
            let mut raw = [0u8; std::mem::size_of::<$t>()];
            raw.copy_from_slice(bytes);
            Ok(<$t>::from_le_bytes(raw))
        }
    };
}

impl<'a> BinaryReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> ScriptResult<Self> {
        let mut r = Self::new(buf);
        r.seek(pos)?;
        Ok(r)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.cursor)
    }

    fn eof(&self, needed: usize) -> ScriptError {
        ScriptError::EofReached {
            offset: self.cursor,
            needed,
            available: self.remaining(),
        }
    }

    fn take(&mut self, len: usize) -> ScriptResult<&'a [u8]> {
        let end = match self.cursor.checked_add(len) {
            Some(end) if end <= self.buf.len() => end,
            _ => return Err(self.eof(len)),
        };
        let out = &self.buf[self.cursor..end];
        self.cursor = end;
        Ok(out)
    }

    read_le!(read_u8, u8);
    read_le!(read_u16, u16);
    read_le!(read_u32, u32);
    read_le!(read_u64, u64);
    read_le!(read_i8, i8);
    read_le!(read_i16, i16);
    read_le!(read_i32, i32);
    read_le!(read_i64, i64);

    pub fn read_f32(&mut self) -> ScriptResult<f32> {
        self.read_u32().map(f32::from_bits)
    }

    pub fn read_f64(&mut self) -> ScriptResult<f64> {
        self.read_u64().map(f64::from_bits)
    }

    pub fn read_bool(&mut self) -> ScriptResult<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /* Invalid UTF-8 is replaced rather than rejected, strings are informational only. */
    pub fn read_string(&mut self, len: usize) -> ScriptResult<String> {
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn read_prefixed_string(&mut self) -> ScriptResult<String> {
        let start = self.cursor;
        let len = self.read_u16()?;
        self.read_string(len as usize).inspect_err(|_| self.cursor = start)
    }

    pub fn read_vec2i(&mut self) -> ScriptResult<Vec2i> {
        self.require(8)?;
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        Ok(Vec2i { x, y })
    }

    pub fn read_vec2f(&mut self) -> ScriptResult<Vec2f> {
        self.require(8)?;
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        Ok(Vec2f { x, y })
    }

    pub fn read_vec3i(&mut self) -> ScriptResult<Vec3i> {
        self.require(12)?;
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        let z = self.read_i32()?;
        Ok(Vec3i { x, y, z })
    }

    pub fn read_vec3f(&mut self) -> ScriptResult<Vec3f> {
        self.require(12)?;
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3f { x, y, z })
    }

    // Keeps composed reads all-or-nothing.
    fn require(&self, len: usize) -> ScriptResult<()> {
        if len > self.remaining() {
            Err(self.eof(len))
        } else {
            Ok(())
        }
    }

    pub fn check_signature(&mut self, expected: &[u8]) -> ScriptResult<()> {
        let found = self.take(expected.len())?;
        if found != expected {
            return Err(ScriptError::SignatureMismatch);
        }
        Ok(())
    }

    pub fn align_up(&mut self, alignment: usize) {
        debug_assert!(alignment.is_power_of_two());
        self.cursor = (self.cursor + alignment - 1) & !(alignment - 1);
    }

    pub fn seek(&mut self, pos: usize) -> ScriptResult<()> {
        if pos > self.buf.len() {
            return Err(ScriptError::EofReached {
                offset: pos,
                needed: 0,
                available: 0,
            });
        }
        self.cursor = pos;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> ScriptResult<()> {
        self.take(len).map(|_| ())
    }
}
