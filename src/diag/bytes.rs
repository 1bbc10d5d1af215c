//! Bounds-checked little-endian cursor over diag payloads

/// Sequential reader; every accessor returns `None` once the
/// buffer runs out instead of panicking.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn u16_le(&mut self) -> Option<u16> {
        let s = self.take(2)?;
        Some(u16::from_le_bytes([s[0], s[1]]))
    }

    pub fn u32_le(&mut self) -> Option<u32> {
        let s = self.take(4)?;
        Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let s = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(s)
    }

    /// Everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let s = &self.buf[self.pos..];
        self.pos = self.buf.len();
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xaa, 0xbb];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u8(), Some(0x01));
        assert_eq!(r.u16_le(), Some(0x1234));
        assert_eq!(r.u32_le(), Some(0x12345678));
        assert_eq!(r.remaining(), 2);
        assert_eq!(r.rest(), &[0xaa, 0xbb]);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_reads_past_end_return_none() {
        let data = [0x01, 0x02];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u32_le(), None);
        // A failed read must not consume anything
        assert_eq!(r.u16_le(), Some(0x0201));
        assert_eq!(r.u8(), None);
    }

    #[test]
    fn test_skip_and_take() {
        let data = [1, 2, 3, 4, 5];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.skip(2), Some(()));
        assert_eq!(r.take(2), Some(&[3u8, 4u8][..]));
        assert_eq!(r.take(2), None);
        assert_eq!(r.take(1), Some(&[5u8][..]));
    }
}
