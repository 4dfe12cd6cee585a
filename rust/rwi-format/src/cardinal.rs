//! Big-endian base-256 unsigned integers of 1 to 8 bytes.

use byteorder::{BigEndian, ByteOrder};

/// Largest value representable in `width` bytes.
pub fn max_value(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Reads an unsigned big-endian integer spanning all of `bytes`.
///
/// An empty slice reads as zero. Slices longer than eight bytes are read from
/// their last eight bytes.
pub fn read(bytes: &[u8]) -> u64 {
    match bytes.len() {
        0 => 0,
        n @ 1..=8 => BigEndian::read_uint(bytes, n),
        n => BigEndian::read_u64(&bytes[n - 8..]),
    }
}

/// Writes `value` into all of `dst`, big-endian, truncating it modulo `256^dst.len()`.
pub fn write(dst: &mut [u8], value: u64) {
    match dst.len() {
        0 => {}
        n @ 1..=8 => BigEndian::write_uint(dst, value & max_value(n), n),
        n => {
            let (high, low) = dst.split_at_mut(n - 8);
            high.fill(0);
            BigEndian::write_u64(low, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut buf = [0u8; 2];
        write(&mut buf, 0x1234);
        assert_eq!(buf, [0x12, 0x34]);
        assert_eq!(read(&buf), 0x1234);

        let mut one = [0u8; 1];
        write(&mut one, 255);
        assert_eq!(read(&one), 255);
    }

    #[test]
    fn test_truncation() {
        let mut buf = [0u8; 1];
        write(&mut buf, 256 + 7);
        assert_eq!(read(&buf), 7);

        let mut buf = [0u8; 2];
        write(&mut buf, 65536 + 3);
        assert_eq!(read(&buf), 3);
    }

    #[test]
    fn test_ordering_matches_bytes() {
        for _ in 0..1000 {
            let a = fastrand::u64(..65536);
            let b = fastrand::u64(..65536);
            let mut ba = [0u8; 2];
            let mut bb = [0u8; 2];
            write(&mut ba, a);
            write(&mut bb, b);
            assert_eq!(a.cmp(&b), ba.cmp(&bb));
        }
    }

    #[test]
    fn test_wide() {
        let mut buf = [0xffu8; 10];
        write(&mut buf, 42);
        assert_eq!(&buf[..2], &[0, 0]);
        assert_eq!(read(&buf), 42);
        assert_eq!(max_value(8), u64::MAX);
        assert_eq!(max_value(2), 65535);
    }
}
