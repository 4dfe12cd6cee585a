use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

/// Number of bytes a [`Flags`] value occupies in a record.
pub const FLAGS_WIDTH: usize = 4;

bitflags! {
    /// Per-document category and per-term appearance flags.
    ///
    /// Bits 0 to 23 describe the document, bits 24 to 29 where the term appeared.
    /// Unnamed bits are retained as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Directory listing.
        const CAT_INDEXOF = 1 << 0;
        const CAT_HAS_LOCATION = 1 << 19;
        const CAT_HAS_IMAGE = 1 << 20;
        const CAT_HAS_AUDIO = 1 << 21;
        const CAT_HAS_VIDEO = 1 << 22;
        const CAT_HAS_APP = 1 << 23;

        const APP_DESCRIPTION = 1 << 24;
        const APP_TITLE = 1 << 25;
        const APP_CREATOR = 1 << 26;
        const APP_SUBJECT = 1 << 27;
        const APP_IDENTIFIER = 1 << 28;
        const APP_EMPHASIZED = 1 << 29;

        const _ = !0;
    }
}

impl Flags {
    /// Decodes the stored form: bit `i` is in byte `i / 8` under mask `1 << (i % 8)`.
    pub fn from_record_bytes(bytes: &[u8]) -> Flags {
        let mut raw = [0u8; FLAGS_WIDTH];
        let n = bytes.len().min(FLAGS_WIDTH);
        raw[..n].copy_from_slice(&bytes[..n]);
        Flags::from_bits_retain(LittleEndian::read_u32(&raw))
    }

    pub fn to_record_bytes(self) -> [u8; FLAGS_WIDTH] {
        let mut raw = [0u8; FLAGS_WIDTH];
        LittleEndian::write_u32(&mut raw, self.bits());
        raw
    }

    /// Tests bit `index`; indices past 31 read as unset.
    pub fn get(&self, index: u32) -> bool {
        index < 32 && self.bits() & (1 << index) != 0
    }

    pub fn set_bit(&mut self, index: u32, value: bool) {
        if index < 32 {
            self.set(Flags::from_bits_retain(1 << index), value);
        }
    }
}
