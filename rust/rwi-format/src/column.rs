/// How the bytes of a cell are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Opaque fixed-length character data, zero padded.
    FixedString,
    /// Unsigned integer.
    Cardinal,
    /// Small opaque code (for example, a document type byte).
    Binary,
    /// Bit vector; bit `i` lives in byte `i / 8` under mask `1 << (i % 8)`.
    Bitfield,
}

/// Byte encoding used by a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoder {
    /// Bytes are stored as-is.
    Bytes,
    /// Big-endian base-256 unsigned integer.
    B256,
}

/// A single column of a fixed-width record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    nickname: String,
    name: String,
    kind: CellKind,
    encoder: Encoder,
    width: usize,
}

impl Column {
    pub fn new(
        nickname: impl Into<String>,
        name: impl Into<String>,
        kind: CellKind,
        encoder: Encoder,
        width: usize,
    ) -> Column {
        Column {
            nickname: nickname.into(),
            name: name.into(),
            kind,
            encoder,
            width,
        }
    }

    pub fn string(nickname: &str, name: &str, width: usize) -> Column {
        Column::new(nickname, name, CellKind::FixedString, Encoder::Bytes, width)
    }

    pub fn cardinal(nickname: &str, name: &str, width: usize) -> Column {
        Column::new(nickname, name, CellKind::Cardinal, Encoder::B256, width)
    }

    pub fn binary(nickname: &str, name: &str, width: usize) -> Column {
        Column::new(nickname, name, CellKind::Binary, Encoder::B256, width)
    }

    pub fn bitfield(nickname: &str, name: &str, width: usize) -> Column {
        Column::new(nickname, name, CellKind::Bitfield, Encoder::Bytes, width)
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the cell can be read as an unsigned integer.
    pub fn is_numeric(&self) -> bool {
        self.encoder == Encoder::B256 && self.width <= 8
    }

    /// Matches either the full name or the nickname.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.nickname == name
    }
}
