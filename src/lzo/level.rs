//! Compressor level: selects the dictionary hash-table width (`D_BITS`).
//! Four variants differ only in `D_BITS` (11, 12, 14, 15); each carries its
//! per-variant sizing via a `match` on associated constants rather than a
//! v-table.

/// A compressor variant, named the way the CLI surfaces it (`-L {1,1k,1l,1o}`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// `D_BITS = 11` — smallest dictionary, fastest, worst ratio.
    L,
    /// `D_BITS = 12`.
    K,
    /// `D_BITS = 14` — the historical `lzo1x_1_compress` default.
    X,
    /// `D_BITS = 15` — largest dictionary, best ratio of the four.
    O,
}

impl Level {
    /// `D_BITS` for this variant: log2 of the dictionary's slot count.
    pub const fn d_bits(self) -> u32 {
        match self {
            Level::L => 11,
            Level::K => 12,
            Level::X => 14,
            Level::O => 15,
        }
    }

    /// Number of slots in the dictionary hash table (`1 << d_bits`).
    pub const fn dict_slots(self) -> usize {
        1usize << self.d_bits()
    }

    /// Maps a CLI `-L` numeral to a variant: `1 -> L`, `2 -> K`, `4 -> O`,
    /// anything else (including the default `3`) falls back to `X`.
    pub const fn from_cli(n: u8) -> Level {
        match n {
            1 => Level::L,
            2 => Level::K,
            4 => Level::O,
            _ => Level::X,
        }
    }

    /// Maps the daemon protocol's 1-9 "compression level" to a variant:
    /// `1..3 -> X, 4..6 -> K, 7..8 -> L, 9+ -> O`. Distinct from
    /// [`Level::from_cli`]'s `-L` numeral mapping, which uses wider level
    /// bands than the CLI's one-to-one `-L` numerals.
    pub const fn from_daemon_level(level: u8) -> Level {
        match level {
            1..=3 => Level::X,
            4..=6 => Level::K,
            7..=8 => Level::L,
            _ => Level::O,
        }
    }

    /// One-letter label used in CLI help text and log lines.
    pub const fn label(self) -> char {
        match self {
            Level::L => 'l',
            Level::K => 'k',
            Level::X => 'x',
            Level::O => 'o',
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
