//! LZO1X token grammar constants: the M1–M4 marker bits and offset/length
//! ranges are fixed by the wire format, not by compressor level.

pub const M1_MAX_OFFSET: usize = 0x0400;
pub const M2_MAX_OFFSET: usize = 0x0800;
pub const M3_MAX_OFFSET: usize = 0x4000;
pub const M4_MAX_OFFSET: usize = 0xbfff;

pub const M2_MIN_LEN: usize = 3;
pub const M2_MAX_LEN: usize = 8;
pub const M3_MIN_LEN: usize = 3;
pub const M3_MAX_LEN: usize = 33;
pub const M4_MIN_LEN: usize = 3;
pub const M4_MAX_LEN: usize = 9;

pub const M2_MARKER: u8 = 64;
pub const M3_MARKER: u8 = 32;
pub const M4_MARKER: u8 = 16;

/// The minimum 4-byte match length the hash-based finder ever emits
/// (a dword comparison is the finder's unit of work).
pub const MIN_MATCH: usize = 4;
