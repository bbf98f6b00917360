//! The LZO1X-1 compressor and decompressor, plus the variant enum
//! (`level`) and wire-format constants (`types`) they share.

pub mod compress;
pub mod decompress;
pub mod level;
pub mod types;

pub use compress::{compress, compress_bound};
pub use decompress::{decompress_fast, decompress_safe};
pub use level::Level;
