//! Block-parallel LZO1X codec: library crate backing the `lzopar` binary.
//!
//! Reading order follows the components described in `DESIGN.md`: memory
//! ops and the dictionary underlie the compressor/decompressor (`lzo`),
//! which the block planner and worker pool (`block`) drive in parallel,
//! assembled by the container codec (`container`) and sequenced by the
//! driver (`driver`). `accel` offers the same pipeline through a
//! device/program/kernel abstraction; `daemon` keeps that device's
//! resources resident across many requests. `cli` holds the argument
//! surface and logging constants the binary uses.

pub mod accel;
pub mod block;
pub mod cli;
pub mod config;
pub mod container;
pub mod daemon;
pub mod dict;
pub mod driver;
pub mod error;
pub mod lzo;
pub mod mem;
pub mod util;

pub use container::{read_container, write_container, ContainerHeader};
pub use driver::{compress, decompress, CompressOptions, DecompressOptions};
pub use error::{CompressError, ContainerError, DaemonError, DecodeError, DriverError};
pub use lzo::level::Level;
