//! The device/program/kernel abstraction. The accelerator vendor's runtime
//! API is abstracted as a generic device handle plus a program/kernel cache,
//! rather than bound to a concrete OpenCL binding. `accel::software` is the
//! one concrete backend, used for testing the cache/dispatch logic
//! end-to-end.

use std::fmt;

use crate::error::{CompressError, DecodeError};
use crate::lzo::level::Level;

/// Identifies which program/kernel a request needs: one of the four
/// compressor variants, or the (single, variant-independent) decompressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Compress(Level),
    Decompress,
}

impl Kind {
    /// On-disk kernel-binary base name (`<variant>.bin` for a compressor
    /// variant, `lzo1x_decomp.bin` for the decompressor).
    pub fn binary_name(self) -> &'static str {
        match self {
            Kind::Compress(Level::X) => "lzo1x_1.bin",
            Kind::Compress(Level::K) => "lzo1x_1k.bin",
            Kind::Compress(Level::L) => "lzo1x_1l.bin",
            Kind::Compress(Level::O) => "lzo1x_1o.bin",
            Kind::Decompress => "lzo1x_decomp.bin",
        }
    }
}

/// A compiled/loaded kernel: dispatches one block (one "work-item").
pub trait Kernel: Send + Sync {
    /// Encodes or decodes `input` into an owned output buffer no larger
    /// than `max_out_len` bytes would allow; the caller (the accelerator
    /// driver) is responsible for compacting per-block outputs into the
    /// container payload afterwards.
    fn run(&self, input: &[u8], max_out_len: usize) -> Result<Vec<u8>, AccelError>;
}

/// A loaded program: one or more kernels, retained for the lifetime of the
/// process (daemon) or driver (in-process).
pub trait Program: Send + Sync {
    fn kernel(&self) -> &dyn Kernel;
}

/// An in-flight (or, for `accel::software`, already-finished-by-the-time-it-
/// returns) unit of submitted work: one block through one kernel.
pub trait CommandQueue: Send + Sync {
    /// Submits `input` to `kernel` and blocks until the result is ready.
    /// A real device's queue would overlap transfer/compute/transfer across
    /// several in-flight submissions; `accel::software` has nothing to
    /// overlap, so this is synchronous there.
    fn run(&self, kernel: &dyn Kernel, input: &[u8], max_out_len: usize) -> Result<Vec<u8>, AccelError>;
}

/// A reusable device-side (or, for `accel::software`, host-side) scratch
/// buffer that grows in place rather than being reallocated per block.
pub trait DeviceBuffer: Send {
    fn capacity(&self) -> usize;
    /// Grows the buffer's capacity to at least `needed`, if it isn't already.
    fn ensure_capacity(&mut self, needed: usize);
}

/// A device handle: exposes enough to size work dispatch
/// (`compute_units`) and to load programs for a given [`Kind`].
pub trait Device: Send + Sync {
    /// Used by the accelerator block planner's `target = compute_units *
    /// OCC_FACTOR` heuristic.
    fn compute_units(&self) -> usize;

    /// Loads (from a precompiled binary, falling back to source) the
    /// program for `kind`; implementations that have no binary/source step
    /// (like `accel::software`) just construct the program directly.
    fn load_program(&self, kind: Kind) -> Result<Box<dyn Program>, AccelError>;

    /// Returns a queue to submit work through.
    fn command_queue(&self) -> Box<dyn CommandQueue>;
}

/// Errors from the accelerator path: the same codec failures as the CPU
/// path, plus resource failures specific to device/program management.
#[derive(Debug)]
pub enum AccelError {
    Compress(CompressError),
    Decode(DecodeError),
    Container(crate::error::ContainerError),
    /// Neither a precompiled binary nor a source fallback was found for a
    /// kernel.
    MissingKernel(&'static str),
}

impl fmt::Display for AccelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccelError::Compress(e) => write!(f, "{e}"),
            AccelError::Decode(e) => write!(f, "{e}"),
            AccelError::Container(e) => write!(f, "{e}"),
            AccelError::MissingKernel(name) => write!(f, "missing kernel binary or source: {name}"),
        }
    }
}
impl std::error::Error for AccelError {}

impl From<CompressError> for AccelError {
    fn from(e: CompressError) -> Self {
        AccelError::Compress(e)
    }
}
impl From<DecodeError> for AccelError {
    fn from(e: DecodeError) -> Self {
        AccelError::Decode(e)
    }
}
impl From<crate::error::ContainerError> for AccelError {
    fn from(e: crate::error::ContainerError) -> Self {
        AccelError::Container(e)
    }
}
