//! `accel::software`: the one concrete [`Device`] backend, gated behind the
//! `accel-software` feature. Dispatches each work-item to the same CPU block
//! codec the driver uses directly — there is no real vendor runtime to
//! bind to in this workspace, so this backend exists to exercise the
//! program/kernel cache and block-dispatch logic end to end without real
//! hardware.

use super::device::{AccelError, CommandQueue, Device, Kernel, Kind, Program};
use crate::lzo::compress::compress as lzo_compress;
use crate::lzo::decompress::decompress_safe;

pub struct SoftwareDevice {
    compute_units: usize,
}

impl SoftwareDevice {
    /// One "compute unit" per available CPU core, matching
    /// `crate::util::count_cores`'s role as the default worker count.
    pub fn new() -> Self {
        SoftwareDevice {
            compute_units: crate::util::count_cores(),
        }
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for SoftwareDevice {
    fn compute_units(&self) -> usize {
        self.compute_units
    }

    fn load_program(&self, kind: Kind) -> Result<Box<dyn Program>, AccelError> {
        Ok(Box::new(SoftwareProgram { kind }))
    }

    fn command_queue(&self) -> Box<dyn CommandQueue> {
        Box::new(SoftwareQueue)
    }
}

struct SoftwareProgram {
    kind: Kind,
}

impl Program for SoftwareProgram {
    fn kernel(&self) -> &dyn Kernel {
        self
    }
}

impl Kernel for SoftwareProgram {
    fn run(&self, input: &[u8], max_out_len: usize) -> Result<Vec<u8>, AccelError> {
        match self.kind {
            Kind::Compress(level) => Ok(lzo_compress(level, input, max_out_len)?),
            Kind::Decompress => Ok(decompress_safe(input, max_out_len)?),
        }
    }
}

struct SoftwareQueue;

impl CommandQueue for SoftwareQueue {
    fn run(&self, kernel: &dyn Kernel, input: &[u8], max_out_len: usize) -> Result<Vec<u8>, AccelError> {
        kernel.run(input, max_out_len)
    }
}
