//! The accelerator-offload path: a generic device/program/kernel abstraction
//! ([`device`]), process-long program and buffer caches ([`cache`]), one
//! concrete in-process backend ([`software`]), and [`AccelDriver`] here,
//! which plans accelerator-sized blocks and dispatches them through a device
//! exactly the way `driver::compress`/`decompress` dispatch CPU-sized blocks
//! through `block::pool::run_pool` — the two drivers share the container
//! codec and the worker pool, differing only in the block-size heuristic and
//! in going through a `Device` instead of calling the codec directly.

pub mod cache;
pub mod device;
#[cfg(feature = "accel-software")]
pub mod software;

pub use cache::{HostBuffer, ProgramCache};
pub use device::{AccelError, CommandQueue, Device, DeviceBuffer, Kernel, Kind, Program};

use std::sync::{Arc, Mutex};

use crate::block::planner::{plan_accel_blocks, BlockPlan};
use crate::block::pool::run_pool;
use crate::container::{read_container, write_container};
use crate::lzo::level::Level;

/// Occupancy factor for the `target = compute_units * OCC_FACTOR` block
/// count heuristic: enough in-flight work-items per compute unit to hide
/// per-item overhead without fragmenting the input into blocks too small to
/// amortize it.
const OCC_FACTOR: usize = 4;

/// Drives one device end to end: plans blocks, loads (and reuses) the
/// program for the requested [`Kind`], and dispatches every block through
/// the device's command queue via the same atomic-index work pool the CPU
/// driver uses.
pub struct AccelDriver {
    device: Arc<dyn Device>,
    programs: ProgramCache,
}

impl AccelDriver {
    pub fn new(device: Arc<dyn Device>) -> Self {
        let programs = ProgramCache::new(Arc::clone(&device));
        AccelDriver { device, programs }
    }

    /// Compresses `input` into a container using the accelerator block plan
    /// and the given `level`'s kernel.
    pub fn compress(&self, input: &[u8], level: Level, workers: usize) -> Result<Vec<u8>, AccelError> {
        let plan = plan_accel_blocks(input.len(), self.device.compute_units(), OCC_FACTOR);
        let program = self.programs.get_or_load(Kind::Compress(level))?;
        let kernel = program.kernel();
        let queue = self.device.command_queue();

        let outputs = dispatch_blocks(&plan, workers, |span| {
            let slice = &input[span.start..span.start + span.len];
            queue.run(kernel, slice, crate::lzo::compress::compress_bound(slice.len()))
        })?;

        write_container(input.len() as u64, plan.block_size, &outputs).map_err(AccelError::from)
    }

    /// Decompresses a container using the accelerator path. The length
    /// table in the container is the single source of truth for each
    /// block's output length; there is no fallback that recovers a length
    /// from the compressed bytes themselves.
    pub fn decompress(&self, container: &[u8], workers: usize) -> Result<Vec<u8>, AccelError> {
        let parsed = read_container(container)?;
        let program = self.programs.get_or_load(Kind::Decompress)?;
        let kernel = program.kernel();
        let queue = self.device.command_queue();
        let block_count = parsed.header.block_count as usize;

        let slots: Vec<Mutex<Vec<u8>>> = (0..block_count).map(|_| Mutex::new(Vec::new())).collect();
        run_pool(workers, block_count, |i| {
            let compressed = parsed.compressed_block(i);
            let max_out_len = parsed.original_len(i);
            let out = queue.run(kernel, compressed, max_out_len)?;
            *slots[i].lock().unwrap() = out;
            Ok(())
        })
        .map_err(|e| e.source)?;

        let mut output = Vec::with_capacity(parsed.header.original_size as usize);
        for slot in slots {
            output.extend(slot.into_inner().unwrap());
        }
        Ok(output)
    }
}

/// Runs one block-index-parallel pass over `plan`'s spans, collecting each
/// block's output into its plan-ordered slot.
fn dispatch_blocks<F>(plan: &BlockPlan, workers: usize, work: F) -> Result<Vec<Vec<u8>>, AccelError>
where
    F: Fn(crate::block::planner::BlockSpan) -> Result<Vec<u8>, AccelError> + Sync,
{
    let slots: Vec<Mutex<Vec<u8>>> = (0..plan.block_count()).map(|_| Mutex::new(Vec::new())).collect();
    run_pool(workers, plan.block_count(), |i| {
        let out = work(plan.spans[i])?;
        *slots[i].lock().unwrap() = out;
        Ok(())
    })
    .map_err(|e| e.source)?;
    Ok(slots.into_iter().map(|m| m.into_inner().unwrap()).collect())
}

#[cfg(all(test, feature = "accel-software"))]
mod tests {
    use super::*;
    use crate::accel::software::SoftwareDevice;

    fn driver() -> AccelDriver {
        AccelDriver::new(Arc::new(SoftwareDevice::new()))
    }

    #[test]
    fn roundtrips_through_the_software_backend() {
        let input: Vec<u8> = (0..300_000).map(|i| ((i * 13) % 251) as u8).collect();
        let d = driver();
        let container = d.compress(&input, Level::X, 4).unwrap();
        let back = d.decompress(&container, 4).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn empty_input_roundtrips() {
        let d = driver();
        let container = d.compress(&[], Level::X, 4).unwrap();
        let back = d.decompress(&container, 4).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn program_is_loaded_once_across_many_blocks() {
        let input = vec![9u8; 1_000_000];
        let d = driver();
        // plan_accel_blocks will split this into several blocks; if the
        // program cache reloaded per block this would still pass
        // functionally, but the cache identity test in `cache.rs` covers the
        // "loads once" contract directly. This just confirms a multi-block
        // accelerator compress still round-trips.
        let container = d.compress(&input, Level::K, 2).unwrap();
        let back = d.decompress(&container, 2).unwrap();
        assert_eq!(back, input);
    }
}
