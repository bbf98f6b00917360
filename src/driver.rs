//! The driver: orchestrates read → plan → compress/decompress → write, plus
//! the optional in-memory `verify` and `benchmark` passes. File I/O itself
//! lives in `main.rs`/`cli`; this module works entirely on in-memory buffers
//! so it can be exercised without touching disk.
//!
//! Block outputs are collected into `Mutex`-guarded slots rather than
//! written through raw pointers: each mutex is locked exactly once, by the
//! one worker that owns that block index, so there is no real contention —
//! it keeps the disjoint-destination invariant without `unsafe`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::block::planner::{plan_cpu_blocks, BlockPlan};
use crate::block::pool::run_pool;
use crate::container::{read_container, write_container};
use crate::error::DriverError;
use crate::lzo::compress::compress as lzo_compress;
use crate::lzo::decompress::decompress_safe;
use crate::lzo::level::Level;

/// Options controlling one compress operation.
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    pub level: Level,
    pub workers: usize,
    /// Re-decompress the produced container in memory and compare against
    /// `input` before returning.
    pub verify: bool,
    /// Run the single-block/multi-block timed passes after compressing.
    pub benchmark: bool,
}

/// Options controlling one decompress operation.
#[derive(Debug, Clone, Copy)]
pub struct DecompressOptions {
    pub workers: usize,
    /// Recompress the reconstructed output and confirm it decodes back to
    /// the same bytes — an internal self-consistency check, since a
    /// decompress operation has no separately supplied "original" to compare
    /// against.
    pub verify: bool,
    pub benchmark: bool,
}

/// Wall-clock timings from a `benchmark` pass. No human-readable formatting
/// lives here; the CLI is the one thing that turns this into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkReport {
    /// Time to process the whole input as a single block.
    pub single_block: Duration,
    /// Time to process the input via the planned multi-block pipeline.
    pub multi_block: Duration,
}

pub struct CompressOutcome {
    pub container: Vec<u8>,
    pub benchmark: Option<BenchmarkReport>,
}

pub struct DecompressOutcome {
    pub output: Vec<u8>,
    pub benchmark: Option<BenchmarkReport>,
}

/// Compresses `input` into a container: plan → dispatch workers → assemble
/// container → optional verify → (caller writes the result).
pub fn compress(input: &[u8], opts: &CompressOptions) -> Result<CompressOutcome, DriverError> {
    let plan = plan_cpu_blocks(input.len(), opts.workers);
    let container = compress_with_plan(input, opts.level, opts.workers, &plan)?;

    if opts.verify {
        let decoded = decompress(
            &container,
            &DecompressOptions {
                workers: opts.workers,
                verify: false,
                benchmark: false,
            },
        )?
        .output;
        if decoded != input {
            return Err(DriverError::VerifyMismatch {
                block_index: first_mismatch_block(&plan, input, &decoded),
            });
        }
    }

    let benchmark = if opts.benchmark {
        Some(benchmark_compress(input, opts.level, opts.workers))
    } else {
        None
    };

    Ok(CompressOutcome {
        container,
        benchmark,
    })
}

/// Decompresses a container: validate header → dispatch workers over
/// payload slices → optional verify → (caller writes the result).
pub fn decompress(
    container: &[u8],
    opts: &DecompressOptions,
) -> Result<DecompressOutcome, DriverError> {
    let output = decompress_to_bytes(container, opts.workers)?;

    if opts.verify {
        let recompressed = compress(
            &output,
            &CompressOptions {
                level: Level::from_cli(0),
                workers: opts.workers,
                verify: false,
                benchmark: false,
            },
        )?;
        let redecoded = decompress_to_bytes(&recompressed.container, opts.workers)?;
        if redecoded != output {
            return Err(DriverError::VerifyMismatch { block_index: 0 });
        }
    }

    let benchmark = if opts.benchmark {
        Some(benchmark_decompress(container, opts.workers))
    } else {
        None
    };

    Ok(DecompressOutcome { output, benchmark })
}

fn compress_with_plan(
    input: &[u8],
    level: Level,
    workers: usize,
    plan: &BlockPlan,
) -> Result<Vec<u8>, DriverError> {
    let slots: Vec<Mutex<Vec<u8>>> = (0..plan.block_count())
        .map(|_| Mutex::new(Vec::new()))
        .collect();

    run_pool(workers, plan.block_count(), |i| {
        let span = plan.spans[i];
        let slice = &input[span.start..span.start + span.len];
        let out = lzo_compress(level, slice, span.len)?;
        *slots[i].lock().unwrap() = out;
        Ok(())
    })
    .map_err(|e| DriverError::Compress(e.source))?;

    let outputs: Vec<Vec<u8>> = slots.into_iter().map(|m| m.into_inner().unwrap()).collect();
    write_container(input.len() as u64, plan.block_size, &outputs).map_err(DriverError::from)
}

fn decompress_to_bytes(container: &[u8], workers: usize) -> Result<Vec<u8>, DriverError> {
    let parsed = read_container(container)?;
    let block_count = parsed.header.block_count as usize;
    let slots: Vec<Mutex<Vec<u8>>> = (0..block_count).map(|_| Mutex::new(Vec::new())).collect();

    run_pool(workers, block_count, |i| {
        let compressed = parsed.compressed_block(i);
        let max_out_len = parsed.original_len(i);
        let out = decompress_safe(compressed, max_out_len)?;
        *slots[i].lock().unwrap() = out;
        Ok(())
    })
    .map_err(|e| DriverError::Decode(e.source))?;

    let mut output = Vec::with_capacity(parsed.header.original_size as usize);
    for slot in slots {
        output.extend(slot.into_inner().unwrap());
    }
    Ok(output)
}

/// Finds the first block whose decoded bytes disagree with the input, for a
/// useful `VerifyMismatch` diagnostic.
fn first_mismatch_block(plan: &BlockPlan, input: &[u8], decoded: &[u8]) -> usize {
    for (i, span) in plan.spans.iter().enumerate() {
        let original = &input[span.start..span.start + span.len];
        let got = decoded.get(span.start..span.start + span.len).unwrap_or(&[]);
        if original != got {
            return i;
        }
    }
    0
}

fn benchmark_compress(input: &[u8], level: Level, workers: usize) -> BenchmarkReport {
    let single_plan = BlockPlan {
        block_size: input.len().max(1),
        spans: if input.is_empty() {
            Vec::new()
        } else {
            vec![crate::block::planner::BlockSpan {
                start: 0,
                len: input.len(),
            }]
        },
    };
    let t0 = Instant::now();
    let _ = compress_with_plan(input, level, 1, &single_plan);
    let single_block = t0.elapsed();

    let multi_plan = plan_cpu_blocks(input.len(), workers);
    let t1 = Instant::now();
    let _ = compress_with_plan(input, level, workers, &multi_plan);
    let multi_block = t1.elapsed();

    BenchmarkReport {
        single_block,
        multi_block,
    }
}

fn benchmark_decompress(container: &[u8], workers: usize) -> BenchmarkReport {
    let t0 = Instant::now();
    let _ = decompress_to_bytes(container, 1);
    let single_block = t0.elapsed();

    let t1 = Instant::now();
    let _ = decompress_to_bytes(container, workers);
    let multi_block = t1.elapsed();

    BenchmarkReport {
        single_block,
        multi_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_compress_opts(workers: usize) -> CompressOptions {
        CompressOptions {
            level: Level::X,
            workers,
            verify: false,
            benchmark: false,
        }
    }

    fn default_decompress_opts(workers: usize) -> DecompressOptions {
        DecompressOptions {
            workers,
            verify: false,
            benchmark: false,
        }
    }

    #[test]
    fn empty_input_roundtrips() {
        let outcome = compress(&[], &default_compress_opts(4)).unwrap();
        let back = decompress(&outcome.container, &default_decompress_opts(4)).unwrap();
        assert!(back.output.is_empty());
    }

    #[test]
    fn roundtrips_across_worker_counts() {
        let input: Vec<u8> = (0..500_000).map(|i| ((i * 31) % 257) as u8).collect();
        for workers in [1, 2, 8] {
            let outcome = compress(&input, &default_compress_opts(workers)).unwrap();
            let back = decompress(&outcome.container, &default_decompress_opts(workers)).unwrap();
            assert_eq!(back.output, input, "mismatch at workers={workers}");
        }
    }

    #[test]
    fn container_is_byte_identical_regardless_of_worker_count() {
        // Determinism property: fixed (x, level, block_size) ⇒ byte-identical
        // container, independent of worker count.
        let input: Vec<u8> = (0..200_000).map(|i| ((i * 97) % 191) as u8).collect();
        let a = compress(&input, &default_compress_opts(1)).unwrap().container;
        let b = compress(&input, &default_compress_opts(6)).unwrap().container;
        assert_eq!(a, b);
    }

    #[test]
    fn verify_flag_succeeds_on_a_healthy_roundtrip() {
        let input: Vec<u8> = (0..10_000).map(|i| (i % 7) as u8).collect();
        let mut opts = default_compress_opts(4);
        opts.verify = true;
        let outcome = compress(&input, &opts).unwrap();
        assert!(!outcome.container.is_empty());
    }

    #[test]
    fn decompress_rejects_a_corrupt_container() {
        let input = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let outcome = compress(&input, &default_compress_opts(1)).unwrap();
        let mut tampered = outcome.container.clone();
        tampered[0] ^= 0xFF;
        let err = decompress(&tampered, &default_decompress_opts(1)).unwrap_err();
        assert!(matches!(err, DriverError::Container(_)));
    }

    #[test]
    fn benchmark_flag_populates_a_report() {
        let input: Vec<u8> = vec![7u8; 200_000];
        let mut opts = default_compress_opts(2);
        opts.benchmark = true;
        let outcome = compress(&input, &opts).unwrap();
        assert!(outcome.benchmark.is_some());
    }
}
