//! The fixed-size worker pool: `num_workers` OS threads drain a shared block
//! queue via atomic fetch-add, each claiming the next unclaimed index rather
//! than being handed work through a channel. An explicit atomic index keeps
//! the scheduling discipline visible and testable instead of hiding it
//! behind a work-stealing scheduler.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A block-level failure, naming which block index first reported it.
#[derive(Debug)]
pub struct PoolError<E> {
    pub block_index: usize,
    pub source: E,
}

impl<E: fmt::Display> fmt::Display for PoolError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}: {}", self.block_index, self.source)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for PoolError<E> {}

/// Drains `0..num_blocks` across `num_workers` OS threads: each worker
/// claims the next unclaimed index via atomic fetch-add and calls `work`
/// with it. `work` is responsible for writing into whatever disjoint
/// destination region index `i` owns; the pool only sequences *which*
/// index each worker processes next, never synchronizes their writes.
///
/// On the first `Err` returned by any worker, the shared `status` word is
/// set and every other worker exits its claim loop as soon as it next
/// checks — without claiming further indices. The first-reported error
/// (by claim order, not necessarily by thread) is returned.
pub fn run_pool<F, E>(num_workers: usize, num_blocks: usize, work: F) -> Result<(), PoolError<E>>
where
    F: Fn(usize) -> Result<(), E> + Sync,
    E: Send,
{
    if num_blocks == 0 {
        return Ok(());
    }

    let next_index = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let error_slot: Mutex<Option<PoolError<E>>> = Mutex::new(None);
    let workers = num_workers.max(1).min(num_blocks);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if failed.load(Ordering::Acquire) {
                    break;
                }
                let idx = next_index.fetch_add(1, Ordering::Relaxed);
                if idx >= num_blocks {
                    break;
                }
                if let Err(source) = work(idx) {
                    let mut slot = error_slot.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(PoolError {
                            block_index: idx,
                            source,
                        });
                    }
                    drop(slot);
                    failed.store(true, Ordering::Release);
                    break;
                }
            });
        }
    });

    match error_slot.into_inner().unwrap() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;
    use std::sync::Arc;

    #[test]
    fn visits_every_index_exactly_once() {
        let n = 2000;
        let seen: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();
        run_pool::<_, ()>(8, n, |i| {
            assert!(!seen[i].swap(true, Ordering::SeqCst), "index {i} visited twice");
            Ok(())
        })
        .unwrap();
        assert!(seen.iter().all(|b| b.load(Ordering::SeqCst)));
    }

    #[test]
    fn disjoint_writes_from_many_workers_are_all_observed() {
        let n = 512;
        let dest = Arc::new((0..n).map(|_| Counter::new(0)).collect::<Vec<_>>());
        let dest2 = Arc::clone(&dest);
        run_pool::<_, ()>(16, n, move |i| {
            dest2[i].store((i * 7 + 1) as usize, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        for (i, slot) in dest.iter().enumerate() {
            assert_eq!(slot.load(Ordering::SeqCst), i * 7 + 1);
        }
    }

    #[test]
    fn one_worker_behaves_like_sequential_execution() {
        let n = 100;
        let mut order = Vec::new();
        let order_mutex = Mutex::new(&mut order);
        run_pool::<_, ()>(1, n, |i| {
            order_mutex.lock().unwrap().push(i);
            Ok(())
        })
        .unwrap();
        assert_eq!(*order_mutex.lock().unwrap(), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn first_failure_aborts_remaining_claims() {
        let n = 10_000;
        let claimed = Arc::new(AtomicUsize::new(0));
        let claimed2 = Arc::clone(&claimed);
        let result = run_pool::<_, &'static str>(4, n, move |i| {
            claimed2.fetch_add(1, Ordering::SeqCst);
            if i == 3 {
                Err("synthetic block failure")
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        // Not every block should have been claimed once the error fired;
        // this is a liveness property, not a tight bound, since threads
        // racing the failure may already have claimed a few more indices.
        assert!(claimed.load(Ordering::SeqCst) < n);
    }

    #[test]
    fn zero_blocks_is_trivially_ok() {
        let result = run_pool::<_, ()>(4, 0, |_| Ok(()));
        assert!(result.is_ok());
    }
}
