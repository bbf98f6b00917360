//! Cross-cutting helpers shared by the driver, pool, and CLI.

pub mod cores;

pub use cores::count_cores;

/// Blocks the current thread for `millis` milliseconds. A small wrapper kept
/// alongside `count_cores` so callers needing a retry backoff against the
/// daemon's socket don't reach for a new dependency.
pub fn sleep_millis(millis: u64) {
    std::thread::sleep(std::time::Duration::from_millis(millis));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_cores_at_least_one() {
        assert!(count_cores() >= 1);
    }
}
