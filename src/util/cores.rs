/// Returns the number of logical CPU cores available on the system, via
/// `std::thread::available_parallelism`.
///
/// Guaranteed to return a value >= 1 (falls back to 1 on error).
pub fn count_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
