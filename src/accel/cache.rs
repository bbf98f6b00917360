//! Program and buffer caches for the accelerator path: a reusable heap
//! buffer with a capacity and a populated-length count, kept around across
//! calls instead of being reallocated, plus a program cache that plays the
//! equivalent role for compiled kernels: load once per `Kind`, reuse for the
//! rest of the process's (or daemon's) lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::device::{AccelError, Device, DeviceBuffer, Kind, Program};

/// Loads and retains one [`Program`] per [`Kind`] for the lifetime of the
/// cache: the first request for a given level pays the load cost, every
/// later one reuses it.
pub struct ProgramCache {
    device: Arc<dyn Device>,
    programs: Mutex<HashMap<Kind, Arc<dyn Program>>>,
}

impl ProgramCache {
    pub fn new(device: Arc<dyn Device>) -> Self {
        ProgramCache {
            device,
            programs: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached program for `kind`, loading it via
    /// [`Device::load_program`] on first use.
    pub fn get_or_load(&self, kind: Kind) -> Result<Arc<dyn Program>, AccelError> {
        let mut table = self.programs.lock().unwrap();
        if let Some(p) = table.get(&kind) {
            return Ok(Arc::clone(p));
        }
        let p: Arc<dyn Program> = Arc::from(self.device.load_program(kind)?);
        table.insert(kind, Arc::clone(&p));
        Ok(p)
    }
}

/// A reusable heap buffer with a capacity and a populated byte count — the
/// one concrete [`DeviceBuffer`] implementation, used by `accel::software`
/// as host-side scratch for a block's decoded/encoded bytes.
pub struct HostBuffer {
    data: Vec<u8>,
    size: usize,
}

impl HostBuffer {
    pub fn new() -> Self {
        HostBuffer {
            data: Vec::new(),
            size: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    pub fn set_len(&mut self, size: usize) {
        assert!(size <= self.data.capacity());
        self.size = size;
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let cap = self.data.capacity();
        if self.data.len() < cap {
            self.data.resize(cap, 0);
        }
        &mut self.data[..cap]
    }
}

impl Default for HostBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBuffer for HostBuffer {
    fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Grows in place only when `needed` exceeds the current capacity: no
    /// reallocation on the common path of repeated same-size blocks.
    fn ensure_capacity(&mut self, needed: usize) {
        if self.data.capacity() < needed {
            self.data = Vec::with_capacity(needed);
        }
    }
}

#[cfg(all(test, feature = "accel-software"))]
mod tests {
    use super::*;
    use crate::accel::software::SoftwareDevice;
    use crate::lzo::level::Level;

    #[test]
    fn program_cache_loads_once_and_reuses() {
        let device: Arc<dyn Device> = Arc::new(SoftwareDevice::new());
        let cache = ProgramCache::new(device);
        let a = cache.get_or_load(Kind::Compress(Level::X)).unwrap();
        let b = cache.get_or_load(Kind::Compress(Level::X)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn program_cache_distinguishes_kinds() {
        let device: Arc<dyn Device> = Arc::new(SoftwareDevice::new());
        let cache = ProgramCache::new(device);
        let compress = cache.get_or_load(Kind::Compress(Level::X)).unwrap();
        let decompress = cache.get_or_load(Kind::Decompress).unwrap();
        assert!(!Arc::ptr_eq(&compress, &decompress));
    }

    #[test]
    fn host_buffer_grows_in_place_only_when_needed() {
        let mut buf = HostBuffer::new();
        buf.ensure_capacity(1024);
        let cap_after_first_grow = buf.capacity();
        assert!(cap_after_first_grow >= 1024);
        buf.ensure_capacity(512);
        assert_eq!(buf.capacity(), cap_after_first_grow, "shrink request must be a no-op");
    }

    #[test]
    fn host_buffer_exposes_only_the_populated_length() {
        let mut buf = HostBuffer::new();
        buf.ensure_capacity(8);
        buf.as_mut_slice()[..4].copy_from_slice(&[1, 2, 3, 4]);
        buf.set_len(4);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
    }
}
