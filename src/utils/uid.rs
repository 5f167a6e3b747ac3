use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

/// Hands out subscriber ids that are unique for the lifetime of the allocator.
///
/// Ids start at 1 and strictly increase. Several suites can watch the same key
/// under different ids and deregister without touching each other.
#[derive(Debug, Default)]
pub struct UniqueIdAllocator {
    last: AtomicI64,
}

impl UniqueIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> i64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last id handed out, 0 if none
    pub fn last(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}
