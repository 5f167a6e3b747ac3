pub mod set;
pub mod uid;

pub use set::ThreadSafeSet;
pub use uid::UniqueIdAllocator;
