//! Energy storage components shared by the cooperative.

/// Ordered collection of storage units with fixed-priority allocation.
pub mod pool;
/// Single bounded energy buffer.
pub mod unit;

pub use pool::StoragePool;
pub use unit::StorageUnit;
