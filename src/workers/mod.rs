//! Worker allocation: one job per gatherer, capacity per depot and patch

pub mod allocator;
pub mod data;
mod defense;
pub mod job;

pub use allocator::WorkerAllocator;
pub use data::WorkerData;
pub use job::{JobKind, WorkerJob};
