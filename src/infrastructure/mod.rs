//! Storage adapters implementing the domain ports.

pub mod fault;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
