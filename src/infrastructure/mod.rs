pub mod clock;
pub mod dexscreener;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod telegram;
