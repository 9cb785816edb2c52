// file: src/cache/mod.rs
// description: idempotent publish cache module

pub mod store;

pub use store::{CacheEntry, PublishCache};
