#![forbid(unsafe_code)]

mod cache;
mod entry;

pub use cache::{Lookup, TtlCache};
pub use ttlmemo_common::{CacheError, CacheResult, DEFAULT_TTL};
