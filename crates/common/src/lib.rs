#![forbid(unsafe_code)]

mod error;

use std::time::Duration;

pub use error::*;

/// TTL usado por `TtlCache::default()`.
pub const DEFAULT_TTL: Duration = Duration::from_millis(DEFAULT_TTL_MS);
pub const DEFAULT_TTL_MS: u64 = 60_000;
