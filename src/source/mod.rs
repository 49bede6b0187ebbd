pub mod client;
pub mod memory;
pub mod payload;
pub mod rate_limit;
pub mod text;

pub use client::*;
pub use memory::MemorySource;
pub use rate_limit::RateLimiter;
pub use text::{extract_id_from_url, first_english};
