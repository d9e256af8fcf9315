//! Key-value storage for the Roleypoly API.
//!
//! This crate provides:
//!
//! - **Namespaces**: the `KvNamespace` backend trait and its typed JSON wrapper
//! - **Backends**: in-memory and Cloudflare Workers KV
//! - **Read-through cache**: `CacheLayer`, memoizing a fetch under a TTL

pub mod cache;
pub mod cloudflare;
pub mod error;
pub mod memory;
pub mod namespace;

pub use cache::{CacheLayer, CacheOptions};
pub use cloudflare::{CloudflareKv, CloudflareKvConfig};
pub use error::{CacheError, KvError};
pub use memory::MemoryKv;
pub use namespace::{KvNamespace, WrappedKvNamespace};
