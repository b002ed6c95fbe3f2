//! Session-based conversation memory
//!
//! Bounded, TTL-expiring, session-isolated store of conversation history.
//! Expiry is lazy (checked on access), eviction is LRU on capacity.

mod cache;

pub use cache::SessionMemory;
