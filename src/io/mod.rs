//! I/O operations module
//!
//! Contains task-scoped temporary files, retrying reads, the heavy
//! payload codec, and simulated network calls.

pub mod codec;
pub mod files;
pub mod network;

pub use codec::{compute_hash, decode_payload, encode_payload, generate_content, FilePayload};
pub use files::{read_with_retry, TaskFiles};
pub use network::{join_network_calls, simulate_network_delay, spawn_network_calls};
