//! Unique id generation for indexed records.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// A source of unique record identifiers.
///
/// Injected into the ingestion path so production code can use random UUIDs
/// while tests swap in deterministic sequential ids. Collision-free
/// generation is the implementation's responsibility.
pub trait IdGenerator: Send + Sync {
    /// Produce the next unique identifier.
    fn generate(&self) -> String;
}

/// Generates random 128-bit UUIDs (v4). The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Generates sequential ids (`"0"`, `"1"`, ...) for reproducible tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
