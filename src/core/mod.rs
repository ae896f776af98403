//! Core coordination logic.
//!
//! This module contains:
//! - RunLock: cross-run mutual exclusion
//! - StabilityDetector: mid-write detection for intake files
//! - AudioNormalizer: bounded-retry transcoding
//! - Coordinator: the per-task state machine and run aggregation

pub mod coordinator;
pub mod lock;
pub mod normalize;
pub mod readiness;

// Re-export commonly used types
pub use coordinator::{Coordinator, TaskError};
pub use lock::{LockToken, RunLock, RunLockGuard};
pub use normalize::{AudioNormalizer, NormalizeError};
pub use readiness::StabilityDetector;
