//! Worker pool plumbing
//!
//! This module knows about threads, not about files:
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Client        │    │   Parallel       │    │   System        │
//! │   (Scanner)     │───▶│   Module         │───▶│   Resources     │
//! │                 │    │                  │    │                 │
//! │ • File paths    │    │ • WorkQueue      │    │ • CPU cores     │
//! │ • Per-file scan │    │ • Worker sizing  │    │ • OS threads    │
//! │ • Result map    │    │ • Scoped threads │    │                 │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use shredscan::parallel::{ExecutionStrategy, WorkQueue};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let queue = WorkQueue::new();
//! for n in 1..=10 {
//!     queue.push(n).unwrap();
//! }
//! queue.mark_done();
//!
//! let total = AtomicUsize::new(0);
//! let strategy = ExecutionStrategy::for_workload(0, queue.len());
//! strategy
//!     .run(|_worker_id| {
//!         while let Some(n) = queue.pop() {
//!             total.fetch_add(n, Ordering::Relaxed);
//!         }
//!     })
//!     .unwrap();
//! assert_eq!(total.load(Ordering::Relaxed), 55);
//! ```

pub mod core;
pub mod queue;

pub use core::{ExecutionStrategy, WorkerPanic};
pub use queue::{QueueClosed, WorkQueue};
