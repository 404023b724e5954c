//! # Durapipe Runtime
//!
//! In-process implementation of the Durapipe engine contract, plus the state
//! store backends.
//!
//! ## Components
//!
//! - [`LocalEngine`] - runs registered workflows on their own tasks, schedules
//!   activities concurrently, records completion history, and replays
//!   instances from that history without repeating side effects
//! - [`MemoryStateStore`] / [`FileStateStore`] - [`StateStore`] backends for
//!   tests and local runs
//!
//! A production deployment would substitute an external durable engine behind
//! the same protocol traits; this crate exists so the orchestration code can
//! be executed, replayed, and tested without one.

pub mod engine;
pub mod error;
pub mod store;

pub use durapipe_protocols::StateStore;
pub use engine::LocalEngine;
pub use error::EngineError;
pub use store::{FileStateStore, MemoryStateStore};
