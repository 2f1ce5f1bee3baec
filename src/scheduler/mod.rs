//! Adaptive scheduling.
//!
//! BKT updates and decay drive items in learning mode; the memory model
//! drives items in retention mode. [`Scheduler`] combines both into item
//! selection and session queues.

pub mod bkt;
pub mod decay;
pub mod engine;
pub mod scoring;

pub use decay::DecayResult;
pub use engine::{ItemStatus, ItemUpdate, Scheduler};
