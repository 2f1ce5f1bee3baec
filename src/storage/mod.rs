//! Content and mastery storage.
//!
//! Content is read from JSON files in a data directory; mastery records are
//! kept in a single JSON file written atomically. In-memory stores back the
//! tests.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::{write_atomic, FileContentStore, FileMasteryStore};
pub use memory::{MemoryContentStore, MemoryMasteryStore};
pub use traits::{ContentStore, MasteryStore};
