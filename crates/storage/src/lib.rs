//! Storage abstraction for PV records, sequence counters, and the task/user
//! collaborator surfaces.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use record::{ActivityRecord, TaskRecord, UserRecord};
pub use traits::PvStorage;
