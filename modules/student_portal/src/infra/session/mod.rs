mod file_store;
mod memory;

pub use file_store::{FileSessionStore, StoreError};
pub use memory::MemorySessionStore;
