//! Small key-value persistence used for the event cache and the credential record.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::DaybookResult;

/// Load/save interface over raw bytes keyed by name
pub trait Store: Send + Sync {
    /// Load the value stored under `key`, `None` if nothing was saved
    fn load(&self, key: &str) -> DaybookResult<Option<Vec<u8>>>;

    /// Replace the value stored under `key`
    fn save(&self, key: &str, value: &[u8]) -> DaybookResult<()>;
}
