//! Long-running processors of the relay pipeline:
//!
//! - `FactoryWatcher`: polls factory logs, emits `FundCreated`
//! - `EventRelay`: receives `FundCreated`, broadcasts batches to subscribers

pub mod factory_watcher;
pub mod relay;

pub use factory_watcher::FactoryWatcher;
pub use relay::{EventRelay, RelayChannel, RelayError};
