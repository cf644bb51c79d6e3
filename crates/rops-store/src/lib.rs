//! Research Ops Demo Store
//!
//! Observable, explicitly constructed state container for the guided tour:
//! - [`DemoStore`]: mutators, [`DemoStore::snapshot`] and [`DemoStore::subscribe`]
//! - [`DemoState`]: tour position plus the request/document/module/source/QC collections
//! - [`StateStorage`]: durable backend for the persisted subset
//!   ([`MemoryStorage`], [`FileStorage`])
//!
//! # Example
//!
//! ```rust,ignore
//! use rops_model::StepTable;
//! use rops_store::DemoStore;
//!
//! let store = DemoStore::in_memory(StepTable::enterprise());
//! store.start_demo();
//! store.next_step();
//! assert_eq!(store.snapshot().current_step, 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod persist;
mod state;
mod store;

pub use error::StorageError;
pub use persist::{
    FileStorage, MemoryStorage, PersistedState, StateStorage, DEFAULT_STORAGE_KEY,
    PERSIST_VERSION,
};
pub use state::DemoState;
pub use store::{DemoStore, StoreSubscription};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
