//! Research Ops Model
//!
//! Typed vocabulary shared by the guided tour:
//! - [`DemoStep`] and the [`StepAction`] tag set
//! - [`StepTable`]: ordered, validated step lists (built-in or loaded from YAML/JSON)
//! - [`DemoData`]: payloads a step injects into the demo store
//! - Research-ops entities: [`Request`], [`WorkingDoc`], [`Module`], [`Source`], [`QcFlag`]
//!
//! # Example
//!
//! ```rust,ignore
//! use rops_model::{StepTable, StepAction};
//!
//! let table = StepTable::enterprise();
//! assert_eq!(table.len(), 16);
//! assert_eq!(table.steps()[0].action, StepAction::NavigateToRequests);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod data;
mod entities;
mod error;
mod step;
mod table;

pub use data::{DemoData, OneOrMany, StatusPatch};
pub use entities::{
    DocStatus, Module, ModuleStatus, Priority, QcFlag, QcSeverity, Request, RequestStatus, Source,
    SourceKind, WorkingDoc,
};
pub use error::ModelError;
pub use step::{ActionKind, DemoStep, StepAction};
pub use table::{StepTable, TableKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
