//! Research Ops Pages
//!
//! Headless rendition of the app the tour walks through:
//! - Page projections over a [`Dataset`]: [`RequestsBoard`], [`StudioView`],
//!   [`SourcesLibrary`], [`ModulesCatalog`], [`SubjectsList`]
//! - Static fallback data outside demo mode
//! - User actions that add modules and sources
//! - [`SimulatedBrowser`], a [`rops_navigator::TourEffects`] implementation
//!   that renders pages from the store

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod actions;
mod board;
mod browser;
mod catalog;
mod dataset;
mod library;
mod studio;
mod subjects;
mod view;

pub use actions::{add_module, add_source, toggle_module, PageError};
pub use board::{BoardColumn, RequestsBoard};
pub use browser::SimulatedBrowser;
pub use catalog::{ModuleGroup, ModulesCatalog};
pub use dataset::Dataset;
pub use library::SourcesLibrary;
pub use studio::StudioView;
pub use subjects::{Subject, SubjectsList};
pub use view::{render_path, route_param, PageView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
