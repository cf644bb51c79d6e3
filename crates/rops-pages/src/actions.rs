//! User-triggered mutations
//!
//! Things a user does on a page outside the scripted tour: adding a module
//! or a source to the open working document, toggling a module. New entities
//! get random ids so they never collide with seeded `*-demo-*` ids.

use chrono::Utc;
use rops_model::{Module, ModuleStatus, Source, SourceKind};
use rops_store::DemoStore;
use uuid::Uuid;

/// Rejected page action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("no working document {0}")]
    UnknownDocument(String),

    #[error("no module {0}")]
    UnknownModule(String),

    #[error("{field} must not be blank")]
    Blank { field: &'static str },
}

/// Add a module at the end of a working document's module list
///
/// # Errors
/// `PageError::UnknownDocument` if the document is not in the store,
/// `PageError::Blank` for an empty name.
pub fn add_module(
    store: &DemoStore,
    working_doc_id: &str,
    name: &str,
    description: &str,
) -> Result<Module, PageError> {
    let name = non_blank(name, "name")?;
    let next_order = store.read(|s| {
        s.working_docs
            .iter()
            .any(|d| d.id == working_doc_id)
            .then(|| {
                s.modules_of(working_doc_id)
                    .last()
                    .map_or(1, |m| m.order + 1)
            })
    });
    let order = next_order.ok_or_else(|| PageError::UnknownDocument(working_doc_id.to_string()))?;

    let module = Module {
        id: format!("mod-{}", Uuid::new_v4()),
        working_doc_id: working_doc_id.to_string(),
        name,
        description: description.trim().to_string(),
        status: ModuleStatus::Pending,
        enabled: true,
        order,
    };
    tracing::info!(module = %module.id, doc = working_doc_id, "module added");
    store.add_manual_module(module.clone());
    Ok(module)
}

/// Attach a source to a working document
///
/// # Errors
/// `PageError::UnknownDocument` if the document is not in the store,
/// `PageError::Blank` for an empty title.
pub fn add_source(
    store: &DemoStore,
    working_doc_id: &str,
    title: &str,
    url: Option<&str>,
    kind: SourceKind,
) -> Result<Source, PageError> {
    let title = non_blank(title, "title")?;
    if !store.read(|s| s.working_docs.iter().any(|d| d.id == working_doc_id)) {
        return Err(PageError::UnknownDocument(working_doc_id.to_string()));
    }

    let source = Source {
        id: format!("src-{}", Uuid::new_v4()),
        working_doc_id: working_doc_id.to_string(),
        title,
        url: url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
        kind,
        added_at: Utc::now(),
    };
    tracing::info!(source = %source.id, doc = working_doc_id, "source added");
    store.add_manual_source(source.clone());
    Ok(source)
}

/// Flip a module's enabled flag; returns the new value
///
/// # Errors
/// `PageError::UnknownModule` if no module has this id.
pub fn toggle_module(store: &DemoStore, module_id: &str) -> Result<bool, PageError> {
    store
        .toggle_module(module_id)
        .ok_or_else(|| PageError::UnknownModule(module_id.to_string()))
}

fn non_blank(value: &str, field: &'static str) -> Result<String, PageError> {
    let value = value.trim();
    if value.is_empty() {
        Err(PageError::Blank { field })
    } else {
        Ok(value.to_string())
    }
}
