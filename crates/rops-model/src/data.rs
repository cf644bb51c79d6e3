//! Step payloads
//!
//! [`DemoData`] is what a data-injection step hands to the demo store. The
//! `modules` and `sources` kinds accept either a single entity or a list; both
//! shapes flatten into the target collection.

use crate::entities::{Module, QcFlag, Request, RequestStatus, Source, WorkingDoc};
use serde::{Deserialize, Serialize};

/// A single value or a list of values
///
/// Deserializes from either shape. `Many` is listed first so a list is never
/// mistaken for a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flatten into a list
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }

    /// Number of contained values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::Many(items) => items.len(),
            OneOrMany::One(_) => 1,
        }
    }

    /// True when a `Many` holds no values
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// Status change for an existing request
///
/// Without `request_id` the patch targets the most recently added request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub status: RequestStatus,
}

impl StatusPatch {
    /// Patch the most recent request
    #[inline]
    #[must_use]
    pub fn latest(status: RequestStatus) -> Self {
        Self {
            request_id: None,
            status,
        }
    }

    /// Patch a specific request
    #[inline]
    #[must_use]
    pub fn for_request(request_id: impl Into<String>, status: RequestStatus) -> Self {
        Self {
            request_id: Some(request_id.into()),
            status,
        }
    }
}

/// Payload injected into the demo store by a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum DemoData {
    Request(Request),
    WorkingDoc(WorkingDoc),
    Modules(OneOrMany<Module>),
    Sources(OneOrMany<Source>),
    QcFlag(QcFlag),
    UpdateRequestStatus(StatusPatch),
}

impl DemoData {
    /// Wire name of the payload kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DemoData::Request(_) => "request",
            DemoData::WorkingDoc(_) => "working_doc",
            DemoData::Modules(_) => "modules",
            DemoData::Sources(_) => "sources",
            DemoData::QcFlag(_) => "qc_flag",
            DemoData::UpdateRequestStatus(_) => "update_request_status",
        }
    }
}
