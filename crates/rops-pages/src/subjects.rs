//! Subjects: the clients behind the requests

use crate::dataset::Dataset;
use crate::view::PageView;
use rops_model::RequestStatus;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub request_count: usize,
    /// Requests not yet delivered
    pub active_count: usize,
}

/// Subjects derived from request clients, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectsList {
    pub subjects: Vec<Subject>,
}

impl SubjectsList {
    #[must_use]
    pub fn project(data: &Dataset) -> Self {
        let mut by_client: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for request in &data.requests {
            let entry = by_client.entry(request.client.as_str()).or_default();
            entry.0 += 1;
            if request.status != RequestStatus::Delivered {
                entry.1 += 1;
            }
        }

        let subjects = by_client
            .into_iter()
            .map(|(name, (request_count, active_count))| Subject {
                name: name.to_string(),
                request_count,
                active_count,
            })
            .collect();
        Self { subjects }
    }
}

impl PageView for SubjectsList {
    fn title(&self) -> String {
        "Subjects".to_string()
    }

    fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    fn empty_state(&self) -> &'static str {
        "No subjects yet. Clients appear here once they have a request."
    }

    fn render_body(&self, out: &mut String) {
        for subject in &self.subjects {
            out.push_str(&format!(
                "  {}: {} requests, {} active\n",
                subject.name, subject.request_count, subject.active_count
            ));
        }
    }
}
