//! Page data source
//!
//! Pages read the demo store's collections while the tour runs and a fixed
//! fallback dataset otherwise, so the app never renders blank outside a tour.

use chrono::{DateTime, Utc};
use rops_model::{
    DocStatus, Module, ModuleStatus, Priority, QcFlag, QcSeverity, Request, RequestStatus, Source,
    SourceKind, WorkingDoc,
};
use rops_store::DemoState;

/// Collections a page projection reads from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub requests: Vec<Request>,
    pub working_docs: Vec<WorkingDoc>,
    pub modules: Vec<Module>,
    pub sources: Vec<Source>,
    pub qc_flags: Vec<QcFlag>,
}

impl Dataset {
    /// Demo collections in demo mode, the fallback dataset otherwise
    #[must_use]
    pub fn for_state(state: &DemoState) -> Self {
        if state.is_demo_mode {
            Self::from_demo(state)
        } else {
            Self::fallback()
        }
    }

    /// The store's collections, regardless of mode
    #[must_use]
    pub fn from_demo(state: &DemoState) -> Self {
        Self {
            requests: state.requests.clone(),
            working_docs: state.working_docs.clone(),
            modules: state.modules.clone(),
            sources: state.sources.clone(),
            qc_flags: state.qc_flags.clone(),
        }
    }

    /// Static data shown outside demo mode
    #[must_use]
    pub fn fallback() -> Self {
        let requests = vec![
            request(
                "req-001",
                "Competitor pricing review",
                "Halden Foods",
                RequestStatus::Open,
                Priority::Medium,
                0,
            ),
            request(
                "req-002",
                "Regulatory scan: EU battery rules",
                "Volta Mobility",
                RequestStatus::InProgress,
                Priority::High,
                1,
            ),
            request(
                "req-003",
                "Customer interview synthesis",
                "Halden Foods",
                RequestStatus::Qc,
                Priority::Low,
                2,
            ),
            request(
                "req-004",
                "Supplier risk assessment",
                "Northwind Logistics",
                RequestStatus::Delivered,
                Priority::Urgent,
                3,
            ),
        ];

        let working_docs = vec![WorkingDoc {
            id: "doc-002".to_string(),
            request_id: "req-002".to_string(),
            title: "EU battery regulation brief".to_string(),
            content: "## Scope\nBattery passport, due diligence and recycled content \
                      targets under the new EU regulation."
                .to_string(),
            status: DocStatus::InReview,
            created_at: day(1),
            updated_at: day(2),
        }];

        let modules = [
            ("Scope", ModuleStatus::Completed),
            ("Obligations by role", ModuleStatus::Active),
            ("Timeline", ModuleStatus::Pending),
        ]
        .into_iter()
        .zip(1u32..)
        .map(|((name, status), order)| Module {
            id: format!("mod-{order:03}"),
            working_doc_id: "doc-002".to_string(),
            name: name.to_string(),
            description: String::new(),
            status,
            enabled: true,
            order,
        })
        .collect();

        let sources = vec![
            Source {
                id: "src-001".to_string(),
                working_doc_id: "doc-002".to_string(),
                title: "Regulation (EU) 2023/1542".to_string(),
                url: Some("https://eur-lex.europa.eu/eli/reg/2023/1542/oj".to_string()),
                kind: SourceKind::Filing,
                added_at: day(1),
            },
            Source {
                id: "src-002".to_string(),
                working_doc_id: "doc-002".to_string(),
                title: "Interview: compliance lead, cell manufacturer".to_string(),
                url: None,
                kind: SourceKind::Interview,
                added_at: day(2),
            },
        ];

        let qc_flags = vec![QcFlag {
            id: "qc-001".to_string(),
            working_doc_id: "doc-002".to_string(),
            severity: QcSeverity::Info,
            message: "Timeline section has no sources yet".to_string(),
            resolved: false,
        }];

        Self {
            requests,
            working_docs,
            modules,
            sources,
            qc_flags,
        }
    }

    /// Working document by its own id or its request's id
    #[must_use]
    pub fn working_doc_for(&self, id: &str) -> Option<&WorkingDoc> {
        self.working_docs
            .iter()
            .rev()
            .find(|d| d.id == id || d.request_id == id)
    }
}

// 2024-02-05T09:00:00Z
const FALLBACK_EPOCH: i64 = 1_707_123_600;

fn day(n: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(FALLBACK_EPOCH + n * 86_400, 0).unwrap_or_default()
}

fn request(
    id: &str,
    title: &str,
    client: &str,
    status: RequestStatus,
    priority: Priority,
    offset_days: i64,
) -> Request {
    Request {
        id: id.to_string(),
        title: title.to_string(),
        client: client.to_string(),
        status,
        priority,
        due_date: Some(day(offset_days + 21)),
        created_at: day(offset_days),
        updated_at: day(offset_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rops_model::StepTable;

    #[test]
    fn fallback_outside_demo_mode() {
        let state = DemoState::new(StepTable::basic().into_steps());
        let data = Dataset::for_state(&state);

        assert_eq!(data, Dataset::fallback());
        assert_eq!(data.requests.len(), 4);
    }

    #[test]
    fn demo_collections_in_demo_mode() {
        let mut state = DemoState::new(StepTable::basic().into_steps());
        state.is_demo_mode = true;

        let data = Dataset::for_state(&state);
        assert!(data.requests.is_empty());
        assert!(data.working_docs.is_empty());
    }

    #[test]
    fn working_doc_lookup_by_either_id() {
        let data = Dataset::fallback();
        assert_eq!(data.working_doc_for("doc-002").map(|d| d.id.as_str()), Some("doc-002"));
        assert_eq!(data.working_doc_for("req-002").map(|d| d.id.as_str()), Some("doc-002"));
        assert!(data.working_doc_for("req-001").is_none());
    }
}
