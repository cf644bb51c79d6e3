//! Requests board: one column per request status

use crate::dataset::Dataset;
use crate::view::{matches_search, PageView};
use rops_model::{Request, RequestStatus};
use serde::Serialize;

/// Cards in one status column, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: RequestStatus,
    pub cards: Vec<Request>,
}

/// Kanban projection of the requests
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsBoard {
    pub columns: Vec<BoardColumn>,
    pub search: String,
}

impl RequestsBoard {
    /// Group requests matching `search` (title or client) by status
    #[must_use]
    pub fn project(data: &Dataset, search: &str) -> Self {
        let columns = RequestStatus::ALL
            .into_iter()
            .map(|status| {
                let mut cards: Vec<Request> = data
                    .requests
                    .iter()
                    .filter(|r| r.status == status)
                    .filter(|r| matches_search(search, &[r.title.as_str(), r.client.as_str()]))
                    .cloned()
                    .collect();
                cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                BoardColumn { status, cards }
            })
            .collect();

        Self {
            columns,
            search: search.to_string(),
        }
    }

    #[must_use]
    pub fn column(&self, status: RequestStatus) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.status == status)
    }

    /// Cards across all columns
    #[must_use]
    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}

impl PageView for RequestsBoard {
    fn title(&self) -> String {
        "Requests".to_string()
    }

    fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn empty_state(&self) -> &'static str {
        if self.search.trim().is_empty() {
            "No requests yet. Create one to get started."
        } else {
            "No requests match your search."
        }
    }

    fn render_body(&self, out: &mut String) {
        for column in &self.columns {
            out.push_str(&format!("[{}] {}\n", column.status, column.cards.len()));
            for card in &column.cards {
                out.push_str(&format!(
                    "  {} | {} | {:?}\n",
                    card.title, card.client, card.priority
                ));
            }
        }
    }
}
