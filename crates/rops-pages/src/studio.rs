//! Working studio: one working document with its modules, sources and QC flags

use crate::dataset::Dataset;
use crate::view::PageView;
use rops_model::{Module, QcFlag, Source, WorkingDoc};
use serde::Serialize;

/// Studio projection for a single working document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioView {
    pub doc: WorkingDoc,
    /// Enabled modules first, each group in display order
    pub modules: Vec<Module>,
    pub sources: Vec<Source>,
    pub qc_flags: Vec<QcFlag>,
}

impl StudioView {
    /// Studio for a document id or request id; `None` when there is no such
    /// document
    #[must_use]
    pub fn project(data: &Dataset, id: &str) -> Option<Self> {
        let doc = data.working_doc_for(id)?.clone();

        let mut modules: Vec<Module> = data
            .modules
            .iter()
            .filter(|m| m.working_doc_id == doc.id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| (!m.enabled, m.order));

        let sources = data
            .sources
            .iter()
            .filter(|s| s.working_doc_id == doc.id)
            .cloned()
            .collect();
        let qc_flags = data
            .qc_flags
            .iter()
            .filter(|f| f.working_doc_id == doc.id)
            .cloned()
            .collect();

        Some(Self {
            doc,
            modules,
            sources,
            qc_flags,
        })
    }

    /// Page shown when the id has no working document
    #[must_use]
    pub fn render_missing(id: &str) -> String {
        format!(
            "Working Studio\nNo working document for {id} yet. \
             Create one to start drafting the brief.\n"
        )
    }

    /// Unresolved QC flags
    #[must_use]
    pub fn open_flags(&self) -> usize {
        self.qc_flags.iter().filter(|f| !f.resolved).count()
    }
}

impl PageView for StudioView {
    fn title(&self) -> String {
        format!("Working Studio: {}", self.doc.title)
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn empty_state(&self) -> &'static str {
        ""
    }

    fn render_body(&self, out: &mut String) {
        if self.doc.content.trim().is_empty() {
            out.push_str("The brief is empty. Add modules or ask the assistant for a draft.\n");
        } else {
            out.push_str(self.doc.content.trim());
            out.push('\n');
        }

        out.push_str("Modules\n");
        if self.modules.is_empty() {
            out.push_str("  No modules yet.\n");
        }
        for module in &self.modules {
            let marker = if module.enabled { "x" } else { " " };
            out.push_str(&format!("  [{marker}] {} ({:?})\n", module.name, module.status));
        }

        out.push_str("Sources\n");
        if self.sources.is_empty() {
            out.push_str("  No sources attached.\n");
        }
        for source in &self.sources {
            out.push_str(&format!("  {}\n", source.title));
        }

        if !self.qc_flags.is_empty() {
            out.push_str(&format!("QC: {} open\n", self.open_flags()));
            for flag in &self.qc_flags {
                out.push_str(&format!("  {:?}: {}\n", flag.severity, flag.message));
            }
        }
    }
}
