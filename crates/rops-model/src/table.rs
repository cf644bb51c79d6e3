//! Step tables
//!
//! A [`StepTable`] is an ordered, non-empty list of steps with unique ids.
//! Two tables ship built in: the short `basic` walkthrough and the 16-step
//! `enterprise` tour whose navigation steps declare an expected route.

use crate::data::{DemoData, StatusPatch};
use crate::entities::{
    DocStatus, Module, ModuleStatus, Priority, QcFlag, QcSeverity, Request, RequestStatus, Source,
    SourceKind, WorkingDoc,
};
use crate::error::ModelError;
use crate::step::{DemoStep, StepAction};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Request id used throughout the built-in tours
const DEMO_REQUEST_ID: &str = "req-demo-001";
/// Working document id used throughout the built-in tours
const DEMO_DOC_ID: &str = "doc-demo-001";

/// Built-in table selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableKind {
    Basic,
    #[default]
    Enterprise,
}

impl FromStr for TableKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(TableKind::Basic),
            "enterprise" => Ok(TableKind::Enterprise),
            other => Err(ModelError::UnknownTable(other.to_string())),
        }
    }
}

/// Ordered list of tour steps
#[derive(Debug, Clone, PartialEq)]
pub struct StepTable {
    steps: Vec<DemoStep>,
}

impl StepTable {
    /// Build a table, rejecting empty lists and duplicate ids
    ///
    /// Completion flags are cleared: a table always starts fresh.
    ///
    /// # Errors
    /// - `ModelError::EmptyTable` when `steps` is empty
    /// - `ModelError::DuplicateStepId` when two steps share an id
    pub fn new(mut steps: Vec<DemoStep>) -> Result<Self, ModelError> {
        if steps.is_empty() {
            return Err(ModelError::EmptyTable);
        }

        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ModelError::DuplicateStepId(step.id.clone()));
            }
        }

        for step in &mut steps {
            step.completed = false;
        }

        Ok(Self { steps })
    }

    /// Built-in table by kind
    #[must_use]
    pub fn builtin(kind: TableKind) -> Self {
        match kind {
            TableKind::Basic => Self::basic(),
            TableKind::Enterprise => Self::enterprise(),
        }
    }

    /// Parse a YAML list of steps
    ///
    /// # Errors
    /// Parse failures and the validation errors of [`StepTable::new`].
    pub fn from_yaml_str(source: &str) -> Result<Self, ModelError> {
        let steps: Vec<DemoStep> = serde_yaml::from_str(source)?;
        Self::new(steps)
    }

    /// Parse a JSON array of steps
    ///
    /// # Errors
    /// Parse failures and the validation errors of [`StepTable::new`].
    pub fn from_json_str(source: &str) -> Result<Self, ModelError> {
        let steps: Vec<DemoStep> = serde_json::from_str(source)?;
        Self::new(steps)
    }

    /// Load a tour file; `.json` files parse as JSON, everything else as YAML
    ///
    /// # Errors
    /// I/O, parse and validation failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[DemoStep] {
        &self.steps
    }

    /// Number of steps (never zero)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for API symmetry with slices
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Consume into the step list
    #[inline]
    #[must_use]
    pub fn into_steps(self) -> Vec<DemoStep> {
        self.steps
    }

    /// Steps whose action tag was not recognised, as `(step id, tag)`
    #[must_use]
    pub fn unknown_actions(&self) -> Vec<(&str, &str)> {
        self.steps
            .iter()
            .filter(|step| step.action.is_unknown())
            .map(|step| (step.id.as_str(), step.action.tag()))
            .collect()
    }

    /// Short walkthrough without declared routes
    #[must_use]
    pub fn basic() -> Self {
        let steps = vec![
            DemoStep::new(
                "requests-board",
                "Requests board",
                "Every engagement starts as a request on the board.",
                StepAction::NavigateToRequests,
            )
            .with_target("[data-tour='requests-board']"),
            DemoStep::new(
                "create-request",
                "Create a request",
                "A client asks for a market entry assessment.",
                StepAction::CreateRequest,
            )
            .with_data(DemoData::Request(demo_request())),
            DemoStep::new(
                "open-studio",
                "Open the working studio",
                "The studio is where the brief gets written.",
                StepAction::NavigateToWorkingStudio,
            ),
            DemoStep::new(
                "create-brief",
                "Start a working document",
                "A draft brief is created for the request.",
                StepAction::CreateWorkingDoc,
            )
            .with_data(DemoData::WorkingDoc(demo_working_doc())),
            DemoStep::new(
                "add-modules",
                "Add modules",
                "Modules give the brief its structure.",
                StepAction::AddModules,
            )
            .with_data(DemoData::Modules(demo_modules().into())),
            DemoStep::new(
                "add-sources",
                "Attach sources",
                "Sources back every claim in the brief.",
                StepAction::AddSources,
            )
            .with_data(DemoData::Sources(demo_sources().into())),
            DemoStep::new(
                "sources-library",
                "Sources library",
                "All references live in one searchable library.",
                StepAction::NavigateToSources,
            ),
            DemoStep::new(
                "back-to-studio",
                "Back to the studio",
                "Return to the brief to keep writing.",
                StepAction::NavigateBackToStudio,
            ),
            DemoStep::new(
                "ai-assist",
                "AI assist",
                "Suggestions are drafted from the attached sources.",
                StepAction::DemoAiAssist,
            )
            .with_target("[data-tour='ai-panel']"),
            DemoStep::new(
                "quality-check",
                "Quality check",
                "QC flags issues before anything reaches the client.",
                StepAction::RunQualityCheck,
            )
            .with_data(DemoData::QcFlag(demo_qc_flag())),
            DemoStep::new(
                "complete",
                "You're all set",
                "That's the core loop from request to reviewed brief.",
                StepAction::DemoComplete,
            ),
        ];

        Self { steps }
    }

    /// Full enterprise tour; navigation steps declare their expected route
    #[must_use]
    pub fn enterprise() -> Self {
        let studio_path = format!("/working-studio/{DEMO_REQUEST_ID}");

        let steps = vec![
            DemoStep::new(
                "enterprise-requests",
                "Requests board",
                "Incoming client work is triaged on the requests board.",
                StepAction::NavigateToRequests,
            )
            .with_target("[data-tour='requests-board']")
            .with_expected_path("/requests"),
            DemoStep::new(
                "enterprise-create-request",
                "New client request",
                "Aurora Capital asks for a Nordic fintech market entry assessment.",
                StepAction::CreateRequest,
            )
            .with_target("[data-tour='new-request']")
            .with_data(DemoData::Request(demo_request())),
            DemoStep::new(
                "enterprise-start-request",
                "Pick up the request",
                "Moving the card to In Progress assigns it to the team.",
                StepAction::UpdateRequestStatus,
            )
            .with_data(DemoData::UpdateRequestStatus(StatusPatch::for_request(
                DEMO_REQUEST_ID,
                RequestStatus::InProgress,
            ))),
            DemoStep::new(
                "enterprise-open-studio",
                "Working studio",
                "Each request gets its own studio workspace.",
                StepAction::NavigateToWorkingStudio,
            )
            .with_target("[data-tour='studio']")
            .with_expected_path(studio_path.clone()),
            DemoStep::new(
                "enterprise-create-brief",
                "Draft the brief",
                "A working document is created from the request template.",
                StepAction::CreateWorkingDoc,
            )
            .with_data(DemoData::WorkingDoc(demo_working_doc())),
            DemoStep::new(
                "enterprise-add-modules",
                "Structure with modules",
                "Modules from the catalog become sections of the brief.",
                StepAction::AddModules,
            )
            .with_target("[data-tour='modules-panel']")
            .with_data(DemoData::Modules(demo_modules().into())),
            DemoStep::new(
                "enterprise-add-sources",
                "Cite sources",
                "Reports and filings are attached to the brief.",
                StepAction::AddSources,
            )
            .with_target("[data-tour='sources-panel']")
            .with_data(DemoData::Sources(demo_sources().into())),
            DemoStep::new(
                "enterprise-sources-library",
                "Sources library",
                "The library collects every reference across engagements.",
                StepAction::NavigateToSources,
            )
            .with_expected_path("/sources"),
            DemoStep::new(
                "enterprise-back-to-studio",
                "Back to the brief",
                "Return to the studio with the new references in place.",
                StepAction::NavigateBackToStudio,
            )
            .with_expected_path(studio_path),
            DemoStep::new(
                "enterprise-ai-assist",
                "AI assist",
                "The assistant proposes an outline grounded in the cited sources.",
                StepAction::DemoAiAssist,
            )
            .with_target("[data-tour='ai-panel']"),
            DemoStep::new(
                "enterprise-populate",
                "Populate content",
                "Accepted suggestions are written into the brief.",
                StepAction::PopulateContent,
            )
            .with_target("[data-tour='editor']"),
            DemoStep::new(
                "enterprise-quality-check",
                "Quality check",
                "QC checks citations, tone and completeness.",
                StepAction::RunQualityCheck,
            )
            .with_target("[data-tour='qc-panel']")
            .with_data(DemoData::QcFlag(demo_qc_flag())),
            DemoStep::new(
                "enterprise-send-to-qc",
                "Send to review",
                "The request moves to QC for a second pair of eyes.",
                StepAction::UpdateRequestStatus,
            )
            .with_data(DemoData::UpdateRequestStatus(StatusPatch::for_request(
                DEMO_REQUEST_ID,
                RequestStatus::Qc,
            ))),
            DemoStep::new(
                "enterprise-export",
                "Export",
                "The brief is exported for client delivery.",
                StepAction::ExportDocument,
            )
            .with_target("[data-tour='export']"),
            DemoStep::new(
                "enterprise-subjects",
                "Subjects",
                "Clients and subjects roll up across every engagement.",
                StepAction::NavigateToSubjects,
            )
            .with_expected_path("/subjects"),
            DemoStep::new(
                "enterprise-complete",
                "Tour complete",
                "You've seen a request go from intake to export.",
                StepAction::DemoComplete,
            ),
        ];

        Self { steps }
    }
}

impl Default for StepTable {
    fn default() -> Self {
        Self::enterprise()
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

// 2024-03-04T09:00:00Z
const SEED_EPOCH: i64 = 1_709_542_800;

fn demo_request() -> Request {
    Request {
        id: DEMO_REQUEST_ID.to_string(),
        title: "Market entry assessment: Nordic fintech".to_string(),
        client: "Aurora Capital".to_string(),
        status: RequestStatus::Open,
        priority: Priority::High,
        due_date: Some(at(SEED_EPOCH + 14 * 86_400)),
        created_at: at(SEED_EPOCH),
        updated_at: at(SEED_EPOCH),
    }
}

fn demo_working_doc() -> WorkingDoc {
    WorkingDoc {
        id: DEMO_DOC_ID.to_string(),
        request_id: DEMO_REQUEST_ID.to_string(),
        title: "Nordic fintech market entry brief".to_string(),
        content: String::new(),
        status: DocStatus::Draft,
        created_at: at(SEED_EPOCH + 600),
        updated_at: at(SEED_EPOCH + 600),
    }
}

fn demo_modules() -> Vec<Module> {
    [
        ("Executive summary", "Key findings and recommendation"),
        ("Market sizing", "Addressable market by segment and country"),
        ("Competitive landscape", "Incumbents, challengers and regulators"),
    ]
    .into_iter()
    .zip(1u32..)
    .map(|((name, description), order)| Module {
        id: format!("mod-demo-{order:03}"),
        working_doc_id: DEMO_DOC_ID.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        status: if order == 1 {
            ModuleStatus::Active
        } else {
            ModuleStatus::Pending
        },
        enabled: true,
        order,
    })
    .collect()
}

fn demo_sources() -> Vec<Source> {
    vec![
        Source {
            id: "src-demo-001".to_string(),
            working_doc_id: DEMO_DOC_ID.to_string(),
            title: "Nordic Payments Report 2024".to_string(),
            url: Some("https://example.com/reports/nordic-payments-2024".to_string()),
            kind: SourceKind::Report,
            added_at: at(SEED_EPOCH + 1_200),
        },
        Source {
            id: "src-demo-002".to_string(),
            working_doc_id: DEMO_DOC_ID.to_string(),
            title: "Licensing regimes for e-money institutions".to_string(),
            url: None,
            kind: SourceKind::Filing,
            added_at: at(SEED_EPOCH + 1_260),
        },
    ]
}

fn demo_qc_flag() -> QcFlag {
    QcFlag {
        id: "qc-demo-001".to_string(),
        working_doc_id: DEMO_DOC_ID.to_string(),
        severity: QcSeverity::Warning,
        message: "Market sizing cites a single source".to_string(),
        resolved: false,
    }
}
