//! Tour steps and the action vocabulary
//!
//! The action tag is the contract between a step table and the navigator.
//! Tags outside the known vocabulary load as [`StepAction::Unknown`] so tour
//! files written for newer builds still parse; the navigator treats them as
//! pass-through steps.

use crate::data::DemoData;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// What the navigator does when a step becomes current
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    NavigateToRequests,
    CreateRequest,
    UpdateRequestStatus,
    NavigateToWorkingStudio,
    CreateWorkingDoc,
    AddModules,
    AddSources,
    NavigateToSources,
    NavigateBackToStudio,
    DemoAiAssist,
    PopulateContent,
    RunQualityCheck,
    ExportDocument,
    NavigateToSubjects,
    DemoComplete,
    /// Tag not in the known vocabulary
    Unknown(String),
}

/// Broad category of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Issues a route change and verifies arrival
    Navigation,
    /// Appends or patches store data
    DataInjection,
    /// Waits on simulated async work
    SimulatedWork,
    /// Final step of the tour
    Terminal,
    /// Unrecognised tag
    Unrecognized,
}

impl StepAction {
    /// Every known action, in vocabulary order
    pub const KNOWN: [StepAction; 15] = [
        StepAction::NavigateToRequests,
        StepAction::CreateRequest,
        StepAction::UpdateRequestStatus,
        StepAction::NavigateToWorkingStudio,
        StepAction::CreateWorkingDoc,
        StepAction::AddModules,
        StepAction::AddSources,
        StepAction::NavigateToSources,
        StepAction::NavigateBackToStudio,
        StepAction::DemoAiAssist,
        StepAction::PopulateContent,
        StepAction::RunQualityCheck,
        StepAction::ExportDocument,
        StepAction::NavigateToSubjects,
        StepAction::DemoComplete,
    ];

    /// Wire tag
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            StepAction::NavigateToRequests => "navigate_to_requests",
            StepAction::CreateRequest => "create_request",
            StepAction::UpdateRequestStatus => "update_request_status",
            StepAction::NavigateToWorkingStudio => "navigate_to_working_studio",
            StepAction::CreateWorkingDoc => "create_working_doc",
            StepAction::AddModules => "add_modules",
            StepAction::AddSources => "add_sources",
            StepAction::NavigateToSources => "navigate_to_sources",
            StepAction::NavigateBackToStudio => "navigate_back_to_studio",
            StepAction::DemoAiAssist => "demo_ai_assist",
            StepAction::PopulateContent => "populate_content",
            StepAction::RunQualityCheck => "run_quality_check",
            StepAction::ExportDocument => "export_document",
            StepAction::NavigateToSubjects => "navigate_to_subjects",
            StepAction::DemoComplete => "demo_complete",
            StepAction::Unknown(tag) => tag,
        }
    }

    /// Category of this action
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            StepAction::NavigateToRequests
            | StepAction::NavigateToWorkingStudio
            | StepAction::NavigateToSources
            | StepAction::NavigateBackToStudio
            | StepAction::NavigateToSubjects => ActionKind::Navigation,
            StepAction::CreateRequest
            | StepAction::UpdateRequestStatus
            | StepAction::CreateWorkingDoc
            | StepAction::AddModules
            | StepAction::AddSources
            | StepAction::RunQualityCheck => ActionKind::DataInjection,
            StepAction::DemoAiAssist | StepAction::PopulateContent | StepAction::ExportDocument => {
                ActionKind::SimulatedWork
            }
            StepAction::DemoComplete => ActionKind::Terminal,
            StepAction::Unknown(_) => ActionKind::Unrecognized,
        }
    }

    /// True for route-changing actions
    #[inline]
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.kind() == ActionKind::Navigation
    }

    /// True when the tag was not recognised
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, StepAction::Unknown(_))
    }
}

impl FromStr for StepAction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = StepAction::KNOWN
            .iter()
            .find(|known| known.tag() == s)
            .cloned()
            .unwrap_or_else(|| StepAction::Unknown(s.to_string()));
        Ok(action)
    }
}

impl From<String> for StepAction {
    fn from(tag: String) -> Self {
        match StepAction::from_str(&tag) {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        match action {
            StepAction::Unknown(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One scripted unit of the tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStep {
    /// Stable key
    pub id: String,
    pub title: String,
    pub description: String,
    pub action: StepAction,
    /// Advisory selector of the UI region to highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_element: Option<String>,
    /// Payload for data-injection actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DemoData>,
    /// Set once by the navigator; cleared only by a full demo restart
    #[serde(default)]
    pub completed: bool,
    /// Route the browser must reach for the step to count as navigated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_path: Option<String>,
}

impl DemoStep {
    /// Create a step with no payload
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        action: StepAction,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            action,
            target_element: None,
            data: None,
            completed: false,
            expected_path: None,
        }
    }

    /// With highlight target
    #[inline]
    #[must_use]
    pub fn with_target(mut self, selector: impl Into<String>) -> Self {
        self.target_element = Some(selector.into());
        self
    }

    /// With injected payload
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: DemoData) -> Self {
        self.data = Some(data);
        self
    }

    /// With an expected route
    #[inline]
    #[must_use]
    pub fn with_expected_path(mut self, path: impl Into<String>) -> Self {
        self.expected_path = Some(path.into());
        self
    }

    /// Whether the step only counts once the browser reaches a route
    #[inline]
    #[must_use]
    pub fn requires_navigation(&self) -> bool {
        self.action.is_navigation() || self.expected_path.is_some()
    }
}
