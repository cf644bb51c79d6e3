//! Modules catalog grouped by status

use crate::dataset::Dataset;
use crate::view::PageView;
use rops_model::{Module, ModuleStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleGroup {
    pub status: ModuleStatus,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulesCatalog {
    pub groups: Vec<ModuleGroup>,
}

impl ModulesCatalog {
    #[must_use]
    pub fn project(data: &Dataset) -> Self {
        let groups = ModuleStatus::ALL
            .into_iter()
            .map(|status| {
                let mut modules: Vec<Module> = data
                    .modules
                    .iter()
                    .filter(|m| m.status == status)
                    .cloned()
                    .collect();
                modules.sort_by(|a, b| a.name.cmp(&b.name));
                ModuleGroup { status, modules }
            })
            .collect();
        Self { groups }
    }

    #[must_use]
    pub fn group(&self, status: ModuleStatus) -> &[Module] {
        self.groups
            .iter()
            .find(|g| g.status == status)
            .map(|g| g.modules.as_slice())
            .unwrap_or_default()
    }
}

impl PageView for ModulesCatalog {
    fn title(&self) -> String {
        "Modules Catalog".to_string()
    }

    fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.modules.is_empty())
    }

    fn empty_state(&self) -> &'static str {
        "No modules yet. Modules added to a working document appear here."
    }

    fn render_body(&self, out: &mut String) {
        for group in &self.groups {
            out.push_str(&format!("{:?} ({})\n", group.status, group.modules.len()));
            for module in &group.modules {
                out.push_str(&format!("  {}\n", module.name));
            }
        }
    }
}
