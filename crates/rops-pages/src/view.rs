//! Page rendering
//!
//! Every projection renders to plain text: a heading line followed by either
//! its body or its empty-state message. The simulated browser measures this
//! text to decide whether a page has loaded.

use crate::board::RequestsBoard;
use crate::catalog::ModulesCatalog;
use crate::dataset::Dataset;
use crate::library::SourcesLibrary;
use crate::studio::StudioView;
use crate::subjects::SubjectsList;
use rops_model::RequestStatus;
use rops_navigator::{normalize_path, Page};
use rops_store::DemoState;

/// A projection that can be shown as a page
pub trait PageView {
    /// Heading line
    fn title(&self) -> String;

    /// True when there is nothing to list
    fn is_empty(&self) -> bool;

    /// Message shown instead of the body when empty
    fn empty_state(&self) -> &'static str;

    /// Body lines
    fn render_body(&self, out: &mut String);

    /// Full page text
    fn render(&self) -> String {
        let mut out = self.title();
        out.push('\n');
        if self.is_empty() {
            out.push_str(self.empty_state());
            out.push('\n');
        } else {
            self.render_body(&mut out);
        }
        out
    }
}

/// Render the page at `path` from `state`
///
/// Unknown paths render a not-found page.
#[must_use]
pub fn render_path(page: Option<Page>, path: &str, state: &DemoState) -> String {
    let data = Dataset::for_state(state);
    let Some(page) = page else {
        return format!("Not found\nNothing lives at {}.\n", normalize_path(path));
    };

    match page {
        Page::Dashboard => render_dashboard(&data),
        Page::Requests => RequestsBoard::project(&data, "").render(),
        Page::WorkingStudio => {
            let id = route_param(path).unwrap_or_default();
            match StudioView::project(&data, &id) {
                Some(view) => view.render(),
                None => StudioView::render_missing(&id),
            }
        }
        Page::Sources => SourcesLibrary::project(&data, "", None).render(),
        Page::Modules => ModulesCatalog::project(&data).render(),
        Page::Subjects => SubjectsList::project(&data).render(),
        Page::Calendar => render_calendar(&data),
        Page::TimeTracker => "Time Tracker\nNo time entries this week.\n".to_string(),
        Page::Settings => "Settings\nWorkspace: Research Ops\nNotifications: on\n".to_string(),
    }
}

/// Second path segment, e.g. the id in `/working-studio/{id}`
#[must_use]
pub fn route_param(path: &str) -> Option<String> {
    normalize_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .nth(1)
        .map(str::to_string)
}

/// Case-insensitive substring match; an empty needle matches everything
pub(crate) fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty()
        || haystacks
            .iter()
            .any(|h| h.to_lowercase().contains(&needle))
}

fn render_dashboard(data: &Dataset) -> String {
    let mut out = String::from("Dashboard\n");
    if data.requests.is_empty() {
        out.push_str("No requests yet. New client work will show up here.\n");
        return out;
    }
    for status in RequestStatus::ALL {
        let count = data.requests.iter().filter(|r| r.status == status).count();
        out.push_str(&format!("{status}: {count}\n"));
    }
    let open_flags = data.qc_flags.iter().filter(|f| !f.resolved).count();
    out.push_str(&format!("Open QC flags: {open_flags}\n"));
    out
}

fn render_calendar(data: &Dataset) -> String {
    let mut out = String::from("Calendar\n");
    let mut due: Vec<_> = data
        .requests
        .iter()
        .filter_map(|r| r.due_date.map(|d| (d, r)))
        .collect();
    if due.is_empty() {
        out.push_str("No upcoming deadlines.\n");
        return out;
    }
    due.sort_by_key(|(d, _)| *d);
    for (date, request) in due {
        out.push_str(&format!(
            "{}  {} ({})\n",
            date.format("%Y-%m-%d"),
            request.title,
            request.client
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rops_model::StepTable;

    fn idle_state() -> DemoState {
        DemoState::new(StepTable::enterprise().into_steps())
    }

    #[test]
    fn route_param_extracts_id() {
        assert_eq!(route_param("/working-studio/req-1?tab=x"), Some("req-1".to_string()));
        assert_eq!(route_param("/requests"), None);
    }

    #[test]
    fn search_is_case_insensitive() {
        assert!(matches_search("nordic", &["Market entry: Nordic fintech"]));
        assert!(matches_search("  ", &["anything"]));
        assert!(!matches_search("battery", &["Nordic", "Aurora"]));
    }

    #[test]
    fn unknown_path_renders_not_found() {
        let text = render_path(None, "/nowhere/", &idle_state());
        assert!(text.starts_with("Not found"));
        assert!(text.contains("/nowhere"));
    }

    #[test]
    fn dashboard_uses_fallback_outside_demo() {
        let text = render_path(Some(Page::Dashboard), "/", &idle_state());
        assert!(text.contains("In Progress: 1"));
    }

    #[test]
    fn dashboard_renders_one_line_per_status() {
        let text = render_path(Some(Page::Dashboard), "/", &idle_state());
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.ends_with('\n'));
        assert_eq!(lines.len(), RequestStatus::ALL.len() + 2);
        assert_eq!(lines[0], "Dashboard");
        assert!(lines.last().is_some_and(|l| l.starts_with("Open QC flags: ")));
    }

    #[test]
    fn empty_demo_dashboard_has_empty_state() {
        let mut state = idle_state();
        state.is_demo_mode = true;
        let text = render_path(Some(Page::Dashboard), "/", &state);
        assert!(text.contains("No requests yet"));
    }

    #[test]
    fn calendar_lists_due_dates_in_order() {
        let text = render_path(Some(Page::Calendar), "/calendar", &idle_state());
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Competitor pricing review"));
    }
}
