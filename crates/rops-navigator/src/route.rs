//! Route table and path matching
//!
//! Every page of the app is reachable through a template such as
//! `/working-studio/{id}`. Templates compile to segment matchers; `{name}` and
//! `:name` segments match any single non-empty path segment.

use crate::error::NavigatorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level pages of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Requests,
    WorkingStudio,
    Sources,
    Modules,
    Subjects,
    Calendar,
    TimeTracker,
    Settings,
}

impl Page {
    /// All pages, in sidebar order
    pub const ALL: [Page; 9] = [
        Page::Dashboard,
        Page::Requests,
        Page::WorkingStudio,
        Page::Sources,
        Page::Modules,
        Page::Subjects,
        Page::Calendar,
        Page::TimeTracker,
        Page::Settings,
    ];

    /// Route template
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Requests => "/requests",
            Self::WorkingStudio => "/working-studio/{id}",
            Self::Sources => "/sources",
            Self::Modules => "/modules",
            Self::Subjects => "/subjects",
            Self::Calendar => "/calendar",
            Self::TimeTracker => "/time-tracker",
            Self::Settings => "/settings",
        }
    }

    /// Heading shown on the page
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Requests => "Requests",
            Self::WorkingStudio => "Working Studio",
            Self::Sources => "Sources Library",
            Self::Modules => "Modules Catalog",
            Self::Subjects => "Subjects",
            Self::Calendar => "Calendar",
            Self::TimeTracker => "Time Tracker",
            Self::Settings => "Settings",
        }
    }

    /// Compiled pattern for this page
    #[must_use]
    pub fn pattern(self) -> RoutePattern {
        RoutePattern {
            template: self.template().to_string(),
            segments: split_template(self.template()),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How a location satisfied a navigation target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMatch {
    /// Location equals the target path
    Exact,
    /// Location is on the target's page, with a different parameter or a
    /// deeper sub-path
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Compiled route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a template
    ///
    /// # Errors
    /// `NavigatorError::InvalidRoute` if the template is not absolute or has
    /// an unnamed parameter.
    pub fn parse(template: &str) -> Result<Self, NavigatorError> {
        if !template.starts_with('/') {
            return Err(NavigatorError::InvalidRoute(format!(
                "{template}: must start with '/'"
            )));
        }
        let segments = split_template(template);
        if segments
            .iter()
            .any(|s| matches!(s, Segment::Param(name) if name.is_empty()))
        {
            return Err(NavigatorError::InvalidRoute(format!(
                "{template}: unnamed parameter"
            )));
        }
        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// True if the template has at least one parameter
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Full match against a path (query and fragment ignored)
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let parts = path_segments(&path);
        parts.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| segment_matches(segment, part))
    }

    /// Prefix match: the path starts with every segment of the template
    ///
    /// Only dynamic templates prefix-match; a static template like
    /// `/requests` does not claim `/requests/archive`.
    #[must_use]
    pub fn matches_prefix(&self, path: &str) -> bool {
        if !self.is_dynamic() {
            return self.is_match(path);
        }
        let path = normalize_path(path);
        let parts = path_segments(&path);
        parts.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| segment_matches(segment, part))
    }

    /// Substitute `value` for every parameter
    #[must_use]
    pub fn fill(&self, value: &str) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => format!("/{text}"),
                Segment::Param(_) => format!("/{value}"),
            })
            .collect()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// The app's route table
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(Page, RoutePattern)>,
}

impl RouteTable {
    /// Table with every [`Page`]
    #[must_use]
    pub fn standard() -> Self {
        Self {
            routes: Page::ALL.iter().map(|&p| (p, p.pattern())).collect(),
        }
    }

    /// Page whose pattern fully matches `path`
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Page> {
        self.routes
            .iter()
            .find(|(_, pattern)| pattern.is_match(path))
            .map(|(page, _)| *page)
    }

    /// Pattern of a page
    #[must_use]
    pub fn pattern(&self, page: Page) -> Option<&RoutePattern> {
        self.routes
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, pattern)| pattern)
    }

    /// Path of a static page, or of a dynamic page with `param` filled in
    #[must_use]
    pub fn path_for(&self, page: Page, param: &str) -> String {
        self.pattern(page)
            .map_or_else(|| page.template().to_string(), |p| p.fill(param))
    }

    /// Decide whether `location` satisfies a navigation to `target`
    ///
    /// Exact path equality wins; otherwise a location on the same dynamic
    /// page as the target (other parameter, or deeper sub-path) is accepted.
    #[must_use]
    pub fn satisfies(&self, target: &str, location: &str) -> Option<NavigationMatch> {
        let target = normalize_path(target);
        let location = normalize_path(location);
        if target == location {
            return Some(NavigationMatch::Exact);
        }

        let (_, pattern) = self
            .routes
            .iter()
            .find(|(_, pattern)| pattern.is_match(&target))?;
        (pattern.is_dynamic() && pattern.matches_prefix(&location)).then_some(NavigationMatch::Pattern)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strip query and fragment, collapse duplicate and trailing slashes
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let parts = path_segments(path);
    if parts.is_empty() {
        "/".to_string()
    } else {
        parts.iter().map(|p| format!("/{p}")).collect()
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

fn split_template(template: &str) -> Vec<Segment> {
    path_segments(template)
        .into_iter()
        .map(|part| {
            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            }
        })
        .collect()
}

fn segment_matches(segment: &Segment, part: &str) -> bool {
    match segment {
        Segment::Literal(text) => text == part,
        Segment::Param(_) => !part.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize_path("/requests/"), "/requests");
        assert_eq!(normalize_path("/requests?tab=open#top"), "/requests");
        assert_eq!(normalize_path("//sources//"), "/sources");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/?x=1"), "/");
    }

    #[test]
    fn static_pattern_matches_exactly() {
        let pattern = Page::Requests.pattern();
        assert!(pattern.is_match("/requests"));
        assert!(pattern.is_match("/requests/?q=x"));
        assert!(!pattern.is_match("/requests/archive"));
        assert!(!pattern.matches_prefix("/requests/archive"));
    }

    #[test]
    fn dynamic_pattern_matches_any_id() {
        let pattern = Page::WorkingStudio.pattern();
        assert!(pattern.is_dynamic());
        assert!(pattern.is_match("/working-studio/req-1"));
        assert!(!pattern.is_match("/working-studio"));
        assert!(!pattern.is_match("/working-studio/req-1/modules"));
        assert!(pattern.matches_prefix("/working-studio/req-1/modules"));
    }

    #[test]
    fn fill_substitutes_params() {
        assert_eq!(Page::WorkingStudio.pattern().fill("req-7"), "/working-studio/req-7");
        assert_eq!(Page::Dashboard.pattern().fill("x"), "/");
        assert_eq!(Page::Sources.pattern().fill("x"), "/sources");
    }

    #[test]
    fn parse_accepts_colon_params() {
        let pattern = RoutePattern::parse("/projects/:id/files").unwrap();
        assert!(pattern.is_match("/projects/42/files"));
        assert!(!pattern.is_match("/projects/42"));
    }

    #[test]
    fn parse_rejects_bad_templates() {
        assert!(RoutePattern::parse("requests").is_err());
        assert!(RoutePattern::parse("/a/{}").is_err());
        assert!(RoutePattern::parse("/a/:").is_err());
    }

    #[test]
    fn resolve_pages() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/"), Some(Page::Dashboard));
        assert_eq!(table.resolve("/time-tracker"), Some(Page::TimeTracker));
        assert_eq!(table.resolve("/working-studio/abc"), Some(Page::WorkingStudio));
        assert_eq!(table.resolve("/nowhere"), None);
    }

    #[test]
    fn satisfies_exact_and_pattern() {
        let table = RouteTable::standard();
        assert_eq!(
            table.satisfies("/requests", "/requests/"),
            Some(NavigationMatch::Exact)
        );
        assert_eq!(
            table.satisfies("/working-studio/req-1", "/working-studio/doc-9"),
            Some(NavigationMatch::Pattern)
        );
        assert_eq!(
            table.satisfies("/working-studio/req-1", "/working-studio/req-1/sources"),
            Some(NavigationMatch::Pattern)
        );
        assert_eq!(table.satisfies("/working-studio/req-1", "/requests"), None);
        assert_eq!(table.satisfies("/sources", "/subjects"), None);
        assert_eq!(table.satisfies("/custom/page", "/custom/other"), None);
    }

    proptest::proptest! {
        #[test]
        fn normalize_is_idempotent(path in "[/a-z?#-]{0,24}") {
            let once = normalize_path(&path);
            proptest::prop_assert_eq!(normalize_path(&once), once.clone());
            proptest::prop_assert!(once.starts_with('/'));
        }

        #[test]
        fn any_studio_id_satisfies_studio_target(id in "[a-z0-9-]{1,16}") {
            let table = RouteTable::standard();
            let location = table.path_for(Page::WorkingStudio, &id);
            proptest::prop_assert!(table
                .satisfies("/working-studio/req-demo-001", &location)
                .is_some());
            proptest::prop_assert_eq!(table.resolve(&location), Some(Page::WorkingStudio));
        }
    }
}
