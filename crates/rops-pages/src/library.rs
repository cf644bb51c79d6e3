//! Sources library

use crate::dataset::Dataset;
use crate::view::{matches_search, PageView};
use rops_model::{Source, SourceKind};
use serde::Serialize;

/// Every source across documents, filtered by text and kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesLibrary {
    /// Most recently added first
    pub sources: Vec<Source>,
    pub search: String,
    pub kind: Option<SourceKind>,
}

impl SourcesLibrary {
    #[must_use]
    pub fn project(data: &Dataset, search: &str, kind: Option<SourceKind>) -> Self {
        let mut sources: Vec<Source> = data
            .sources
            .iter()
            .filter(|s| kind.map_or(true, |k| s.kind == k))
            .filter(|s| matches_search(search, &[s.title.as_str(), s.url.as_deref().unwrap_or_default()]))
            .cloned()
            .collect();
        sources.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        Self {
            sources,
            search: search.to_string(),
            kind,
        }
    }

    fn is_filtered(&self) -> bool {
        self.kind.is_some() || !self.search.trim().is_empty()
    }
}

impl PageView for SourcesLibrary {
    fn title(&self) -> String {
        format!("Sources Library ({})", self.sources.len())
    }

    fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn empty_state(&self) -> &'static str {
        if self.is_filtered() {
            "No sources match these filters."
        } else {
            "No sources yet. Attach references from a working document."
        }
    }

    fn render_body(&self, out: &mut String) {
        for source in &self.sources {
            out.push_str(&format!("  [{:?}] {}", source.kind, source.title));
            if let Some(url) = &source.url {
                out.push_str(&format!(" <{url}>"));
            }
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first() {
        let library = SourcesLibrary::project(&Dataset::fallback(), "", None);
        assert_eq!(library.sources[0].id, "src-002");
    }

    #[test]
    fn kind_filter() {
        let library = SourcesLibrary::project(&Dataset::fallback(), "", Some(SourceKind::Filing));
        assert_eq!(library.sources.len(), 1);
        assert_eq!(library.sources[0].id, "src-001");
    }

    #[test]
    fn search_covers_url() {
        let library = SourcesLibrary::project(&Dataset::fallback(), "eur-lex", None);
        assert_eq!(library.sources.len(), 1);
    }

    #[test]
    fn url_renders_on_the_source_line() {
        let library = SourcesLibrary::project(&Dataset::fallback(), "eur-lex", None);
        let text = library.render();
        let line = text.lines().find(|l| l.contains("eur-lex")).unwrap();
        assert!(line.starts_with("  ["));
        assert!(line.ends_with('>'));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn empty_states() {
        let none = SourcesLibrary::project(&Dataset::default(), "", None);
        assert!(none.render().contains("No sources yet"));

        let filtered = SourcesLibrary::project(&Dataset::fallback(), "", Some(SourceKind::Dataset));
        assert!(filtered.render().contains("No sources match"));
    }
}
