//! Navigator configuration
//!
//! Timings default to what the tour was tuned for: a 3s read delay before a
//! step runs, 2.5s to let the UI settle before advancing, three navigation
//! attempts half a second apart.

use crate::error::ConfigError;
use crate::route::Page;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Navigator timing and retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Delay before a newly current step executes
    pub read_delay_ms: u64,
    /// Delay between completing a step and advancing
    pub settle_delay_ms: u64,
    /// Delay between navigation verification attempts
    pub verify_interval_ms: u64,
    /// Navigation attempts before a step fails
    pub max_nav_attempts: u32,
    /// Delay before (and between) content checks on heavy pages
    pub content_check_delay_ms: u64,
    /// Content checks per navigation attempt on heavy pages
    pub content_attempts: u32,
    /// Rendered characters a heavy page needs before it counts as loaded
    pub min_content_chars: usize,
    /// Duration of simulated async work (AI assist, export, ...)
    pub simulated_work_ms: u64,
    /// Pages whose main content must render before navigation succeeds
    pub heavy_pages: Vec<Page>,
}

impl NavigatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays zero; retry counts unchanged
    #[must_use]
    pub fn instant() -> Self {
        Self {
            read_delay_ms: 0,
            settle_delay_ms: 0,
            verify_interval_ms: 0,
            content_check_delay_ms: 0,
            simulated_work_ms: 0,
            ..Self::default()
        }
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` for invalid TOML, `ConfigError::Invalid` for
    /// zero attempt counts.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    ///
    /// # Errors
    /// I/O failures and the errors of [`NavigatorConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject configurations that could never complete a navigation
    ///
    /// # Errors
    /// `ConfigError::Invalid` when an attempt count is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nav_attempts == 0 {
            return Err(ConfigError::Invalid("max_nav_attempts must be at least 1".into()));
        }
        if self.content_attempts == 0 {
            return Err(ConfigError::Invalid("content_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// With read delay
    #[inline]
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay_ms = millis(delay);
        self
    }

    /// With settle delay
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = millis(delay);
        self
    }

    /// With verification interval
    #[inline]
    #[must_use]
    pub fn with_verify_interval(mut self, interval: Duration) -> Self {
        self.verify_interval_ms = millis(interval);
        self
    }

    /// With navigation attempt cap
    #[inline]
    #[must_use]
    pub fn with_max_nav_attempts(mut self, attempts: u32) -> Self {
        self.max_nav_attempts = attempts.max(1);
        self
    }

    /// With simulated work duration
    #[inline]
    #[must_use]
    pub fn with_simulated_work(mut self, duration: Duration) -> Self {
        self.simulated_work_ms = millis(duration);
        self
    }

    #[inline]
    #[must_use]
    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }

    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[inline]
    #[must_use]
    pub fn verify_interval(&self) -> Duration {
        Duration::from_millis(self.verify_interval_ms)
    }

    #[inline]
    #[must_use]
    pub fn content_check_delay(&self) -> Duration {
        Duration::from_millis(self.content_check_delay_ms)
    }

    #[inline]
    #[must_use]
    pub fn simulated_work(&self) -> Duration {
        Duration::from_millis(self.simulated_work_ms)
    }

    /// Whether a page needs the content check
    #[inline]
    #[must_use]
    pub fn is_heavy(&self, page: Page) -> bool {
        self.heavy_pages.contains(&page)
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            read_delay_ms: 3_000,
            settle_delay_ms: 2_500,
            verify_interval_ms: 500,
            max_nav_attempts: 3,
            content_check_delay_ms: 300,
            content_attempts: 3,
            min_content_chars: 40,
            simulated_work_ms: 1_500,
            heavy_pages: vec![Page::WorkingStudio],
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let config = NavigatorConfig::default();
        assert_eq!(config.read_delay(), Duration::from_millis(3_000));
        assert_eq!(config.settle_delay(), Duration::from_millis(2_500));
        assert_eq!(config.max_nav_attempts, 3);
        assert!(config.is_heavy(Page::WorkingStudio));
        assert!(!config.is_heavy(Page::Requests));
    }

    #[test]
    fn instant_keeps_retry_counts() {
        let config = NavigatorConfig::instant();
        assert_eq!(config.read_delay(), Duration::ZERO);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.max_nav_attempts, 3);
    }

    #[test]
    fn toml_overrides_some_fields() {
        let config = NavigatorConfig::from_toml_str(
            r#"
            read_delay_ms = 100
            max_nav_attempts = 5
            heavy_pages = ["working_studio", "sources"]
            "#,
        )
        .unwrap();

        assert_eq!(config.read_delay_ms, 100);
        assert_eq!(config.max_nav_attempts, 5);
        assert_eq!(config.settle_delay_ms, 2_500);
        assert_eq!(config.heavy_pages, vec![Page::WorkingStudio, Page::Sources]);
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = NavigatorConfig::from_toml_str("max_nav_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn builder_methods() {
        let config = NavigatorConfig::new()
            .with_read_delay(Duration::from_millis(10))
            .with_settle_delay(Duration::from_millis(20))
            .with_max_nav_attempts(0);

        assert_eq!(config.read_delay_ms, 10);
        assert_eq!(config.settle_delay_ms, 20);
        assert_eq!(config.max_nav_attempts, 1);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navigator.toml");
        std::fs::write(&path, "settle_delay_ms = 1\n").unwrap();

        let config = NavigatorConfig::load(&path).unwrap();
        assert_eq!(config.settle_delay_ms, 1);
    }
}
