//! Run configuration.

use std::env;

use trellis_core::Environment;

use crate::report::Reporter;

/// Comma-separated tag filter.
pub const TAGS_ENV: &str = "TRELLIS_TAGS";
/// Substring filter on test names.
pub const FILTER_ENV: &str = "TRELLIS_FILTER";
/// Current execution environment (`server` or `client`).
pub const ENVIRONMENT_ENV: &str = "TRELLIS_ENV";

/// Options for one `run()` invocation.
pub struct RunOptions<'a> {
    /// Keep only tests whose class or method tags intersect these tags
    pub tags: Option<Vec<String>>,
    /// Keep only tests whose name contains this substring
    pub name_filter: Option<String>,
    /// Execution context tests with an environment restriction are matched against
    pub environment: Environment,
    /// Observer notified of run and test lifecycle events
    pub reporter: Option<&'a mut (dyn Reporter + Send)>,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            tags: None,
            name_filter: None,
            environment: Environment::Server,
            reporter: None,
        }
    }
}

impl<'a> RunOptions<'a> {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from `TRELLIS_TAGS`, `TRELLIS_FILTER` and `TRELLIS_ENV`.
    ///
    /// Unset or empty variables keep the defaults; an unknown environment name is logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(raw) = env::var(TAGS_ENV) {
            let tags = parse_tag_list(&raw);
            if !tags.is_empty() {
                options.tags = Some(tags);
            }
        }
        if let Ok(filter) = env::var(FILTER_ENV) {
            if !filter.is_empty() {
                options.name_filter = Some(filter);
            }
        }
        if let Ok(raw) = env::var(ENVIRONMENT_ENV) {
            match raw.parse::<Environment>() {
                Ok(environment) => options.environment = environment,
                Err(e) => tracing::warn!(variable = ENVIRONMENT_ENV, "{e}; keeping `server`"),
            }
        }
        options
    }

    /// Set the tag filter
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the test name filter
    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into());
        self
    }

    /// Set the current execution environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Attach a reporter. It must be `Send` so a run can be moved onto another task.
    pub fn with_reporter(mut self, reporter: &'a mut (dyn Reporter + Send)) -> Self {
        self.reporter = Some(reporter);
        self
    }
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RunOptions::new();
        assert!(options.tags.is_none());
        assert!(options.name_filter.is_none());
        assert_eq!(options.environment, Environment::Server);
        assert!(options.reporter.is_none());
    }

    #[test]
    fn test_builder_sets_fields() {
        let options = RunOptions::new()
            .with_tags(["db", "slow"])
            .with_name_filter("insert")
            .with_environment(Environment::Client);
        assert_eq!(options.tags.as_deref(), Some(&["db".to_string(), "slow".to_string()][..]));
        assert_eq!(options.name_filter.as_deref(), Some("insert"));
        assert_eq!(options.environment, Environment::Client);
    }

    #[test]
    fn test_parse_tag_list_drops_blanks() {
        assert_eq!(parse_tag_list(" a, ,b ,,"), vec!["a", "b"]);
        assert!(parse_tag_list("").is_empty());
    }
}
