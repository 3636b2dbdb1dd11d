//! Configuration for exports.

/// Which keys a flattened row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Every schema column is present; unselected options and unanswered
    /// fields are materialized (CSV)
    #[default]
    Full,
    /// Only answered fields and selected options are present (JSON)
    Sparse,
}

/// Where the additional metadata headers go relative to schema columns.
///
/// Chosen when the schema is resolved, since it fixes the Header Set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaPosition {
    #[default]
    Front,
    Back,
}

/// Configuration for the `Exporter`
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Row mode used when flattening instances
    pub mode: ExportMode,
    /// Rendering of absent values and unselected options
    pub na_rep: String,
    /// Rendering of selected options
    pub true_rep: String,
    /// Rendering of unselected options; falls back to `na_rep`
    pub false_rep: Option<String>,
    /// Skip instances submitted against a different form instead of exporting them
    pub skip_foreign_instances: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::Full,
            na_rep: "n/a".to_string(),
            true_rep: "True".to_string(),
            false_rep: None,
            skip_foreign_instances: true,
        }
    }
}

impl ExportConfig {
    #[must_use]
    pub const fn with_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_na_rep(mut self, na_rep: impl Into<String>) -> Self {
        self.na_rep = na_rep.into();
        self
    }

    #[must_use]
    pub fn with_true_rep(mut self, true_rep: impl Into<String>) -> Self {
        self.true_rep = true_rep.into();
        self
    }

    #[must_use]
    pub fn with_false_rep(mut self, false_rep: impl Into<String>) -> Self {
        self.false_rep = Some(false_rep.into());
        self
    }

    #[must_use]
    pub const fn with_skip_foreign_instances(mut self, skip: bool) -> Self {
        self.skip_foreign_instances = skip;
        self
    }

    /// Rendering used for an unselected option
    #[must_use]
    pub fn false_rep(&self) -> &str {
        self.false_rep.as_deref().unwrap_or(&self.na_rep)
    }
}
