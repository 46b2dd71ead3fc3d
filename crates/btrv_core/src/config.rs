//! Load configuration.

/// Options controlling how a Btrieve file is loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Skip records whose variable-length tail cannot be rebuilt instead of
    /// failing the whole load. Skipped records are reported as warnings.
    pub allow_corrupted_records: bool,

    /// Track visited fragments while rebuilding variable-length tails and
    /// fail on a revisit. Off by default: a cyclic chain then never ends.
    pub detect_fragment_cycles: bool,

    /// When the requested file is missing, copy a sibling template with
    /// [`LoadOptions::template_extension`] into place first.
    pub template_fallback: bool,

    /// Extension of the template file used by `template_fallback`.
    pub template_extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            allow_corrupted_records: false,
            detect_fragment_cycles: false,
            template_fallback: false,
            template_extension: "VIR".to_string(),
        }
    }
}

impl LoadOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether corrupted records are skipped with a warning.
    #[must_use]
    pub const fn allow_corrupted_records(mut self, value: bool) -> Self {
        self.allow_corrupted_records = value;
        self
    }

    /// Sets whether fragment chains are checked for cycles.
    #[must_use]
    pub const fn detect_fragment_cycles(mut self, value: bool) -> Self {
        self.detect_fragment_cycles = value;
        self
    }

    /// Sets whether a missing file may be created from its template.
    #[must_use]
    pub const fn template_fallback(mut self, value: bool) -> Self {
        self.template_fallback = value;
        self
    }

    /// Sets the template file extension.
    #[must_use]
    pub fn template_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }
}
