//! Renderers from a [`GenerationResult`] to text
//!
//! Formatters are pure: no I/O, no clock, no randomness. The only failure
//! is a result that violates the test case invariants, reported as
//! [`GenError::MalformedResult`] naming the offending case.

pub mod code_skeleton;
pub mod gherkin;
pub mod human_readable;

pub use code_skeleton::{CodeSkeletonFormatter, Framework};
pub use gherkin::GherkinFormatter;
pub use human_readable::HumanReadableFormatter;

use crate::core_types::{GenerationResult, OutputFormat, RequirementModel, TestSpecification};
use crate::error::{GenError, GenResult};

use std::collections::HashMap;
use std::sync::Arc;

/// Header material formatters may draw on besides the cases themselves.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub requirements: &'a RequirementModel,
    pub spec: &'a TestSpecification,
}

impl<'a> FormatContext<'a> {
    pub fn new(requirements: &'a RequirementModel, spec: &'a TestSpecification) -> Self {
        Self { requirements, spec }
    }

    /// Feature name: the story's action, else the first case title.
    pub(crate) fn feature_name(&self, result: &GenerationResult) -> String {
        let action = self.requirements.story.action.trim();
        if !action.is_empty() {
            return capitalize(action);
        }
        result
            .test_cases
            .first()
            .map(|case| case.title.clone())
            .unwrap_or_else(|| "Generated test cases".to_string())
    }
}

pub trait Formatter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render every case in `result`.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MalformedResult`] if a case violates the test
    /// case invariants.
    fn render(&self, result: &GenerationResult, context: &FormatContext<'_>) -> GenResult<String>;
}

/// Lookup table from output format to formatter.
pub struct FormatterRegistry {
    formatters: HashMap<OutputFormat, Arc<dyn Formatter>>,
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.formatters.keys().map(OutputFormat::as_str).collect();
        formats.sort_unstable();
        f.debug_struct("FormatterRegistry")
            .field("formats", &formats)
            .finish()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatterRegistry {
    pub fn new() -> Self {
        let mut formatters: HashMap<OutputFormat, Arc<dyn Formatter>> = HashMap::new();
        formatters.insert(OutputFormat::Gherkin, Arc::new(GherkinFormatter));
        formatters.insert(OutputFormat::Human, Arc::new(HumanReadableFormatter));
        for framework in Framework::ALL {
            formatters.insert(
                framework.output_format(),
                Arc::new(CodeSkeletonFormatter::new(framework)),
            );
        }
        Self { formatters }
    }

    /// Add a formatter, replacing any registered for `format`.
    pub fn register(&mut self, format: OutputFormat, formatter: Arc<dyn Formatter>) {
        self.formatters.insert(format, formatter);
    }

    /// # Errors
    ///
    /// Returns [`GenError::InvalidSpecification`] when nothing is registered
    /// for `format`.
    pub fn get(&self, format: OutputFormat) -> GenResult<Arc<dyn Formatter>> {
        self.formatters.get(&format).cloned().ok_or_else(|| {
            GenError::invalid_specification(format!("no formatter registered for {format}"))
        })
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Append `line` and a newline to a rendered document.
pub(crate) fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

/// Collapse line breaks so a value fits on one output line.
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
