//! Gherkin `.feature` rendering
//!
//! One `Feature` per document, a shared `Background`, and one `Scenario`
//! per test case. A case whose step data declares `<name> = v1, v2, ...`
//! becomes a `Scenario Outline` with an `Examples` table.

use super::{push_line, single_line, FormatContext, Formatter};
use crate::core_types::{GenerationResult, StepRole, TestCase, TestType};
use crate::error::GenResult;

use once_cell::sync::Lazy;
use regex::Regex;

pub const BACKGROUND_STEP: &str = "the system is in a known state";

static PLACEHOLDER_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*<([A-Za-z_][A-Za-z0-9_ ]*)>\s*=\s*(.+?)\s*$").expect("valid placeholder regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Given,
    When,
    Then,
}

impl Keyword {
    fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

/// Writes step lines, turning a repeated keyword into `And`.
struct StepWriter<'a> {
    out: &'a mut String,
    last: Option<Keyword>,
}

impl StepWriter<'_> {
    fn step(&mut self, keyword: Keyword, text: &str) {
        let shown = if self.last == Some(keyword) {
            "And"
        } else {
            keyword.as_str()
        };
        self.last = Some(keyword);
        push_line(self.out, format!("    {shown} {}", step_text(text)));
    }

    fn comment(&mut self, label: &str, text: &str) {
        push_line(self.out, format!("    # {label}: {}", single_line(text)));
    }
}

/// Lower-case a leading capital unless the word is an acronym.
fn step_text(text: &str) -> String {
    let text = single_line(text);
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_lowercase() => {
            first.to_lowercase().chain(text.chars().skip(1)).collect()
        }
        _ => text,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GherkinFormatter;

impl GherkinFormatter {
    /// One feature document per test type, in order of first appearance.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MalformedResult`](crate::error::GenError::MalformedResult)
    /// if a case violates the test case invariants.
    pub fn render_by_type(
        &self,
        result: &GenerationResult,
        context: &FormatContext<'_>,
    ) -> GenResult<Vec<(TestType, String)>> {
        result.validate()?;

        let mut order: Vec<TestType> = Vec::new();
        for case in &result.test_cases {
            if !order.contains(&case.test_type) {
                order.push(case.test_type);
            }
        }

        Ok(order
            .into_iter()
            .map(|test_type| {
                let cases: Vec<&TestCase> = result
                    .test_cases
                    .iter()
                    .filter(|case| case.test_type == test_type)
                    .collect();
                let name = format!("{} ({test_type} tests)", context.feature_name(result));
                (test_type, self.document(result, context, &name, &cases))
            })
            .collect())
    }

    fn document(
        &self,
        result: &GenerationResult,
        context: &FormatContext<'_>,
        feature_name: &str,
        cases: &[&TestCase],
    ) -> String {
        let mut out = String::new();
        push_line(&mut out, format!("# Generated by {}", result.generator_name));
        push_line(&mut out, format!("# Test Level: {}", context.spec.test_level));
        push_line(
            &mut out,
            format!("# Generated at: {}", result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        );

        push_line(&mut out, format!("Feature: {}", single_line(feature_name)));
        let story = &context.requirements.story;
        if !story.persona.is_empty() {
            push_line(&mut out, format!("  As a {}", single_line(&story.persona)));
        }
        if !story.action.is_empty() {
            push_line(&mut out, format!("  I want {}", single_line(&story.action)));
        }
        if !story.value.is_empty() {
            push_line(&mut out, format!("  So that {}", single_line(&story.value)));
        }

        out.push('\n');
        push_line(&mut out, "  Background:");
        push_line(&mut out, format!("    Given {BACKGROUND_STEP}"));

        for case in cases {
            out.push('\n');
            scenario(&mut out, case);
        }
        out
    }
}

impl Formatter for GherkinFormatter {
    fn name(&self) -> &'static str {
        "gherkin"
    }

    fn render(&self, result: &GenerationResult, context: &FormatContext<'_>) -> GenResult<String> {
        result.validate()?;
        let cases: Vec<&TestCase> = result.test_cases.iter().collect();
        Ok(self.document(result, context, &context.feature_name(result), &cases))
    }
}

fn tags_line(case: &TestCase) -> String {
    let mut tags = vec![case.test_type.as_str().to_string(), case.priority.as_str().to_string()];
    for tag in &case.tags {
        let tag: String = tag
            .chars()
            .map(|c| if c.is_whitespace() || c == '@' { '-' } else { c })
            .collect();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.iter()
        .map(|tag| format!("@{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(column, values)` for every step that declares placeholder data.
fn examples(case: &TestCase) -> Vec<(String, Vec<String>)> {
    case.steps
        .iter()
        .filter_map(|step| step.test_data.as_deref())
        .filter_map(|data| PLACEHOLDER_DATA.captures(data))
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().trim().to_string();
            let values = caps
                .get(2)?
                .as_str()
                .split(',')
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>();
            Some((name, values))
        })
        .fold(Vec::new(), |mut columns: Vec<(String, Vec<String>)>, (name, values)| {
            if !columns.iter().any(|(existing, _)| *existing == name) {
                columns.push((name, values));
            }
            columns
        })
}

fn table_cell(value: &str) -> String {
    single_line(value).replace('\\', "\\\\").replace('|', "\\|")
}

fn scenario(out: &mut String, case: &TestCase) {
    let columns = examples(case);
    push_line(out, format!("  {}", tags_line(case)));
    let keyword = if columns.is_empty() {
        "Scenario"
    } else {
        "Scenario Outline"
    };
    push_line(out, format!("  {keyword}: {}", single_line(&case.title)));

    let mut writer = StepWriter {
        out: &mut *out,
        last: None,
    };
    for precondition in &case.preconditions {
        if precondition.trim().eq_ignore_ascii_case(BACKGROUND_STEP) {
            continue;
        }
        writer.step(Keyword::Given, precondition);
    }

    for step in &case.steps {
        match step.role {
            Some(StepRole::Precondition) => {
                writer.step(Keyword::Given, &step.action);
                if step.has_expected_result() {
                    writer.step(Keyword::Given, &step.expected_result);
                }
            }
            Some(StepRole::Verification) => {
                let text = if step.has_expected_result() {
                    &step.expected_result
                } else {
                    &step.action
                };
                writer.step(Keyword::Then, text);
            }
            Some(StepRole::Action) | None => {
                writer.step(Keyword::When, &step.action);
                if step.has_expected_result() {
                    writer.step(Keyword::Then, &step.expected_result);
                }
            }
        }
        if let Some(data) = step.test_data.as_deref() {
            if !PLACEHOLDER_DATA.is_match(data) {
                writer.comment("Test data", data);
            }
        }
        if let Some(notes) = step.notes.as_deref() {
            writer.comment("Notes", notes);
        }
    }

    if columns.is_empty() {
        return;
    }

    let rows = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
    out.push('\n');
    push_line(out, "    Examples:");
    let header = columns
        .iter()
        .map(|(name, _)| table_cell(name))
        .collect::<Vec<_>>()
        .join(" | ");
    push_line(out, format!("      | {header} |"));
    for row in 0..rows {
        let cells = columns
            .iter()
            .map(|(_, values)| values.get(row).map_or_else(String::new, |v| table_cell(v)))
            .collect::<Vec<_>>()
            .join(" | ");
        push_line(out, format!("      | {cells} |"));
    }
}
