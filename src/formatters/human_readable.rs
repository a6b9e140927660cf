//! Plain markdown document for readers who never open a test runner.

use super::{push_line, single_line, FormatContext, Formatter};
use crate::core_types::{GenerationResult, Priority, TestCase, TestType};
use crate::error::GenResult;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct HumanReadableFormatter;

impl Formatter for HumanReadableFormatter {
    fn name(&self) -> &'static str {
        "human"
    }

    fn render(&self, result: &GenerationResult, context: &FormatContext<'_>) -> GenResult<String> {
        result.validate()?;

        let mut out = String::new();
        push_line(&mut out, "# Test Case Documentation");
        out.push('\n');
        overview(&mut out, context);

        push_line(&mut out, "## Test Cases");
        for case in &result.test_cases {
            out.push('\n');
            record(&mut out, case);
        }

        out.push('\n');
        summary(&mut out, result);

        if !result.warnings.is_empty() {
            out.push('\n');
            push_line(&mut out, "## Warnings");
            out.push('\n');
            for warning in &result.warnings {
                push_line(&mut out, format!("- {}", single_line(warning)));
            }
        }
        Ok(out)
    }
}

fn overview(out: &mut String, context: &FormatContext<'_>) {
    let requirements = context.requirements;
    push_line(out, "## Overview");
    out.push('\n');
    push_line(out, format!("- Test Level: {}", context.spec.test_level));

    let story = &requirements.story;
    if !story.is_empty() {
        out.push('\n');
        push_line(out, "### User Story");
        out.push('\n');
        if !story.persona.is_empty() {
            push_line(out, format!("- As a: {}", single_line(&story.persona)));
        }
        if !story.action.is_empty() {
            push_line(out, format!("- I want: {}", single_line(&story.action)));
        }
        if !story.value.is_empty() {
            push_line(out, format!("- So that: {}", single_line(&story.value)));
        }
    }

    if !requirements.criteria.is_empty() {
        out.push('\n');
        push_line(out, "### Acceptance Criteria");
        out.push('\n');
        for (index, criterion) in requirements.criteria.iter().enumerate() {
            push_line(out, format!("{}. {}", index + 1, single_line(&criterion.display_text())));
        }
    }
    out.push('\n');
}

fn record(out: &mut String, case: &TestCase) {
    push_line(out, format!("### {}: {}", case.id, single_line(&case.title)));
    out.push('\n');
    push_line(out, format!("- Type: {}", case.test_type));
    push_line(out, format!("- Priority: {}", case.priority));
    push_line(out, format!("- Level: {}", case.level));
    if !case.tags.is_empty() {
        let tags = case.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        push_line(out, format!("- Tags: {tags}"));
    }

    if !case.description.trim().is_empty() {
        out.push('\n');
        push_line(out, format!("**Description:** {}", single_line(&case.description)));
    }

    if !case.preconditions.is_empty() {
        out.push('\n');
        push_line(out, "**Preconditions:**");
        out.push('\n');
        for precondition in &case.preconditions {
            push_line(out, format!("- {}", single_line(precondition)));
        }
    }

    out.push('\n');
    push_line(out, "**Steps:**");
    out.push('\n');
    for (index, step) in case.steps.iter().enumerate() {
        push_line(out, format!("{}. {}", index + 1, single_line(&step.action)));
        push_line(out, format!("   - Expected: {}", single_line(&step.expected_result)));
        if let Some(data) = step.test_data.as_deref() {
            push_line(out, format!("   - Test Data: {}", single_line(data)));
        }
        if let Some(notes) = step.notes.as_deref() {
            push_line(out, format!("   - Notes: {}", single_line(notes)));
        }
    }

    if let Some(notes) = case.notes.as_deref() {
        out.push('\n');
        push_line(out, format!("**Notes:** {}", single_line(notes)));
    }
}

fn summary(out: &mut String, result: &GenerationResult) {
    let mut by_type: BTreeMap<TestType, usize> = BTreeMap::new();
    let mut by_priority: BTreeMap<Priority, usize> = BTreeMap::new();
    for case in &result.test_cases {
        *by_type.entry(case.test_type).or_default() += 1;
        *by_priority.entry(case.priority).or_default() += 1;
    }

    push_line(out, "## Summary");
    out.push('\n');
    push_line(out, format!("- Total Test Cases: {}", result.test_cases.len()));
    push_line(out, "- By Type:");
    for (test_type, count) in &by_type {
        push_line(out, format!("  - {test_type}: {count}"));
    }
    push_line(out, "- By Priority:");
    for (priority, count) in by_priority.iter().rev() {
        push_line(out, format!("  - {priority}: {count}"));
    }
    push_line(
        out,
        format!("- Generated At: {}", result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    );
}
