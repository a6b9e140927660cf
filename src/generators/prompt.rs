//! Deterministic prompt construction
//!
//! The same requirement model and specification always produce the same
//! prompt text. The offline synthesizer reads the labelled sections back,
//! so the labels below are part of the contract between the two.

use crate::core_types::{RequirementModel, TestSpecification, TestType};
use crate::formatters::push_line;

pub const SYSTEM_PROMPT: &str = "You are an expert test engineer. You write precise, \
actionable test cases with one concrete action and one observable expected result per step.";

pub const TEST_TYPE_LABEL: &str = "Test Type:";
pub const STORY_HEADER: &str = "User Story:";
pub const CRITERIA_HEADER: &str = "Acceptance Criteria:";
pub const CONTEXT_HEADER: &str = "System Context:";
pub const REQUIREMENT_HEADER: &str = "Requirement Text:";
pub const SPECIFICATION_HEADER: &str = "Test Requirements:";
pub const FOCUS_HEADER: &str = "Focus on:";
pub const LAYOUT_HEADER: &str = "Respond with test cases in exactly this layout:";

const RESPONSE_LAYOUT: &str = "TEST CASE 1: <title>
Description: <one sentence>
Preconditions:
- <precondition>
Steps:
1. <action> => <expected result>
2. <action> => <expected result>";

fn focus_points(test_type: TestType) -> &'static [&'static str] {
    match test_type {
        TestType::Functional => &[
            "Cover every acceptance criterion",
            "Positive and negative scenarios",
            "Specific, actionable steps with observable results",
        ],
        TestType::Edge => &[
            "Boundary conditions",
            "Invalid inputs",
            "Error scenarios",
            "Data edge cases",
        ],
        TestType::Security => &[
            "Authentication bypass attempts",
            "Authorization violations",
            "Input validation attacks",
            "Data exposure scenarios",
            "Session management issues",
        ],
        TestType::Api => &[
            "HTTP method validation",
            "Request and response validation",
            "Error handling and status codes",
            "Authentication and rate limiting",
        ],
        TestType::Ui => &[
            "User interactions",
            "Visual elements and feedback",
            "Responsive layout",
            "Cross-browser behaviour",
        ],
        TestType::Performance => &[
            "Response time under expected load",
            "Behaviour under peak load",
            "Resource usage over time",
        ],
        TestType::Accessibility => &[
            "Keyboard-only navigation",
            "Screen reader labels and announcements",
            "Colour contrast and focus visibility",
        ],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// User prompt asking for `test_type` cases.
    pub fn build(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
        test_type: TestType,
    ) -> String {
        let mut prompt = String::new();

        push_line(
            &mut prompt,
            format!("Generate {} test cases for the following requirements.", test_type.as_str()),
        );
        prompt.push('\n');
        push_line(&mut prompt, format!("{TEST_TYPE_LABEL} {test_type}"));
        prompt.push('\n');

        let story = &requirements.story;
        if !story.is_empty() {
            push_line(&mut prompt, STORY_HEADER);
            if !story.persona.is_empty() {
                push_line(&mut prompt, format!("As a {}", story.persona));
            }
            if !story.action.is_empty() {
                push_line(&mut prompt, format!("I want {}", story.action));
            }
            if !story.value.is_empty() {
                push_line(&mut prompt, format!("So that {}", story.value));
            }
            prompt.push('\n');
        }

        if requirements.criteria.is_empty() {
            push_line(&mut prompt, REQUIREMENT_HEADER);
            push_line(&mut prompt, requirements.source_text.trim());
            prompt.push('\n');
        } else {
            push_line(&mut prompt, CRITERIA_HEADER);
            for (index, criterion) in requirements.criteria.iter().enumerate() {
                push_line(&mut prompt, format!("{}. {}", index + 1, criterion.display_text()));
            }
            prompt.push('\n');
        }

        let context = &requirements.context;
        if !context.is_empty() {
            push_line(&mut prompt, CONTEXT_HEADER);
            let mut line = |label: &str, values: Vec<&str>| {
                if !values.is_empty() {
                    push_line(&mut prompt, format!("{label}: {}", values.join(", ")));
                }
            };
            line("Technology Stack", context.tech_stack.iter().map(String::as_str).collect());
            line("Constraints", context.constraints.iter().map(String::as_str).collect());
            line("User Roles", context.user_roles.iter().map(String::as_str).collect());
            line("Data Types", context.data_types.iter().map(String::as_str).collect());
            prompt.push('\n');
        }

        push_line(&mut prompt, SPECIFICATION_HEADER);
        push_line(&mut prompt, format!("- Test Level: {}", spec.test_level.as_str()));
        push_line(&mut prompt, format!("- Priority: {}", spec.priority.as_str()));
        push_line(&mut prompt, format!("- Output Format: {}", spec.output_format.as_str()));
        prompt.push('\n');

        push_line(&mut prompt, FOCUS_HEADER);
        for (index, point) in focus_points(test_type).iter().enumerate() {
            push_line(&mut prompt, format!("{}. {point}", index + 1));
        }
        prompt.push('\n');

        push_line(&mut prompt, LAYOUT_HEADER);
        prompt.push_str(RESPONSE_LAYOUT);
        prompt.push('\n');

        prompt
    }
}
