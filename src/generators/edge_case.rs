//! Edge-case test generation
//!
//! Before the model is asked anything, template cases are built from the
//! requirement itself: boundary probes around every stated numeric
//! threshold, a string-input case, and one negative-precondition case per
//! given-when-then scenario. Template cases come first in the result,
//! model cases after them, each group in creation order.

use super::{base_tags, check_inputs, push_repaired, Generator, ModelPass, ORIGIN_TEMPLATE};
use crate::client::ProviderClient;
use crate::core_types::{
    GenerationResult, IdSequence, Priority, RequirementModel, StepRole, TestCase,
    TestSpecification, TestStep, TestType,
};
use crate::error::GenResult;
use crate::logging::{log_info, log_warn};
use crate::parsers::{group_scenarios, CriterionGroup};
use crate::providers::InvokeOptions;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static THRESHOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,9})\s*(users?|characters?|items?|seconds?|minutes?|hours?|days?|bytes?|mb|gb|percent|times|attempts?)\b",
    )
    .expect("valid threshold regex")
});

const STRING_EDGE_VALUES: &[&str] = &[
    "empty string",
    "single character",
    "whitespace only",
    "10000 characters",
    "special characters !@#$%^&*()",
    "unicode characters 日本語 🚀",
    "SQL metacharacters ' OR 1=1 --",
    "embedded null byte",
];

/// A `<number> <unit>` threshold stated in the requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub value: i64,
    pub unit: String,
    /// The text the threshold was read from, e.g. `10 minutes`.
    pub mention: String,
}

impl Threshold {
    /// `0, v-1, v, v+1, 2v, -1` without repeats, in that order.
    pub fn probe_values(&self) -> Vec<i64> {
        let v = self.value;
        let mut values = Vec::new();
        for candidate in [0, v - 1, v, v + 1, v.saturating_mul(2), -1] {
            if !values.contains(&candidate) {
                values.push(candidate);
            }
        }
        values
    }
}

/// Every distinct threshold in `text`, in order of appearance.
pub fn find_thresholds(text: &str) -> Vec<Threshold> {
    let mut found: Vec<Threshold> = Vec::new();
    for caps in THRESHOLD.captures_iter(text) {
        let (Some(number), Some(unit), Some(mention)) = (caps.get(1), caps.get(2), caps.get(0))
        else {
            continue;
        };
        let Ok(value) = number.as_str().parse::<i64>() else {
            continue;
        };
        let unit = unit.as_str().to_string();
        if found
            .iter()
            .any(|t| t.value == value && t.unit.eq_ignore_ascii_case(&unit))
        {
            continue;
        }
        found.push(Threshold {
            value,
            unit,
            mention: mention.as_str().to_string(),
        });
    }
    found
}

#[derive(Debug, Clone)]
pub struct EdgeCaseGenerator {
    pass: ModelPass,
}

impl EdgeCaseGenerator {
    pub fn new(client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        Self {
            pass: ModelPass::new(client, options),
        }
    }

    /// Template cases built without a model call.
    pub fn template_cases(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
        ids: &mut IdSequence,
    ) -> Vec<TestCase> {
        let priority = spec.priority;
        let tags = base_tags(requirements, spec, TestType::Edge, priority, ORIGIN_TEMPLATE);
        let new_case = |ids: &mut IdSequence, title: String, label: &str| {
            let mut case =
                TestCase::new(ids.next_id(), title, TestType::Edge, priority, spec.test_level);
            case.tags = tags.clone();
            case.tags.insert(label.to_string());
            case
        };

        let scan_text = if requirements.source_text.trim().is_empty() {
            requirements
                .criteria
                .iter()
                .map(|criterion| criterion.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            requirements.source_text.clone()
        };

        let mut cases = Vec::new();

        for threshold in find_thresholds(&scan_text) {
            let values = threshold
                .probe_values()
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let mut case = new_case(
                ids,
                format!("Boundary values around {}", threshold.mention),
                "boundary-values",
            );
            case.description = format!(
                "Probes just below, at and above the stated threshold of {}",
                threshold.mention
            );
            case.preconditions
                .push(format!("The limit of {} is in effect", threshold.mention));
            case.push_step(
                TestStep::new(
                    format!("Set the value to <value> {}", threshold.unit),
                    "The value is accepted by the input",
                )
                .with_data(format!("<value> = {values}"))
                .with_role(StepRole::Action),
            );
            case.push_step(
                TestStep::new(
                    format!("Observe how the system handles <value> {}", threshold.unit),
                    format!(
                        "Values within {} are handled normally and values beyond it are rejected",
                        threshold.mention
                    ),
                )
                .with_role(StepRole::Verification),
            );
            cases.push(case);
        }

        let mut strings = new_case(ids, "String input edge cases".to_string(), "string-edge-cases");
        strings.description =
            "Text inputs cope with empty, oversized and unusual character content".to_string();
        strings.push_step(
            TestStep::new("Enter <input> into each text input and submit", "The input is validated")
                .with_data(format!("<input> = {}", STRING_EDGE_VALUES.join(", ")))
                .with_role(StepRole::Action),
        );
        strings.push_step(
            TestStep::new(
                "Verify the response to <input>",
                "The input is either accepted and stored intact or rejected with a clear message",
            )
            .with_role(StepRole::Verification),
        );
        cases.push(strings);

        for group in group_scenarios(&requirements.criteria) {
            let CriterionGroup::Scenario { given, when, .. } = group else {
                continue;
            };
            if given.is_empty() {
                continue;
            }
            let state = given.join(" and ");
            let action = if when.is_empty() {
                "perform the described action".to_string()
            } else {
                when.join(" and ")
            };

            let mut case = new_case(
                ids,
                format!("Negative precondition: {action} without {state}"),
                "negative-scenarios",
            );
            case.description = format!("The action is refused when '{state}' does not hold");
            case.push_step(
                TestStep::new(
                    format!("Ensure the system is NOT in state: {state}"),
                    "The precondition does not hold",
                )
                .with_role(StepRole::Precondition),
            );
            case.push_step(
                TestStep::new(
                    format!("Attempt to {action}"),
                    "The system rejects the attempt",
                )
                .with_role(StepRole::Action),
            );
            case.push_step(
                TestStep::new(
                    "Verify the attempt is rejected with an error message",
                    "A clear error is shown and no state changes",
                )
                .with_role(StepRole::Verification),
            );
            cases.push(case);
        }

        cases
    }
}

#[async_trait]
impl Generator for EdgeCaseGenerator {
    fn name(&self) -> &'static str {
        "edge-case-generator"
    }

    fn test_type(&self) -> TestType {
        TestType::Edge
    }

    async fn generate(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult> {
        check_inputs(requirements, spec, TestType::Edge)?;

        let mut result = GenerationResult::new(self.name());
        let mut ids = IdSequence::new(TestType::Edge.id_prefix());

        let templates = self.template_cases(requirements, spec, &mut ids);
        let template_count = templates.len();
        for case in templates {
            push_repaired(&mut result, case);
        }

        let priority: Priority = spec.priority;
        if let Err(error) = self
            .pass
            .run(requirements, spec, TestType::Edge, priority, &mut ids, &mut result)
            .await
        {
            if error.is_fatal() {
                return Err(error);
            }
            log_warn!(
                error = %error,
                template_cases = template_count,
                "Model pass failed, keeping template edge cases only"
            );
            result
                .warnings
                .push(format!("edge: model cases unavailable ({error}); template cases only"));
        }

        log_info!(
            generator = self.name(),
            template_cases = template_count,
            model_cases = result.test_cases.len() - template_count,
            "Edge-case generation finished"
        );
        Ok(result)
    }
}

