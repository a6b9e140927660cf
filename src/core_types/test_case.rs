//! Test case records produced by generators and consumed by formatters.

use super::spec::{Priority, TestLevel, TestType};
use crate::error::{GenError, GenResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Placeholder for an expected result the source never stated.
pub const NOT_SPECIFIED: &str = "not specified";

/// What a step does in the scenario. Drives Gherkin keyword selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    Precondition,
    Action,
    Verification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub action: String,
    pub expected_result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<StepRole>,
}

impl TestStep {
    pub fn new(action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            expected_result: expected_result.into(),
            test_data: None,
            notes: None,
            role: None,
        }
    }

    pub fn with_data(mut self, test_data: impl Into<String>) -> Self {
        self.test_data = Some(test_data.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_role(mut self, role: StepRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn has_expected_result(&self) -> bool {
        !self.expected_result.trim().is_empty() && self.expected_result != NOT_SPECIFIED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub description: String,
    pub test_type: TestType,
    pub priority: Priority,
    pub level: TestLevel,
    pub tags: BTreeSet<String>,
    pub preconditions: Vec<String>,
    pub steps: Vec<TestStep>,
    pub expected_results: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TestCase {
    /// Build a case whose `expected_results` mirror the steps.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        test_type: TestType,
        priority: Priority,
        level: TestLevel,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            test_type,
            priority,
            level,
            tags: BTreeSet::new(),
            preconditions: Vec::new(),
            steps: Vec::new(),
            expected_results: Vec::new(),
            notes: None,
        }
    }

    pub fn push_step(&mut self, step: TestStep) {
        self.expected_results.push(step.expected_result.clone());
        self.steps.push(step);
    }

    /// Bring the case back within the data-model invariants.
    ///
    /// Returns one warning per repair. Nothing is ever discarded except
    /// expected results that have no step to belong to.
    pub fn repair(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();

        if self.title.trim().is_empty() {
            self.title = format!("Untitled test case {}", self.id);
            repairs.push(format!("{}: missing title replaced", self.id));
        }

        if self.steps.is_empty() {
            let action = if self.description.trim().is_empty() {
                format!("Exercise the behaviour described by '{}'", self.title)
            } else {
                "Review the behaviour described above".to_string()
            };
            let expected = self
                .expected_results
                .first()
                .cloned()
                .unwrap_or_else(|| NOT_SPECIFIED.to_string());
            self.steps.push(TestStep::new(action, expected));
            repairs.push(format!("{}: added a step to a case without steps", self.id));
        }

        for (index, step) in self.steps.iter_mut().enumerate() {
            if step.action.trim().is_empty() {
                step.action = format!("Step {} (action not specified)", index + 1);
                repairs.push(format!("{}: step {} had no action", self.id, index + 1));
            }
            if step.expected_result.trim().is_empty() {
                step.expected_result = NOT_SPECIFIED.to_string();
            }
        }

        match self.expected_results.len().cmp(&self.steps.len()) {
            std::cmp::Ordering::Less => {
                let missing = self.steps.len() - self.expected_results.len();
                for step in &self.steps[self.expected_results.len()..] {
                    self.expected_results.push(step.expected_result.clone());
                }
                repairs.push(format!(
                    "{}: padded {missing} missing expected result(s)",
                    self.id
                ));
            }
            std::cmp::Ordering::Greater => {
                let extra = self.expected_results.len() - self.steps.len();
                self.expected_results.truncate(self.steps.len());
                repairs.push(format!(
                    "{}: dropped {extra} expected result(s) without a step",
                    self.id
                ));
            }
            std::cmp::Ordering::Equal => {}
        }

        for (expected, step) in self.expected_results.iter_mut().zip(&self.steps) {
            if expected.trim().is_empty() {
                *expected = step.expected_result.clone();
            }
        }

        repairs
    }

    /// Check the data-model invariants without changing anything.
    pub fn validate(&self) -> GenResult<()> {
        if self.id.trim().is_empty() {
            return Err(GenError::malformed_result("<missing id>", "test case has no id"));
        }
        if self.steps.is_empty() {
            return Err(GenError::malformed_result(&self.id, "test case has no steps"));
        }
        if self.expected_results.len() != self.steps.len() {
            return Err(GenError::malformed_result(
                &self.id,
                format!(
                    "{} expected result(s) for {} step(s)",
                    self.expected_results.len(),
                    self.steps.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Output of one generator, or of a whole merged request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub test_cases: Vec<TestCase>,
    pub generator_name: String,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn new(generator_name: impl Into<String>) -> Self {
        Self {
            test_cases: Vec::new(),
            generator_name: generator_name.into(),
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Validate every case and id uniqueness, naming the first offender.
    pub fn validate(&self) -> GenResult<()> {
        let mut seen = HashSet::new();
        for case in &self.test_cases {
            case.validate()?;
            if !seen.insert(case.id.as_str()) {
                return Err(GenError::malformed_result(&case.id, "duplicate test case id"));
            }
        }
        Ok(())
    }

    /// Append another result's cases and warnings, keeping their order.
    pub fn extend(&mut self, other: GenerationResult) {
        self.test_cases.extend(other.test_cases);
        self.warnings.extend(other.warnings);
    }
}

/// A test type that contributed no cases, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedVariant {
    pub test_type: TestType,
    pub reason: String,
}

impl fmt::Display for SkippedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} test generation skipped: {}", self.test_type, self.reason)
    }
}

/// Hands out `{PREFIX}-{timestamp}-{seq:03}` identifiers for one generator run.
#[derive(Debug)]
pub struct IdSequence {
    prefix: String,
    stamp: String,
    next: u32,
}

impl IdSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_stamp(prefix, Utc::now().format("%Y%m%d%H%M%S%3f").to_string())
    }

    pub fn with_stamp(prefix: impl Into<String>, stamp: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stamp: stamp.into(),
            next: 1,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{}-{:03}", self.prefix, self.stamp, self.next);
        self.next += 1;
        id
    }
}
