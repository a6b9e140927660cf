// Shared fixtures for unit tests

use crate::core_types::{
    GenerationResult, Priority, RequirementModel, StepRole, TestCase, TestLevel,
    TestSpecification, TestStep, TestType, TicketContent,
};
use crate::error::{GenError, GenResult};
use crate::generators::Generator;
use crate::internals::RetryPolicy;
use crate::parsers::RequirementParser;

use async_trait::async_trait;
use std::time::Duration;

pub const LOGIN_STORY: &str =
    "As a registered customer, I want to log in with my email so that I can see my orders";

pub const LOGIN_CRITERIA: &str = "Given a registered user on the login page
When they enter valid credentials
Then the dashboard is shown
And a welcome message names the user";

pub fn login_ticket() -> TicketContent {
    TicketContent {
        raw_description: LOGIN_STORY.to_string(),
        acceptance_criteria_text: LOGIN_CRITERIA.to_string(),
        ..TicketContent::default()
    }
}

pub fn login_requirements() -> RequirementModel {
    RequirementParser::parse_ticket(&login_ticket()).0
}

pub fn spec_for(test_types: &[TestType]) -> TestSpecification {
    TestSpecification::new(
        test_types.iter().copied(),
        TestLevel::Integration,
        crate::core_types::OutputFormat::Gherkin,
        Priority::Medium,
    )
    .expect("non-empty test types")
}

/// Millisecond-scale policy so retry tests stay fast.
pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        total_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_millis(500),
    }
}

/// The one-case, one-step result used by formatter tests.
pub fn login_case_result() -> GenerationResult {
    let mut case = TestCase::new(
        "FUNC-20240101000000000-001",
        "Login",
        TestType::Functional,
        Priority::High,
        TestLevel::E2e,
    );
    case.push_step(TestStep::new("enter credentials", "dashboard shown"));
    let mut result = GenerationResult::new("functional-generator");
    result.test_cases.push(case);
    result
}

pub fn verification_step(text: &str) -> TestStep {
    TestStep::new(format!("Verify {text}"), text).with_role(StepRole::Verification)
}

/// How a [`ScriptedGenerator`] finishes.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Cases(usize),
    Transient,
    Fatal,
}

/// Generator with a fixed delay and outcome, for fan-out tests.
pub struct ScriptedGenerator {
    pub test_type: TestType,
    pub delay: Duration,
    pub outcome: Outcome,
}

impl ScriptedGenerator {
    pub fn new(test_type: TestType, delay: Duration, outcome: Outcome) -> Self {
        Self {
            test_type,
            delay,
            outcome,
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted-generator"
    }

    fn test_type(&self) -> TestType {
        self.test_type
    }

    async fn generate(
        &self,
        _requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult> {
        tokio::time::sleep(self.delay).await;
        match self.outcome {
            Outcome::Cases(count) => {
                let mut result = GenerationResult::new(self.name());
                for index in 1..=count {
                    let mut case = TestCase::new(
                        format!("{}-{index:03}", self.test_type.id_prefix()),
                        format!("{} case {index}", self.test_type),
                        self.test_type,
                        spec.priority,
                        spec.test_level,
                    );
                    case.push_step(TestStep::new("Do the thing", "The thing is done"));
                    result.test_cases.push(case);
                }
                Ok(result)
            }
            Outcome::Transient => Err(GenError::provider_unavailable(
                "scripted",
                3,
                "backend kept timing out",
            )),
            Outcome::Fatal => Err(GenError::provider_auth_failure("bad key")),
        }
    }
}
