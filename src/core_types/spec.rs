//! Test specification: what to generate and how to render it.
//!
//! Values are validated once, when the specification is built. Everything
//! downstream works with the typed enums.

use crate::error::{GenError, GenResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of test a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Functional,
    Security,
    Api,
    Ui,
    Performance,
    Accessibility,
    Edge,
}

impl TestType {
    pub const ALL: [TestType; 7] = [
        Self::Functional,
        Self::Security,
        Self::Api,
        Self::Ui,
        Self::Performance,
        Self::Accessibility,
        Self::Edge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::Security => "security",
            Self::Api => "api",
            Self::Ui => "ui",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
            Self::Edge => "edge",
        }
    }

    /// Prefix used in test case identifiers.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Functional => "FUNC",
            Self::Security => "SEC",
            Self::Api => "API",
            Self::Ui => "UI",
            Self::Performance => "PERF",
            Self::Accessibility => "A11Y",
            Self::Edge => "EDGE",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "functional" => Ok(Self::Functional),
            "security" => Ok(Self::Security),
            "api" => Ok(Self::Api),
            "ui" => Ok(Self::Ui),
            "performance" => Ok(Self::Performance),
            "accessibility" | "a11y" => Ok(Self::Accessibility),
            "edge" | "edge_case" | "edge_cases" => Ok(Self::Edge),
            _ => Err(GenError::invalid_specification(format!(
                "unsupported test type '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLevel {
    Unit,
    #[default]
    Integration,
    E2e,
    System,
}

impl TestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::E2e => "e2e",
            Self::System => "system",
        }
    }
}

impl fmt::Display for TestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestLevel {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "unit" => Ok(Self::Unit),
            "integration" => Ok(Self::Integration),
            "e2e" | "end_to_end" => Ok(Self::E2e),
            "system" => Ok(Self::System),
            _ => Err(GenError::invalid_specification(format!(
                "unsupported test level '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Gherkin,
    Playwright,
    Pytest,
    Cypress,
    Selenium,
    Junit,
    Human,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gherkin => "gherkin",
            Self::Playwright => "playwright",
            Self::Pytest => "pytest",
            Self::Cypress => "cypress",
            Self::Selenium => "selenium",
            Self::Junit => "junit",
            Self::Human => "human",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "gherkin" | "feature" => Ok(Self::Gherkin),
            "playwright" => Ok(Self::Playwright),
            "pytest" => Ok(Self::Pytest),
            "cypress" => Ok(Self::Cypress),
            "selenium" => Ok(Self::Selenium),
            "junit" => Ok(Self::Junit),
            "human" | "human_readable" | "markdown" => Ok(Self::Human),
            _ => Err(GenError::invalid_specification(format!(
                "unsupported output format '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// One level up, saturating at `High`.
    pub fn raised(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(GenError::invalid_specification(format!(
                "unsupported priority '{s}'"
            ))),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Immutable generation configuration supplied by the caller.
///
/// `test_types` keeps the order the caller asked for; it drives the order
/// of the merged output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSpecification {
    test_types: Vec<TestType>,
    pub test_level: TestLevel,
    pub output_format: OutputFormat,
    pub priority: Priority,
}

impl Default for TestSpecification {
    fn default() -> Self {
        Self {
            test_types: vec![TestType::Functional],
            test_level: TestLevel::default(),
            output_format: OutputFormat::default(),
            priority: Priority::default(),
        }
    }
}

impl TestSpecification {
    /// Build a specification, dropping repeated test types.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::InvalidSpecification`] when `test_types` is empty.
    pub fn new(
        test_types: impl IntoIterator<Item = TestType>,
        test_level: TestLevel,
        output_format: OutputFormat,
        priority: Priority,
    ) -> GenResult<Self> {
        let mut ordered = Vec::new();
        for test_type in test_types {
            if !ordered.contains(&test_type) {
                ordered.push(test_type);
            }
        }
        if ordered.is_empty() {
            return Err(GenError::invalid_specification(
                "at least one test type is required",
            ));
        }

        Ok(Self {
            test_types: ordered,
            test_level,
            output_format,
            priority,
        })
    }

    /// Build a specification from the loosely typed strings front ends collect.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::InvalidSpecification`] naming the first value that
    /// is not recognized.
    pub fn parse<S: AsRef<str>>(
        test_types: &[S],
        test_level: &str,
        output_format: &str,
        priority: &str,
    ) -> GenResult<Self> {
        let types = test_types
            .iter()
            .map(|value| value.as_ref().parse::<TestType>())
            .collect::<GenResult<Vec<_>>>()?;

        Self::new(
            types,
            test_level.parse()?,
            output_format.parse()?,
            priority.parse()?,
        )
    }

    pub fn test_types(&self) -> &[TestType] {
        &self.test_types
    }

    /// Copy of this specification targeting a single test type.
    pub fn for_type(&self, test_type: TestType) -> Self {
        Self {
            test_types: vec![test_type],
            ..self.clone()
        }
    }
}
