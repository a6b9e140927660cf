//! # testgen-llm
//!
//! Turns loosely structured requirement text (acceptance criteria, user
//! stories, system context) into structured test cases, using a generative
//! model as the content engine, and renders them as Gherkin, test-framework
//! skeletons or a plain document.
//!
//! ## Key Features
//!
//! - **Tolerant parsing**: malformed requirement text degrades to warnings, never errors
//! - **Pluggable backends**: local model server, hosted chat API or a custom endpoint
//! - **Resilience**: token-bucket rate limiting and jittered exponential retry
//! - **Offline fallback**: a deterministic synthesizer when no backend is configured
//! - **Concurrent fan-out**: one generator per test type, partial results on failure
//!
//! ## Example
//!
//! ```rust,no_run
//! use testgen_llm::{
//!     GenerationRequest, OutputFormat, Priority, TestCaseGenerator, TestLevel,
//!     TestSpecification, TestType, TicketContent,
//! };
//!
//! # async fn example() -> testgen_llm::GenResult<()> {
//! let ticket = TicketContent {
//!     raw_description: "As a shopper, I want to log in so that I can see my orders".into(),
//!     acceptance_criteria_text: "Given a registered user\nWhen they log in\nThen the dashboard is shown".into(),
//!     ..TicketContent::default()
//! };
//! let spec = TestSpecification::new(
//!     [TestType::Functional, TestType::Edge],
//!     TestLevel::Integration,
//!     OutputFormat::Gherkin,
//!     Priority::High,
//! )?;
//!
//! let generator = TestCaseGenerator::offline();
//! let output = generator.run(&GenerationRequest::new(ticket, spec)).await?;
//! println!("{}", output.rendered);
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Requirement, specification and test case data model
pub mod core_types;

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod client;
pub mod config;
pub mod error;
pub mod formatters;
pub mod generators;
pub mod internals;
pub mod parsers;
pub mod pipeline;
pub mod providers;
pub(crate) mod response_parser;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use client::ProviderClient;
pub use config::{
    BackendConfig, CustomEndpointConfig, FallbackPolicy, GeneratorConfig, HostedApiConfig,
    LocalServerConfig, ProviderConfig, RateLimitConfig,
};
pub use error::{ErrorCategory, ErrorSeverity, GenError, GenResult};
pub use formatters::{
    CodeSkeletonFormatter, FormatContext, Formatter, FormatterRegistry, Framework,
    GherkinFormatter, HumanReadableFormatter,
};
pub use generators::{
    CategoryGenerator, EdgeCaseGenerator, FunctionalGenerator, Generator, GeneratorRegistry,
    PromptBuilder, SecurityGenerator,
};
pub use internals::{RateLimiter, RetryExecutor, RetryPolicy};
pub use parsers::{
    parse_acceptance_criteria, parse_system_context, parse_user_story, RequirementParser,
};
pub use pipeline::{GenerationOutput, GenerationRequest, TestCaseGenerator};
pub use providers::{
    CustomEndpointBackend, FallbackSynthesizer, HostedApiBackend, InvokeOptions,
    LocalServerBackend, ProviderBackend,
};

pub use core_types::{
    AcceptanceCriterion, Clause, CriterionKind, FormatHint, GenerationResult, OutputFormat,
    ParseDegraded, Priority, RequirementModel, SkippedVariant, StepRole, SystemContext, TestCase,
    TestLevel, TestSpecification, TestStep, TestType, TicketContent, UserStory,
};
