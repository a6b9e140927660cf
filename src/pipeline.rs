//! End-to-end generation: ticket text in, rendered test artifact out.
//!
//! ```text
//! GenerationRequest
//!   -> RequirementParser::parse_ticket      (degradations become warnings)
//!   -> one Generator per requested type     (concurrent, shared deadline)
//!   -> merge in request order
//!   -> Formatter for the requested output format
//! ```
//!
//! A fatal error from any variant fails the whole request at once. Any other
//! variant failure, including running past the deadline, only skips that
//! variant; the caller gets the rest plus a warning.

use crate::client::ProviderClient;
use crate::config::GeneratorConfig;
use crate::core_types::{
    GenerationResult, RequirementModel, TestSpecification, TestType, TicketContent,
};
use crate::error::{GenError, GenResult};
use crate::formatters::{FormatContext, FormatterRegistry};
use crate::generators::GeneratorRegistry;
use crate::logging::{log_info, log_warn};
use crate::parsers::RequirementParser;
use crate::providers::InvokeOptions;

pub use crate::core_types::SkippedVariant;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// What a front end hands the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub ticket: TicketContent,
    pub spec: TestSpecification,
    /// Overrides the generator's fan-out timeout for this request.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    pub fn new(ticket: TicketContent, spec: TestSpecification) -> Self {
        Self {
            ticket,
            spec,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub request_id: Uuid,
    /// Every produced case, grouped by test type in request order.
    pub result: GenerationResult,
    pub rendered: String,
    pub requirements: RequirementModel,
    pub skipped: Vec<SkippedVariant>,
}

impl GenerationOutput {
    /// True when at least one requested test type was skipped.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

enum VariantOutcome {
    Produced(GenerationResult),
    Skipped(SkippedVariant),
}

/// Runs requests against a shared client, generator set and formatter set.
#[derive(Debug)]
pub struct TestCaseGenerator {
    client: Arc<ProviderClient>,
    registry: GeneratorRegistry,
    formatters: FormatterRegistry,
    default_timeout: Duration,
}

impl TestCaseGenerator {
    pub fn new(client: Arc<ProviderClient>, options: InvokeOptions, default_timeout: Duration) -> Self {
        Self {
            registry: GeneratorRegistry::new(Arc::clone(&client), options),
            client,
            formatters: FormatterRegistry::new(),
            default_timeout,
        }
    }

    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if `config` fails validation.
    pub fn from_config(config: &GeneratorConfig) -> GenResult<Self> {
        let client = Arc::new(ProviderClient::from_config(config)?);
        let options = InvokeOptions {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            ..InvokeOptions::default()
        };
        Ok(Self::new(client, options, config.fan_out_timeout))
    }

    /// Generator that answers every prompt from the offline synthesizer.
    pub fn offline() -> Self {
        let config = GeneratorConfig::offline();
        Self::new(
            Arc::new(ProviderClient::offline()),
            InvokeOptions::deterministic(),
            config.fan_out_timeout,
        )
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn client(&self) -> &Arc<ProviderClient> {
        &self.client
    }

    /// Parse, generate every requested test type concurrently, and render.
    ///
    /// # Errors
    ///
    /// - [`GenError::EmptyInput`] when the ticket parses to nothing
    /// - [`GenError::InvalidSpecification`] when a requested type or format
    ///   has nothing registered for it
    /// - any fatal variant error, as soon as it happens
    /// - [`GenError::NothingProduced`] when every variant was skipped
    pub async fn run(&self, request: &GenerationRequest) -> GenResult<GenerationOutput> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generation", request_id = %request_id);
        self.run_inner(request_id, request).instrument(span).await
    }

    async fn run_inner(
        &self,
        request_id: Uuid,
        request: &GenerationRequest,
    ) -> GenResult<GenerationOutput> {
        let spec = &request.spec;
        log_info!(
            test_types = ?spec.test_types(),
            output_format = %spec.output_format,
            provider = self.client.provider_name(),
            "Generation request started"
        );

        let (requirements, degraded) = RequirementParser::parse_ticket(&request.ticket);
        if requirements.is_empty() {
            return Err(GenError::empty_input("requirements"));
        }

        let formatter = self.formatters.get(spec.output_format)?;
        let generators = spec
            .test_types()
            .iter()
            .map(|&test_type| Ok((test_type, self.registry.get(test_type)?)))
            .collect::<GenResult<Vec<_>>>()?;

        let generator_name = match generators.as_slice() {
            [(_, single)] => single.name(),
            _ => "test-case-generator",
        };
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let deadline = tokio::time::Instant::now() + timeout;

        let variants = generators.into_iter().map(|(test_type, generator)| {
            let variant_spec = spec.for_type(test_type);
            let requirements = &requirements;
            let span = tracing::info_span!("variant", test_type = %test_type);
            async move {
                let outcome =
                    tokio::time::timeout_at(deadline, generator.generate(requirements, &variant_spec))
                        .await;
                match outcome {
                    Ok(Ok(result)) => Ok(VariantOutcome::Produced(result)),
                    Ok(Err(error)) if error.is_fatal() => Err(error),
                    Ok(Err(error)) => Ok(skip(test_type, error.to_string())),
                    Err(_) => {
                        let elapsed = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                        Ok(skip(test_type, GenError::timeout(elapsed).to_string()))
                    }
                }
            }
            .instrument(span)
        });

        let outcomes = try_join_all(variants).await?;

        let mut result = GenerationResult::new(generator_name);
        result
            .warnings
            .extend(degraded.iter().map(ToString::to_string));
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                VariantOutcome::Produced(variant) => result.extend(variant),
                VariantOutcome::Skipped(variant) => {
                    result.warnings.push(variant.to_string());
                    skipped.push(variant);
                }
            }
        }

        if skipped.len() == spec.test_types().len() {
            return Err(GenError::nothing_produced(skipped));
        }

        let context = FormatContext::new(&requirements, spec);
        let rendered = formatter.render(&result, &context)?;

        log_info!(
            test_cases = result.test_cases.len(),
            skipped = skipped.len(),
            warnings = result.warnings.len(),
            "Generation request finished"
        );

        Ok(GenerationOutput {
            request_id,
            result,
            rendered,
            requirements,
            skipped,
        })
    }
}

fn skip(test_type: TestType, reason: String) -> VariantOutcome {
    log_warn!(test_type = %test_type, reason = %reason, "Skipping test type");
    VariantOutcome::Skipped(SkippedVariant { test_type, reason })
}
