//! Test case generators, one per test type
//!
//! Every generator builds a deterministic prompt, asks the
//! [`ProviderClient`] for a response, extracts draft cases from it and
//! normalizes them into [`TestCase`]s that satisfy the data-model
//! invariants. Malformed model output never fails a generator; invalid
//! inputs do.

pub mod category;
pub mod edge_case;
pub mod functional;
pub mod prompt;
pub mod security;

pub use category::CategoryGenerator;
pub use edge_case::EdgeCaseGenerator;
pub use functional::FunctionalGenerator;
pub use prompt::PromptBuilder;
pub use security::SecurityGenerator;

use crate::client::ProviderClient;
use crate::core_types::{
    GenerationResult, IdSequence, Priority, RequirementModel, TestCase, TestSpecification,
    TestType,
};
use crate::error::{GenError, GenResult};
use crate::logging::{log_debug, log_warn};
use crate::providers::InvokeOptions;
use crate::response_parser::{extract_test_cases, ExtractedCase};

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Tag marking cases that came back from the model (or its offline stand-in).
pub const ORIGIN_GENERATED: &str = "generated";
/// Tag marking cases built from templates without a model call.
pub const ORIGIN_TEMPLATE: &str = "template";

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "are", "was", "were", "will",
    "should", "must", "can", "has", "have", "had", "not", "but", "when", "then", "given", "user",
    "users", "system", "their", "they", "them", "its", "able", "page", "all", "any", "each",
];

/// One test-type variant of the generation pipeline.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    fn test_type(&self) -> TestType;

    /// Produce test cases for `requirements`.
    ///
    /// # Errors
    ///
    /// - [`GenError::EmptyInput`] when the requirement model has nothing in it
    /// - [`GenError::InvalidSpecification`] when `spec` does not ask for this
    ///   generator's test type
    /// - Backend failures the client could not recover from
    async fn generate(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult>;
}

/// Reject inputs no generator can work with.
pub(crate) fn check_inputs(
    requirements: &RequirementModel,
    spec: &TestSpecification,
    test_type: TestType,
) -> GenResult<()> {
    if requirements.is_empty() {
        return Err(GenError::empty_input("requirements"));
    }
    if !spec.test_types().contains(&test_type) {
        return Err(GenError::invalid_specification(format!(
            "{test_type} generator cannot produce {}",
            spec.test_types()
                .iter()
                .map(TestType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(())
}

/// Shared prompt, invoke, extract and normalize steps.
#[derive(Debug, Clone)]
pub(crate) struct ModelPass {
    client: Arc<ProviderClient>,
    options: InvokeOptions,
    prompts: PromptBuilder,
}

impl ModelPass {
    pub(crate) fn new(client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        let options = if options.system_prompt.is_some() {
            options
        } else {
            options.with_system_prompt(prompt::SYSTEM_PROMPT)
        };
        Self {
            client,
            options,
            prompts: PromptBuilder,
        }
    }

    /// Ask the model for `test_type` cases and append them to `result`.
    pub(crate) async fn run(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
        test_type: TestType,
        priority: Priority,
        ids: &mut IdSequence,
        result: &mut GenerationResult,
    ) -> GenResult<()> {
        let prompt = self.prompts.build(requirements, spec, test_type);
        let raw = self.client.invoke(&prompt, &self.options).await?;
        let extraction = extract_test_cases(&raw);

        log_debug!(
            test_type = %test_type,
            drafts = extraction.cases.len(),
            degraded = extraction.degraded,
            "Extracted draft test cases"
        );

        result.warnings.extend(
            extraction
                .warnings
                .into_iter()
                .map(|warning| format!("{test_type}: {warning}")),
        );

        let tags = base_tags(requirements, spec, test_type, priority, ORIGIN_GENERATED);
        for draft in extraction.cases {
            let case = from_draft(draft, ids.next_id(), test_type, priority, spec, &tags);
            push_repaired(result, case);
        }
        Ok(())
    }
}

/// Turn a draft into a test case, matching separately listed expected
/// results to steps by position.
pub(crate) fn from_draft(
    draft: ExtractedCase,
    id: String,
    test_type: TestType,
    priority: Priority,
    spec: &TestSpecification,
    tags: &BTreeSet<String>,
) -> TestCase {
    let mut case = TestCase::new(id, draft.title, test_type, priority, spec.test_level);
    case.description = draft.description;
    case.preconditions = draft.preconditions;
    case.notes = draft.notes;
    case.tags = tags.clone();
    case.tags.extend(draft.tags.iter().map(|tag| normalize_tag(tag)));

    if draft.expected_results.is_empty() {
        for step in draft.steps {
            case.push_step(step);
        }
    } else {
        let mut steps = draft.steps;
        for (step, expected) in steps.iter_mut().zip(&draft.expected_results) {
            if step.expected_result.trim().is_empty() {
                step.expected_result = expected.clone();
            }
        }
        case.steps = steps;
        case.expected_results = draft.expected_results;
    }
    case
}

/// Repair `case` and add it to `result`, recording every repair as a warning.
pub(crate) fn push_repaired(result: &mut GenerationResult, mut case: TestCase) {
    let repairs = case.repair();
    if !repairs.is_empty() {
        log_warn!(
            test_case_id = %case.id,
            repairs = repairs.len(),
            "Repaired generated test case"
        );
    }
    result.warnings.extend(repairs);
    result.test_cases.push(case);
}

/// Type, level, priority, origin, leading tech and roles, and keywords.
pub(crate) fn base_tags(
    requirements: &RequirementModel,
    spec: &TestSpecification,
    test_type: TestType,
    priority: Priority,
    origin: &str,
) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    tags.insert(test_type.as_str().to_string());
    tags.insert(spec.test_level.as_str().to_string());
    tags.insert(priority.as_str().to_string());
    tags.insert(origin.to_string());

    let context = &requirements.context;
    tags.extend(context.tech_stack.iter().take(3).map(|tech| normalize_tag(tech)));
    tags.extend(context.user_roles.iter().take(2).map(|role| normalize_tag(role)));
    tags.extend(keywords(requirements, 5));
    tags
}

/// Up to `limit` distinct keywords from the criteria, or the source text
/// when there are no criteria.
pub(crate) fn keywords(requirements: &RequirementModel, limit: usize) -> Vec<String> {
    let text = if requirements.criteria.is_empty() {
        requirements.source_text.clone()
    } else {
        requirements
            .criteria
            .iter()
            .map(|criterion| criterion.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut found: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if word.chars().count() <= 2
            || word.chars().all(|c| c.is_ascii_digit())
            || STOP_WORDS.contains(&word.as_str())
            || found.contains(&word)
        {
            continue;
        }
        found.push(word);
        if found.len() == limit {
            break;
        }
    }
    found
}

fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .trim_start_matches('@')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Lookup table from test type to generator.
pub struct GeneratorRegistry {
    generators: BTreeMap<TestType, Arc<dyn Generator>>,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("test_types", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GeneratorRegistry {
    /// Registry with no generators.
    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Registry with the built-in generator for every test type, all
    /// sharing `client`.
    pub fn new(client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(FunctionalGenerator::new(
            Arc::clone(&client),
            options.clone(),
        )));
        registry.register(Arc::new(SecurityGenerator::new(
            Arc::clone(&client),
            options.clone(),
        )));
        registry.register(Arc::new(EdgeCaseGenerator::new(
            Arc::clone(&client),
            options.clone(),
        )));
        for test_type in [
            TestType::Api,
            TestType::Ui,
            TestType::Performance,
            TestType::Accessibility,
        ] {
            registry.register(Arc::new(CategoryGenerator::new(
                test_type,
                Arc::clone(&client),
                options.clone(),
            )));
        }
        registry
    }

    /// Add a generator, replacing any registered for the same test type.
    pub fn register(&mut self, generator: Arc<dyn Generator>) {
        self.generators.insert(generator.test_type(), generator);
    }

    /// # Errors
    ///
    /// Returns [`GenError::InvalidSpecification`] when no generator is
    /// registered for `test_type`.
    pub fn get(&self, test_type: TestType) -> GenResult<Arc<dyn Generator>> {
        self.generators.get(&test_type).cloned().ok_or_else(|| {
            GenError::invalid_specification(format!("no generator registered for {test_type}"))
        })
    }

    pub fn test_types(&self) -> Vec<TestType> {
        self.generators.keys().copied().collect()
    }
}
