//! Generators for the categories that only differ by prompt focus:
//! api, ui, performance and accessibility.

use super::{check_inputs, Generator, ModelPass};
use crate::client::ProviderClient;
use crate::core_types::{GenerationResult, IdSequence, RequirementModel, TestSpecification, TestType};
use crate::error::GenResult;
use crate::logging::log_info;
use crate::providers::InvokeOptions;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CategoryGenerator {
    test_type: TestType,
    pass: ModelPass,
}

impl CategoryGenerator {
    pub fn new(test_type: TestType, client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        Self {
            test_type,
            pass: ModelPass::new(client, options),
        }
    }
}

#[async_trait]
impl Generator for CategoryGenerator {
    fn name(&self) -> &'static str {
        match self.test_type {
            TestType::Api => "api-generator",
            TestType::Ui => "ui-generator",
            TestType::Performance => "performance-generator",
            TestType::Accessibility => "accessibility-generator",
            TestType::Functional => "functional-generator",
            TestType::Security => "security-generator",
            TestType::Edge => "edge-case-generator",
        }
    }

    fn test_type(&self) -> TestType {
        self.test_type
    }

    async fn generate(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult> {
        check_inputs(requirements, spec, self.test_type)?;

        let mut result = GenerationResult::new(self.name());
        let mut ids = IdSequence::new(self.test_type.id_prefix());
        self.pass
            .run(
                requirements,
                spec,
                self.test_type,
                spec.priority,
                &mut ids,
                &mut result,
            )
            .await?;

        log_info!(
            generator = self.name(),
            test_cases = result.test_cases.len(),
            "Category generation finished"
        );
        Ok(result)
    }
}
