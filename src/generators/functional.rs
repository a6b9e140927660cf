//! Functional test generation

use super::{check_inputs, Generator, ModelPass};
use crate::client::ProviderClient;
use crate::core_types::{GenerationResult, IdSequence, RequirementModel, TestSpecification, TestType};
use crate::error::GenResult;
use crate::logging::log_info;
use crate::providers::InvokeOptions;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FunctionalGenerator {
    pass: ModelPass,
}

impl FunctionalGenerator {
    pub fn new(client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        Self {
            pass: ModelPass::new(client, options),
        }
    }
}

#[async_trait]
impl Generator for FunctionalGenerator {
    fn name(&self) -> &'static str {
        "functional-generator"
    }

    fn test_type(&self) -> TestType {
        TestType::Functional
    }

    async fn generate(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult> {
        check_inputs(requirements, spec, TestType::Functional)?;

        let mut result = GenerationResult::new(self.name());
        let mut ids = IdSequence::new(TestType::Functional.id_prefix());
        self.pass
            .run(
                requirements,
                spec,
                TestType::Functional,
                spec.priority,
                &mut ids,
                &mut result,
            )
            .await?;

        log_info!(
            generator = self.name(),
            test_cases = result.test_cases.len(),
            warnings = result.warnings.len(),
            "Functional generation finished"
        );
        Ok(result)
    }
}
