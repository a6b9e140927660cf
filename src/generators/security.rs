//! Security test generation
//!
//! Same model pass as the functional generator, one priority level higher.

use super::{check_inputs, Generator, ModelPass};
use crate::client::ProviderClient;
use crate::core_types::{GenerationResult, IdSequence, RequirementModel, TestSpecification, TestType};
use crate::error::GenResult;
use crate::logging::log_info;
use crate::providers::InvokeOptions;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SecurityGenerator {
    pass: ModelPass,
}

impl SecurityGenerator {
    pub fn new(client: Arc<ProviderClient>, options: InvokeOptions) -> Self {
        Self {
            pass: ModelPass::new(client, options),
        }
    }
}

#[async_trait]
impl Generator for SecurityGenerator {
    fn name(&self) -> &'static str {
        "security-generator"
    }

    fn test_type(&self) -> TestType {
        TestType::Security
    }

    async fn generate(
        &self,
        requirements: &RequirementModel,
        spec: &TestSpecification,
    ) -> GenResult<GenerationResult> {
        check_inputs(requirements, spec, TestType::Security)?;

        let priority = spec.priority.raised();
        let mut result = GenerationResult::new(self.name());
        let mut ids = IdSequence::new(TestType::Security.id_prefix());
        self.pass
            .run(
                requirements,
                spec,
                TestType::Security,
                priority,
                &mut ids,
                &mut result,
            )
            .await?;

        log_info!(
            generator = self.name(),
            priority = priority.as_str(),
            test_cases = result.test_cases.len(),
            "Security generation finished"
        );
        Ok(result)
    }
}
