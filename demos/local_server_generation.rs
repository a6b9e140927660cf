//! Generation against a local model server, with offline fallback disabled.
//!
//! This example shows how to:
//! - Load configuration from the environment
//! - Run several test types concurrently against a live backend
//! - Handle partial results and fatal errors
//!
//! # Running
//!
//! ```bash
//! export TESTGEN_PROVIDER=ollama
//! export OLLAMA_BASE_URL="http://localhost:11434"
//! export TESTGEN_MODEL=llama3
//! cargo run --example local_server_generation
//! ```

use std::time::Duration;
use testgen_llm::{
    FallbackPolicy, GenError, GenerationRequest, GeneratorConfig, OutputFormat, Priority,
    TestCaseGenerator, TestLevel, TestSpecification, TestType, TicketContent,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("testgen_llm=info")),
        )
        .init();

    let config = GeneratorConfig {
        fallback: FallbackPolicy::Disabled,
        ..GeneratorConfig::from_env()?
    };
    let generator = TestCaseGenerator::from_config(&config)?;
    println!("Using backend: {}", generator.client().provider_name());

    let ticket = TicketContent {
        raw_description: "As an administrator, I want to export the audit log as CSV".to_string(),
        acceptance_criteria_text: "1. The export contains every event from the selected range
2. Ranges longer than 90 days are rejected
3. Only administrators can start an export"
            .to_string(),
        ..TicketContent::default()
    };
    let spec = TestSpecification::new(
        [TestType::Functional, TestType::Security, TestType::Api],
        TestLevel::Integration,
        OutputFormat::Pytest,
        Priority::Medium,
    )?;
    let request = GenerationRequest::new(ticket, spec).with_timeout(Duration::from_secs(90));

    match generator.run(&request).await {
        Ok(output) => {
            println!("{}", output.rendered);
            if output.is_partial() {
                println!("\nSkipped:");
                for skipped in &output.skipped {
                    println!("  {skipped}");
                }
            }
        }
        Err(error @ GenError::NothingProduced { .. }) => {
            eprintln!("No test type produced cases: {error}");
        }
        Err(error) => {
            eprintln!("{}", error.user_message());
            return Err(error.into());
        }
    }

    Ok(())
}
