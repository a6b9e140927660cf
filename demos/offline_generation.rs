//! Offline generation example: no model backend, deterministic output.
//!
//! This example shows how to:
//! - Describe a ticket and a test specification
//! - Run the pipeline with the offline synthesizer
//! - Print the rendered document and any warnings
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=testgen_llm=debug cargo run --example offline_generation
//! ```

use testgen_llm::{
    GenerationRequest, OutputFormat, Priority, TestCaseGenerator, TestLevel, TestSpecification,
    TestType, TicketContent,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ticket = TicketContent {
        raw_description: "As a shopper, I want to apply a discount code at checkout so that I pay less

Platform: web
Browsers: Chrome, Firefox"
            .to_string(),
        acceptance_criteria_text: "Given a cart with at least one item
When a valid discount code is entered
Then the order total is reduced
And an expired code shows an error message
- Codes are limited to 5 uses per customer"
            .to_string(),
        ..TicketContent::default()
    };

    let spec = TestSpecification::new(
        [TestType::Functional, TestType::Edge, TestType::Security],
        TestLevel::E2e,
        OutputFormat::Gherkin,
        Priority::High,
    )?;

    let generator = TestCaseGenerator::offline();
    let output = generator.run(&GenerationRequest::new(ticket, spec)).await?;

    println!("{}", output.rendered);

    println!("\nGenerated {} test cases", output.result.test_cases.len());
    for warning in &output.result.warnings {
        println!("  warning: {warning}");
    }

    Ok(())
}
