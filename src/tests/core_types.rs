// Unit Tests for the Core Data Model
//
// UNIT UNDER TEST: TestSpecification, TestCase::repair, TestCase::validate,
//                  IdSequence, GenerationResult
//
// BUSINESS RESPONSIBILITY:
//   - Validates the generation specification once, keeping request order
//   - Repairs model-produced cases instead of discarding them
//   - Hands out identifiers unique within a run
//
// TEST COVERAGE:
//   - Empty and repeated test types, string parsing with aliases
//   - Padding and truncation of expected results, cases without steps
//   - Identifier layout and sequencing
//   - Merging results and skip messages

use crate::core_types::{
    GenerationResult, IdSequence, OutputFormat, Priority, SkippedVariant, TestCase, TestLevel,
    TestSpecification, TestStep, TestType, NOT_SPECIFIED,
};
use crate::error::GenError;

fn bare_case(id: &str) -> TestCase {
    TestCase::new(id, "Checkout", TestType::Functional, Priority::Medium, TestLevel::E2e)
}

#[cfg(test)]
mod specification_tests {
    use super::*;

    #[test]
    fn test_empty_test_types_are_rejected() {
        // Act
        let result = TestSpecification::new(
            Vec::<TestType>::new(),
            TestLevel::Unit,
            OutputFormat::Gherkin,
            Priority::Low,
        );

        // Assert
        assert!(matches!(result, Err(GenError::InvalidSpecification { .. })));
    }

    #[test]
    fn test_repeated_types_keep_first_position() {
        // Act
        let spec = TestSpecification::new(
            [TestType::Security, TestType::Functional, TestType::Security],
            TestLevel::Integration,
            OutputFormat::Human,
            Priority::High,
        )
        .expect("valid spec");

        // Assert
        assert_eq!(spec.test_types(), &[TestType::Security, TestType::Functional]);
        assert_eq!(spec.for_type(TestType::Functional).test_types(), &[TestType::Functional]);
    }

    #[test]
    fn test_parse_accepts_front_end_spellings() {
        // Act
        let spec = TestSpecification::parse(&["Edge-Case", "a11y"][..], "end to end", "Feature", " HIGH ")
            .expect("aliases are recognized");

        // Assert
        assert_eq!(spec.test_types(), &[TestType::Edge, TestType::Accessibility]);
        assert_eq!(spec.test_level, TestLevel::E2e);
        assert_eq!(spec.output_format, OutputFormat::Gherkin);
        assert_eq!(spec.priority, Priority::High);
    }

    #[test]
    fn test_parse_names_the_unsupported_value() {
        // Act
        let result = TestSpecification::parse(&["functional", "chaos"][..], "unit", "gherkin", "low");

        // Assert
        match result {
            Err(GenError::InvalidSpecification { message }) => {
                assert!(message.contains("'chaos'"), "Message should name the value: {message}");
            }
            other => panic!("Expected InvalidSpecification, got {other:?}"),
        }
    }

    #[test]
    fn test_priority_raise_saturates() {
        assert_eq!(Priority::Low.raised(), Priority::Medium);
        assert_eq!(Priority::Medium.raised(), Priority::High);
        assert_eq!(Priority::High.raised(), Priority::High);
    }
}

#[cfg(test)]
mod repair_tests {
    use super::*;

    #[test]
    fn test_missing_expected_results_are_padded() {
        // Arrange
        let mut case = bare_case("FUNC-1");
        case.steps.push(TestStep::new("Add an item to the cart", "The cart shows 1 item"));
        case.steps.push(TestStep::new("Open the cart", ""));

        // Act
        let repairs = case.repair();

        // Assert
        assert_eq!(
            case.expected_results,
            vec!["The cart shows 1 item".to_string(), NOT_SPECIFIED.to_string()]
        );
        assert_eq!(repairs, vec!["FUNC-1: padded 2 missing expected result(s)".to_string()]);
        assert!(case.validate().is_ok(), "Repaired case satisfies the invariants");
    }

    #[test]
    fn test_extra_expected_results_are_truncated() {
        // Arrange
        let mut case = bare_case("FUNC-2");
        case.push_step(TestStep::new("Pay with a saved card", "The order is confirmed"));
        case.expected_results.push("An email is sent".to_string());

        // Act
        let repairs = case.repair();

        // Assert
        assert_eq!(case.expected_results.len(), 1);
        assert!(repairs[0].contains("dropped 1 expected result(s)"));
    }

    #[test]
    fn test_case_without_steps_gets_one() {
        // Arrange
        let mut case = bare_case("FUNC-3");

        // Act
        let repairs = case.repair();

        // Assert
        assert_eq!(case.steps.len(), 1, "Cases are repaired, never left empty");
        assert!(case.steps[0].action.contains("'Checkout'"));
        assert_eq!(case.steps[0].expected_result, NOT_SPECIFIED);
        assert!(!case.steps[0].has_expected_result());
        assert!(!repairs.is_empty());
    }

    #[test]
    fn test_validate_does_not_repair() {
        // Arrange
        let case = bare_case("FUNC-4");

        // Act
        let result = case.validate();

        // Assert
        match result {
            Err(GenError::MalformedResult { test_case_id, .. }) => assert_eq!(test_case_id, "FUNC-4"),
            other => panic!("Expected MalformedResult, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod result_tests {
    use super::*;

    #[test]
    fn test_id_sequence_layout() {
        // Arrange
        let mut ids = IdSequence::with_stamp("SEC", "20240101120000000");

        // Act
        let first = ids.next_id();
        let second = ids.next_id();

        // Assert
        assert_eq!(first, "SEC-20240101120000000-001");
        assert_eq!(second, "SEC-20240101120000000-002");
    }

    #[test]
    fn test_extend_keeps_order_of_cases_and_warnings() {
        // Arrange
        let mut merged = GenerationResult::new("test-case-generator");
        let mut security = GenerationResult::new("security-generator");
        let mut case = bare_case("SEC-1");
        case.push_step(TestStep::new("Replay a used token", "The request is rejected"));
        security.test_cases.push(case);
        security.warnings.push("SEC-1: padded 1 missing expected result(s)".to_string());

        // Act
        merged.extend(security);

        // Assert
        assert_eq!(merged.test_cases[0].id, "SEC-1");
        assert_eq!(merged.generator_name, "test-case-generator");
        assert_eq!(merged.warnings.len(), 1);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_skipped_variant_message() {
        // Arrange
        let skipped = SkippedVariant {
            test_type: TestType::Performance,
            reason: "Timed out after 100ms".to_string(),
        };

        // Act & Assert
        assert_eq!(
            skipped.to_string(),
            "performance test generation skipped: Timed out after 100ms"
        );
    }
}
