// Unit Tests for Model Output Extraction
//
// UNIT UNDER TEST: extract_test_cases
//
// BUSINESS RESPONSIBILITY:
//   - Recovers draft test cases from whatever layout the model answered in
//   - Never fails: unrecognized output is kept whole in one degraded case
//   - Leaves expected-result alignment to the generator, with the raw lists intact
//
// TEST COVERAGE:
//   - JSON arrays, wrapped objects and fenced JSON in mixed content
//   - TEST CASE headers with labelled sections and arrow steps
//   - Step segments for test data and notes
//   - Given/When/Then lines inside a case
//   - Gherkin Feature and Background blocks
//   - Separate expected-results blocks
//   - Degraded tier and empty responses

use crate::core_types::StepRole;
use crate::response_parser::{extract_test_cases, UNSTRUCTURED_CASE};

#[cfg(test)]
mod json_tier_tests {
    use super::*;

    #[test]
    fn test_wrapped_json_cases_are_extracted() {
        // Arrange
        let raw = r#"{"test_cases": [{
            "title": "Valid login",
            "description": "Happy path",
            "preconditions": "User exists",
            "steps": [
                {"action": "Enter valid credentials", "expected_result": "Dashboard is shown"},
                "Verify the welcome banner => Banner shows the user name"
            ]
        }]}"#;

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert!(!extraction.degraded);
        assert_eq!(extraction.cases.len(), 1);
        let case = &extraction.cases[0];
        assert_eq!(case.title, "Valid login");
        assert_eq!(case.preconditions, vec!["User exists".to_string()]);
        assert_eq!(case.steps.len(), 2);
        assert_eq!(case.steps[0].expected_result, "Dashboard is shown");
        assert_eq!(case.steps[1].action, "Verify the welcome banner");
        assert_eq!(case.steps[1].role, Some(StepRole::Verification));
    }

    #[test]
    fn test_fenced_json_inside_prose_is_found() {
        // Arrange
        let raw = "Here are your tests:\n```json\n[{\"name\": \"Logout\", \"steps\": [\"Click logout -> Login page is shown\"]}]\n```\nLet me know if you need more.";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert_eq!(extraction.cases.len(), 1);
        assert_eq!(extraction.cases[0].title, "Logout");
        assert_eq!(extraction.cases[0].steps[0].action, "Click logout");
        assert_eq!(extraction.cases[0].steps[0].expected_result, "Login page is shown");
    }
}

#[cfg(test)]
mod text_tier_tests {
    use super::*;

    #[test]
    fn test_layout_with_headers_sections_and_arrows() {
        // Arrange
        let raw = "TEST CASE 1: Successful login
Description: A registered user signs in
Preconditions:
- The user has an account
Steps:
1. Open the login page => The form is shown
2. Submit valid credentials => The dashboard is shown | Data: user@example.com | Notes: use staging

TEST CASE 2: Wrong password
Steps:
1. Submit a wrong password => An error is shown";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert!(!extraction.degraded);
        assert_eq!(extraction.cases.len(), 2, "Two headers, two cases");
        let first = &extraction.cases[0];
        assert_eq!(first.title, "Successful login");
        assert_eq!(first.description, "A registered user signs in");
        assert_eq!(first.preconditions, vec!["The user has an account".to_string()]);
        assert_eq!(first.steps.len(), 2);
        assert_eq!(first.steps[1].expected_result, "The dashboard is shown");
        assert_eq!(first.steps[1].test_data.as_deref(), Some("user@example.com"));
        assert_eq!(first.steps[1].notes.as_deref(), Some("use staging"));
        assert_eq!(extraction.cases[1].steps[0].action, "Submit a wrong password");
    }

    #[test]
    fn test_bold_markdown_headers_and_clause_lines() {
        // Arrange
        let raw = "**Test Case 1:** Checkout
Given a cart with one item
When the user pays
Then the order is confirmed
And a receipt is emailed";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert_eq!(extraction.cases.len(), 1);
        let case = &extraction.cases[0];
        assert_eq!(case.title, "Checkout");
        assert_eq!(case.preconditions, vec!["a cart with one item".to_string()]);
        assert_eq!(case.steps.len(), 2, "When/Then pair plus the trailing And Then");
        assert_eq!(case.steps[0].action, "the user pays");
        assert_eq!(case.steps[0].expected_result, "the order is confirmed");
        assert_eq!(case.steps[1].role, Some(StepRole::Verification));
        assert_eq!(case.steps[1].expected_result, "a receipt is emailed");
    }

    #[test]
    fn test_separate_expected_results_block_is_kept_as_listed() {
        // Test verifies mismatched expected results reach the generator untouched

        // Arrange
        let raw = "TEST CASE 1: Profile update
Steps:
1. Open the profile page
2. Change the display name
3. Save
Expected Results:
1. The profile page opens
2. The new name is saved";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        let case = &extraction.cases[0];
        assert_eq!(case.steps.len(), 3);
        assert_eq!(case.expected_results.len(), 2, "Expected list kept as listed");
        assert!(case.steps.iter().all(|step| step.expected_result.is_empty()));
    }

    #[test]
    fn test_gherkin_background_feeds_every_scenario() {
        // Test verifies Feature and Background headers open no case of their own

        // Arrange
        let raw = "Feature: Login

  Background:
    Given the app is running
    And the user is signed out

  Scenario: Valid login
    When they sign in
    Then the dashboard is shown

  Scenario: Wrong password
    When they sign in with a wrong password
    Then an error is shown";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert!(!extraction.degraded);
        let titles: Vec<_> = extraction.cases.iter().map(|case| case.title.as_str()).collect();
        assert_eq!(titles, vec!["Valid login", "Wrong password"]);
        for case in &extraction.cases {
            assert_eq!(
                case.preconditions,
                vec!["the app is running".to_string(), "the user is signed out".to_string()],
                "Background applies to '{}'",
                case.title
            );
            assert_eq!(case.steps.len(), 1);
        }
    }
}

#[cfg(test)]
mod degraded_tier_tests {
    use super::*;

    #[test]
    fn test_unrecognized_prose_becomes_one_case_with_warning() {
        // Arrange
        let raw = "I think you should test the login flow thoroughly, especially errors.";

        // Act
        let extraction = extract_test_cases(raw);

        // Assert
        assert!(extraction.degraded);
        assert_eq!(extraction.cases.len(), 1);
        assert_eq!(extraction.cases[0].title, UNSTRUCTURED_CASE);
        assert_eq!(extraction.cases[0].description, raw);
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_empty_response_yields_no_cases_and_a_warning() {
        // Arrange & Act
        let extraction = extract_test_cases("  \n ");

        // Assert
        assert!(extraction.cases.is_empty());
        assert!(extraction.degraded);
        assert_eq!(extraction.warnings, vec!["model returned an empty response".to_string()]);
    }
}
