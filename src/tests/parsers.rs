// Unit Tests for Requirement Parsers
//
// UNIT UNDER TEST: parse_acceptance_criteria, parse_user_story,
//                  parse_system_context, group_scenarios, RequirementParser
//
// BUSINESS RESPONSIBILITY:
//   - Turns freeform ticket text into the canonical requirement model
//   - Never fails: unmatched input degrades to weaker interpretations
//   - Reports every degradation so it can surface as a warning
//
// TEST COVERAGE:
//   - Given/When/Then clause splitting, ordering and counts
//   - Plain lines with bullet and numbering markers
//   - Auto format detection and inline clause keywords
//   - Scenario grouping across And continuations and repeated Givens
//   - User story phrasings, including the all-empty result
//   - Tech stack, constraints, roles and data types, ordered and de-duplicated
//   - Whole-ticket parsing with degradation reporting

use crate::core_types::{Clause, CriterionKind, FormatHint, ParseSource, TicketContent};
use crate::parsers::{
    group_scenarios, parse_acceptance_criteria, parse_acceptance_criteria_reporting,
    parse_system_context, parse_user_story, CriterionGroup, RequirementParser,
};

#[cfg(test)]
mod acceptance_criteria_tests {
    use super::*;

    #[test]
    fn test_given_when_then_yields_one_criterion_per_clause() {
        // Test verifies a k-clause block produces k ordered criteria

        // Arrange
        let text = "Given a registered user\nWhen they submit valid credentials\nThen the dashboard is shown\nAnd a session cookie is set";

        // Act
        let criteria = parse_acceptance_criteria(text, FormatHint::GivenWhenThen);

        // Assert
        assert_eq!(criteria.len(), 4, "One criterion per clause");
        let clauses: Vec<_> = criteria.iter().map(|c| c.clause).collect();
        assert_eq!(
            clauses,
            vec![
                Some(Clause::Given),
                Some(Clause::When),
                Some(Clause::Then),
                Some(Clause::And)
            ],
            "Clause order should be preserved"
        );
        assert!(criteria
            .iter()
            .all(|c| c.kind == CriterionKind::GivenWhenThen));
        assert_eq!(criteria[0].text, "a registered user");
        assert_eq!(criteria[3].display_text(), "And a session cookie is set");
    }

    #[test]
    fn test_inline_clauses_on_one_line_are_split() {
        // Arrange
        let text = "Given a cart with two items When the user checks out Then an order is created";

        // Act
        let criteria = parse_acceptance_criteria(text, FormatHint::Auto);

        // Assert
        assert_eq!(criteria.len(), 3, "Three capitalized clause keywords");
        assert_eq!(criteria[1].text, "the user checks out");
    }

    #[test]
    fn test_lowercase_and_inside_a_clause_is_not_a_keyword() {
        // Arrange
        let text = "Given a cart and a coupon\nThen the discount applies";

        // Act
        let criteria = parse_acceptance_criteria(text, FormatHint::Auto);

        // Assert
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].text, "a cart and a coupon");
    }

    #[test]
    fn test_plain_lines_strip_list_markers() {
        // Arrange
        let text = "- Users can reset their password\n* Reset links expire after 24 hours\n3. Old passwords cannot be reused\n\n";

        // Act
        let criteria = parse_acceptance_criteria(text, FormatHint::Plain);

        // Assert
        let texts: Vec<_> = criteria.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Users can reset their password",
                "Reset links expire after 24 hours",
                "Old passwords cannot be reused"
            ]
        );
        assert!(criteria.iter().all(|c| c.kind == CriterionKind::Plain));
    }

    #[test]
    fn test_unmatched_line_in_clause_mode_degrades_to_plain() {
        // Test verifies malformed input never fails, it degrades and is reported

        // Arrange
        let text = "Given an admin\nthe report is exported nightly\nThen a file is stored";
        let mut degraded = Vec::new();

        // Act
        let criteria =
            parse_acceptance_criteria_reporting(text, FormatHint::GivenWhenThen, &mut degraded);

        // Assert
        assert_eq!(criteria.len(), 3);
        assert_eq!(criteria[1].kind, CriterionKind::Plain);
        assert_eq!(degraded.len(), 1, "The plain line should be reported");
        assert_eq!(degraded[0].source, ParseSource::AcceptanceCriteria);
    }

    #[test]
    fn test_scenario_headings_are_not_criteria() {
        // Arrange
        let text = "Scenario: Successful login\nGiven a user\nWhen they log in\nThen they see the dashboard";

        // Act
        let criteria = parse_acceptance_criteria(text, FormatHint::Auto);

        // Assert
        assert_eq!(criteria.len(), 3, "Heading line should be skipped");
        assert_eq!(criteria[0].clause, Some(Clause::Given));
    }

    #[test]
    fn test_empty_text_yields_no_criteria() {
        // Arrange & Act
        let criteria = parse_acceptance_criteria("   \n\n", FormatHint::Auto);

        // Assert
        assert!(criteria.is_empty());
    }
}

#[cfg(test)]
mod scenario_grouping_tests {
    use super::*;

    #[test]
    fn test_and_continues_previous_clause_and_given_opens_new_scenario() {
        // Arrange
        let text = "Given a user\nAnd a saved card\nWhen they pay\nThen a receipt is sent\nAnd the order is confirmed\nGiven an expired card\nWhen they pay\nThen payment is declined";
        let criteria = parse_acceptance_criteria(text, FormatHint::GivenWhenThen);

        // Act
        let groups = group_scenarios(&criteria);

        // Assert
        assert_eq!(groups.len(), 2, "Second Given opens a new scenario");
        assert_eq!(
            groups[0],
            CriterionGroup::Scenario {
                given: vec!["a user".to_string(), "a saved card".to_string()],
                when: vec!["they pay".to_string()],
                then: vec![
                    "a receipt is sent".to_string(),
                    "the order is confirmed".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_plain_criteria_stand_alone() {
        // Arrange
        let criteria = parse_acceptance_criteria("Orders are listed newest first", FormatHint::Plain);

        // Act
        let groups = group_scenarios(&criteria);

        // Assert
        assert_eq!(
            groups,
            vec![CriterionGroup::Plain(
                "Orders are listed newest first".to_string()
            )]
        );
    }
}

#[cfg(test)]
mod user_story_tests {
    use super::*;

    #[test]
    fn test_classic_story_fields() {
        // Arrange
        let text = "As a store manager, I want to export weekly sales so that I can plan stock.";

        // Act
        let story = parse_user_story(text);

        // Assert
        assert_eq!(story.persona, "store manager");
        assert_eq!(story.action, "export weekly sales");
        assert_eq!(story.value, "I can plan stock");
    }

    #[test]
    fn test_alternative_phrasing() {
        // Arrange
        let text = "The billing service needs to retry failed charges because card networks are flaky";

        // Act
        let story = parse_user_story(text);

        // Assert
        assert_eq!(story.action, "retry failed charges");
        assert_eq!(story.value, "card networks are flaky");
        assert!(story.persona.is_empty(), "No persona phrase present");
    }

    #[test]
    fn test_text_without_markers_gives_all_empty_story() {
        // Test verifies a story parse never fails; it returns empty fields

        // Arrange
        let text = "Fix the broken footer link on the pricing page";

        // Act
        let story = parse_user_story(text);

        // Assert
        assert!(story.is_empty(), "All fields should be empty: {story:?}");
    }

    #[test]
    fn test_prose_with_story_words_gives_empty_story() {
        // Test verifies "as the", a bare "requires" and a lone "because" are not story phrases

        let prose = [
            "formats such as the CSV layout.",
            "The login form requires a valid password.",
            "Sorting is stable because the index is ordered.",
            "Exports are zipped so that downloads stay small.",
        ];

        for text in prose {
            // Act
            let story = parse_user_story(text);

            // Assert
            assert!(story.is_empty(), "'{text}' is not a user story: {story:?}");
        }
    }

    #[test]
    fn test_complete_alternative_forms_are_accepted() {
        // Arrange
        let requires = "The importer requires a header row to map the columns";
        let must = "Auditors must be able to export the log in order to file reports";

        // Act
        let requires_story = parse_user_story(requires);
        let must_story = parse_user_story(must);

        // Assert
        assert_eq!(requires_story.action, "a header row");
        assert_eq!(requires_story.value, "map the columns");
        assert_eq!(must_story.action, "export the log");
        assert_eq!(must_story.value, "file reports");
    }

    #[test]
    fn test_persona_after_a_sentence_or_label() {
        // Arrange
        let text = "Story: As an auditor, I want to filter the log by user";

        // Act
        let story = parse_user_story(text);

        // Assert
        assert_eq!(story.persona, "auditor");
        assert_eq!(story.action, "filter the log by user");
        assert!(story.value.is_empty());
    }
}

#[cfg(test)]
mod system_context_tests {
    use super::*;

    #[test]
    fn test_key_value_lines_and_known_technologies() {
        // Arrange
        let text = "Tech stack: React, Node.js and PostgreSQL\nConstraints: must respond within 2 seconds\nThe admin can export CSV files. Deployed with Docker.";

        // Act
        let context = parse_system_context(text);

        // Assert
        assert_eq!(
            &context.tech_stack[..3],
            &["React".to_string(), "Node.js".to_string(), "PostgreSQL".to_string()],
            "Listed technologies in order of mention"
        );
        assert!(context.tech_stack.contains(&"Docker".to_string()));
        assert_eq!(
            context
                .tech_stack
                .iter()
                .filter(|tech| tech.eq_ignore_ascii_case("react"))
                .count(),
            1,
            "Repeated mentions should be de-duplicated"
        );
        assert!(context
            .constraints
            .contains("must respond within 2 seconds"));
        assert!(context.user_roles.contains(&"admin".to_string()));
        assert!(context.data_types.contains(&"file".to_string()));
    }

    #[test]
    fn test_unknown_text_yields_empty_context() {
        // Arrange & Act
        let context = parse_system_context("Make the button blue");

        // Assert
        assert!(context.is_empty(), "Nothing recognizable: {context:?}");
    }
}

#[cfg(test)]
mod ticket_tests {
    use super::*;

    #[test]
    fn test_ticket_parses_into_full_model() {
        // Arrange
        let ticket = TicketContent {
            raw_description: "As a customer, I want to reset my password so that I can regain access. Built with Django.".to_string(),
            acceptance_criteria_text: "Given a registered email\nWhen a reset is requested\nThen a link is emailed".to_string(),
            format_hint: FormatHint::Auto,
        };

        // Act
        let (model, degraded) = RequirementParser::parse_ticket(&ticket);

        // Assert
        assert_eq!(model.criteria.len(), 3);
        assert_eq!(model.story.persona, "customer");
        assert!(model.context.tech_stack.contains(&"Django".to_string()));
        assert!(model.source_text.contains("reset my password"));
        assert!(degraded.is_empty(), "Nothing should degrade: {degraded:?}");
    }

    #[test]
    fn test_ticket_without_story_reports_degradation() {
        // Arrange
        let ticket = TicketContent {
            raw_description: "Fix pagination on the orders list".to_string(),
            acceptance_criteria_text: "- Page size is 20\n- Last page shows the remainder"
                .to_string(),
            format_hint: FormatHint::Auto,
        };

        // Act
        let (model, degraded) = RequirementParser::parse_ticket(&ticket);

        // Assert
        assert_eq!(model.criteria.len(), 2, "Plain bullets become criteria");
        assert!(model.story.is_empty());
        assert!(
            degraded.iter().any(|d| d.source == ParseSource::UserStory),
            "Missing story should be reported: {degraded:?}"
        );
    }

    #[test]
    fn test_empty_ticket_is_an_empty_model() {
        // Arrange & Act
        let (model, _) = RequirementParser::parse_ticket(&TicketContent::default());

        // Assert
        assert!(model.is_empty());
    }
}
