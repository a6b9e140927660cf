//! Requirement parsers.
//!
//! All parsers are pure and total: malformed text degrades to a weaker
//! interpretation and is reported as [`ParseDegraded`], never as an error.

pub mod acceptance_criteria;
pub mod system_context;
pub mod user_story;

pub use acceptance_criteria::{
    group_scenarios, parse_acceptance_criteria, parse_acceptance_criteria_reporting,
    CriterionGroup,
};
pub use system_context::{parse_system_context, parse_system_context_reporting};
pub use user_story::{parse_user_story, parse_user_story_reporting};

use crate::core_types::{FormatHint, ParseDegraded, RequirementModel, TicketContent};
use crate::logging::log_info;

/// Parses a whole ticket into the canonical requirement model.
pub struct RequirementParser;

impl RequirementParser {
    /// Parse criteria, story and context out of a ticket.
    ///
    /// The story is looked for in the description first, then in the
    /// criteria text. When the ticket has no separate criteria text, clause
    /// lines in the description are used.
    pub fn parse_ticket(ticket: &TicketContent) -> (RequirementModel, Vec<ParseDegraded>) {
        let mut degraded = Vec::new();

        let criteria = if ticket.acceptance_criteria_text.trim().is_empty() {
            let mut ignored = Vec::new();
            let from_description = parse_acceptance_criteria_reporting(
                &ticket.raw_description,
                FormatHint::Auto,
                &mut ignored,
            );
            from_description
                .into_iter()
                .filter(|criterion| criterion.clause.is_some())
                .collect()
        } else {
            parse_acceptance_criteria_reporting(
                &ticket.acceptance_criteria_text,
                ticket.format_hint,
                &mut degraded,
            )
        };

        let mut story_degraded = Vec::new();
        let mut story = parse_user_story_reporting(&ticket.raw_description, &mut story_degraded);
        if story.is_empty() {
            let from_criteria = parse_user_story(&ticket.acceptance_criteria_text);
            if from_criteria.is_empty() {
                degraded.extend(story_degraded);
            } else {
                story = from_criteria;
            }
        }

        let source_text = [
            ticket.raw_description.trim(),
            ticket.acceptance_criteria_text.trim(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
        let context = parse_system_context_reporting(&source_text, &mut degraded);

        log_info!(
            criteria = criteria.len(),
            has_story = !story.is_empty(),
            tech_stack = context.tech_stack.len(),
            degraded = degraded.len(),
            "Parsed ticket into requirement model"
        );

        (
            RequirementModel {
                criteria,
                story,
                context,
                source_text,
            },
            degraded,
        )
    }
}
