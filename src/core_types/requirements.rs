//! Canonical requirement model produced by the parsers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Shape of an acceptance criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionKind {
    GivenWhenThen,
    Plain,
}

/// Keyword that opened a given-when-then clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clause {
    Given,
    When,
    Then,
    And,
}

impl Clause {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
        }
    }

    /// Case-insensitive keyword lookup. `But` is folded into `And`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "given" => Some(Self::Given),
            "when" => Some(Self::When),
            "then" => Some(Self::Then),
            "and" | "but" => Some(Self::And),
            _ => None,
        }
    }
}

/// One acceptance criterion. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub kind: CriterionKind,
    pub text: String,
    /// Opening keyword, present only for given-when-then criteria.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<Clause>,
}

impl AcceptanceCriterion {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: CriterionKind::Plain,
            text: text.into(),
            clause: None,
        }
    }

    pub fn clause(clause: Clause, text: impl Into<String>) -> Self {
        Self {
            kind: CriterionKind::GivenWhenThen,
            text: text.into(),
            clause: Some(clause),
        }
    }

    /// Text as it would appear in a feature file, keyword included.
    pub fn display_text(&self) -> String {
        match self.clause {
            Some(clause) => format!("{} {}", clause.keyword(), self.text),
            None => self.text.clone(),
        }
    }
}

/// How acceptance criteria text is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatHint {
    GivenWhenThen,
    Plain,
    /// Try clause keywords first, fall back to one criterion per line.
    #[default]
    Auto,
}

/// `As a {persona}, I want {action}, so that {value}`.
///
/// Fields are empty strings when the text had no matching phrase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStory {
    pub persona: String,
    pub action: String,
    pub value: String,
}

impl UserStory {
    pub fn is_empty(&self) -> bool {
        self.persona.is_empty() && self.action.is_empty() && self.value.is_empty()
    }
}

/// Technology and constraint context extracted from a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemContext {
    /// In order of first mention, without duplicates.
    pub tech_stack: Vec<String>,
    pub constraints: BTreeSet<String>,
    pub user_roles: Vec<String>,
    pub data_types: Vec<String>,
}

impl SystemContext {
    pub fn is_empty(&self) -> bool {
        self.tech_stack.is_empty()
            && self.constraints.is_empty()
            && self.user_roles.is_empty()
            && self.data_types.is_empty()
    }
}

/// Ticket text handed over by the ticket-tracker collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketContent {
    pub raw_description: String,
    pub acceptance_criteria_text: String,
    #[serde(default)]
    pub format_hint: FormatHint,
}

/// The parsed `{criteria, story, context}` triple consumed by generators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementModel {
    pub criteria: Vec<AcceptanceCriterion>,
    pub story: UserStory,
    pub context: SystemContext,
    /// Free text the model was parsed from, kept for threshold and keyword scans.
    #[serde(default)]
    pub source_text: String,
}

impl RequirementModel {
    /// True when there is nothing to generate tests from.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.story.is_empty() && self.source_text.trim().is_empty()
    }
}

/// Which parser degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    AcceptanceCriteria,
    UserStory,
    SystemContext,
}

impl fmt::Display for ParseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AcceptanceCriteria => "acceptance criteria",
            Self::UserStory => "user story",
            Self::SystemContext => "system context",
        };
        f.write_str(name)
    }
}

/// Input did not match an expected pattern; parsing carried on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDegraded {
    pub source: ParseSource,
    pub detail: String,
}

impl ParseDegraded {
    pub fn new(source: ParseSource, detail: impl Into<String>) -> Self {
        Self {
            source,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ParseDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse degraded ({}): {}", self.source, self.detail)
    }
}
