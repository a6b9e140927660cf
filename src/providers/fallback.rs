//! Deterministic, network-free response synthesis
//!
//! Reads the test type, user story and acceptance criteria back out of a
//! prompt built by [`PromptBuilder`](crate::generators::PromptBuilder) and
//! answers in the same `TEST CASE n:` layout a live model is asked for. The
//! output depends on nothing but the prompt text, so identical prompts give
//! byte-identical responses.

use crate::core_types::{FormatHint, TestType};
use crate::formatters::push_line;
use crate::generators::prompt::{
    CRITERIA_HEADER, REQUIREMENT_HEADER, STORY_HEADER, TEST_TYPE_LABEL,
};
use crate::logging::log_debug;
use crate::parsers::{group_scenarios, parse_acceptance_criteria, parse_user_story, CriterionGroup};

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+").expect("valid numbering regex"));

static MODAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(should|must|shall|will|can)\s+(.+)$").expect("valid modal regex")
});

const MAX_TITLE_WORDS: usize = 10;

/// A template case added when the requirement mentions one of `triggers`.
struct FallbackRule {
    triggers: &'static [&'static str],
    test_types: &'static [TestType],
    title: &'static str,
    description: &'static str,
    steps: &'static [(&'static str, &'static str)],
}

const RULES: &[FallbackRule] = &[
    FallbackRule {
        triggers: &["login", "log in", "sign in", "password", "passwords", "credential", "credentials"],
        test_types: &[TestType::Functional],
        title: "Login with invalid credentials",
        description: "A wrong password is refused without revealing which field was wrong.",
        steps: &[(
            "Enter a valid username with a wrong password and submit",
            "An invalid credentials message is shown and the user stays signed out",
        )],
    },
    FallbackRule {
        triggers: &["login", "log in", "sign in", "password", "passwords", "credential", "credentials"],
        test_types: &[TestType::Security],
        title: "Brute force protection",
        description: "Repeated failed logins lock or throttle the account.",
        steps: &[
            (
                "Submit five consecutive logins with a wrong password",
                "The account is locked or throttled and a generic error is shown",
            ),
            (
                "Submit the correct password while the account is locked",
                "Login is still refused until the lockout expires",
            ),
        ],
    },
    FallbackRule {
        triggers: &["login", "log in", "sign in", "password", "passwords", "credential", "credentials"],
        test_types: &[TestType::Security],
        title: "SQL injection in login fields",
        description: "Injection payloads in credentials are handled as plain text.",
        steps: &[(
            "Enter ' OR '1'='1 as the username and submit",
            "Login is refused and no database error is exposed",
        )],
    },
    FallbackRule {
        triggers: &["login", "log in", "sign in", "password", "passwords", "credential", "credentials"],
        test_types: &[TestType::Edge],
        title: "Empty credentials",
        description: "Submitting the login form without input is rejected.",
        steps: &[(
            "Submit the login form with both fields empty",
            "Validation messages are shown for both fields",
        )],
    },
    FallbackRule {
        triggers: &["upload", "uploads", "file", "files", "attachment", "attachments"],
        test_types: &[TestType::Functional],
        title: "Upload a supported file",
        description: "A small file of a supported type is accepted.",
        steps: &[(
            "Upload a small file of a supported type",
            "The file is stored and listed with its name and size",
        )],
    },
    FallbackRule {
        triggers: &["upload", "uploads", "file", "files", "attachment", "attachments"],
        test_types: &[TestType::Security],
        title: "Malicious file upload",
        description: "Uploaded content is checked, not just the file extension.",
        steps: &[(
            "Upload an executable renamed with an allowed extension",
            "The upload is rejected based on its content",
        )],
    },
    FallbackRule {
        triggers: &["upload", "uploads", "file", "files", "attachment", "attachments"],
        test_types: &[TestType::Edge],
        title: "Oversized file upload",
        description: "A file just over the size limit is refused cleanly.",
        steps: &[(
            "Upload a file just above the size limit",
            "The upload is rejected with a size limit message",
        )],
    },
    FallbackRule {
        triggers: &["api", "apis", "endpoint", "endpoints", "request", "requests"],
        test_types: &[TestType::Api],
        title: "Missing authentication token",
        description: "Unauthenticated calls are refused.",
        steps: &[(
            "Call the endpoint without an Authorization header",
            "The API responds 401 with an error body",
        )],
    },
    FallbackRule {
        triggers: &["api", "apis", "endpoint", "endpoints", "request", "requests"],
        test_types: &[TestType::Api],
        title: "Malformed request body",
        description: "Invalid payloads are rejected with a useful error.",
        steps: &[(
            "Send a request body that is not valid JSON",
            "The API responds 400 and names the problem",
        )],
    },
    FallbackRule {
        triggers: &["api", "apis", "endpoint", "endpoints", "request", "requests"],
        test_types: &[TestType::Security],
        title: "Access to another user's resource",
        description: "A valid token does not grant access to other users' data.",
        steps: &[(
            "Call the endpoint with a token belonging to another user",
            "The API responds 403 and returns no data",
        )],
    },
    FallbackRule {
        triggers: &["api", "apis", "endpoint", "endpoints", "request", "requests"],
        test_types: &[TestType::Performance],
        title: "Endpoint latency under load",
        description: "Latency stays within limits under concurrent calls.",
        steps: &[(
            "Send 100 concurrent requests to the endpoint",
            "95th percentile response time stays within the agreed limit",
        )],
    },
    FallbackRule {
        triggers: &["search", "input", "inputs", "form", "forms", "field", "fields"],
        test_types: &[TestType::Security],
        title: "Script injection in input",
        description: "User input is escaped wherever it is displayed.",
        steps: &[(
            "Enter a script-tag payload into the field and submit",
            "The value is escaped when displayed and no script runs",
        )],
    },
    FallbackRule {
        triggers: &["search", "input", "inputs", "form", "forms", "field", "fields"],
        test_types: &[TestType::Edge],
        title: "Special characters in input",
        description: "Unicode, emoji and quotes are handled consistently.",
        steps: &[(
            "Enter unicode, emoji and quote characters into the field",
            "The input is accepted or rejected consistently without errors",
        )],
    },
    FallbackRule {
        triggers: &["search", "input", "inputs", "form", "forms", "field", "fields"],
        test_types: &[TestType::Ui],
        title: "Form validation feedback",
        description: "Invalid values produce visible inline feedback.",
        steps: &[(
            "Submit the form with an invalid value",
            "An inline error message appears next to the field",
        )],
    },
    FallbackRule {
        triggers: &["search", "input", "inputs", "form", "forms", "field", "fields"],
        test_types: &[TestType::Accessibility],
        title: "Form field labels",
        description: "Every field is usable with a screen reader.",
        steps: &[(
            "Navigate the form with a screen reader",
            "Every field announces its label and any validation error",
        )],
    },
    FallbackRule {
        triggers: &["payment", "payments", "checkout", "card", "cards", "order"],
        test_types: &[TestType::Functional],
        title: "Declined payment",
        description: "A declined card does not place the order.",
        steps: &[(
            "Pay with a card that the processor declines",
            "The order is not placed and a decline message is shown",
        )],
    },
    FallbackRule {
        triggers: &["payment", "payments", "checkout", "card", "cards", "order"],
        test_types: &[TestType::Security],
        title: "Card data exposure",
        description: "Full card numbers never leave the payment processor.",
        steps: &[(
            "Complete a payment and inspect responses and logs",
            "Only the last four digits of the card number ever appear",
        )],
    },
    FallbackRule {
        triggers: &["payment", "payments", "checkout", "card", "cards", "order"],
        test_types: &[TestType::Edge],
        title: "Zero amount checkout",
        description: "A checkout totalling zero is handled explicitly.",
        steps: &[(
            "Attempt a checkout with a total of 0",
            "The checkout is rejected or completed without a charge",
        )],
    },
];

/// Extra step appended to every scenario case for a test type.
fn type_step(test_type: TestType) -> Option<(&'static str, &'static str)> {
    match test_type {
        TestType::Functional => None,
        TestType::Security => Some((
            "Repeat the action without a valid session",
            "Access is denied and no data is exposed",
        )),
        TestType::Edge => Some((
            "Repeat the action with empty and malformed input",
            "The input is rejected with a clear validation message",
        )),
        TestType::Api => Some((
            "Repeat the request with a required field missing",
            "The API responds with a 4xx status and an error body",
        )),
        TestType::Ui => Some((
            "Repeat the flow at mobile and desktop widths",
            "Layout and feedback messages stay visible and aligned",
        )),
        TestType::Performance => Some((
            "Repeat the action under expected peak load",
            "Response time stays within the agreed threshold",
        )),
        TestType::Accessibility => Some((
            "Complete the flow using only the keyboard",
            "Every control is reachable and announced by a screen reader",
        )),
    }
}

fn title_prefix(test_type: TestType) -> &'static str {
    match test_type {
        TestType::Functional => "Verify ",
        TestType::Security => "Security: ",
        TestType::Edge => "Edge: ",
        TestType::Api => "API: ",
        TestType::Ui => "UI: ",
        TestType::Performance => "Performance: ",
        TestType::Accessibility => "Accessibility: ",
    }
}

/// The parts of a prompt the synthesizer reads.
struct PromptView {
    test_type: TestType,
    story_text: String,
    criteria_text: String,
    requirement_text: String,
}

impl PromptView {
    fn read(prompt: &str) -> Self {
        let test_type = prompt
            .lines()
            .find_map(|line| line.trim().strip_prefix(TEST_TYPE_LABEL))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(TestType::Functional);

        let criteria_text = section(prompt, CRITERIA_HEADER)
            .iter()
            .map(|line| NUMBERING.replace(line, "").into_owned())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            test_type,
            story_text: section(prompt, STORY_HEADER).join("\n"),
            criteria_text,
            requirement_text: section(prompt, REQUIREMENT_HEADER).join(" "),
        }
    }

    /// Lower-cased words of the requirement, space separated and padded.
    fn subject(&self) -> String {
        let text = format!(
            "{} {} {}",
            self.story_text, self.criteria_text, self.requirement_text
        )
        .to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        format!(" {} ", words.join(" "))
    }
}

/// Lines following `header` up to the next blank line.
fn section<'a>(prompt: &'a str, header: &str) -> Vec<&'a str> {
    prompt
        .lines()
        .skip_while(|line| line.trim() != header)
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect()
}

struct Draft {
    title: String,
    description: String,
    preconditions: Vec<String>,
    steps: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Answer `prompt` without a model.
    pub fn synthesize(&self, prompt: &str) -> String {
        let view = PromptView::read(prompt);
        let mut drafts = criterion_drafts(&view);

        if drafts.is_empty() {
            drafts.push(generic_draft(&view));
        }

        let subject = view.subject();
        for rule in RULES {
            if rule.test_types.contains(&view.test_type)
                && rule.triggers.iter().any(|trigger| mentions(&subject, trigger))
            {
                drafts.push(Draft {
                    title: rule.title.to_string(),
                    description: rule.description.to_string(),
                    preconditions: Vec::new(),
                    steps: rule
                        .steps
                        .iter()
                        .map(|(action, expected)| (action.to_string(), expected.to_string()))
                        .collect(),
                });
            }
        }

        log_debug!(
            test_type = %view.test_type,
            cases = drafts.len(),
            "Synthesized offline response"
        );

        render(&drafts)
    }
}

/// Whole-word match; `subject` is space padded on both ends.
fn mentions(subject: &str, phrase: &str) -> bool {
    subject.contains(&format!(" {phrase} "))
}

fn criterion_drafts(view: &PromptView) -> Vec<Draft> {
    if view.criteria_text.trim().is_empty() {
        return Vec::new();
    }

    let criteria = parse_acceptance_criteria(&view.criteria_text, FormatHint::Auto);
    let extra_step = type_step(view.test_type);
    let prefix = title_prefix(view.test_type);

    group_scenarios(&criteria)
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let mut draft = match group {
                CriterionGroup::Scenario { given, when, then } => {
                    scenario_draft(prefix, index + 1, given, when, then)
                }
                CriterionGroup::Plain(text) => plain_draft(prefix, index + 1, &text),
            };
            if let Some((action, expected)) = extra_step {
                draft.steps.push((action.to_string(), expected.to_string()));
            }
            draft
        })
        .collect()
}

fn scenario_draft(
    prefix: &str,
    number: usize,
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
) -> Draft {
    let title = format!(
        "{prefix}{}",
        short_title(
            when.first()
                .or_else(|| then.first())
                .or_else(|| given.first())
                .map_or("the described behaviour", String::as_str)
        )
    );

    let mut summary = Vec::new();
    summary.extend(given.iter().map(|text| format!("Given {text}")));
    summary.extend(when.iter().map(|text| format!("When {text}")));
    summary.extend(then.iter().map(|text| format!("Then {text}")));

    let mut steps: Vec<(String, String)> = Vec::new();
    let mut outcomes = then.into_iter();
    for action in when {
        let expected = outcomes
            .next()
            .unwrap_or_else(|| "The system accepts the action".to_string());
        steps.push((capitalize(&action), capitalize(&expected)));
    }
    for outcome in outcomes {
        steps.push((format!("Verify that {outcome}"), capitalize(&outcome)));
    }
    if steps.is_empty() {
        for state in &given {
            steps.push((
                format!("Confirm that {state}"),
                "The system is in the described state".to_string(),
            ));
        }
    }

    Draft {
        title,
        description: format!(
            "Covers acceptance criterion {number}: {}",
            summary.join("; ")
        ),
        preconditions: given,
        steps,
    }
}

fn plain_draft(prefix: &str, number: usize, text: &str) -> Draft {
    let text = text.trim().trim_end_matches('.');
    let steps = match MODAL.captures(text) {
        Some(caps) => {
            let actor = caps.get(1).map_or("", |m| m.as_str());
            vec![(
                format!("Exercise the requirement for {}", lower_first(actor)),
                capitalize(text),
            )]
        }
        None => vec![(
            format!("Exercise the requirement: {text}"),
            "The requirement is satisfied".to_string(),
        )],
    };

    Draft {
        title: format!("{prefix}{}", short_title(text)),
        description: format!("Covers acceptance criterion {number}: {text}"),
        preconditions: Vec::new(),
        steps,
    }
}

fn generic_draft(view: &PromptView) -> Draft {
    let story = parse_user_story(&view.story_text);
    let prefix = title_prefix(view.test_type);

    if !story.action.is_empty() {
        let persona = if story.persona.is_empty() {
            "user"
        } else {
            story.persona.as_str()
        };
        let mut steps = vec![(
            format!("As the {persona}, {}", story.action),
            "The action completes successfully".to_string(),
        )];
        if !story.value.is_empty() {
            steps.push((
                "Check the outcome of the action".to_string(),
                capitalize(&story.value),
            ));
        }
        return Draft {
            title: format!("{prefix}{}", short_title(&story.action)),
            description: format!(
                "Covers the user story: as a {persona}, I want {}",
                story.action
            ),
            preconditions: vec![format!("A {persona} account is available")],
            steps,
        };
    }

    let requirement = view
        .requirement_text
        .split_terminator(['.', '\n'])
        .map(str::trim)
        .find(|sentence| !sentence.is_empty())
        .unwrap_or("the requirement");

    Draft {
        title: format!("{prefix}{}", short_title(requirement)),
        description: format!("Covers the requirement: {}", view.requirement_text.trim()),
        preconditions: Vec::new(),
        steps: vec![(
            format!("Exercise the requirement: {requirement}"),
            "The requirement is satisfied".to_string(),
        )],
    }
}

fn render(drafts: &[Draft]) -> String {
    let mut out = String::new();
    for (index, draft) in drafts.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        push_line(&mut out, format!("TEST CASE {}: {}", index + 1, draft.title));
        push_line(&mut out, format!("Description: {}", draft.description));
        if !draft.preconditions.is_empty() {
            push_line(&mut out, "Preconditions:");
            for precondition in &draft.preconditions {
                push_line(&mut out, format!("- {precondition}"));
            }
        }
        push_line(&mut out, "Steps:");
        for (number, (action, expected)) in draft.steps.iter().enumerate() {
            push_line(&mut out, format!("{}. {action} => {expected}", number + 1));
        }
    }
    out
}

fn short_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(MAX_TITLE_WORDS).collect();
    words.join(" ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
