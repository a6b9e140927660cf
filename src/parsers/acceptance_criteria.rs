//! Acceptance criteria parsing.
//!
//! Given/When/Then text is split into one criterion per clause. Lines
//! without a clause keyword degrade to plain criteria and are reported, never
//! rejected.

use crate::core_types::{
    AcceptanceCriterion, Clause, CriterionKind, FormatHint, ParseDegraded, ParseSource,
};
use crate::logging::log_debug;
use once_cell::sync::Lazy;
use regex::Regex;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[•\-\*+]|\d+[.)])\s+").expect("valid list marker regex"));

static LEADING_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(given|when|then|and|but)\b[:,]?\s*").expect("valid keyword regex")
});

// Mid-line clauses only count when capitalized, so "a cart and a coupon" stays one clause.
static INLINE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,;](Given|When|Then|And|But)\s").expect("valid keyword regex"));

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:scenario(?:\s+outline)?|feature|background|examples|acceptance\s+criteria|ac\s*\d*)\b[^:]*:\s*",
    )
    .expect("valid heading regex")
});

/// Parse acceptance criteria text. Never fails.
pub fn parse_acceptance_criteria(text: &str, format_hint: FormatHint) -> Vec<AcceptanceCriterion> {
    let mut degraded = Vec::new();
    parse_acceptance_criteria_reporting(text, format_hint, &mut degraded)
}

/// Same as [`parse_acceptance_criteria`], recording every degraded line.
pub fn parse_acceptance_criteria_reporting(
    text: &str,
    format_hint: FormatHint,
    degraded: &mut Vec<ParseDegraded>,
) -> Vec<AcceptanceCriterion> {
    let use_clauses = match format_hint {
        FormatHint::GivenWhenThen => true,
        FormatHint::Plain => false,
        FormatHint::Auto => has_clause_keywords(text),
    };

    let criteria = if use_clauses {
        parse_clauses(text, degraded)
    } else {
        parse_plain(text)
    };

    log_debug!(
        format_hint = ?format_hint,
        clause_mode = use_clauses,
        criteria = criteria.len(),
        degraded = degraded.len(),
        "Parsed acceptance criteria"
    );

    criteria
}

fn has_clause_keywords(text: &str) -> bool {
    text.lines().any(|line| {
        let line = strip_list_marker(line.trim());
        LEADING_KEYWORD.is_match(line) || INLINE_KEYWORD.is_match(line)
    })
}

fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(marker) => &line[marker.end()..],
        None => line,
    }
}

fn clean_clause(body: &str) -> String {
    body.trim()
        .trim_end_matches([',', ';'])
        .trim()
        .to_string()
}

fn parse_plain(text: &str) -> Vec<AcceptanceCriterion> {
    text.lines()
        .map(|line| strip_list_marker(line.trim()).trim())
        .filter(|line| !line.is_empty())
        .map(AcceptanceCriterion::plain)
        .collect()
}

fn parse_clauses(text: &str, degraded: &mut Vec<ParseDegraded>) -> Vec<AcceptanceCriterion> {
    let mut criteria = Vec::new();

    for raw_line in text.lines() {
        let mut line = strip_list_marker(raw_line.trim()).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(heading) = HEADING.find(line) {
            log_debug!(heading = %heading.as_str().trim(), "Skipping criteria heading");
            line = line[heading.end()..].trim();
            // "Scenario: Successful login" is a title, not a criterion.
            if !(LEADING_KEYWORD.is_match(line) || INLINE_KEYWORD.is_match(line)) {
                continue;
            }
        }

        for (clause, body) in split_clauses(line) {
            let body = clean_clause(body);
            match clause {
                Some(clause) if !body.is_empty() => {
                    criteria.push(AcceptanceCriterion::clause(clause, body));
                }
                Some(clause) => degraded.push(ParseDegraded::new(
                    ParseSource::AcceptanceCriteria,
                    format!("'{}' clause without text", clause.keyword()),
                )),
                None if body.is_empty() || body.ends_with(':') => {}
                None => {
                    degraded.push(ParseDegraded::new(
                        ParseSource::AcceptanceCriteria,
                        format!("no clause keyword in '{body}', kept as plain criterion"),
                    ));
                    criteria.push(AcceptanceCriterion::plain(body));
                }
            }
        }
    }

    criteria
}

/// Split one line at its clause keywords. Text before the first keyword is
/// returned without a clause.
fn split_clauses(line: &str) -> Vec<(Option<Clause>, &str)> {
    // (keyword start, clause, body start)
    let mut boundaries: Vec<(usize, Clause, usize)> = Vec::new();

    if let Some(caps) = LEADING_KEYWORD.captures(line) {
        if let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) {
            if let Some(clause) = Clause::from_keyword(word.as_str()) {
                boundaries.push((0, clause, whole.end()));
            }
        }
    }

    let scan_from = boundaries.first().map_or(0, |(_, _, body)| *body);
    for caps in INLINE_KEYWORD.captures_iter(&line[scan_from..]) {
        if let Some(word) = caps.get(1) {
            if let Some(clause) = Clause::from_keyword(word.as_str()) {
                boundaries.push((scan_from + word.start(), clause, scan_from + word.end()));
            }
        }
    }

    let mut segments = Vec::new();
    let first_start = boundaries.first().map_or(line.len(), |(start, _, _)| *start);
    if first_start > 0 {
        segments.push((None, &line[..first_start]));
    }

    for (index, (_, clause, body_start)) in boundaries.iter().enumerate() {
        let body_end = boundaries
            .get(index + 1)
            .map_or(line.len(), |(next_start, _, _)| *next_start);
        segments.push((Some(*clause), &line[*body_start..body_end]));
    }

    segments
}

/// Criteria folded back into scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionGroup {
    Scenario {
        given: Vec<String>,
        when: Vec<String>,
        then: Vec<String>,
    },
    Plain(String),
}

/// Fold clauses into `{given, when, then}` scenarios.
///
/// `And` continues the previous clause. A `Given` that follows a `When` or
/// `Then` starts a new scenario. Plain criteria stand alone.
pub fn group_scenarios(criteria: &[AcceptanceCriterion]) -> Vec<CriterionGroup> {
    let mut groups = Vec::new();
    let mut given: Vec<String> = Vec::new();
    let mut when: Vec<String> = Vec::new();
    let mut then: Vec<String> = Vec::new();
    let mut last = Clause::Given;

    let flush = |groups: &mut Vec<CriterionGroup>,
                 given: &mut Vec<String>,
                 when: &mut Vec<String>,
                 then: &mut Vec<String>| {
        if !(given.is_empty() && when.is_empty() && then.is_empty()) {
            groups.push(CriterionGroup::Scenario {
                given: std::mem::take(given),
                when: std::mem::take(when),
                then: std::mem::take(then),
            });
        }
    };

    for criterion in criteria {
        if criterion.kind == CriterionKind::Plain {
            flush(&mut groups, &mut given, &mut when, &mut then);
            groups.push(CriterionGroup::Plain(criterion.text.clone()));
            last = Clause::Given;
            continue;
        }

        let clause = match criterion.clause.unwrap_or(Clause::And) {
            Clause::And => last,
            other => other,
        };

        if clause == Clause::Given && !(when.is_empty() && then.is_empty()) {
            flush(&mut groups, &mut given, &mut when, &mut then);
        }

        match clause {
            Clause::Given | Clause::And => given.push(criterion.text.clone()),
            Clause::When => when.push(criterion.text.clone()),
            Clause::Then => then.push(criterion.text.clone()),
        }
        last = clause;
    }

    flush(&mut groups, &mut given, &mut when, &mut then);
    groups
}
