//! User story parsing.

use crate::core_types::{ParseDegraded, ParseSource, UserStory};
use crate::logging::log_debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// "As a/an" opening a line or sentence, optionally after a bullet.
static PERSONA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)(?:^|[.!?:])[\s•*-]*\bas\s+an?\s+").expect("valid persona regex")
});

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bI\s+(?:want|would\s+like|need|must\s+be\s+able)(?:\s+to)?\s+")
        .expect("valid action regex")
});

static VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bso\s+that\s+|\bin\s+order\s+to\s+").expect("valid value regex")
});

/// Who-what-why phrasings, accepted only with all three parts present.
static ALTERNATIVES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)\S\s+needs\s+(?:to\s+)?(.+?)\s+because\s+(.+)")
            .expect("valid needs regex"),
        Regex::new(r"(?i)\S\s+requires\s+(.+?)\s+to\s+(.+)").expect("valid requires regex"),
        Regex::new(r"(?i)\S\s+must\s+be\s+able\s+to\s+(.+?)\s+in\s+order\s+to\s+(.+)")
            .expect("valid must-be-able regex"),
    ]
});

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Persona,
    Action,
    Value,
}

/// Extract persona, action and value. Never fails; absent parts stay empty.
pub fn parse_user_story(text: &str) -> UserStory {
    let mut degraded = Vec::new();
    parse_user_story_reporting(text, &mut degraded)
}

/// Same as [`parse_user_story`], recording when nothing was recognized.
pub fn parse_user_story_reporting(text: &str, degraded: &mut Vec<ParseDegraded>) -> UserStory {
    // (field, marker start, marker end)
    let mut markers: Vec<(Field, usize, usize)> = [
        (Field::Persona, &*PERSONA),
        (Field::Action, &*ACTION),
        (Field::Value, &*VALUE),
    ]
    .into_iter()
    .filter_map(|(field, pattern)| pattern.find(text).map(|m| (field, m.start(), m.end())))
    .collect();
    markers.sort_by_key(|(_, start, _)| *start);

    // A lone "so that" is prose unless a persona or action anchors it.
    if markers.iter().all(|(field, _, _)| *field == Field::Value) {
        markers.clear();
    }

    let mut story = UserStory::default();
    for (index, (field, _, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .iter()
            .skip(index + 1)
            .map(|(_, start, _)| *start)
            .find(|start| start >= body_start)
            .unwrap_or(text.len());
        let body = if *body_start <= body_end {
            clean_field(&text[*body_start..body_end])
        } else {
            String::new()
        };

        match field {
            Field::Persona => story.persona = body,
            Field::Action => story.action = body,
            Field::Value => story.value = body,
        }
    }

    if story.is_empty() {
        if let Some((action, value)) = alternative_phrasing(text) {
            story.action = action;
            story.value = value;
        }
    }

    if story.is_empty() && !text.trim().is_empty() {
        degraded.push(ParseDegraded::new(
            ParseSource::UserStory,
            "no 'As a', 'I want' or 'So that' phrase found",
        ));
    }

    log_debug!(
        has_persona = !story.persona.is_empty(),
        has_action = !story.action.is_empty(),
        has_value = !story.value.is_empty(),
        "Parsed user story"
    );

    story
}

/// Action and value from the first complete who-what-why phrasing.
fn alternative_phrasing(text: &str) -> Option<(String, String)> {
    ALTERNATIVES.iter().find_map(|pattern| {
        let captures = pattern.captures(text)?;
        let action = clean_field(captures.get(1)?.as_str());
        let value = clean_field(captures.get(2)?.as_str());
        (!action.is_empty() && !value.is_empty()).then_some((action, value))
    })
}

/// First line of the field, whitespace collapsed, trailing punctuation dropped.
fn clean_field(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or_default();
    first_line
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', '.', ';', ':'])
        .trim()
        .to_string()
}
