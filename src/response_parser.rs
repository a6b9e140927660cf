//! Tolerant extraction of test cases from raw model output
//!
//! Three tiers, tried in order:
//!
//! 1. JSON: an array of cases, `{"test_cases": [...]}` or a single case,
//!    parsed directly, after cleaning fences, or cut out of mixed content
//! 2. Structured text: `TEST CASE n:` headers, labelled sections, numbered
//!    steps and Given/When/Then lines
//! 3. Degraded: the whole response becomes one case whose description holds
//!    the text, with a warning
//!
//! Extraction never fails. Invariant repair happens later, when drafts
//! become [`TestCase`](crate::core_types::TestCase)s.

use crate::core_types::{StepRole, TestStep};
use crate::logging::{log_debug, log_warn};

use once_cell::sync::Lazy;
use regex::Regex;

/// A test case as the model described it, before ids and invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCase {
    pub title: String,
    pub description: String,
    pub preconditions: Vec<String>,
    pub steps: Vec<TestStep>,
    /// A separately listed expected-results block; may not match the step count.
    pub expected_results: Vec<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub cases: Vec<ExtractedCase>,
    pub warnings: Vec<String>,
    /// True when tier 3 stored the raw response in a single case.
    pub degraded: bool,
}

/// Title given to cases found without a header line.
pub const UNTITLED_CASE: &str = "Generated test case";

/// Title of the case that holds an unrecognized response.
pub const UNSTRUCTURED_CASE: &str = "Unstructured model output";

/// Turn raw model output into draft test cases. Never fails.
pub fn extract_test_cases(raw: &str) -> Extraction {
    log_debug!(
        content_length = raw.len(),
        content_preview = raw.chars().take(200).collect::<String>(),
        "Extracting test cases from model output"
    );

    if raw.trim().is_empty() {
        log_warn!("Model returned an empty response");
        return Extraction {
            cases: Vec::new(),
            warnings: vec!["model returned an empty response".to_string()],
            degraded: true,
        };
    }

    if let Some(cases) = json_tier::parse(raw) {
        log_debug!(cases = cases.len(), "Extracted test cases from JSON");
        return Extraction {
            cases,
            ..Extraction::default()
        };
    }

    let cases = text_tier::parse(raw);
    if !cases.is_empty() {
        log_debug!(cases = cases.len(), "Extracted test cases from structured text");
        return Extraction {
            cases,
            ..Extraction::default()
        };
    }

    log_warn!(
        content_preview = raw.chars().take(200).collect::<String>(),
        "Model output matched no known layout, keeping it as one case"
    );
    Extraction {
        cases: vec![ExtractedCase {
            title: UNSTRUCTURED_CASE.to_string(),
            description: raw.trim().to_string(),
            ..ExtractedCase::default()
        }],
        warnings: vec![
            "model response did not match the expected layout; whole response kept in the description"
                .to_string(),
        ],
        degraded: true,
    }
}

mod json_tier {
    use super::{ExtractedCase, UNTITLED_CASE};
    use crate::core_types::TestStep;
    use crate::logging::log_trace;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonRoot {
        List(Vec<JsonCase>),
        Wrapped {
            #[serde(alias = "testCases", alias = "tests")]
            test_cases: Vec<JsonCase>,
        },
        Single(JsonCase),
    }

    #[derive(Deserialize)]
    struct JsonCase {
        #[serde(default, alias = "name")]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, deserialize_with = "one_or_many")]
        preconditions: Vec<String>,
        steps: Vec<JsonStep>,
        #[serde(default, deserialize_with = "one_or_many")]
        expected_results: Vec<String>,
        #[serde(default)]
        notes: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonStep {
        Text(String),
        Detailed {
            #[serde(alias = "step", alias = "description")]
            action: String,
            #[serde(default, alias = "expected", alias = "expectedResult")]
            expected_result: Option<String>,
            #[serde(default, alias = "data", alias = "testData")]
            test_data: Option<String>,
            #[serde(default)]
            notes: Option<String>,
        },
    }

    fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }

    pub(super) fn parse(raw: &str) -> Option<Vec<ExtractedCase>> {
        let value = parse_value(raw)?;
        let root: JsonRoot = serde_json::from_value(value).ok()?;
        let cases = match root {
            JsonRoot::List(cases) | JsonRoot::Wrapped { test_cases: cases } => cases,
            JsonRoot::Single(case) => vec![case],
        };
        if cases.is_empty() {
            return None;
        }
        Some(cases.into_iter().map(convert).collect())
    }

    fn parse_value(raw: &str) -> Option<Value> {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return Some(value);
        }

        let cleaned = clean_artifacts(raw);
        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            log_trace!("Parsed JSON after artifact cleaning");
            return Some(value);
        }

        let start = cleaned.find(['[', '{'])?;
        let candidate = extract_balanced(&cleaned[start..])?;
        serde_json::from_str::<Value>(candidate).ok()
    }

    fn clean_artifacts(content: &str) -> String {
        content
            .replace("```json", "")
            .replace("```JSON", "")
            .replace("```", "")
            .trim()
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }

    /// Slice of `text` up to the bracket that closes its first character.
    fn extract_balanced(text: &str) -> Option<&str> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (index, ch) in text.char_indices() {
            if in_string {
                match ch {
                    '\\' if !escaped => escaped = true,
                    '"' if !escaped => in_string = false,
                    _ => escaped = false,
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(&text[..=index]);
                    }
                }
                _ => {}
            }
        }

        None
    }

    fn convert(case: JsonCase) -> ExtractedCase {
        let steps = case
            .steps
            .into_iter()
            .map(|step| match step {
                JsonStep::Text(text) => super::text_tier::parse_step_line(&text),
                JsonStep::Detailed {
                    action,
                    expected_result,
                    test_data,
                    notes,
                } => TestStep {
                    role: super::infer_role(&action),
                    action,
                    expected_result: expected_result.unwrap_or_default(),
                    test_data,
                    notes,
                },
            })
            .collect();

        ExtractedCase {
            title: case.title.unwrap_or_else(|| UNTITLED_CASE.to_string()),
            description: case.description.unwrap_or_default(),
            preconditions: case.preconditions,
            steps,
            expected_results: case.expected_results,
            notes: case.notes,
            tags: case.tags,
        }
    }
}

/// Verification wording maps to `Then`; everything else is left to the formatter.
fn infer_role(action: &str) -> Option<StepRole> {
    static VERIFY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(?:verify|check|confirm|assert|validate)\b").expect("valid role regex")
    });
    VERIFY.is_match(action.trim()).then_some(StepRole::Verification)
}

mod text_tier {
    use super::{infer_role, ExtractedCase, UNTITLED_CASE};
    use crate::core_types::{Clause, StepRole, TestStep};
    use crate::logging::log_trace;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static CASE_HEADER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(?:test[\s_-]*case|tc)[\s_#-]*\d*\s*[:.)-]\s*(.*)$")
            .expect("valid header regex")
    });

    static SCENARIO_HEADER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^scenario(?:\s+outline)?\s*\d*\s*:\s*(.+)$").expect("valid scenario regex")
    });

    static GHERKIN_BLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(feature|background|rule|examples)\s*:\s*(.*)$")
            .expect("valid gherkin block regex")
    });

    static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)^(title|description|summary|pre-?conditions?|steps|test\s+steps|expected\s+results?|expected|test\s+data|data|notes?|tags|priority|type)\s*:\s*(.*)$",
        )
        .expect("valid label regex")
    });

    static CLAUSE_LINE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(given|when|then|and|but)\b[:,]?\s*(.*)$").expect("valid clause regex")
    });

    static NUMBERED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(?:step\s*)?\d+\s*[.):]\s+(.+)$").expect("valid numbered regex")
    });

    static BULLET: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[-*•]\s+(.+)$").expect("valid bullet regex"));

    static ARROW: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*(?:=>|->|→)\s*").expect("valid arrow regex"));

    static INLINE_EXPECTED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\s*[-–(]?\s*expected(?:\s+result)?\s*:\s*").expect("valid expected regex")
    });

    static SEGMENT_LABEL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(expected(?:\s+result)?|test\s+data|data|notes?)\s*:\s*(.*)$")
            .expect("valid segment regex")
    });

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Section {
        None,
        Description,
        Preconditions,
        Steps,
        ExpectedResults,
        Notes,
        Tags,
    }

    struct Builder {
        cases: Vec<ExtractedCase>,
        current: Option<ExtractedCase>,
        section: Section,
        last_clause: Clause,
        /// Given lines of a `Background:` block, shared by every later scenario.
        background: Vec<String>,
        in_background: bool,
    }

    impl Builder {
        fn start(&mut self, title: &str) {
            self.finish();
            let title = title.trim().trim_matches('*').trim();
            self.current = Some(ExtractedCase {
                title: if title.is_empty() {
                    UNTITLED_CASE.to_string()
                } else {
                    title.to_string()
                },
                preconditions: self.background.clone(),
                ..ExtractedCase::default()
            });
            self.section = Section::None;
            self.last_clause = Clause::Given;
            self.in_background = false;
        }

        fn finish(&mut self) {
            if let Some(case) = self.current.take() {
                self.cases.push(case);
            }
        }

        fn case(&mut self) -> &mut ExtractedCase {
            let background = &self.background;
            self.current.get_or_insert_with(|| ExtractedCase {
                title: UNTITLED_CASE.to_string(),
                preconditions: background.clone(),
                ..ExtractedCase::default()
            })
        }
    }

    pub(super) fn parse(raw: &str) -> Vec<ExtractedCase> {
        let mut builder = Builder {
            cases: Vec::new(),
            current: None,
            section: Section::None,
            last_clause: Clause::Given,
            background: Vec::new(),
            in_background: false,
        };

        for raw_line in raw.lines() {
            let line = clean_line(raw_line);
            if line.is_empty() || line.starts_with("```") {
                continue;
            }

            if let Some(title) = CASE_HEADER
                .captures(&line)
                .or_else(|| SCENARIO_HEADER.captures(&line))
                .and_then(|caps| caps.get(1))
            {
                builder.start(title.as_str());
                continue;
            }

            if let Some(caps) = GHERKIN_BLOCK.captures(&line) {
                let keyword = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
                match keyword.as_str() {
                    "feature" => {
                        builder.finish();
                        builder.background.clear();
                        builder.in_background = false;
                    }
                    "rule" => {
                        builder.finish();
                        builder.in_background = false;
                    }
                    "background" => {
                        builder.finish();
                        builder.in_background = true;
                    }
                    _ => log_trace!(keyword = %keyword, "Skipping gherkin block header"),
                }
                continue;
            }

            if builder.in_background {
                if let Some(text) = CLAUSE_LINE
                    .captures(&line)
                    .and_then(|caps| caps.get(2))
                    .map(|text| text.as_str().trim())
                    .filter(|text| !text.is_empty())
                {
                    builder.background.push(text.to_string());
                }
                continue;
            }

            if let Some(caps) = SECTION_LABEL.captures(&line) {
                let label = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
                let rest = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                if builder.current.is_none()
                    && matches!(label.as_str(), "note" | "notes" | "priority" | "type" | "tags")
                {
                    log_trace!(label = %label, "Skipping label before any test case");
                    continue;
                }
                apply_label(&mut builder, &label, rest);
                continue;
            }

            if let Some(caps) = CLAUSE_LINE.captures(&line) {
                let keyword = caps.get(1).map_or("", |m| m.as_str());
                let text = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                if !text.is_empty() {
                    apply_clause(&mut builder, keyword, text);
                }
                continue;
            }

            if let Some(text) = NUMBERED.captures(&line).and_then(|caps| caps.get(1)) {
                let text = text.as_str().trim().to_string();
                match builder.section {
                    Section::ExpectedResults => builder.case().expected_results.push(text),
                    Section::Preconditions => builder.case().preconditions.push(text),
                    _ => {
                        let step = parse_step_line(&text);
                        builder.case().steps.push(step);
                        builder.section = Section::Steps;
                    }
                }
                continue;
            }

            if let Some(text) = BULLET.captures(&line).and_then(|caps| caps.get(1)) {
                let text = text.as_str().trim().to_string();
                if builder.current.is_none() {
                    log_trace!(line = %text, "Skipping bullet before any test case");
                    continue;
                }
                match builder.section {
                    Section::Preconditions => builder.case().preconditions.push(text),
                    Section::ExpectedResults => builder.case().expected_results.push(text),
                    Section::Steps => {
                        let step = parse_step_line(&text);
                        builder.case().steps.push(step);
                    }
                    Section::Tags => builder.case().tags.push(text),
                    Section::Notes => append_notes(builder.case(), &text),
                    Section::None | Section::Description => append(&mut builder.case().description, &text),
                }
                continue;
            }

            if builder.current.is_none() {
                log_trace!(line = %line, "Skipping preamble line");
                continue;
            }
            match builder.section {
                Section::Notes => append_notes(builder.case(), &line),
                Section::Steps => {
                    if let Some(step) = builder.case().steps.last_mut() {
                        let notes = step.notes.get_or_insert_with(String::new);
                        append(notes, &line);
                    }
                }
                _ => append(&mut builder.case().description, &line),
            }
        }

        builder.finish();

        // A lone untitled case with nothing but description text is prose, not structure.
        if let [only] = builder.cases.as_slice() {
            if only.title == UNTITLED_CASE && only.steps.is_empty() && only.preconditions.is_empty() {
                return Vec::new();
            }
        }
        builder.cases
    }

    fn apply_label(builder: &mut Builder, label: &str, rest: String) {
        match label {
            "title" => {
                if builder.current.is_none() {
                    builder.start(&rest);
                } else {
                    builder.case().title = rest;
                }
            }
            "description" | "summary" => {
                builder.case().description = rest;
                builder.section = Section::Description;
            }
            "steps" | "test steps" => builder.section = Section::Steps,
            "expected" | "expected result" | "expected results"
                if builder.section == Section::Steps && !rest.is_empty() =>
            {
                let case = builder.case();
                match case.steps.last_mut() {
                    Some(step) if step.expected_result.is_empty() => step.expected_result = rest,
                    _ => case.expected_results.push(rest),
                }
            }
            "expected" | "expected result" | "expected results" => {
                builder.section = Section::ExpectedResults;
                if !rest.is_empty() {
                    builder.case().expected_results.push(rest);
                }
            }
            "test data" | "data" => {
                let case = builder.case();
                match case.steps.last_mut() {
                    Some(step) => step.test_data = Some(rest),
                    None => append(&mut case.description, &format!("Test data: {rest}")),
                }
            }
            "note" | "notes" => {
                if builder.section == Section::Steps && !rest.is_empty() {
                    if let Some(step) = builder.case().steps.last_mut() {
                        step.notes = Some(rest);
                        return;
                    }
                }
                builder.section = Section::Notes;
                if !rest.is_empty() {
                    append_notes(builder.case(), &rest);
                }
            }
            "tags" => {
                builder.section = Section::Tags;
                let tags = rest
                    .split(',')
                    .map(|tag| tag.trim().trim_start_matches('@').to_string())
                    .filter(|tag| !tag.is_empty());
                builder.case().tags.extend(tags);
            }
            label if label.starts_with("pre") => {
                builder.section = Section::Preconditions;
                if !rest.is_empty() {
                    builder.case().preconditions.push(rest);
                }
            }
            _ => log_trace!(label = %label, "Ignoring section label"),
        }
    }

    fn apply_clause(builder: &mut Builder, keyword: &str, text: String) {
        let clause = match Clause::from_keyword(keyword) {
            Some(Clause::And) | None => builder.last_clause,
            Some(clause) => clause,
        };
        builder.last_clause = clause;

        let case = builder.case();
        match clause {
            Clause::Given | Clause::And => case.preconditions.push(text),
            Clause::When => case
                .steps
                .push(TestStep::new(text, "").with_role(StepRole::Action)),
            Clause::Then => match case.steps.last_mut() {
                Some(step) if step.expected_result.is_empty() => step.expected_result = text,
                _ => case.steps.push(
                    TestStep::new(format!("Verify that {text}"), text)
                        .with_role(StepRole::Verification),
                ),
            },
        }
        builder.section = Section::Steps;
    }

    /// `action => expected | Data: x | Notes: y`, with `->` and
    /// `Expected:` accepted in place of `=>`.
    pub(super) fn parse_step_line(text: &str) -> TestStep {
        let mut segments = text.split(" | ");
        let head = segments.next().unwrap_or_default();

        let (mut action, mut expected) = match ARROW.find(head) {
            Some(arrow) => (
                head[..arrow.start()].to_string(),
                head[arrow.end()..].to_string(),
            ),
            None => (head.to_string(), String::new()),
        };
        if expected.is_empty() {
            if let Some(marker) = INLINE_EXPECTED.find(&action) {
                if marker.start() > 0 {
                    expected = action[marker.end()..].trim_end_matches(')').to_string();
                    action.truncate(marker.start());
                }
            }
        }

        let mut test_data = None;
        let mut notes = None;
        for segment in segments {
            match SEGMENT_LABEL.captures(segment) {
                Some(caps) => {
                    let label = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
                    let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                    if label.starts_with("expected") {
                        expected = value;
                    } else if label.starts_with("note") {
                        notes = Some(value);
                    } else {
                        test_data = Some(value);
                    }
                }
                None => {
                    action.push_str(" | ");
                    action.push_str(segment);
                }
            }
        }

        let action = action.trim().to_string();
        TestStep {
            role: infer_role(&action),
            action,
            expected_result: expected.trim().to_string(),
            test_data,
            notes,
        }
    }

    fn clean_line(line: &str) -> String {
        line.replace("**", "")
            .trim()
            .trim_start_matches('#')
            .trim()
            .to_string()
    }

    fn append(target: &mut String, text: &str) {
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }

    fn append_notes(case: &mut ExtractedCase, text: &str) {
        let notes = case.notes.get_or_insert_with(String::new);
        append(notes, text);
    }
}
