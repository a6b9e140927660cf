//! System context parsing: tech stack, constraints, roles and data types.
//!
//! Recognizes `key: value` lines, "built with ..." phrases and a dictionary
//! of well-known technologies. Anything else is ignored.

use crate::core_types::{ParseDegraded, ParseSource, SystemContext};
use crate::logging::log_debug;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]\s*)?([A-Za-z][A-Za-z /_-]{0,30}?)\s*[:=]\s*(.*)$")
        .expect("valid key-value regex")
});

static BUILT_WITH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbuilt\s+(?:with|on|using)\s+([^.\n]+)").expect("valid regex"));

static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:[,;|/+&]|\band\b)\s*").expect("valid separator regex"));

/// (display name, pattern). Ambiguous English words (Go, Rust, Express) are
/// deliberately absent.
static KNOWN_TECH: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        // frontend
        ("React", r"\breact(?:\.js|js)?\b"),
        ("Angular", r"\bangular\b"),
        ("Vue", r"\bvue(?:\.js|js)?\b"),
        ("Svelte", r"\bsvelte\b"),
        ("Next.js", r"\bnext\.js\b"),
        ("TypeScript", r"\btypescript\b"),
        ("JavaScript", r"\bjavascript\b"),
        // backend
        ("Node.js", r"\bnode(?:\.js|js)\b"),
        ("Django", r"\bdjango\b"),
        ("Flask", r"\bflask\b"),
        ("FastAPI", r"\bfastapi\b"),
        ("Spring Boot", r"\bspring\s+boot\b"),
        ("Ruby on Rails", r"\brails\b"),
        (".NET", r"(?:^|\s)\.net\b"),
        ("Java", r"\bjava\b"),
        ("Python", r"\bpython\b"),
        ("GraphQL", r"\bgraphql\b"),
        ("REST", r"\brest(?:ful)?\s+api\b"),
        // database
        ("PostgreSQL", r"\bpostgres(?:ql)?\b"),
        ("MySQL", r"\bmysql\b"),
        ("MongoDB", r"\bmongo(?:db)?\b"),
        ("Redis", r"\bredis\b"),
        ("SQLite", r"\bsqlite\b"),
        ("Elasticsearch", r"\belasticsearch\b"),
        ("DynamoDB", r"\bdynamodb\b"),
        // infrastructure
        ("Docker", r"\bdocker\b"),
        ("Kubernetes", r"\bkubernetes\b|\bk8s\b"),
        ("AWS", r"\baws\b"),
        ("Azure", r"\bazure\b"),
        ("GCP", r"\bgcp\b|\bgoogle\s+cloud\b"),
        ("Terraform", r"\bterraform\b"),
        ("Kafka", r"\bkafka\b"),
        // testing
        ("Jest", r"\bjest\b"),
        ("Cypress", r"\bcypress\b"),
        ("Playwright", r"\bplaywright\b"),
        ("Selenium", r"\bselenium\b"),
        ("pytest", r"\bpytest\b"),
        ("JUnit", r"\bjunit\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(&format!("(?i){pattern}")).expect("valid technology regex"),
        )
    })
    .collect()
});

static CONSTRAINT_CATEGORIES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "performance",
            r"\b(?:response\s+time|latency|throughput|page\s+load|concurrent\s+users|performance)\b",
        ),
        (
            "security",
            r"\b(?:encrypt(?:ed|ion)?|security|authentication|authorization|gdpr|pci|hipaa)\b",
        ),
        (
            "reliability",
            r"\b(?:uptime|availability|failover|backup|disaster\s+recovery)\b",
        ),
        (
            "usability",
            r"\b(?:accessib(?:le|ility)|wcag|usability|responsive)\b",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(&format!("(?i){pattern}")).expect("valid constraint regex"),
        )
    })
    .collect()
});

static KNOWN_ROLES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(administrator|admin|guest|customer|manager|moderator|editor|viewer|operator|end\s+user|registered\s+user|anonymous\s+user)s?\b",
    )
    .expect("valid role regex")
});

static KNOWN_DATA_TYPES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(email(?:\s+address)?|password|phone\s+number|date|currency|file|image|url|postal\s+address|credit\s+card|username)s?\b",
    )
    .expect("valid data type regex")
});

#[derive(Clone, Copy)]
enum Key {
    Tech,
    Constraint,
    Quality,
    Role,
    Data,
}

fn classify_key(key: &str) -> Option<Key> {
    let key = key.trim().to_ascii_lowercase();
    match key.as_str() {
        "tech" | "technology" | "technologies" | "tech stack" | "technology stack" | "stack"
        | "built with" | "using" | "frameworks" | "framework" | "platform" => Some(Key::Tech),
        "constraint" | "constraints" | "requirement" | "requirements" | "non-functional"
        | "nfr" | "compliance" => Some(Key::Constraint),
        "performance" | "security" | "reliability" | "usability" => Some(Key::Quality),
        "role" | "roles" | "user role" | "user roles" | "actor" | "actors" | "personas" => {
            Some(Key::Role)
        }
        "data" | "data type" | "data types" | "inputs" | "fields" => Some(Key::Data),
        _ => None,
    }
}

/// Extract a [`SystemContext`]. Never fails; unknown tokens are ignored.
pub fn parse_system_context(text: &str) -> SystemContext {
    let mut degraded = Vec::new();
    parse_system_context_reporting(text, &mut degraded)
}

/// Same as [`parse_system_context`], recording recognized keys without usable values.
pub fn parse_system_context_reporting(
    text: &str,
    degraded: &mut Vec<ParseDegraded>,
) -> SystemContext {
    let mut tech: Vec<(usize, String)> = Vec::new();
    let mut roles: Vec<(usize, String)> = Vec::new();
    let mut data: Vec<(usize, String)> = Vec::new();
    let mut context = SystemContext::default();

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some(caps) = KEY_VALUE.captures(line.trim_end()) {
            if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
                let position = offset + value.start();
                let items = split_list(value.as_str());
                match classify_key(key.as_str()) {
                    Some(_) if items.is_empty() => degraded.push(ParseDegraded::new(
                        ParseSource::SystemContext,
                        format!("'{}' has no value", key.as_str().trim()),
                    )),
                    Some(Key::Tech) => tech.extend(items.into_iter().map(|i| (position, i))),
                    Some(Key::Constraint) => {
                        context.constraints.insert(value.as_str().trim().to_string());
                    }
                    Some(Key::Quality) => {
                        context.constraints.insert(format!(
                            "{}: {}",
                            key.as_str().trim().to_ascii_lowercase(),
                            value.as_str().trim()
                        ));
                    }
                    Some(Key::Role) => roles.extend(
                        items
                            .into_iter()
                            .map(|i| (position, i.to_ascii_lowercase())),
                    ),
                    Some(Key::Data) => data.extend(
                        items
                            .into_iter()
                            .map(|i| (position, i.to_ascii_lowercase())),
                    ),
                    None => {}
                }
            }
        }
        offset += line.len();
    }

    for caps in BUILT_WITH.captures_iter(text) {
        if let Some(list) = caps.get(1) {
            tech.extend(
                split_list(list.as_str())
                    .into_iter()
                    .map(|item| (list.start(), item)),
            );
        }
    }

    for (name, pattern) in KNOWN_TECH.iter() {
        if let Some(found) = pattern.find(text) {
            tech.push((found.start(), (*name).to_string()));
        }
    }

    for found in KNOWN_ROLES.captures_iter(text) {
        if let Some(role) = found.get(1) {
            roles.push((role.start(), normalize_phrase(role.as_str())));
        }
    }

    for found in KNOWN_DATA_TYPES.captures_iter(text) {
        if let Some(kind) = found.get(1) {
            data.push((kind.start(), normalize_phrase(kind.as_str())));
        }
    }

    for (name, pattern) in CONSTRAINT_CATEGORIES.iter() {
        if pattern.is_match(text) {
            context.constraints.insert((*name).to_string());
        }
    }

    context.tech_stack = ordered_unique(tech);
    context.user_roles = ordered_unique(roles);
    context.data_types = ordered_unique(data);

    log_debug!(
        tech_stack = context.tech_stack.len(),
        constraints = context.constraints.len(),
        user_roles = context.user_roles.len(),
        data_types = context.data_types.len(),
        "Parsed system context"
    );

    context
}

fn split_list(value: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(value)
        .map(|item| item.trim().trim_end_matches('.').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Sort by first mention, then drop case-insensitive repeats.
fn ordered_unique(mut items: Vec<(usize, String)>) -> Vec<String> {
    items.sort_by_key(|(position, _)| *position);
    let mut seen = Vec::new();
    let mut ordered = Vec::new();
    for (_, item) in items {
        let folded = item.to_ascii_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            ordered.push(item);
        }
    }
    ordered
}
