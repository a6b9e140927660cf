//! Test-framework scaffolding
//!
//! Each test case becomes one empty test whose body lists the steps as
//! numbered comments, with a commented hint for the framework call the step
//! most likely needs. Nothing here is meant to run as-is.

use super::{push_line, single_line, FormatContext, Formatter};
use crate::core_types::{GenerationResult, OutputFormat, TestCase, TestStep};
use crate::error::GenResult;

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    /// TypeScript, `@playwright/test`
    Playwright,
    /// Python, pytest functions
    Pytest,
    /// JavaScript, Cypress `describe`/`it`
    Cypress,
    /// Python, `unittest` with Selenium WebDriver
    Selenium,
    /// Java, JUnit 5
    Junit,
}

impl Framework {
    pub const ALL: [Framework; 5] = [
        Self::Playwright,
        Self::Pytest,
        Self::Cypress,
        Self::Selenium,
        Self::Junit,
    ];

    pub fn output_format(self) -> OutputFormat {
        match self {
            Self::Playwright => OutputFormat::Playwright,
            Self::Pytest => OutputFormat::Pytest,
            Self::Cypress => OutputFormat::Cypress,
            Self::Selenium => OutputFormat::Selenium,
            Self::Junit => OutputFormat::Junit,
        }
    }

    pub fn from_output_format(format: OutputFormat) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|framework| framework.output_format() == format)
    }

    fn comment(self) -> &'static str {
        match self {
            Self::Pytest | Self::Selenium => "#",
            Self::Playwright | Self::Cypress | Self::Junit => "//",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionHint {
    Navigate,
    Click,
    Fill,
    Verify,
}

impl ActionHint {
    fn detect(action: &str) -> Option<Self> {
        let action = action.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|word| action.contains(word));
        if has(&["verify", "check", "confirm", "assert", "observe", "ensure"]) {
            Some(Self::Verify)
        } else if has(&["navigate", "open", "go to", "visit", "load"]) {
            Some(Self::Navigate)
        } else if has(&["enter", "type", "fill", "input", "upload"]) {
            Some(Self::Fill)
        } else if has(&["click", "press", "select", "submit", "tap"]) {
            Some(Self::Click)
        } else {
            None
        }
    }

    fn code(self, framework: Framework) -> &'static str {
        match (framework, self) {
            (Framework::Playwright, Self::Navigate) => "await page.goto('/');",
            (Framework::Playwright, Self::Click) => "await page.click('selector');",
            (Framework::Playwright, Self::Fill) => "await page.fill('selector', 'value');",
            (Framework::Playwright, Self::Verify) => {
                "await expect(page.locator('selector')).toBeVisible();"
            }
            (Framework::Cypress, Self::Navigate) => "cy.visit('/');",
            (Framework::Cypress, Self::Click) => "cy.get('selector').click();",
            (Framework::Cypress, Self::Fill) => "cy.get('selector').type('value');",
            (Framework::Cypress, Self::Verify) => "cy.get('selector').should('be.visible');",
            (Framework::Pytest, Self::Navigate) => "client.get(\"/\")",
            (Framework::Pytest, Self::Click) => "client.post(\"/\")",
            (Framework::Pytest, Self::Fill) => "payload = {\"field\": \"value\"}",
            (Framework::Pytest, Self::Verify) => "assert response.status_code == 200",
            (Framework::Selenium, Self::Navigate) => "self.driver.get(BASE_URL)",
            (Framework::Selenium, Self::Click) => {
                "self.driver.find_element(By.CSS_SELECTOR, \"selector\").click()"
            }
            (Framework::Selenium, Self::Fill) => {
                "self.driver.find_element(By.CSS_SELECTOR, \"selector\").send_keys(\"value\")"
            }
            (Framework::Selenium, Self::Verify) => {
                "self.assertTrue(self.driver.find_element(By.CSS_SELECTOR, \"selector\").is_displayed())"
            }
            (Framework::Junit, Self::Navigate) => "driver.get(baseUrl);",
            (Framework::Junit, Self::Click) => "driver.findElement(By.cssSelector(\"selector\")).click();",
            (Framework::Junit, Self::Fill) => {
                "driver.findElement(By.cssSelector(\"selector\")).sendKeys(\"value\");"
            }
            (Framework::Junit, Self::Verify) => {
                "assertTrue(driver.findElement(By.cssSelector(\"selector\")).isDisplayed());"
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeSkeletonFormatter {
    framework: Framework,
}

impl CodeSkeletonFormatter {
    pub fn new(framework: Framework) -> Self {
        Self { framework }
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }
}

impl Formatter for CodeSkeletonFormatter {
    fn name(&self) -> &'static str {
        match self.framework {
            Framework::Playwright => "playwright",
            Framework::Pytest => "pytest",
            Framework::Cypress => "cypress",
            Framework::Selenium => "selenium",
            Framework::Junit => "junit",
        }
    }

    fn render(&self, result: &GenerationResult, context: &FormatContext<'_>) -> GenResult<String> {
        result.validate()?;
        let feature = context.feature_name(result);
        let names = Identifiers::for_cases(&result.test_cases, self.framework);

        let out = match self.framework {
            Framework::Playwright => playwright(result, &feature),
            Framework::Cypress => cypress(result, &feature),
            Framework::Pytest => pytest(result, &names),
            Framework::Selenium => selenium(result, &feature, &names),
            Framework::Junit => junit(result, &feature, &names),
        };
        Ok(out)
    }
}

/// Unique per-case function names derived from titles.
struct Identifiers(Vec<String>);

impl Identifiers {
    fn for_cases(cases: &[TestCase], framework: Framework) -> Self {
        let mut seen = HashSet::new();
        let names = cases
            .iter()
            .map(|case| {
                let words = words(&case.title);
                let base = match framework {
                    Framework::Junit => camel_case(&words),
                    _ => format!("test_{}", words.join("_")),
                };
                let base = if base.is_empty() || base == "test_" {
                    format!("test_{}", words_from_id(&case.id))
                } else {
                    base
                };
                let mut name = base.clone();
                let mut suffix = 2;
                while !seen.insert(name.clone()) {
                    name = format!("{base}_{suffix}");
                    suffix += 1;
                }
                name
            })
            .collect();
        Self(names)
    }

    fn get(&self, index: usize) -> &str {
        self.0.get(index).map_or("test_case", String::as_str)
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

fn words_from_id(id: &str) -> String {
    words(id).join("_")
}

fn camel_case(words: &[String]) -> String {
    let mut name = String::new();
    for (index, word) in words.iter().enumerate() {
        if index == 0 {
            name.push_str(word);
        } else {
            name.push_str(&super::capitalize(word));
        }
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "test");
    }
    name
}

fn js_string(text: &str) -> String {
    single_line(text).replace('\\', "\\\\").replace('\'', "\\'")
}

fn double_quoted(text: &str) -> String {
    single_line(text).replace('\\', "\\\\").replace('"', "\\\"")
}

/// Numbered step comments with an optional framework hint.
fn step_comments(out: &mut String, indent: &str, framework: Framework, case: &TestCase) {
    let c = framework.comment();
    if !case.preconditions.is_empty() {
        push_line(out, format!("{indent}{c} Preconditions:"));
        for precondition in &case.preconditions {
            push_line(out, format!("{indent}{c} - {}", single_line(precondition)));
        }
    }
    for (index, step) in case.steps.iter().enumerate() {
        step_comment(out, indent, framework, index + 1, step);
    }
}

fn step_comment(out: &mut String, indent: &str, framework: Framework, number: usize, step: &TestStep) {
    let c = framework.comment();
    push_line(out, format!("{indent}{c} Step {number}: {}", single_line(&step.action)));
    push_line(out, format!("{indent}{c}   Expected: {}", single_line(&step.expected_result)));
    if let Some(data) = step.test_data.as_deref() {
        push_line(out, format!("{indent}{c}   Data: {}", single_line(data)));
    }
    if let Some(hint) = ActionHint::detect(&step.action) {
        push_line(out, format!("{indent}{c} {}", hint.code(framework)));
    }
}

fn playwright(result: &GenerationResult, feature: &str) -> String {
    let mut out = String::new();
    push_line(&mut out, "import { test, expect } from '@playwright/test';");
    out.push('\n');
    push_line(&mut out, format!("// Generated by {}", result.generator_name));
    push_line(&mut out, format!("test.describe('{}', () => {{", js_string(feature)));
    for (index, case) in result.test_cases.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        push_line(
            &mut out,
            format!(
                "  test('{}: {}', async ({{ page }}) => {{",
                js_string(&case.id),
                js_string(&case.title)
            ),
        );
        step_comments(&mut out, "    ", Framework::Playwright, case);
        push_line(&mut out, "  });");
    }
    push_line(&mut out, "});");
    out
}

fn cypress(result: &GenerationResult, feature: &str) -> String {
    let mut out = String::new();
    push_line(&mut out, format!("// Generated by {}", result.generator_name));
    push_line(&mut out, format!("describe('{}', () => {{", js_string(feature)));
    for (index, case) in result.test_cases.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        push_line(
            &mut out,
            format!("  it('{}: {}', () => {{", js_string(&case.id), js_string(&case.title)),
        );
        step_comments(&mut out, "    ", Framework::Cypress, case);
        push_line(&mut out, "  });");
    }
    push_line(&mut out, "});");
    out
}

fn pytest(result: &GenerationResult, names: &Identifiers) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("\"\"\"Test skeletons generated by {}.\"\"\"", result.generator_name),
    );
    out.push('\n');
    push_line(&mut out, "import pytest");
    for (index, case) in result.test_cases.iter().enumerate() {
        out.push_str("\n\n");
        push_line(&mut out, format!("@pytest.mark.{}", case.test_type.as_str()));
        push_line(&mut out, format!("@pytest.mark.{}", case.priority.as_str()));
        push_line(&mut out, format!("def {}():", names.get(index)));
        push_line(&mut out, format!("    \"\"\"{}: {}\"\"\"", case.id, double_quoted(&case.title)));
        step_comments(&mut out, "    ", Framework::Pytest, case);
        push_line(&mut out, "    pass");
    }
    out
}

fn class_name(feature: &str) -> String {
    let name: String = words(feature)
        .iter()
        .take(6)
        .map(|word| super::capitalize(word))
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Generated{name}")
    } else {
        name
    }
}

fn selenium(result: &GenerationResult, feature: &str, names: &Identifiers) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("\"\"\"Test skeletons generated by {}.\"\"\"", result.generator_name),
    );
    out.push('\n');
    push_line(&mut out, "import unittest");
    out.push('\n');
    push_line(&mut out, "from selenium import webdriver");
    push_line(&mut out, "from selenium.webdriver.common.by import By");
    out.push('\n');
    push_line(&mut out, "BASE_URL = \"http://localhost\"");
    out.push_str("\n\n");
    push_line(&mut out, format!("class {}Test(unittest.TestCase):", class_name(feature)));
    push_line(&mut out, "    def setUp(self):");
    push_line(&mut out, "        self.driver = webdriver.Chrome()");
    out.push('\n');
    push_line(&mut out, "    def tearDown(self):");
    push_line(&mut out, "        self.driver.quit()");
    for (index, case) in result.test_cases.iter().enumerate() {
        out.push('\n');
        push_line(&mut out, format!("    def {}(self):", names.get(index)));
        push_line(
            &mut out,
            format!("        \"\"\"{}: {}\"\"\"", case.id, double_quoted(&case.title)),
        );
        step_comments(&mut out, "        ", Framework::Selenium, case);
        push_line(&mut out, "        pass");
    }
    out.push_str("\n\n");
    push_line(&mut out, "if __name__ == \"__main__\":");
    push_line(&mut out, "    unittest.main()");
    out
}

fn junit(result: &GenerationResult, feature: &str, names: &Identifiers) -> String {
    let mut out = String::new();
    push_line(&mut out, "import org.junit.jupiter.api.DisplayName;");
    push_line(&mut out, "import org.junit.jupiter.api.Tag;");
    push_line(&mut out, "import org.junit.jupiter.api.Test;");
    out.push('\n');
    push_line(&mut out, format!("// Generated by {}", result.generator_name));
    push_line(&mut out, format!("class {}Test {{", class_name(feature)));
    for (index, case) in result.test_cases.iter().enumerate() {
        out.push('\n');
        push_line(&mut out, "    @Test");
        push_line(
            &mut out,
            format!("    @DisplayName(\"{}: {}\")", case.id, double_quoted(&case.title)),
        );
        push_line(&mut out, format!("    @Tag(\"{}\")", case.test_type.as_str()));
        push_line(&mut out, format!("    void {}() {{", names.get(index)));
        step_comments(&mut out, "        ", Framework::Junit, case);
        push_line(&mut out, "    }");
    }
    push_line(&mut out, "}");
    out
}
