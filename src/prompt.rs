//! Prompt template loading and rendering
//!
//! Templates use `{forecast}` as their only placeholder name, matched
//! exactly. It may appear more than once and every occurrence receives
//! the same forecast text. `{{` and `}}` produce literal braces.
//! Newlines are stripped at load time so the rendered prompt is a
//! single line.

use crate::{BriefError, Result};
use std::path::Path;

/// Fixed name of the template file inside the working directory
pub const TEMPLATE_FILE_NAME: &str = "template.txt";

/// Name of the placeholder substituted with the forecast table
pub const FORECAST_PLACEHOLDER: &str = "forecast";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Forecast,
}

/// Parsed prompt template whose only placeholder name is `forecast`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

/// Template with the forecast substituted, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt(String);

impl RenderedPrompt {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RenderedPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PromptTemplate {
    /// Load and parse the template file, flattening it to one line
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BriefError::template(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&contents.replace(['\r', '\n'], ""))
    }

    /// Parse template text
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(BriefError::template(format!(
                                    "Unclosed placeholder '{{{name}'"
                                )));
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    if name != FORECAST_PLACEHOLDER {
                        return Err(BriefError::template(format!(
                            "Unknown placeholder '{{{name}}}', only {{{FORECAST_PLACEHOLDER}}} is supported"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Forecast);
                }
                '}' => {
                    return Err(BriefError::template(
                        "Single '}' found; use '}}' for a literal brace",
                    ));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.contains(&Segment::Forecast) {
            return Err(BriefError::template(format!(
                "Template has no {{{FORECAST_PLACEHOLDER}}} placeholder"
            )));
        }

        Ok(Self { segments })
    }

    /// Substitute `forecast` into every placeholder
    #[must_use]
    pub fn render(&self, forecast: &str) -> RenderedPrompt {
        let rendered: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Forecast => forecast,
            })
            .collect();
        RenderedPrompt(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_render_substitutes_forecast() {
        let template = PromptTemplate::parse("Summarize: {forecast} Thanks.").unwrap();
        let rendered = template.render("08:00 14.0");
        assert_eq!(rendered.as_str(), "Summarize: 08:00 14.0 Thanks.");
    }

    #[test]
    fn test_render_is_pure() {
        let template = PromptTemplate::parse("Weather: {forecast}").unwrap();
        assert_eq!(template.render("table"), template.render("table"));
    }

    #[test]
    fn test_forecast_text_is_not_reinterpreted() {
        let template = PromptTemplate::parse("{forecast}").unwrap();
        let rendered = template.render("{forecast} {{x}}");
        assert_eq!(rendered.as_str(), "{forecast} {{x}}");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = PromptTemplate::parse("Reply as {{\"summary\": ...}} for {forecast}").unwrap();
        assert_eq!(
            template.render("today").as_str(),
            "Reply as {\"summary\": ...} for today"
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = PromptTemplate::parse("{forecast}|{forecast}").unwrap();
        assert_eq!(template.render("x").as_str(), "x|x");
    }

    #[rstest]
    #[case("No placeholder here")]
    #[case("")]
    #[case("Escaped only {{forecast}}")]
    #[case("Wrong name {weather}")]
    #[case("Padded name { forecast }")]
    #[case("Cased name {Forecast}")]
    #[case("Unclosed {forecast")]
    #[case("Stray } brace {forecast}")]
    fn test_invalid_templates(#[case] text: &str) {
        let err = PromptTemplate::parse(text).unwrap_err();
        assert!(matches!(err, BriefError::Template { .. }));
    }

    #[test]
    fn test_load_strips_newlines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TEMPLATE_FILE_NAME);
        std::fs::write(&path, "You are a forecaster.\nToday:\r\n{forecast}\n").unwrap();

        let template = PromptTemplate::load(&path).unwrap();
        assert_eq!(
            template.render("T").as_str(),
            "You are a forecaster.Today:T"
        );
    }

    #[test]
    fn test_load_missing_file_is_template_error() {
        let dir = TempDir::new().unwrap();
        let err = PromptTemplate::load(&dir.path().join(TEMPLATE_FILE_NAME)).unwrap_err();
        assert!(matches!(err, BriefError::Template { .. }));
    }
}
