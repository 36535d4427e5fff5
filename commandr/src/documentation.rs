//! Command summaries and per-argument help from documentation text
//!
//! The recognized layout is a free-form summary followed by an `Arguments:`
//! block of `name - description` lines:
//!
//! ```text
//! Greet someone.
//!
//! Arguments:
//!   name - Name to greet.
//!   times - Number of time to say the greeting.
//! ```
//!
//! A line inside the block that does not start a new entry continues the
//! previous description. The block ends at the first blank line.

use indexmap::IndexMap;

const ARGUMENTS_MARKER: &str = "Arguments:";

enum State {
    Summary,
    Block,
    Done,
}

/// Summary and argument help parsed from a callable's documentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    summary: String,
    arguments: IndexMap<String, String>,
}

impl Documentation {
    /// Parse documentation text; empty or missing text is valid
    pub fn parse(text: &str) -> Self {
        let lines = dedent(text);
        let mut summary = Vec::new();
        let mut arguments: IndexMap<String, String> = IndexMap::new();
        let mut state = State::Summary;
        let mut last: Option<String> = None;

        for line in &lines {
            let trimmed = line.trim();
            match state {
                State::Summary => {
                    if trimmed == ARGUMENTS_MARKER {
                        state = State::Block;
                    } else {
                        summary.push(line.as_str());
                    }
                }
                State::Block if trimmed.is_empty() => {
                    if !arguments.is_empty() {
                        state = State::Done;
                    }
                }
                State::Block => match parse_entry(trimmed) {
                    Some((name, description)) => {
                        arguments.insert(name.to_string(), description.to_string());
                        last = Some(name.to_string());
                    }
                    None => {
                        if let Some(description) =
                            last.as_ref().and_then(|name| arguments.get_mut(name))
                        {
                            if !description.is_empty() {
                                description.push(' ');
                            }
                            description.push_str(trimmed);
                        }
                    }
                },
                State::Done => break,
            }
        }

        Self {
            summary: summary.join("\n").trim().to_string(),
            arguments,
        }
    }

    /// Text preceding the `Arguments:` block
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// First paragraph of the summary, suitable as a one-line description
    pub fn short_summary(&self) -> String {
        first_paragraph(&self.summary)
    }

    /// Help text for `name`, empty when the argument is not documented
    pub fn help_for(&self, name: &str) -> &str {
        self.arguments.get(name).map(String::as_str).unwrap_or("")
    }

    /// All documented arguments in the order they appear
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.arguments
            .iter()
            .map(|(name, help)| (name.as_str(), help.as_str()))
    }
}

/// Text up to the first blank line, joined onto one line
pub fn first_paragraph(text: &str) -> String {
    dedent(text)
        .iter()
        .map(|line| line.trim())
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let (name, description) = line.split_once(" - ")?;
    let name = name.trim();
    let is_identifier = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    is_identifier.then(|| (name, description.trim()))
}

/// Strip the indentation common to every non-blank line
fn dedent(text: &str) -> Vec<String> {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.get(indent..).unwrap_or(line).trim_end().to_string()
            }
        })
        .collect()
}
