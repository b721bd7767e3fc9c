//! Parsing of `!answer` submission comments.
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::markers::ANSWER_COMMAND;
use crate::models::domain::{SubmissionError, SubmittedAnswer};

static ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(\d+)[.)](?:\s+(.*))?$").expect("ITEM_RE is a valid regex pattern")
});

/// Whether the comment is a submission at all. Anything else is ignored.
///
/// The command must open the comment (after whitespace) and be followed by
/// whitespace or the end of the body, so `!answers` is not a command.
pub fn is_answer_command(body: &str) -> bool {
    command_rest(body).is_some()
}

fn command_rest(body: &str) -> Option<&str> {
    let rest = body.trim_start().strip_prefix(ANSWER_COMMAND)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Extracts one answer per question from a submission body.
///
/// Items start with a numbered marker (`1.` or `1)`) at the beginning of a
/// line. Everything up to the next marker belongs to the item. A numbered line
/// indented deeper than the first item is part of the current answer. For a single
/// question an unnumbered body is accepted as the answer to question 1.
pub fn parse_answers(body: &str, count: usize) -> Result<Vec<SubmittedAnswer>, SubmissionError> {
    let rest = command_rest(body).ok_or(SubmissionError::MissingCommand)?;
    if rest.trim().is_empty() {
        return Err(SubmissionError::NoAnswers);
    }

    let mut items: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();

    // Indent of the first item; numbered lines indented deeper are a nested
    // list inside the current answer.
    let mut item_indent: Option<usize> = None;

    for (line_no, line) in rest.lines().enumerate() {
        let marker = ITEM_RE.captures(line).and_then(|capture| {
            // An item on the command line itself counts as unindented.
            let indent = if line_no == 0 { 0 } else { capture[1].chars().count() };
            match item_indent {
                Some(base) if indent > base => None,
                _ => Some((indent, capture)),
            }
        });

        match marker {
            Some((indent, capture)) => {
                item_indent.get_or_insert(indent);
                let index = capture[2].parse::<usize>().unwrap_or(usize::MAX);
                let first = capture.get(3).map_or("", |m| m.as_str());
                items.push((index, vec![first]));
            }
            None => match items.last_mut() {
                Some((_, lines)) => lines.push(line),
                None => preamble.push(line),
            },
        }
    }

    let preamble_text = preamble.join("\n").trim().to_string();
    if items.is_empty() {
        if count == 1 {
            return Ok(vec![SubmittedAnswer {
                index: 1,
                text: preamble_text,
            }]);
        }
        return Err(SubmissionError::MissingIndices((1..=count).collect()));
    }
    if !preamble_text.is_empty() {
        return Err(SubmissionError::TextBeforeFirstItem);
    }

    let mut answers: BTreeMap<usize, String> = BTreeMap::new();
    let mut duplicates: Vec<usize> = Vec::new();
    for (index, lines) in items {
        if index == 0 || index > count {
            return Err(SubmissionError::OutOfRange { index, count });
        }
        let text = lines.join("\n").trim().to_string();
        if answers.insert(index, text).is_some() && !duplicates.contains(&index) {
            duplicates.push(index);
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        return Err(SubmissionError::DuplicateIndices(duplicates));
    }

    let missing: Vec<usize> = (1..=count).filter(|i| !answers.contains_key(i)).collect();
    if !missing.is_empty() {
        return Err(SubmissionError::MissingIndices(missing));
    }

    let empty: Vec<usize> = answers
        .iter()
        .filter(|(_, text)| text.is_empty())
        .map(|(index, _)| *index)
        .collect();
    if !empty.is_empty() {
        return Err(SubmissionError::EmptyAnswers(empty));
    }

    Ok(answers
        .into_iter()
        .map(|(index, text)| SubmittedAnswer { index, text })
        .collect())
}
