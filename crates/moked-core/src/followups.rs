//! Follow-up suggestion extraction.
//!
//! The assistant may end its answer with an in-band marker of the form
//! `[<label>: option1 | option2 | option3]`. The marker is stripped from the
//! displayed content and each pipe-separated option becomes a clickable
//! suggestion chip. The convention is fragile by nature (structured data
//! inside free text), so parsing is strict: anything that does not look
//! exactly like a closed, labelled, pipe-separated trailer is left alone.

/// Result of scanning a completed answer for a trailing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub content: String,
    pub suggestions: Vec<String>,
}

/// Strip a trailing follow-up marker from `text`, if present.
///
/// Idempotent: text without a well-formed marker is returned unchanged with
/// no suggestions. A marker must be the last thing in the text, closed,
/// contain a `label:` prefix and at least one `|` separator.
pub fn extract(text: &str) -> Extracted {
    let trimmed = text.trim_end();

    let marker = trimmed
        .ends_with(']')
        .then(|| trimmed.rfind('['))
        .flatten()
        .and_then(|open| parse_marker(&trimmed[open + 1..trimmed.len() - 1]).map(|s| (open, s)));

    match marker {
        Some((open, suggestions)) => Extracted {
            content: trimmed[..open].trim_end().to_string(),
            suggestions,
        },
        None => Extracted {
            content: text.to_string(),
            suggestions: Vec::new(),
        },
    }
}

/// The part of a still-streaming answer that is safe to display.
///
/// A trailing `[` that has not been closed yet may be the start of a
/// follow-up marker; hide it until the stream either closes it (it will be
/// stripped on completion) or moves past it.
pub fn visible_prefix(text: &str) -> &str {
    match text.rfind('[') {
        Some(open) if !text[open..].contains(']') => text[..open].trim_end(),
        _ => text,
    }
}

fn parse_marker(inner: &str) -> Option<Vec<String>> {
    let (label, options) = inner.split_once(':')?;
    if label.trim().is_empty() || !options.contains('|') {
        return None;
    }
    let suggestions: Vec<String> = options
        .split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (suggestions.len() >= 2).then_some(suggestions)
}
