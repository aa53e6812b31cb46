//! Classification of raw input text into styled spans.
//!
//! The classifier is a pure function: it never looks at the mention state and
//! is re-run on every text change. The produced spans always partition the
//! input exactly, so renderers can lay them out back to back.

use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

/// One alternation per span kind, tried in this order at every position.
/// URLs come first so that a domain fragment is never read as a mention or
/// hashtag.
const SPAN_PATTERN: &str = concat!(
    r"(?P<url>(?:https?://)?(?:www\.)?[a-zA-Z0-9-]+(?:\.[a-zA-Z]{2,})+(?:/[^\s]*)?)",
    r"|(?P<mention>@\w+)",
    r"|(?P<hashtag>#\w+)",
);

#[allow(clippy::expect_used)]
static SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SPAN_PATTERN).expect("span pattern should compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Url,
    Mention,
    Hashtag,
    Normal,
}

/// A non-empty slice of the source text tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub kind: SpanKind,
}

impl Span {
    pub fn new(text: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Like [`Span`] but borrowing the source and carrying its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRange<'a> {
    pub range: Range<usize>,
    pub text: &'a str,
    pub kind: SpanKind,
}

/// Split `text` into an ordered, lossless sequence of spans.
///
/// Returns an empty list for empty input.
pub fn classify(text: &str) -> Vec<Span> {
    classify_ranges(text)
        .into_iter()
        .map(|span| Span::new(span.text, span.kind))
        .collect()
}

/// Same partition as [`classify`], borrowing from `text` and reporting the
/// byte range of each span.
pub fn classify_ranges(text: &str) -> Vec<SpanRange<'_>> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for caps in SPAN_REGEX.captures_iter(text) {
        let (m, kind) = if let Some(m) = caps.name("url") {
            (m, SpanKind::Url)
        } else if let Some(m) = caps.name("mention") {
            (m, SpanKind::Mention)
        } else if let Some(m) = caps.name("hashtag") {
            (m, SpanKind::Hashtag)
        } else {
            continue;
        };

        push_normal(&mut spans, text, last_end..m.start());
        spans.push(SpanRange {
            range: m.range(),
            text: m.as_str(),
            kind,
        });
        last_end = m.end();
    }

    push_normal(&mut spans, text, last_end..text.len());
    tracing::trace!(spans = spans.len(), "classified input text");
    spans
}

fn push_normal<'a>(spans: &mut Vec<SpanRange<'a>>, text: &'a str, range: Range<usize>) {
    if range.is_empty() {
        return;
    }
    if let Some(slice) = text.get(range.clone()) {
        spans.push(SpanRange {
            range,
            text: slice,
            kind: SpanKind::Normal,
        });
    }
}
