//! Parsing of the `source` field into text and link segments.
//!
//! Only the `[label](url)` form is recognised. Everything else is text.
//! Rendering is left to the caller so no markup is ever spliced together here.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_LINK: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSegment {
  Text(String),
  Link { label: String, url: String },
}

/// Split source text into an ordered sequence of segments
pub fn parse_source(text: &str) -> Vec<SourceSegment> {
  let mut segments = Vec::new();
  let mut cursor = 0;

  for captures in MARKDOWN_LINK.captures_iter(text) {
    let Some(whole) = captures.get(0) else {
      continue;
    };
    if whole.start() > cursor {
      segments.push(SourceSegment::Text(text[cursor..whole.start()].to_string()));
    }
    segments.push(SourceSegment::Link {
      label: captures[1].to_string(),
      url: captures[2].to_string(),
    });
    cursor = whole.end();
  }

  if cursor < text.len() {
    segments.push(SourceSegment::Text(text[cursor..].to_string()));
  }

  segments
}

/// Every link URL in the source, in order of appearance
pub fn source_links(text: &str) -> Vec<String> {
  parse_source(text)
    .into_iter()
    .filter_map(|segment| match segment {
      SourceSegment::Link { url, .. } => Some(url),
      SourceSegment::Text(_) => None,
    })
    .collect()
}
