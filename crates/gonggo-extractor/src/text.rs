//! Document text assembly

use crate::types::JobInput;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static SCRIPT_OR_STYLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").ok());

static BLOCK_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|li|h[1-6]|table|dd|dt)\s*>").ok()
});

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

static NUMERIC_ENTITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"&#(?:([0-9]{1,7})|[xX]([0-9a-fA-F]{1,6}));").ok());

/// Combined source text for a job
///
/// Primary document text, then the detail page with markup removed, then
/// the description. Every non-empty source is kept, separated by a blank
/// line.
pub fn compose_text(input: &JobInput) -> String {
    let detail = input.detail_html.as_deref().map(strip_html);

    [
        input.document_text.as_deref(),
        detail.as_deref(),
        input.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Plain text of an HTML fragment
///
/// Drops scripts and styles, turns block ends into line breaks, removes
/// tags, decodes entities and collapses whitespace within lines.
pub fn strip_html(html: &str) -> String {
    let mut text = html.to_string();
    if let Some(re) = SCRIPT_OR_STYLE.as_ref() {
        text = re.replace_all(&text, " ").into_owned();
    }
    if let Some(re) = BLOCK_BREAK.as_ref() {
        text = re.replace_all(&text, "\n").into_owned();
    }
    if let Some(re) = TAG.as_ref() {
        text = re.replace_all(&text, " ").into_owned();
    }
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&middot;", "·");

    let decoded = match NUMERIC_ENTITY.as_ref() {
        Some(re) => re
            .replace_all(&named, |caps: &Captures| {
                let code = match (caps.get(1), caps.get(2)) {
                    (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                    (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                    _ => None,
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned(),
        None => named,
    };

    // Last, so "&amp;lt;" decodes to "&lt;" and not "<"
    decoded.replace("&amp;", "&")
}

/// The first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
