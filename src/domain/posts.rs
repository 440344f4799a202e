//! Post entities and the text helpers used when presenting them.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::{RewriteStrSettings, doc_text, html_content::TextType, rewrite_str};
use rehive_api_types::ImageRef;
use time::{
    Date, OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

use tracing::warn;

use super::types::PostStatus;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
const ISO_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A post after normalisation. Produced only by
/// [`normalize_post`](super::normalize::normalize_post).
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<ImageRef>,
    pub status: PostStatus,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    /// Minutes as stored in the CMS. Fractional values are truncated and
    /// negative ones treated as missing.
    pub reading_time: Option<u32>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Excerpt for cards and meta descriptions: the explicit excerpt when
    /// present, otherwise the content with markup removed.
    pub fn summary_text(&self, max_chars: usize) -> String {
        let source = match self.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => collapse_whitespace(&strip_html(&self.content)),
        };
        truncate_excerpt(&source, max_chars)
    }

    /// Stored estimate when the CMS supplied one, otherwise derived from the body.
    pub fn reading_minutes(&self) -> u32 {
        self.reading_time.unwrap_or_else(|| {
            let minutes = reading_minutes_from_html(&self.content, DEFAULT_WORDS_PER_MINUTE);
            u32::try_from(minutes).unwrap_or(u32::MAX)
        })
    }

    pub fn display_date(&self) -> String {
        self.date_created
            .as_deref()
            .map(format_human_date)
            .unwrap_or_default()
    }
}

/// Format a CMS timestamp as `November 25, 2024`.
///
/// Empty input yields an empty string; input that is not a recognisable date
/// is returned unchanged.
pub fn format_human_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    parse_date(trimmed)
        .and_then(|date| date.format(HUMAN_DATE_FORMAT).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Calendar date of a CMS timestamp, for `datetime` attributes.
pub fn iso_date(raw: &str) -> Option<String> {
    parse_date(raw.trim()).and_then(|date| date.format(ISO_DATE_FORMAT).ok())
}

fn parse_date(raw: &str) -> Option<Date> {
    if let Ok(datetime) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(datetime.date());
    }
    // Directus omits the offset for `timestamp` columns without time zone.
    raw.get(..10)
        .and_then(|prefix| Date::parse(prefix, ISO_DATE_FORMAT).ok())
}

/// Estimated minutes to read an HTML body: `0` when there are no words,
/// otherwise at least one minute.
pub fn reading_minutes_from_html(html: &str, words_per_minute: usize) -> usize {
    let words = strip_html(html).split_whitespace().count();
    if words == 0 {
        return 0;
    }
    words.div_ceil(words_per_minute.max(1)).max(1)
}

/// Truncate to `max_chars` characters, trimming the cut and appending `...`.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim())
}

/// Text content of an HTML fragment with entities decoded. Script, style and
/// other raw-text content is dropped; each text node ends with a space so
/// words in adjacent elements stay apart.
pub fn strip_html(html: &str) -> String {
    let text = Rc::new(RefCell::new(String::with_capacity(html.len())));
    let node = Rc::new(RefCell::new(String::new()));

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!({
                let text = Rc::clone(&text);
                let node = Rc::clone(&node);
                move |chunk| {
                    if chunk.text_type() != TextType::Data {
                        return Ok(());
                    }
                    let mut node = node.borrow_mut();
                    node.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let mut text = text.borrow_mut();
                        text.push_str(&decode_entities(&node));
                        text.push(' ');
                        node.clear();
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );
    if let Err(err) = result {
        warn!(
            target = "rehive::domain::posts",
            error = %err,
            "failed to extract text from post body"
        );
    }

    let mut extracted = text.take();
    extracted.push_str(&decode_entities(&node.take()));
    extracted
}

/// Decode character references in HTML text: the common named ones and
/// numeric references. Anything else is kept verbatim.
fn decode_entities(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];
        let reference = tail
            .find(';')
            .filter(|end| *end <= 12)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match reference {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
