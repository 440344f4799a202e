//! Conversion of loosely shaped CMS records into [`Post`].
//!
//! Relations come back in whatever form the query expanded them: a category
//! may be an object, a bare key or `null`; tags may be tag objects or junction
//! rows wrapping a tag under `tags_id`. Normalisation never fails. A malformed
//! substructure degrades to "absent" and the rest of the record survives.

use rehive_api_types::{ImageRef, RawPost};
use serde_json::{Map, Value};

use super::posts::{Category, Post, Tag};
use super::types::PostStatus;

/// Junction column Directus uses for the posts ↔ tags M2M relation.
pub const TAG_JUNCTION_FIELD: &str = "tags_id";

/// One element of the raw `tags` array.
#[derive(Debug, Clone, Copy)]
enum RawTagEntry<'a> {
    /// A junction row; the tag itself sits under [`TAG_JUNCTION_FIELD`].
    Junction(&'a Value),
    /// The tag object itself.
    Bare(&'a Map<String, Value>),
}

impl<'a> RawTagEntry<'a> {
    fn classify(value: &'a Value) -> Option<Self> {
        let object = value.as_object()?;
        match object.get(TAG_JUNCTION_FIELD) {
            Some(nested) if !nested.is_null() => Some(Self::Junction(nested)),
            _ => Some(Self::Bare(object)),
        }
    }

    fn into_tag(self) -> Option<Tag> {
        let object = match self {
            Self::Junction(nested) => nested.as_object()?,
            Self::Bare(object) => object,
        };
        let (id, name, slug) = named_fields(object)?;
        Some(Tag { id, name, slug })
    }
}

pub fn normalize_post(raw: RawPost) -> Post {
    let RawPost {
        id,
        title,
        slug,
        content,
        excerpt,
        featured_image,
        status,
        date_created,
        date_updated,
        category,
        tags,
        reading_time,
        extra: _,
    } = raw;

    Post {
        id: id.into_string(),
        title: title.unwrap_or_default(),
        slug: slug.unwrap_or_default(),
        content: content.unwrap_or_default(),
        excerpt,
        featured_image: ImageRef::from_value(&featured_image),
        status: status
            .as_deref()
            .map_or(PostStatus::Unknown, PostStatus::parse),
        date_created,
        date_updated,
        category: normalize_category(&category),
        tags: normalize_tags(&tags),
        reading_time: normalize_reading_time(&reading_time),
    }
}

/// A category survives only as an object with string `id`, `name` and `slug`.
pub fn normalize_category(value: &Value) -> Option<Category> {
    let (id, name, slug) = named_fields(value.as_object()?)?;
    Some(Category { id, name, slug })
}

/// Valid tags in input order; anything that is not an array yields no tags.
pub fn normalize_tags(value: &Value) -> Vec<Tag> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(RawTagEntry::classify)
        .filter_map(RawTagEntry::into_tag)
        .collect()
}

/// Numbers are taken as minutes; strings are parsed as a base-10 integer
/// prefix (`"12 min"` is 12). Everything else, including negatives, is absent.
pub fn normalize_reading_time(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(minutes) = number.as_u64() {
                return u32::try_from(minutes).ok();
            }
            let minutes = number.as_f64()?;
            if minutes.is_finite() && minutes >= 0.0 && minutes <= f64::from(u32::MAX) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let whole = minutes.trunc() as u32;
                Some(whole)
            } else {
                None
            }
        }
        Value::String(text) => parse_integer_prefix(text).and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

fn parse_integer_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn named_fields(object: &Map<String, Value>) -> Option<(String, String, String)> {
    let field = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_string);
    Some((field("id")?, field("name")?, field("slug")?))
}
