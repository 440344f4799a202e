//! Shared domain enumerations aligned with the CMS `status` column.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
    #[serde(other)]
    Unknown,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
            PostStatus::Unknown => "unknown",
        }
    }

    /// Map the raw column value; anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "draft" => PostStatus::Draft,
            "published" => PostStatus::Published,
            "archived" => PostStatus::Archived,
            _ => PostStatus::Unknown,
        }
    }
}
