use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

const MAX_TAGS: usize = 10;
const MAX_TAG_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) timestamp: DateTime<Utc>,
    #[serde(default)]
    pub(crate) likes: BTreeSet<String>,
    #[serde(default)]
    pub(crate) dislikes: BTreeSet<String>,
    #[serde(default)]
    pub(crate) comments: Vec<Comment>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Comment {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: normalize_description(&self.description)?,
            tags: normalize_tags(&self.tags)?,
        })
    }
}

/// How many posts carry a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagCount {
    pub(crate) tag: String,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum FeedSort {
    #[default]
    Recent,
    Popular,
}

impl FeedSort {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            FeedSort::Recent => "recent",
            FeedSort::Popular => "popular",
        }
    }
}

impl fmt::Display for FeedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSort {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "recent" => Ok(FeedSort::Recent),
            "popular" => Ok(FeedSort::Popular),
            _ => Err(DomainError::Validation {
                field: "sort",
                message: "must be 'recent' or 'popular'",
            }),
        }
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let len = title.chars().count();
    if !(3..=255).contains(&len) {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 3..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_description(description: &str) -> Result<String, DomainError> {
    let description = description.trim();
    if description.chars().count() < 10 {
        return Err(DomainError::Validation {
            field: "description",
            message: "must be at least 10 chars",
        });
    }
    Ok(description.to_string())
}

/// Each entry may hold several whitespace separated tags. Tags come back as
/// lowercase `#tag`, deduplicated, in the order given.
fn normalize_tags(raw: &[String]) -> Result<Vec<String>, DomainError> {
    let mut tags: Vec<String> = Vec::new();
    for token in raw.iter().flat_map(|entry| entry.split_whitespace()) {
        let name = token.trim_start_matches('#');
        if name.is_empty() {
            continue;
        }
        if name.chars().count() > MAX_TAG_CHARS {
            return Err(DomainError::Validation {
                field: "tags",
                message: "each tag must be at most 50 chars",
            });
        }

        let tag = format!("#{}", name.to_lowercase());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.len() > MAX_TAGS {
        return Err(DomainError::Validation {
            field: "tags",
            message: "at most 10 tags per post",
        });
    }
    Ok(tags)
}
