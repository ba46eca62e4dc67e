use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub guild_id: u64,
    pub owner_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: DateTime<Utc>,
    pub uses: u64,
    pub deleted: bool,
    pub original_tag_id: Option<u64>,
}

impl Tag {
    pub fn is_alias(&self) -> bool {
        self.original_tag_id.is_some()
    }

    pub fn was_edited(&self) -> bool {
        self.last_edited_at != self.created_at
    }
}

/// A tag looked up by name, with aliases followed to the tag that owns the content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTag {
    /// Name the caller asked for (the alias name when an alias was used).
    pub requested_name: String,
    pub tag: Tag,
}

#[derive(Clone, Debug)]
pub struct NewTag<'a> {
    pub guild_id: u64,
    pub owner_id: u64,
    pub name: &'a str,
    pub content: &'a str,
}

/// Result of a tag write that can collide with an existing live name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagWriteOutcome {
    Applied(Tag),
    NotFound,
    NameTaken,
}

impl TagWriteOutcome {
    pub fn applied(self) -> Option<Tag> {
        match self {
            TagWriteOutcome::Applied(tag) => Some(tag),
            TagWriteOutcome::NotFound | TagWriteOutcome::NameTaken => None,
        }
    }
}
