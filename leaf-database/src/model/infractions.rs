use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mirrors the `infraction_type` PostgreSQL enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "infraction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InfractionType {
    Warning,
    NicknameChange,
    VoiceMute,
    Timeout,
    Kick,
    Ban,
}

impl InfractionType {
    pub const ALL: [InfractionType; 6] = [
        InfractionType::Warning,
        InfractionType::NicknameChange,
        InfractionType::VoiceMute,
        InfractionType::Timeout,
        InfractionType::Kick,
        InfractionType::Ban,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfractionType::Warning => "warning",
            InfractionType::NicknameChange => "nickname_change",
            InfractionType::VoiceMute => "voice_mute",
            InfractionType::Timeout => "timeout",
            InfractionType::Kick => "kick",
            InfractionType::Ban => "ban",
        }
    }

    /// Whether rows of this type may carry an `expires_at`.
    pub fn is_time_limited(&self) -> bool {
        matches!(self, InfractionType::VoiceMute | InfractionType::Timeout)
    }
}

impl fmt::Display for InfractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfractionType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "warning" | "warn" => Ok(InfractionType::Warning),
            "nickname_change" | "nickname" | "nick" => Ok(InfractionType::NicknameChange),
            "voice_mute" | "mute" | "vmute" => Ok(InfractionType::VoiceMute),
            "timeout" => Ok(InfractionType::Timeout),
            "kick" => Ok(InfractionType::Kick),
            "ban" => Ok(InfractionType::Ban),
            _ => anyhow::bail!("unknown infraction type `{}`", raw.trim()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infraction {
    pub id: u64,
    pub guild_id: u64,
    pub member_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionType,
    pub reason: Option<String>,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Infraction {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Input for recording a new infraction; `id`, `hidden` and `created_at` use column defaults.
#[derive(Clone, Debug)]
pub struct NewInfraction<'a> {
    pub guild_id: u64,
    pub member_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionType,
    pub reason: Option<&'a str>,
    pub duration_seconds: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct InfractionFilters {
    pub member_id: Option<u64>,
    pub moderator_id: Option<u64>,
    pub kind: Option<InfractionType>,
    pub include_hidden: bool,
    pub limit: u32,
}

impl Default for InfractionFilters {
    fn default() -> Self {
        Self {
            member_id: None,
            moderator_id: None,
            kind: None,
            include_hidden: false,
            limit: 25,
        }
    }
}
