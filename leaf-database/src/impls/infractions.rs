use anyhow::Context as _;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{
    database::Database,
    impls::{snowflake_from_i64, snowflake_to_i64, utc},
    model::infractions::{Infraction, InfractionFilters, InfractionType, NewInfraction},
};

#[derive(sqlx::FromRow)]
struct InfractionRow {
    id: i32,
    guild_id: i64,
    member_id: i64,
    moderator_id: i64,
    #[sqlx(rename = "type")]
    kind: InfractionType,
    reason: Option<String>,
    hidden: bool,
    created_at: NaiveDateTime,
    expires_at: Option<NaiveDateTime>,
}

/// Record a moderation action. `id`, `hidden` and `created_at` come from column defaults.
pub async fn record_infraction(
    db: &Database,
    new_infraction: NewInfraction<'_>,
) -> anyhow::Result<Infraction> {
    if new_infraction.duration_seconds.is_some() && !new_infraction.kind.is_time_limited() {
        anyhow::bail!(
            "{} infractions cannot carry an expiry",
            new_infraction.kind
        );
    }

    let guild_id = snowflake_to_i64(new_infraction.guild_id, "guild_id")?;
    let member_id = snowflake_to_i64(new_infraction.member_id, "member_id")?;
    let moderator_id = snowflake_to_i64(new_infraction.moderator_id, "moderator_id")?;
    let duration_seconds = new_infraction
        .duration_seconds
        .map(i64::try_from)
        .transpose()
        .context("duration_seconds out of i64 range")?;
    let reason = new_infraction
        .reason
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    let row: InfractionRow = sqlx::query_as(
        "INSERT INTO infractions (guild_id, member_id, moderator_id, type, reason, expires_at)
         VALUES ($1, $2, $3, $4, $5, (NOW() AT TIME ZONE 'utc') + $6::BIGINT * INTERVAL '1 second')
         RETURNING id, guild_id, member_id, moderator_id, type, reason, hidden, created_at, expires_at",
    )
    .bind(guild_id)
    .bind(member_id)
    .bind(moderator_id)
    .bind(new_infraction.kind)
    .bind(reason)
    .bind(duration_seconds)
    .fetch_one(db.pool())
    .await?;

    let infraction = to_infraction(row)?;
    tracing::info!(
        guild_id = infraction.guild_id,
        infraction_id = infraction.id,
        member_id = infraction.member_id,
        kind = %infraction.kind,
        "infraction recorded"
    );

    Ok(infraction)
}

pub async fn get_infraction(
    db: &Database,
    guild_id: u64,
    infraction_id: u64,
) -> anyhow::Result<Option<Infraction>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let infraction_id = i32::try_from(infraction_id).context("infraction_id out of i32 range")?;

    let row: Option<InfractionRow> = sqlx::query_as(
        "SELECT id, guild_id, member_id, moderator_id, type, reason, hidden, created_at, expires_at
         FROM infractions
         WHERE guild_id = $1 AND id = $2",
    )
    .bind(guild_id)
    .bind(infraction_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(to_infraction).transpose()
}

/// Newest first. Hidden infractions are skipped unless `include_hidden` is set.
pub async fn list_infractions(
    db: &Database,
    guild_id: u64,
    filters: InfractionFilters,
) -> anyhow::Result<Vec<Infraction>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let member_id = filters
        .member_id
        .map(|id| snowflake_to_i64(id, "member_id"))
        .transpose()?;
    let moderator_id = filters
        .moderator_id
        .map(|id| snowflake_to_i64(id, "moderator_id"))
        .transpose()?;
    let limit = i64::from(filters.limit.clamp(1, 200));

    let rows: Vec<InfractionRow> = sqlx::query_as(
        "SELECT id, guild_id, member_id, moderator_id, type, reason, hidden, created_at, expires_at
         FROM infractions
         WHERE guild_id = $1
           AND ($2::BIGINT IS NULL OR member_id = $2)
           AND ($3::BIGINT IS NULL OR moderator_id = $3)
           AND ($4::infraction_type IS NULL OR type = $4)
           AND ($5 OR hidden = FALSE)
         ORDER BY created_at DESC, id DESC
         LIMIT $6",
    )
    .bind(guild_id)
    .bind(member_id)
    .bind(moderator_id)
    .bind(filters.kind)
    .bind(filters.include_hidden)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(to_infraction).collect()
}

/// Count a member's visible infractions in a guild.
pub async fn count_infractions(db: &Database, guild_id: u64, member_id: u64) -> anyhow::Result<u64> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let member_id = snowflake_to_i64(member_id, "member_id")?;

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM infractions WHERE guild_id = $1 AND member_id = $2 AND hidden = FALSE",
    )
    .bind(guild_id)
    .bind(member_id)
    .fetch_one(db.pool())
    .await?;

    u64::try_from(count).context("infraction count out of u64 range")
}

pub async fn set_infraction_hidden(
    db: &Database,
    guild_id: u64,
    infraction_id: u64,
    hidden: bool,
) -> anyhow::Result<bool> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let infraction_id = i32::try_from(infraction_id).context("infraction_id out of i32 range")?;

    let updated = sqlx::query("UPDATE infractions SET hidden = $1 WHERE guild_id = $2 AND id = $3")
        .bind(hidden)
        .bind(guild_id)
        .bind(infraction_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(updated > 0)
}

pub async fn update_infraction_reason(
    db: &Database,
    guild_id: u64,
    infraction_id: u64,
    reason: Option<&str>,
) -> anyhow::Result<Option<Infraction>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let infraction_id = i32::try_from(infraction_id).context("infraction_id out of i32 range")?;
    let reason = reason.map(str::trim).filter(|reason| !reason.is_empty());

    let row: Option<InfractionRow> = sqlx::query_as(
        "UPDATE infractions
         SET reason = $1
         WHERE guild_id = $2 AND id = $3
         RETURNING id, guild_id, member_id, moderator_id, type, reason, hidden, created_at, expires_at",
    )
    .bind(reason)
    .bind(guild_id)
    .bind(infraction_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(to_infraction).transpose()
}

/// End a still-running mute or timeout now. Returns `false` if nothing was active.
pub async fn expire_infraction(
    db: &Database,
    guild_id: u64,
    infraction_id: u64,
) -> anyhow::Result<bool> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let infraction_id = i32::try_from(infraction_id).context("infraction_id out of i32 range")?;

    let updated = sqlx::query(
        "UPDATE infractions
         SET expires_at = NOW() AT TIME ZONE 'utc'
         WHERE guild_id = $1 AND id = $2 AND expires_at > NOW() AT TIME ZONE 'utc'",
    )
    .bind(guild_id)
    .bind(infraction_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Infractions across all guilds whose expiry falls in `(after, until]`, oldest expiry first.
pub async fn expired_infractions(
    db: &Database,
    after: DateTime<Utc>,
    until: DateTime<Utc>,
    limit: u32,
) -> anyhow::Result<Vec<Infraction>> {
    let limit = i64::from(limit.clamp(1, 500));

    let rows: Vec<InfractionRow> = sqlx::query_as(
        "SELECT id, guild_id, member_id, moderator_id, type, reason, hidden, created_at, expires_at
         FROM infractions
         WHERE expires_at > $1 AND expires_at <= $2
         ORDER BY expires_at ASC, guild_id ASC, id ASC
         LIMIT $3",
    )
    .bind(after.naive_utc())
    .bind(until.naive_utc())
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(to_infraction).collect()
}

fn to_infraction(row: InfractionRow) -> anyhow::Result<Infraction> {
    Ok(Infraction {
        id: u64::try_from(row.id).context("id row out of u64 range")?,
        guild_id: snowflake_from_i64(row.guild_id, "guild_id")?,
        member_id: snowflake_from_i64(row.member_id, "member_id")?,
        moderator_id: snowflake_from_i64(row.moderator_id, "moderator_id")?,
        kind: row.kind,
        reason: row.reason,
        hidden: row.hidden,
        created_at: utc(row.created_at),
        expires_at: row.expires_at.map(utc),
    })
}
