use anyhow::Context as _;
use chrono::NaiveDateTime;
use leaf_utils::{
    fuzzy::{SIMILARITY_THRESHOLD, similarity},
    parse::{escape_like, normalize_tag_name},
};
use tracing::{debug, info, warn};

use crate::{
    cache::{TAG_AUTOCOMPLETE_TTL, tag_autocomplete_key, tag_generation_key},
    database::Database,
    impls::{snowflake_from_i64, snowflake_to_i64, utc},
    model::tags::{NewTag, ResolvedTag, Tag, TagWriteOutcome},
};

/// Discord caps autocomplete choices at 25.
pub const AUTOCOMPLETE_LIMIT: i64 = 25;

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    guild_id: i64,
    owner_id: i64,
    content: String,
    created_at: NaiveDateTime,
    last_edited_at: NaiveDateTime,
    uses: i32,
    deleted: bool,
    original_tag_id: Option<i64>,
}

/// Create a tag. Returns `None` when a live tag already uses the name in this guild.
pub async fn create_tag(db: &Database, new_tag: NewTag<'_>) -> anyhow::Result<Option<Tag>> {
    let name = valid_name(new_tag.name)?;
    let content = valid_content(new_tag.content)?;
    let guild_id = snowflake_to_i64(new_tag.guild_id, "guild_id")?;
    let owner_id = snowflake_to_i64(new_tag.owner_id, "owner_id")?;

    let row: Option<TagRow> = sqlx::query_as(
        "INSERT INTO tags (name, guild_id, owner_id, content)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (name, guild_id) WHERE deleted = FALSE DO NOTHING
         RETURNING id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id",
    )
    .bind(name)
    .bind(guild_id)
    .bind(owner_id)
    .bind(content)
    .fetch_optional(db.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let tag = to_tag(row)?;
    info!(guild_id = tag.guild_id, tag_id = tag.id, name = %tag.name, "tag created");
    invalidate_tag_names(db, tag.guild_id).await;

    Ok(Some(tag))
}

/// Create `alias` pointing at the live tag `target`. Aliases of aliases point at the root tag.
pub async fn create_tag_alias(
    db: &Database,
    guild_id: u64,
    owner_id: u64,
    alias: &str,
    target: &str,
) -> anyhow::Result<TagWriteOutcome> {
    let alias = valid_name(alias)?;
    let guild_id_i64 = snowflake_to_i64(guild_id, "guild_id")?;
    let owner_id_i64 = snowflake_to_i64(owner_id, "owner_id")?;

    let mut tx = db.pool().begin().await?;

    let target_row: Option<(i64, Option<i64>, String)> = sqlx::query_as(
        "SELECT id, original_tag_id, content
         FROM tags
         WHERE name = $1 AND guild_id = $2 AND deleted = FALSE
         FOR UPDATE",
    )
    .bind(target.trim())
    .bind(guild_id_i64)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((target_id, target_original_id, content)) = target_row else {
        tx.rollback().await?;
        return Ok(TagWriteOutcome::NotFound);
    };
    let root_id = target_original_id.unwrap_or(target_id);

    let row: Option<TagRow> = sqlx::query_as(
        "INSERT INTO tags (name, guild_id, owner_id, content, original_tag_id)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (name, guild_id) WHERE deleted = FALSE DO NOTHING
         RETURNING id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id",
    )
    .bind(alias)
    .bind(guild_id_i64)
    .bind(owner_id_i64)
    .bind(content)
    .bind(root_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(TagWriteOutcome::NameTaken);
    };

    tx.commit().await?;

    let tag = to_tag(row)?;
    info!(guild_id, tag_id = tag.id, original_tag_id = root_id, name = %tag.name, "tag alias created");
    invalidate_tag_names(db, guild_id).await;

    Ok(TagWriteOutcome::Applied(tag))
}

/// Look up a live tag by exact name. Aliases are returned as stored, not resolved.
pub async fn get_tag(db: &Database, guild_id: u64, name: &str) -> anyhow::Result<Option<Tag>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;

    let row: Option<TagRow> = sqlx::query_as(
        "SELECT id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id
         FROM tags
         WHERE name = $1 AND guild_id = $2 AND deleted = FALSE",
    )
    .bind(name.trim())
    .bind(guild_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(to_tag).transpose()
}

/// Fetch any tag row by its surrogate id, deleted or not.
pub async fn get_tag_by_id(db: &Database, tag_id: u64) -> anyhow::Result<Option<Tag>> {
    let tag_id = i64::try_from(tag_id).context("tag_id out of i64 range")?;

    let row: Option<TagRow> = sqlx::query_as(
        "SELECT id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id
         FROM tags
         WHERE id = $1",
    )
    .bind(tag_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(to_tag).transpose()
}

/// Resolve `name` (following an alias to its live original) and count one use on the resolved tag.
pub async fn use_tag(db: &Database, guild_id: u64, name: &str) -> anyhow::Result<Option<ResolvedTag>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let requested_name = name.trim();

    let row: Option<TagRow> = sqlx::query_as(
        "WITH requested AS (
            SELECT COALESCE(original_tag_id, id) AS target_id
            FROM tags
            WHERE name = $1 AND guild_id = $2 AND deleted = FALSE
        )
        UPDATE tags AS t
        SET uses = t.uses + 1
        FROM requested
        WHERE t.id = requested.target_id AND t.deleted = FALSE
        RETURNING t.id, t.name, t.guild_id, t.owner_id, t.content, t.created_at, t.last_edited_at, t.uses, t.deleted, t.original_tag_id",
    )
    .bind(requested_name)
    .bind(guild_id)
    .fetch_optional(db.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(ResolvedTag {
        requested_name: requested_name.to_owned(),
        tag: to_tag(row)?,
    }))
}

/// Live tags in a guild, optionally only those owned by `owner_id`, ordered by name.
pub async fn list_tags(
    db: &Database,
    guild_id: u64,
    owner_id: Option<u64>,
) -> anyhow::Result<Vec<Tag>> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let owner_id = owner_id
        .map(|id| snowflake_to_i64(id, "owner_id"))
        .transpose()?;

    let rows: Vec<TagRow> = sqlx::query_as(
        "SELECT id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id
         FROM tags
         WHERE guild_id = $1 AND deleted = FALSE AND ($2::BIGINT IS NULL OR owner_id = $2)
         ORDER BY name ASC",
    )
    .bind(guild_id)
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(to_tag).collect()
}

/// Fuzzy search over the live tag names of a guild, best match first.
///
/// Names scoring below [`SIMILARITY_THRESHOLD`] are dropped, so typos,
/// plurals and reordered words still find a tag while unrelated names do not.
pub async fn search_tags(
    db: &Database,
    guild_id: u64,
    query: &str,
    limit: u32,
) -> anyhow::Result<Vec<Tag>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let limit = usize::try_from(limit.clamp(1, 100)).context("search limit out of range")?;

    let rows: Vec<TagRow> = sqlx::query_as(
        "SELECT id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id
         FROM tags
         WHERE guild_id = $1 AND deleted = FALSE",
    )
    .bind(guild_id)
    .fetch_all(db.pool())
    .await?;

    let mut scored: Vec<(f64, Tag)> = rows
        .into_iter()
        .map(to_tag)
        .filter_map(|tag| match tag {
            Ok(tag) => {
                let score = similarity(query, &tag.name);
                (score >= SIMILARITY_THRESHOLD).then_some(Ok((score, tag)))
            }
            Err(e) => Some(Err(e)),
        })
        .collect::<anyhow::Result<_>>()?;

    scored.sort_by(|(left_score, left), (right_score, right)| {
        right_score
            .total_cmp(left_score)
            .then_with(|| left.name.cmp(&right.name))
    });
    scored.truncate(limit);

    debug!(guild_id, query, matches = scored.len(), "tag search ranked");

    Ok(scored.into_iter().map(|(_, tag)| tag).collect())
}

/// Live tag names starting with `prefix` (case-insensitive), served from cache when possible.
pub async fn autocomplete_tag_names(
    db: &Database,
    guild_id: u64,
    prefix: &str,
) -> anyhow::Result<Vec<String>> {
    let guild_id_i64 = snowflake_to_i64(guild_id, "guild_id")?;
    let cache = db.cache();

    let generation = match cache.counter(&tag_generation_key(cache, guild_id)).await {
        Ok(generation) => generation,
        Err(e) => {
            warn!(?e, guild_id, "tag generation lookup failed; using generation 0");
            0
        }
    };
    let key = tag_autocomplete_key(cache, guild_id, generation, prefix);
    let pattern = format!("{}%", escape_like(prefix.trim()));

    cache
        .get_or_load_json(&key, TAG_AUTOCOMPLETE_TTL, || async move {
            let names: Vec<String> = sqlx::query_scalar(
                "SELECT name
                 FROM tags
                 WHERE guild_id = $1 AND deleted = FALSE AND name ILIKE $2
                 ORDER BY name ASC
                 LIMIT $3",
            )
            .bind(guild_id_i64)
            .bind(pattern)
            .bind(AUTOCOMPLETE_LIMIT)
            .fetch_all(db.pool())
            .await?;

            Ok::<_, anyhow::Error>(names)
        })
        .await
}

/// Replace a tag's content. Aliases cannot be edited directly; their stored copy follows the original.
pub async fn edit_tag_content(
    db: &Database,
    guild_id: u64,
    name: &str,
    content: &str,
) -> anyhow::Result<bool> {
    let content = valid_content(content)?;
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;

    let edited: i64 = sqlx::query_scalar(
        "WITH edited AS (
            UPDATE tags
            SET content = $1, last_edited_at = NOW() AT TIME ZONE 'utc'
            WHERE name = $2 AND guild_id = $3 AND deleted = FALSE AND original_tag_id IS NULL
            RETURNING id
        ), synced AS (
            UPDATE tags
            SET content = $1
            FROM edited
            WHERE tags.original_tag_id = edited.id
        )
        SELECT COUNT(*) FROM edited",
    )
    .bind(content)
    .bind(name.trim())
    .bind(guild_id)
    .fetch_one(db.pool())
    .await?;

    Ok(edited > 0)
}

pub async fn rename_tag(
    db: &Database,
    guild_id: u64,
    name: &str,
    new_name: &str,
) -> anyhow::Result<TagWriteOutcome> {
    let new_name = valid_name(new_name)?;
    let guild_id_i64 = snowflake_to_i64(guild_id, "guild_id")?;

    let result: Result<Option<TagRow>, sqlx::Error> = sqlx::query_as(
        "UPDATE tags
         SET name = $1, last_edited_at = NOW() AT TIME ZONE 'utc'
         WHERE name = $2 AND guild_id = $3 AND deleted = FALSE
         RETURNING id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id",
    )
    .bind(new_name)
    .bind(name.trim())
    .bind(guild_id_i64)
    .fetch_optional(db.pool())
    .await;

    let outcome = match result {
        Ok(Some(row)) => TagWriteOutcome::Applied(to_tag(row)?),
        Ok(None) => TagWriteOutcome::NotFound,
        Err(e) if is_unique_violation(&e) => TagWriteOutcome::NameTaken,
        Err(e) => return Err(e.into()),
    };

    if matches!(outcome, TagWriteOutcome::Applied(_)) {
        invalidate_tag_names(db, guild_id).await;
    }

    Ok(outcome)
}

/// Hand a live tag to another member.
pub async fn transfer_tag(
    db: &Database,
    guild_id: u64,
    name: &str,
    new_owner_id: u64,
) -> anyhow::Result<bool> {
    let guild_id = snowflake_to_i64(guild_id, "guild_id")?;
    let new_owner_id = snowflake_to_i64(new_owner_id, "new_owner_id")?;

    let updated = sqlx::query(
        "UPDATE tags
         SET owner_id = $1
         WHERE name = $2 AND guild_id = $3 AND deleted = FALSE",
    )
    .bind(new_owner_id)
    .bind(name.trim())
    .bind(guild_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Soft-delete a live tag together with its aliases.
///
/// Previously deleted rows with the same name in the guild are removed for good first,
/// so at most one deleted copy of a name is ever available to [`restore_tag`].
/// Purging cascades through `original_tag_id`: deleted aliases of a purged row go with it,
/// whatever their own names.
pub async fn delete_tag(db: &Database, guild_id: u64, name: &str) -> anyhow::Result<bool> {
    let guild_id_i64 = snowflake_to_i64(guild_id, "guild_id")?;
    let name = name.trim();

    let mut tx = db.pool().begin().await?;

    let tag_id: Option<i64> = sqlx::query_scalar(
        "SELECT id
         FROM tags
         WHERE name = $1 AND guild_id = $2 AND deleted = FALSE
         FOR UPDATE",
    )
    .bind(name)
    .bind(guild_id_i64)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(tag_id) = tag_id else {
        tx.rollback().await?;
        return Ok(false);
    };

    let purged = sqlx::query("DELETE FROM tags WHERE name = $1 AND guild_id = $2 AND deleted = TRUE")
        .bind(name)
        .bind(guild_id_i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query(
        "UPDATE tags
         SET deleted = TRUE
         WHERE id = $1 OR (original_tag_id = $1 AND deleted = FALSE)",
    )
    .bind(tag_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(guild_id, tag_id, name, purged, "tag deleted");
    invalidate_tag_names(db, guild_id).await;

    Ok(true)
}

/// Bring back the most recently deleted tag called `name`, optionally under `new_name`.
///
/// An alias only comes back while its original is live.
pub async fn restore_tag(
    db: &Database,
    guild_id: u64,
    name: &str,
    new_name: Option<&str>,
) -> anyhow::Result<TagWriteOutcome> {
    let target_name = match new_name {
        Some(new_name) => valid_name(new_name)?,
        None => name.trim(),
    };
    let guild_id_i64 = snowflake_to_i64(guild_id, "guild_id")?;

    let mut tx = db.pool().begin().await?;

    let tag_id: Option<i64> = sqlx::query_scalar(
        "SELECT t.id
         FROM tags AS t
         LEFT JOIN tags AS original ON original.id = t.original_tag_id
         WHERE t.name = $1 AND t.guild_id = $2 AND t.deleted = TRUE
           AND (t.original_tag_id IS NULL OR original.deleted = FALSE)
         ORDER BY t.id DESC
         LIMIT 1
         FOR UPDATE OF t",
    )
    .bind(name.trim())
    .bind(guild_id_i64)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(tag_id) = tag_id else {
        tx.rollback().await?;
        return Ok(TagWriteOutcome::NotFound);
    };

    let result: Result<TagRow, sqlx::Error> = sqlx::query_as(
        "UPDATE tags
         SET deleted = FALSE, name = $1
         WHERE id = $2
         RETURNING id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted, original_tag_id",
    )
    .bind(target_name)
    .bind(tag_id)
    .fetch_one(&mut *tx)
    .await;

    let row = match result {
        Ok(row) => row,
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            return Ok(TagWriteOutcome::NameTaken);
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit().await?;

    let tag = to_tag(row)?;
    info!(guild_id, tag_id = tag.id, name = %tag.name, "tag restored");
    invalidate_tag_names(db, guild_id).await;

    Ok(TagWriteOutcome::Applied(tag))
}

async fn invalidate_tag_names(db: &Database, guild_id: u64) {
    let cache = db.cache();
    if let Err(e) = cache.increment(&tag_generation_key(cache, guild_id)).await {
        warn!(?e, guild_id, "failed to invalidate cached tag names");
    }
}

fn valid_name(raw: &str) -> anyhow::Result<&str> {
    normalize_tag_name(raw).ok_or_else(|| {
        anyhow::anyhow!(
            "tag names must be between 1 and {} characters",
            leaf_utils::MAX_TAG_NAME_CHARS
        )
    })
}

fn valid_content(raw: &str) -> anyhow::Result<&str> {
    if raw.trim().is_empty() {
        anyhow::bail!("tag content cannot be empty");
    }
    Ok(raw)
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

fn to_tag(row: TagRow) -> anyhow::Result<Tag> {
    Ok(Tag {
        id: u64::try_from(row.id).context("id row out of u64 range")?,
        name: row.name,
        guild_id: snowflake_from_i64(row.guild_id, "guild_id")?,
        owner_id: snowflake_from_i64(row.owner_id, "owner_id")?,
        content: row.content,
        created_at: utc(row.created_at),
        last_edited_at: utc(row.last_edited_at),
        uses: u64::try_from(row.uses).context("uses row out of u64 range")?,
        deleted: row.deleted,
        original_tag_id: row
            .original_tag_id
            .map(u64::try_from)
            .transpose()
            .context("original_tag_id row out of u64 range")?,
    })
}
