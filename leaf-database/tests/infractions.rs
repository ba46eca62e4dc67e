//! PostgreSQL-backed tests for the infractions table. Run with
//! `DATABASE_URL=postgres://... cargo test -p leaf-database -- --ignored`.

use chrono::Duration;
use leaf_database::{
    Database,
    impls::infractions::{
        count_infractions, expire_infraction, expired_infractions, get_infraction,
        list_infractions, record_infraction, set_infraction_hidden, update_infraction_reason,
    },
    model::infractions::{InfractionFilters, InfractionType, NewInfraction},
};
use sqlx::PgPool;

const GUILD: u64 = 1_100_000_000_000_000_001;
const OTHER_GUILD: u64 = 1_100_000_000_000_000_002;
const MEMBER: u64 = 2_200_000_000_000_000_001;
const MODERATOR: u64 = 3_300_000_000_000_000_001;

fn warning(reason: &str) -> NewInfraction<'_> {
    NewInfraction {
        guild_id: GUILD,
        member_id: MEMBER,
        moderator_id: MODERATOR,
        kind: InfractionType::Warning,
        reason: Some(reason),
        duration_seconds: None,
    }
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn insert_without_type_is_rejected(pool: PgPool) -> anyhow::Result<()> {
    let result = sqlx::query(
        "INSERT INTO infractions (guild_id, member_id, moderator_id) VALUES ($1, $2, $3)",
    )
    .bind(1_i64)
    .bind(2_i64)
    .bind(3_i64)
    .execute(&pool)
    .await;

    let error = result.expect_err("type is NOT NULL");
    let db_error = error.as_database_error().expect("database error");
    assert_eq!(db_error.code().as_deref(), Some("23502"));

    let unknown_type = sqlx::query(
        "INSERT INTO infractions (guild_id, member_id, moderator_id, type) VALUES (1, 2, 3, 'softban')",
    )
    .execute(&pool)
    .await;
    assert!(unknown_type.is_err());

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn infraction_ids_are_scoped_per_guild(pool: PgPool) -> anyhow::Result<()> {
    for guild_id in [1_i64, 2_i64] {
        sqlx::query(
            "INSERT INTO infractions (id, guild_id, member_id, moderator_id, type)
             VALUES (7, $1, 10, 20, 'kick')",
        )
        .bind(guild_id)
        .execute(&pool)
        .await?;
    }

    let duplicate = sqlx::query(
        "INSERT INTO infractions (id, guild_id, member_id, moderator_id, type)
         VALUES (7, 1, 11, 20, 'ban')",
    )
    .execute(&pool)
    .await;
    let error = duplicate.expect_err("(id, guild_id) is the primary key");
    assert!(
        error
            .as_database_error()
            .is_some_and(|db_error| db_error.is_unique_violation())
    );

    let db = Database::new(pool);
    assert_eq!(get_infraction(&db, 1, 7).await?.map(|i| i.guild_id), Some(1));
    assert_eq!(get_infraction(&db, 2, 7).await?.map(|i| i.guild_id), Some(2));
    assert!(get_infraction(&db, 3, 7).await?.is_none());

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn records_with_column_defaults(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool);

    let first = record_infraction(&db, warning("spam")).await?;
    let second = record_infraction(&db, warning("  ")).await?;

    assert!(second.id > first.id);
    assert_eq!(first.kind, InfractionType::Warning);
    assert_eq!(first.reason.as_deref(), Some("spam"));
    assert_eq!(second.reason, None);
    assert!(!first.hidden);
    assert_eq!(first.expires_at, None);

    let fetched = get_infraction(&db, GUILD, first.id).await?;
    assert_eq!(fetched, Some(first));

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn expiry_only_for_time_limited_types(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool);

    let timeout = record_infraction(
        &db,
        NewInfraction {
            kind: InfractionType::Timeout,
            duration_seconds: Some(600),
            ..warning("cool off")
        },
    )
    .await?;
    let expires_at = timeout.expires_at.expect("timeout carries an expiry");
    assert_eq!(expires_at - timeout.created_at, Duration::seconds(600));
    assert!(timeout.is_active(timeout.created_at));

    let kick = record_infraction(
        &db,
        NewInfraction {
            kind: InfractionType::Kick,
            duration_seconds: Some(600),
            ..warning("bye")
        },
    )
    .await;
    assert!(kick.is_err());

    assert!(expire_infraction(&db, GUILD, timeout.id).await?);
    assert!(!expire_infraction(&db, GUILD, timeout.id).await?);

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn hidden_infractions_are_excluded_by_default(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool);

    let visible = record_infraction(&db, warning("first")).await?;
    let hidden = record_infraction(&db, warning("second")).await?;
    record_infraction(
        &db,
        NewInfraction {
            guild_id: OTHER_GUILD,
            ..warning("elsewhere")
        },
    )
    .await?;

    assert!(set_infraction_hidden(&db, GUILD, hidden.id, true).await?);
    assert!(!set_infraction_hidden(&db, OTHER_GUILD, hidden.id, true).await?);

    let default_listing = list_infractions(&db, GUILD, InfractionFilters::default()).await?;
    assert_eq!(
        default_listing.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![visible.id]
    );

    let everything = list_infractions(
        &db,
        GUILD,
        InfractionFilters {
            include_hidden: true,
            ..InfractionFilters::default()
        },
    )
    .await?;
    assert_eq!(
        everything.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![hidden.id, visible.id]
    );

    let kicks = list_infractions(
        &db,
        GUILD,
        InfractionFilters {
            kind: Some(InfractionType::Kick),
            include_hidden: true,
            ..InfractionFilters::default()
        },
    )
    .await?;
    assert!(kicks.is_empty());

    assert_eq!(count_infractions(&db, GUILD, MEMBER).await?, 1);
    assert_eq!(count_infractions(&db, OTHER_GUILD, MEMBER).await?, 1);

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reasons_can_be_updated_and_cleared(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool);
    let infraction = record_infraction(&db, warning("typo")).await?;

    let updated = update_infraction_reason(&db, GUILD, infraction.id, Some("fixed"))
        .await?
        .expect("infraction exists");
    assert_eq!(updated.reason.as_deref(), Some("fixed"));

    let cleared = update_infraction_reason(&db, GUILD, infraction.id, None)
        .await?
        .expect("infraction exists");
    assert_eq!(cleared.reason, None);

    assert!(
        update_infraction_reason(&db, OTHER_GUILD, infraction.id, Some("nope"))
            .await?
            .is_none()
    );

    Ok(())
}

#[sqlx::test(migrator = "leaf_database::MIGRATOR")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn expired_infractions_respect_the_window(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool);

    let mute = record_infraction(
        &db,
        NewInfraction {
            kind: InfractionType::VoiceMute,
            duration_seconds: Some(60),
            ..warning("loud")
        },
    )
    .await?;
    record_infraction(&db, warning("no expiry")).await?;

    let expires_at = mute.expires_at.expect("mute carries an expiry");

    let before = expired_infractions(&db, mute.created_at, expires_at - Duration::seconds(1), 50).await?;
    assert!(before.is_empty());

    let due = expired_infractions(&db, mute.created_at, expires_at, 50).await?;
    assert_eq!(due.iter().map(|i| i.id).collect::<Vec<_>>(), vec![mute.id]);

    let already_seen = expired_infractions(&db, expires_at, expires_at + Duration::hours(1), 50).await?;
    assert!(already_seen.is_empty());

    Ok(())
}
