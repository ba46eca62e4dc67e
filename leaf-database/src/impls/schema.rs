use std::collections::HashSet;

use tracing::info;

use crate::database::{Database, MIGRATOR};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply every pending migration, logging each newly applied version.
///
/// Databases created before migrations were tracked are adopted in place: the
/// migrations skip objects that already exist.
pub async fn run_migrations(db: &Database) -> anyhow::Result<()> {
    let applied_before = applied_versions(db).await?;

    if applied_before.is_empty() && table_exists(db, "tags").await? {
        info!("Untracked schema found; adopting existing tables.");
    }

    MIGRATOR.run(db.pool()).await?;

    for migration in MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .filter(|migration| !applied_before.contains(&migration.version))
    {
        info!(
            version = migration.version,
            description = %migration.description,
            "migration applied"
        );
    }

    Ok(())
}

/// Every embedded migration in version order, with whether it has been applied.
pub async fn migration_status(db: &Database) -> anyhow::Result<Vec<MigrationStatus>> {
    let applied = applied_versions(db).await?;

    Ok(MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .map(|migration| MigrationStatus {
            version: migration.version,
            description: migration.description.to_string(),
            applied: applied.contains(&migration.version),
        })
        .collect())
}

async fn applied_versions(db: &Database) -> anyhow::Result<HashSet<i64>> {
    if !table_exists(db, "_sqlx_migrations").await? {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = TRUE")
            .fetch_all(db.pool())
            .await?;

    Ok(versions.into_iter().collect())
}

pub async fn table_exists(db: &Database, table: &str) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(table)
        .fetch_one(db.pool())
        .await?;

    Ok(exists)
}
