use leaf_database::{
    Database,
    impls::schema::{migration_status, run_migrations},
};
use tracing::info;

pub async fn up(db: &Database) -> anyhow::Result<()> {
    info!("Running pending migrations...");
    run_migrations(db).await?;
    info!("Database migrations applied.");
    Ok(())
}

pub async fn status(db: &Database) -> anyhow::Result<()> {
    let statuses = migration_status(db).await?;
    let pending = statuses.iter().filter(|status| !status.applied).count();

    for status in &statuses {
        let state = if status.applied { "applied" } else { "pending" };
        println!("{} {:<32} {}", status.version, status.description, state);
    }

    info!(total = statuses.len(), pending, "migration status checked");
    Ok(())
}
