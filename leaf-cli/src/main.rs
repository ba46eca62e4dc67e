mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use leaf_database::{CacheService, Database, impls::schema::run_migrations};

use crate::cli::{Cli, Command};
use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads DATABASE_URL from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::from_env(cli.database_url)?;
    let cache = build_cache(&settings).await;
    let db = Database::connect(&settings.database_url, settings.max_connections, cache).await?;

    let needs_schema = !matches!(cli.command, Command::Migrate | Command::Status);
    if needs_schema {
        if settings.auto_run_migrations {
            run_migrations(&db).await?;
        } else {
            info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run before commands).");
        }
    }

    match cli.command {
        Command::Migrate => commands::migrate::up(&db).await?,
        Command::Status => commands::migrate::status(&db).await?,
        Command::Infractions(args) => commands::infractions::list(&db, args).await?,
        Command::Expired(args) => commands::infractions::expired(&db, args).await?,
        Command::Tags(args) => commands::tags::list(&db, args).await?,
        Command::Tag(args) => commands::tags::show(&db, args).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let max_level = if verbose { Level::DEBUG } else { Level::INFO };

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(move |metadata| {
        if *metadata.level() > max_level {
            return false;
        }

        // Per-statement logs drown out everything else unless debugging.
        verbose || !metadata.target().starts_with("sqlx::query")
    }));

    tracing_subscriber::registry().with(fmt_layer).init();
}

async fn build_cache(settings: &Settings) -> CacheService {
    let prefix = settings.redis_key_prefix.clone();

    if !settings.redis_enabled {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(prefix);
    }

    let Some(redis_url) = settings.redis_url.as_deref() else {
        warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
        return CacheService::disabled(prefix);
    };

    let cache = match CacheService::redis(redis_url, prefix.clone()) {
        Ok(cache) => cache,
        Err(err) => {
            warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
            return CacheService::disabled(prefix);
        }
    };

    if cache.is_redis_enabled() {
        match cache.ping().await {
            Ok(()) => info!(key_prefix = %prefix, "Redis cache enabled."),
            Err(err) => warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            ),
        }
    }

    cache
}
