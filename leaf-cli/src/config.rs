use std::env;

use leaf_database::database::DEFAULT_CACHE_PREFIX;

const DEFAULT_MAX_CONNECTIONS: u64 = 5;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub auto_run_migrations: bool,
}

impl Settings {
    /// `database_url` comes from the command line (which itself falls back to `DATABASE_URL`).
    pub fn from_env(database_url: Option<String>) -> anyhow::Result<Self> {
        let database_url = database_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set (or pass --database-url)"))?;

        let max_connections = env_u64("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            database_url,
            max_connections: u32::try_from(max_connections).unwrap_or(u32::MAX),
            redis_enabled: env_bool("REDIS_ENABLED", false),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_CACHE_PREFIX.to_string()),
            auto_run_migrations: env_bool("AUTO_RUN_MIGRATIONS", true),
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    parse_bool(env::var(key).ok().as_deref(), default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    parse_u64(env::var(key).ok().as_deref(), default)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn parse_u64(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{Settings, parse_bool, parse_u64};

    #[test]
    fn bool_values_follow_common_spellings() {
        assert!(parse_bool(Some("TRUE"), false));
        assert!(parse_bool(Some(" on "), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("no"), true));
        assert!(!parse_bool(Some(""), true));
        assert!(parse_bool(None, true));
    }

    #[test]
    fn numbers_fall_back_on_garbage() {
        assert_eq!(parse_u64(Some(" 12 "), 5), 12);
        assert_eq!(parse_u64(Some("many"), 5), 5);
        assert_eq!(parse_u64(None, 5), 5);
    }

    #[test]
    fn database_url_is_required() {
        assert!(Settings::from_env(None).is_err());
        assert!(Settings::from_env(Some("  ".to_owned())).is_err());
        let settings = Settings::from_env(Some("postgres://localhost/leaf".to_owned())).unwrap();
        assert_eq!(settings.database_url, "postgres://localhost/leaf");
    }
}
