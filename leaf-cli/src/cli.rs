//! Command-line arguments for the `leaf` operator tool.

use clap::{Args, Parser, Subcommand};
use leaf_database::model::infractions::InfractionType;
use leaf_utils::parse::{parse_duration_seconds, parse_snowflake};

/// Database tooling for the Leaf Discord bot.
#[derive(Parser, Debug)]
#[command(name = "leaf", version, about, long_about = None)]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// PostgreSQL connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Show which migrations have been applied
    Status,
    /// List infractions recorded in a guild
    Infractions(InfractionsArgs),
    /// List mutes and timeouts whose expiry passed recently, across all guilds
    Expired(ExpiredArgs),
    /// List or search the live tags of a guild
    Tags(TagsArgs),
    /// Show a single tag
    Tag(TagArgs),
}

#[derive(Args, Debug)]
pub struct InfractionsArgs {
    /// Guild id
    #[arg(value_parser = parse_id)]
    pub guild_id: u64,

    /// Only infractions against this member (id or mention)
    #[arg(long, value_parser = parse_id)]
    pub member: Option<u64>,

    /// Only infractions issued by this moderator (id or mention)
    #[arg(long, value_parser = parse_id)]
    pub moderator: Option<u64>,

    /// Only this infraction type (e.g. warning, timeout, ban)
    #[arg(long = "type")]
    pub kind: Option<InfractionType>,

    /// Include hidden infractions
    #[arg(long)]
    pub include_hidden: bool,

    /// Maximum rows to show (1-200)
    #[arg(long, default_value_t = 25)]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct ExpiredArgs {
    /// How far back to look (e.g. 30m, 2h, 1d)
    #[arg(long, default_value = "1h", value_parser = parse_window)]
    pub within: u64,

    /// Maximum rows to show (1-500)
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Guild id
    #[arg(value_parser = parse_id)]
    pub guild_id: u64,

    /// Only tags owned by this member (id or mention)
    #[arg(long, value_parser = parse_id, conflicts_with = "search")]
    pub owner: Option<u64>,

    /// Fuzzy search on tag names (typos and reordered words still match)
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Guild id
    #[arg(value_parser = parse_id)]
    pub guild_id: u64,

    /// Tag name
    pub name: String,
}

fn parse_id(raw: &str) -> Result<u64, String> {
    parse_snowflake(raw).ok_or_else(|| format!("`{raw}` is not a Discord id or mention"))
}

fn parse_window(raw: &str) -> Result<u64, String> {
    parse_duration_seconds(raw).ok_or_else(|| format!("`{raw}` is not a duration like 30m or 2h"))
}
