use chrono::{DateTime, Utc};
use leaf_database::{
    Database,
    impls::infractions::{count_infractions, expired_infractions, list_infractions},
    model::infractions::{Infraction, InfractionFilters},
};
use leaf_utils::{
    formatting::{display_reason, format_compact_duration, infraction_display_name, truncate_chars},
    time::{now_utc, seconds_before, seconds_until},
};

use crate::cli::{ExpiredArgs, InfractionsArgs};

const REASON_PREVIEW_CHARS: usize = 80;

pub async fn list(db: &Database, args: InfractionsArgs) -> anyhow::Result<()> {
    let filters = InfractionFilters {
        member_id: args.member,
        moderator_id: args.moderator,
        kind: args.kind,
        include_hidden: args.include_hidden,
        limit: args.limit,
    };
    let infractions = list_infractions(db, args.guild_id, filters).await?;

    if let Some(member_id) = args.member {
        let visible = count_infractions(db, args.guild_id, member_id).await?;
        println!("Member {member_id} has {visible} visible infraction(s).");
    }

    if infractions.is_empty() {
        println!("No infractions found.");
        return Ok(());
    }

    let now = now_utc();
    for infraction in &infractions {
        println!("{}", format_infraction_line(infraction, now));
    }

    Ok(())
}

pub async fn expired(db: &Database, args: ExpiredArgs) -> anyhow::Result<()> {
    let now = now_utc();
    let after = seconds_before(now, args.within)
        .ok_or_else(|| anyhow::anyhow!("window of {}s is too large", args.within))?;

    let infractions = expired_infractions(db, after, now, args.limit).await?;
    if infractions.is_empty() {
        println!(
            "Nothing expired in the last {}.",
            format_compact_duration(args.within)
        );
        return Ok(());
    }

    for infraction in &infractions {
        println!(
            "guild={} {}",
            infraction.guild_id,
            format_infraction_line(infraction, now)
        );
    }

    Ok(())
}

fn format_infraction_line(infraction: &Infraction, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "#{:<6} {:<15} member={} moderator={} {} | {}",
        infraction.id,
        infraction_display_name(infraction.kind.as_str()),
        infraction.member_id,
        infraction.moderator_id,
        infraction.created_at.format("%Y-%m-%d %H:%M UTC"),
        truncate_chars(
            display_reason(infraction.reason.as_deref()),
            REASON_PREVIEW_CHARS
        ),
    );

    if let Some(expires_at) = infraction.expires_at {
        if infraction.is_active(now) {
            let remaining = format_compact_duration(seconds_until(now, expires_at));
            line.push_str(&format!(" (expires in {remaining})"));
        } else {
            line.push_str(" (expired)");
        }
    }

    if infraction.hidden {
        line.push_str(" [hidden]");
    }

    line
}
