use crate::MAX_TAG_NAME_CHARS;

/// Parse a compact duration like `30s`, `10m`, `2h`, `1d`, `1w`, `1h30m`, or plain seconds.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    if compact.bytes().all(|byte| byte.is_ascii_digit()) {
        return compact.parse::<u64>().ok().filter(|seconds| *seconds > 0);
    }

    let mut total_seconds = 0_u64;
    let mut digits = String::new();

    for ch in compact.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if digits.is_empty() {
            return None;
        }

        let multiplier = unit_seconds(ch)?;
        let number = digits.parse::<u64>().ok().filter(|value| *value > 0)?;
        digits.clear();

        total_seconds = total_seconds.checked_add(number.checked_mul(multiplier)?)?;
    }

    // A trailing bare number after unit segments (e.g. `1h30`) is ambiguous.
    if !digits.is_empty() {
        return None;
    }

    Some(total_seconds).filter(|seconds| *seconds > 0)
}

fn unit_seconds(unit: char) -> Option<u64> {
    match unit.to_ascii_lowercase() {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(60 * 60),
        'd' => Some(60 * 60 * 24),
        'w' => Some(60 * 60 * 24 * 7),
        _ => None,
    }
}

/// Trim a tag name and check it fits the column. Returns the normalized name.
pub fn normalize_tag_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_TAG_NAME_CHARS {
        return None;
    }

    Some(name)
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Parse a Discord snowflake, accepting raw ids and `<@id>` / `<@!id>` mentions.
pub fn parse_snowflake(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|rest| rest.trim_start_matches('!'))
        .unwrap_or(trimmed);

    inner.parse::<u64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::{escape_like, normalize_tag_name, parse_duration_seconds, parse_snowflake};

    #[test]
    fn parses_compact_durations() {
        assert_eq!(parse_duration_seconds("30"), Some(30));
        assert_eq!(parse_duration_seconds("30s"), Some(30));
        assert_eq!(parse_duration_seconds("10m"), Some(600));
        assert_eq!(parse_duration_seconds("2H"), Some(7_200));
        assert_eq!(parse_duration_seconds("1d"), Some(86_400));
        assert_eq!(parse_duration_seconds("1w"), Some(604_800));
        assert_eq!(parse_duration_seconds("1h 30m"), Some(5_400));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration_seconds(""), None);
        assert_eq!(parse_duration_seconds("   "), None);
        assert_eq!(parse_duration_seconds("0"), None);
        assert_eq!(parse_duration_seconds("0m"), None);
        assert_eq!(parse_duration_seconds("m"), None);
        assert_eq!(parse_duration_seconds("5y"), None);
        assert_eq!(parse_duration_seconds("1h30"), None);
        assert_eq!(parse_duration_seconds("99999999999999999999d"), None);
    }

    #[test]
    fn normalizes_tag_names() {
        assert_eq!(normalize_tag_name("  rules "), Some("rules"));
        assert_eq!(normalize_tag_name(""), None);
        assert_eq!(normalize_tag_name("   "), None);

        let longest = "a".repeat(128);
        assert_eq!(normalize_tag_name(&longest), Some(longest.as_str()));
        assert_eq!(normalize_tag_name(&"a".repeat(129)), None);
        // Multi-byte characters count once each.
        assert!(normalize_tag_name(&"é".repeat(128)).is_some());
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("faq"), "faq");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn parses_snowflakes_and_mentions() {
        assert_eq!(parse_snowflake("80351110224678912"), Some(80_351_110_224_678_912));
        assert_eq!(parse_snowflake("<@80351110224678912>"), Some(80_351_110_224_678_912));
        assert_eq!(parse_snowflake("<@!80351110224678912>"), Some(80_351_110_224_678_912));
        assert_eq!(parse_snowflake("0"), None);
        assert_eq!(parse_snowflake("someone"), None);
    }
}
