/// Convert an `infraction_type` label into a user-facing name.
pub fn infraction_display_name(kind: &str) -> String {
    match kind {
        "warning" => "Warning".to_owned(),
        "nickname_change" => "Nickname Change".to_owned(),
        "voice_mute" => "Voice Mute".to_owned(),
        "timeout" => "Timeout".to_owned(),
        "kick" => "Kick".to_owned(),
        "ban" => "Ban".to_owned(),
        other => title_case_words(other),
    }
}

fn title_case_words(raw: &str) -> String {
    let words: Vec<String> = raw
        .trim()
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{}",
                    first.to_uppercase(),
                    chars.as_str().to_ascii_lowercase()
                ),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Unknown".to_owned()
    } else {
        words.join(" ")
    }
}

/// Format seconds as the two largest non-zero units (e.g. `59s`, `1h 30m`, `2d 4h`).
pub fn format_compact_duration(total_seconds: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut remaining = total_seconds;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        let amount = remaining / size;
        remaining %= size;
        if amount > 0 {
            parts.push(format!("{amount}{suffix}"));
        }
        if parts.len() == 2 {
            break;
        }
    }

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Shorten free text to at most `max_chars`, appending an ellipsis when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

/// Render an optional reason the way listings show it.
pub fn display_reason(reason: Option<&str>) -> &str {
    match reason.map(str::trim) {
        Some(reason) if !reason.is_empty() => reason,
        _ => "No reason provided",
    }
}
