use strsim::jaro_winkler;

/// Lowest score a tag name needs to count as a search hit.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Containment of one string in the other scores just above the threshold,
/// so substring hits always match but rank below close spellings.
const CONTAINMENT_SCORE: f64 = 0.9;

/// Similarity between a search query and a candidate name in `0.0..=1.0`.
///
/// Takes the best of a direct Jaro-Winkler comparison, the same comparison
/// over alphabetically sorted words (so `rules server` finds `server rules`),
/// and a flat score when either string contains the other.
pub fn similarity(query: &str, candidate: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let direct = jaro_winkler(&query, &candidate);
    let sorted = jaro_winkler(&token_sort(&query), &token_sort(&candidate));
    let contained = if candidate.contains(&query) || query.contains(&candidate) {
        CONTAINMENT_SCORE
    } else {
        0.0
    };

    direct.max(sorted).max(contained)
}

/// Words split on anything that is not alphanumeric, sorted and joined by single spaces.
pub fn token_sort(value: &str) -> String {
    let mut tokens: Vec<&str> = value
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::{SIMILARITY_THRESHOLD, similarity, token_sort};

    #[test]
    fn near_misses_clear_the_threshold() {
        assert!(similarity("faqs", "faq") >= SIMILARITY_THRESHOLD);
        assert!(similarity("FAQ", "faq") > 0.999);
        assert!(similarity("rules server", "server rules") > 0.999);
        assert!(similarity("rules", "server rules") >= SIMILARITY_THRESHOLD);
    }

    #[test]
    fn unrelated_names_stay_below_the_threshold() {
        assert!(similarity("faq", "welcome") < SIMILARITY_THRESHOLD);
        assert!(similarity("rust", "python") < SIMILARITY_THRESHOLD);
        assert_eq!(similarity("   ", "faq"), 0.0);
    }

    #[test]
    fn token_sort_ignores_punctuation_and_order() {
        assert_eq!(token_sort("server_rules"), "rules server");
        assert_eq!(token_sort("  b  a-c "), "a b c");
        assert_eq!(token_sort("--"), "");
    }
}
