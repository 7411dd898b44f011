//! Fuzzy string matching for typo and synonym correction.

use crate::config::SimilarityConfig;

/// Lowercase and unify separators (space and hyphen become underscore).
pub fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Lowercase and drop every separator.
pub fn strip_separators(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// Case- and separator-insensitive equality.
pub fn loosely_equal(a: &str, b: &str) -> bool {
    strip_separators(a) == strip_separators(b)
}

/// Similarity in `[0, 1]` between two strings, case-insensitive.
///
/// Identical strings score 1. When one contains the other the score is
/// `0.7 + 0.2 * shorter / longer`. Otherwise it is the fraction of positions
/// that agree, aligning either at the start or at the end, whichever agrees
/// more, over the longer length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if long.windows(short.len()).any(|w| w == short.as_slice()) {
        return 0.7 + 0.2 * short.len() as f64 / long.len() as f64;
    }

    let forward = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    let backward = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .filter(|(x, y)| x == y)
        .count();
    forward.max(backward) as f64 / long.len() as f64
}

/// Score every candidate against `value`, best first.
///
/// Equal scores keep candidate order.
pub fn rank_candidates<'a>(value: &str, candidates: &'a [String]) -> Vec<(&'a str, f64)> {
    let mut ranked: Vec<(&str, f64)> = candidates
        .iter()
        .map(|c| (c.as_str(), similarity(value, c)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Pick the candidate `value` most plausibly meant, if any is convincing.
///
/// The best candidate is accepted when it scores above the accept threshold,
/// or above the weak threshold while beating the runner-up by the dominance
/// ratio.
pub fn best_match<'a>(
    value: &str,
    candidates: &'a [String],
    config: &SimilarityConfig,
) -> Option<(&'a str, f64)> {
    let ranked = rank_candidates(value, candidates);
    let (best, score) = *ranked.first()?;
    let runner_up = ranked.get(1).map_or(0.0, |(_, s)| *s);

    if score > config.accept_threshold {
        return Some((best, score));
    }
    if score > config.weak_threshold && score >= config.dominance_ratio * runner_up {
        return Some((best, score));
    }
    None
}

/// Levenshtein edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min((curr[j - 1] + 1).min(prev[j - 1] + cost));
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Names close to `target`, nearest first.
///
/// A name qualifies when its edit distance (after normalization) is at most
/// `max(2, len / 3)`, or when one name contains the other.
pub fn closest_names<'a>(target: &str, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let target = normalize(target);
    let limit = (target.chars().count() / 3).max(2);

    let mut scored: Vec<(usize, &str)> = names
        .into_iter()
        .filter_map(|name| {
            let candidate = normalize(name);
            let distance = levenshtein(&target, &candidate);
            let contained = target.len() >= 3
                && (candidate.contains(&target) || target.contains(&candidate));
            (distance <= limit || contained).then_some((distance, name))
        })
        .collect();
    scored.sort_by_key(|(distance, _)| *distance);
    scored.into_iter().map(|(_, name)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize(" Motorway-Link "), "motorway_link");
        assert_eq!(strip_separators("motor way_link"), "motorwaylink");
        assert!(loosely_equal("street limited", "street_limited"));
    }

    #[test]
    fn test_similarity_scores() {
        assert_eq!(similarity("Park", "park"), 1.0);
        assert_eq!(similarity("motorwy", "motorway"), 0.75);
        // containment: 0.7 + 0.2 * 4/8
        assert!((similarity("road", "mainroad") - 0.8).abs() < 1e-9);
        assert_eq!(similarity("", "x"), 0.0);
    }

    #[test]
    fn test_backward_alignment() {
        // "xtreet" vs "street": forward alignment agrees on 5 of 6
        assert!((similarity("xtreet", "street") - 5.0 / 6.0).abs() < 1e-9);
        // "tunnnel" vs "tunnel": end-aligned agrees on "nel" + more
        assert!(similarity("tunnnel", "tunnel") > 0.5);
    }

    #[test]
    fn test_best_match_accepts_clear_typo() {
        let candidates = strings(&["motorway", "motorway_link", "trunk", "primary"]);
        let (best, _) = best_match("motorwy", &candidates, &SimilarityConfig::default()).unwrap();
        assert_eq!(best, "motorway");
    }

    #[test]
    fn test_best_match_rejects_noise() {
        let candidates = strings(&["motorway", "trunk", "primary"]);
        assert!(best_match("zzz", &candidates, &SimilarityConfig::default()).is_none());
    }

    #[test]
    fn test_weak_match_needs_dominance() {
        let config = SimilarityConfig::default();
        // 3 of 5 positions agree for both candidates: no clear winner
        let tied = strings(&["abxye", "abcxz"]);
        assert_eq!(similarity("abcde", "abxye"), similarity("abcde", "abcxz"));
        assert!(best_match("abcde", &tied, &config).is_none());

        // single weak candidate dominates an empty field
        let lone = strings(&["abxye"]);
        let (best, score) = best_match("abcde", &lone, &config).unwrap();
        assert_eq!(best, "abxye");
        assert!(score > 0.5 && score <= 0.7);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_closest_names() {
        let names = ["water", "waterways", "motorways", "parks"];
        assert_eq!(closest_names("motorwys", names), vec!["motorways"]);
        assert_eq!(closest_names("watr", names), vec!["water"]);
        assert!(closest_names("completely-different", names).is_empty());
    }
}
