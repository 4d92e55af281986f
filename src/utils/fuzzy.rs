// Fuzzy matching for "did you mean" suggestions on stages, fields and users

use crate::models::normalize_label;

/// Edit distance counting insertions, deletions, substitutions and swaps of
/// two adjacent characters (optimal string alignment), so "emial" is one
/// edit from "email".
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut before: Vec<usize> = vec![0; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                curr[j] = curr[j].min(before[j - 2] + 1);
            }
        }
        std::mem::swap(&mut before, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Candidates within `max_distance` of `search`, closest first.
///
/// Both sides are normalized (case, spacing and punctuation ignored). A
/// candidate that starts with the search text also matches, scored by how
/// many characters it adds.
pub fn find_near_matches<S: AsRef<str>>(search: &str, candidates: &[S], max_distance: usize) -> Vec<(String, usize)> {
    let wanted = normalize_label(search);
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(String, usize)> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let normalized = normalize_label(candidate);
            let distance = levenshtein_distance(&wanted, &normalized);
            if distance <= max_distance {
                return Some((candidate.to_string(), distance));
            }
            if normalized.starts_with(&wanted) && normalized.len() - wanted.len() <= max_distance + 2 {
                return Some((candidate.to_string(), max_distance));
            }
            None
        })
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.truncate(5);
    matches
}

/// Best single suggestion, if any candidate is close enough
pub fn suggest<S: AsRef<str>>(search: &str, candidates: &[S]) -> Option<String> {
    let max_distance = (normalize_label(search).chars().count() / 3).clamp(1, 4);
    find_near_matches(search, candidates, max_distance)
        .into_iter()
        .next()
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_adjacent_swap_is_one_edit() {
        assert_eq!(levenshtein_distance("emial", "email"), 1);
        assert_eq!(levenshtein_distance("ab", "ba"), 1);
        let fields = ["name", "email", "phone", "country", "course", "source"];
        assert_eq!(suggest("emial", &fields), Some("email".to_string()));
    }

    #[test]
    fn test_stage_suggestion() {
        let labels: Vec<&str> = Stage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(suggest("Shortlistd Univ", &labels), Some("Shortlisted Univ.".to_string()));
        assert_eq!(suggest("visa recieved", &labels), Some("Visa Received".to_string()));
        assert_eq!(suggest("zzzzzz", &labels), None);
    }

    #[test]
    fn test_near_field_match() {
        let fields = ["connect_status", "country", "call_type"];
        let matches = find_near_matches("connect_stat", &fields, 2);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, "connect_status");
    }

    #[test]
    fn test_empty_search() {
        assert!(find_near_matches("", &["a"], 3).is_empty());
    }
}
