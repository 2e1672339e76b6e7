//! Name matching against a user's known groups and budgets.
//!
//! Names are normalized first (lower-case, generic words such as "group" or
//! "budget" dropped, a few synonyms folded). Matching then tries direct
//! containment, containment after singularizing, and finally edit distance
//! with a length-scaled threshold and a required margin over the runner-up.

/// Dropped during normalization so "Ski Trip group" and "ski trip" compare equal.
const GENERIC_WORDS: &[&str] = &["group", "groups", "budget", "budgets", "fund", "funds", "the", "my", "our"];

const SYNONYMS: &[(&str, &str)] = &[
    ("vacation", "travel"),
    ("vacations", "travel"),
    ("holiday", "travel"),
    ("holidays", "travel"),
    ("food", "groceries"),
    ("grocery", "groceries"),
    ("gasoline", "gas"),
    ("fuel", "gas"),
];

/// Minimum normalized length before containment is trusted.
const MIN_CONTAINMENT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Direct,
    Singular,
    EditDistance(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMatch {
    /// Index into the candidate list.
    Matched { index: usize, kind: MatchKind },
    /// Several entities were equally close; nothing is chosen.
    Ambiguous(Vec<usize>),
    NoMatch,
}

impl EntityMatch {
    pub fn index(&self) -> Option<usize> {
        match self {
            EntityMatch::Matched { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub fn synonym(word: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == word)
        .map_or(word, |(_, to)| *to)
}

pub fn normalize_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered
        .split_whitespace()
        .filter(|w| !GENERIC_WORDS.contains(w))
        .map(synonym)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn singularize(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.len() > 3 && (word.ends_with("ses") || word.ends_with("xes") || word.ends_with("ches")) {
        word[..word.len() - 2].to_string()
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

pub fn singularize_phrase(phrase: &str) -> String {
    phrase.split_whitespace().map(singularize).collect::<Vec<_>>().join(" ")
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / longer_length`, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

/// Word-aligned containment in either direction.
fn contains_either(a: &str, b: &str) -> bool {
    let padded = |s: &str| format!(" {s} ");
    (b.len() >= MIN_CONTAINMENT_LEN && padded(a).contains(&padded(b)))
        || (a.len() >= MIN_CONTAINMENT_LEN && padded(b).contains(&padded(a)))
}

/// Among containment hits, the name closest in length to the candidate wins;
/// list order breaks ties.
fn best_containment(candidate: &str, names: &[String]) -> Option<usize> {
    if let Some(exact) = names.iter().position(|n| n == candidate) {
        return Some(exact);
    }
    names
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.is_empty() && contains_either(candidate, n))
        .min_by_key(|(i, n)| (n.len().abs_diff(candidate.len()), *i))
        .map(|(i, _)| i)
}

/// Match a phrase against known entity names.
pub fn match_entity<S: AsRef<str>>(candidate: &str, names: &[S]) -> EntityMatch {
    let candidate = normalize_name(candidate);
    if candidate.is_empty() || names.is_empty() {
        return EntityMatch::NoMatch;
    }
    let normalized: Vec<String> = names.iter().map(|n| normalize_name(n.as_ref())).collect();

    if let Some(index) = best_containment(&candidate, &normalized) {
        return EntityMatch::Matched { index, kind: MatchKind::Direct };
    }

    let singular_candidate = singularize_phrase(&candidate);
    let singular_names: Vec<String> = normalized.iter().map(|n| singularize_phrase(n)).collect();
    if let Some(index) = best_containment(&singular_candidate, &singular_names) {
        return EntityMatch::Matched { index, kind: MatchKind::Singular };
    }

    let mut ranked: Vec<(usize, usize)> = normalized
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.is_empty())
        .map(|(i, n)| (levenshtein(&candidate, n), i))
        .collect();
    ranked.sort();

    let threshold = 2usize.max((0.3 * candidate.chars().count() as f32).floor() as usize);
    match ranked.as_slice() {
        [] => EntityMatch::NoMatch,
        [(best, _), ..] if *best > threshold => EntityMatch::NoMatch,
        [(best, index)] => EntityMatch::Matched { index: *index, kind: MatchKind::EditDistance(*best) },
        [(best, index), (second, _), ..] if second - best > 1 => {
            EntityMatch::Matched { index: *index, kind: MatchKind::EditDistance(*best) }
        }
        [(best, _), ..] => {
            let tied = ranked.iter().filter(|(d, _)| d - best <= 1).map(|(_, i)| *i).collect();
            EntityMatch::Ambiguous(tied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_drops_generic_words_and_folds_synonyms() {
        assert_eq!(normalize_name("  The Vacation  Budget "), "travel");
        assert_eq!(normalize_name("Ski-Trip Group"), "ski trip");
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn singularize_common_plurals() {
        assert_eq!(singularize("groceries"), "grocery");
        assert_eq!(singularize("trips"), "trip");
        assert_eq!(singularize("glass"), "glass");
    }
}
