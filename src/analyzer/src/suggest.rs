//! Typo suggestions for unknown function names

use crate::vocabulary::FUNCTIONS;

/// Largest edit distance still offered as a suggestion
const MAX_DISTANCE: usize = 2;
/// Most suggestions returned for a single name
const MAX_SUGGESTIONS: usize = 3;

/// Levenshtein edit distance between two strings, counted in characters
pub fn levenshtein(first: &str, second: &str) -> usize {
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();
    // keep the DP row as short as possible
    let (long, short) = if a.len() < b.len() { (b, a) } else { (a, b) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0; short.len() + 1];
    for (i, c1) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in short.iter().enumerate() {
            let substitution = prev[j] + usize::from(c1 != c2);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// Known function names close to `name`, nearest first
///
/// Candidates whose length differs by more than two are skipped before the
/// distance is computed. Ties are broken alphabetically.
pub fn suggest_functions(name: &str) -> Vec<&'static str> {
    let name = name.to_ascii_lowercase();
    let len = name.chars().count();

    let mut candidates: Vec<(usize, &'static str)> = FUNCTIONS
        .iter()
        .filter(|candidate| candidate.len().abs_diff(len) <= MAX_DISTANCE)
        .map(|candidate| (levenshtein(&name, candidate), *candidate))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate)
        .collect()
}
