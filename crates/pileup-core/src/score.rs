//! Copy-error scoring between a true value and the operator's guess.
//!
//! Every state transition in the caller engine is gated on the
//! normalized dissimilarity `levenshtein(truth, guess) / len(truth)`.
//! The denominator is always the *true* value's length, so the score is
//! deliberately asymmetric: it answers "how much of the real callsign
//! did the operator miss", not "how different are two strings".
//!
//! Comparison is case-sensitive; callers normalize both sides to
//! uppercase before scoring.

/// Errors that can occur while scoring.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The true value was empty, which makes the normalized score
    /// undefined. A real identity is never empty, so this is a
    /// programming error on the caller's side.
    #[error("cannot score against an empty true value")]
    EmptyTruth,
}

/// Classic Levenshtein distance over characters, computed iteratively
/// with a two-row dynamic-programming table. Insertion, deletion, and
/// substitution each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // previous[j] holds the distance between a[..i] and b[..j].
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current: Vec<usize> = vec![0; b_chars.len().saturating_add(1)];

    for (i, a_char) in a_chars.iter().enumerate() {
        if let Some(first) = current.first_mut() {
            *first = i.saturating_add(1);
        }

        for (j, b_char) in b_chars.iter().enumerate() {
            let insertion = previous
                .get(j.saturating_add(1))
                .copied()
                .unwrap_or(usize::MAX)
                .saturating_add(1);
            let deletion = current.get(j).copied().unwrap_or(usize::MAX).saturating_add(1);
            let substitution = previous
                .get(j)
                .copied()
                .unwrap_or(usize::MAX)
                .saturating_add(usize::from(a_char != b_char));

            let cost = insertion.min(deletion).min(substitution);
            if let Some(cell) = current.get_mut(j.saturating_add(1)) {
                *cell = cost;
            }
        }

        std::mem::swap(&mut previous, &mut current);
    }

    previous.last().copied().unwrap_or(0)
}

/// Normalized dissimilarity between the true value and a guess:
/// `levenshtein(truth, guess) / len(truth)`. `0.0` is an exact match;
/// an empty guess scores `1.0`.
///
/// # Errors
///
/// Returns [`ScoreError::EmptyTruth`] if `truth` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn dissimilarity(truth: &str, guess: &str) -> Result<f64, ScoreError> {
    let truth_len = truth.chars().count();
    if truth_len == 0 {
        return Err(ScoreError::EmptyTruth);
    }
    let distance = levenshtein(truth, guess);
    Ok(distance as f64 / truth_len as f64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_distance_zero() {
        assert_eq!(levenshtein("W6ABC", "W6ABC"), 0);
        assert_eq!(dissimilarity("W6ABC", "W6ABC").unwrap(), 0.0);
    }

    #[test]
    fn textbook_distances() {
        assert_eq!(levenshtein("KITTEN", "SITTING"), 3);
        assert_eq!(levenshtein("FLAW", "LAWN"), 2);
        assert_eq!(levenshtein("AB", ""), 2);
        assert_eq!(levenshtein("", "ABC"), 3);
    }

    #[test]
    fn empty_guess_scores_one() {
        assert_eq!(dissimilarity("ABC", "").unwrap(), 1.0);
    }

    #[test]
    fn score_is_asymmetric() {
        // Distance is symmetric but the denominator is not.
        let forward = dissimilarity("AB", "ABC").unwrap();
        let backward = dissimilarity("ABC", "AB").unwrap();
        assert_eq!(levenshtein("AB", "ABC"), levenshtein("ABC", "AB"));
        assert!(forward > backward);
        assert_eq!(forward, 0.5);
        assert!((backward - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert!(dissimilarity("W6AB", "w6ab").unwrap() > 0.0);
    }

    #[test]
    fn empty_truth_is_rejected() {
        assert!(matches!(
            dissimilarity("", "W6AB"),
            Err(ScoreError::EmptyTruth)
        ));
        assert!(matches!(dissimilarity("", ""), Err(ScoreError::EmptyTruth)));
    }

    #[test]
    fn single_substitution_on_a_callsign() {
        // One wrong character in a five character call is 0.2.
        assert_eq!(dissimilarity("K6GTE", "K6GTA").unwrap(), 0.2);
    }
}
