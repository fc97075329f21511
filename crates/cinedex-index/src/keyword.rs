use cinedex_core::EntityRecord;

/// Query equals the label.
pub const EXACT_SCORE: f32 = 1.0;
/// Label starts with the query.
pub const PREFIX_SCORE: f32 = 0.9;
/// Label contains the query.
pub const SUBSTRING_SCORE: f32 = 0.8;
/// Floor of the word-overlap score.
pub const FUZZY_BASE: f32 = 0.5;
/// Range of the word-overlap score above the floor.
pub const FUZZY_SPAN: f32 = 0.3;

/// Lexical relevance of `candidate` to `query`, case-insensitive.
///
/// `1.0` exact, `0.9` prefix, `0.8` substring, otherwise
/// `0.5 + 0.3 * f` where `f` is the fraction of query words that are a
/// substring or superstring of some candidate word.
pub fn score_text(query: &str, candidate: &str) -> f32 {
    let query = query.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();

    if query.is_empty() {
        return FUZZY_BASE;
    }
    if query == candidate {
        return EXACT_SCORE;
    }
    if candidate.starts_with(&query) {
        return PREFIX_SCORE;
    }
    if candidate.contains(&query) {
        return SUBSTRING_SCORE;
    }

    let query_words: Vec<&str> = query.split_whitespace().collect();
    let candidate_words: Vec<&str> = candidate.split_whitespace().collect();
    let found = query_words
        .iter()
        .filter(|q| {
            candidate_words
                .iter()
                .any(|c| c.contains(*q) || q.contains(*c))
        })
        .count();

    FUZZY_BASE + FUZZY_SPAN * (found as f32 / query_words.len() as f32)
}

/// Best [`score_text`] over the record's identifying labels.
pub fn score_record(query: &str, record: &EntityRecord) -> f32 {
    record
        .labels()
        .into_iter()
        .map(|label| score_text(query, label))
        .fold(FUZZY_BASE, f32::max)
}
