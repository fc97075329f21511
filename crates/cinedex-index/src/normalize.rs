use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM_RUN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^\p{L}\p{N}]+").expect("static regex is valid")
});

/// Strips accents and tone marks, e.g. `Hành Động` -> `Hanh Dong`.
///
/// Decomposes to NFD and drops combining marks. `đ`/`Đ` carry their stroke
/// in the base letter rather than a combining mark, so they are mapped
/// explicitly.
pub fn fold_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Normalizes a query for the vector path: lowercase, diacritics stripped,
/// every run of non-alphanumeric characters collapsed to one space.
pub fn normalize_query(text: &str) -> String {
    let folded = fold_diacritics(&text.to_lowercase());
    NON_ALNUM_RUN.replace_all(&folded, " ").trim().to_string()
}
