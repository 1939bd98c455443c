//! Tokenizer shared by the index, the scorer, and snippet extraction.
//!
//! Lowercases, splits on non-alphanumeric characters, and drops
//! single-character tokens and common English stop words.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "if", "in", "into",
        "is", "it", "no", "not", "of", "on", "or", "our", "such", "that", "the", "their", "then",
        "there", "these", "they", "this", "to", "was", "we", "will", "with", "you",
    ]
    .into_iter()
    .collect()
});

/// Tokenize text into owned lowercase terms, in text order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Tokenize and de-duplicate, keeping first-occurrence order.
pub fn unique_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Slug form used for tag comparison: `"Product Strategy"` → `"product-strategy"`.
pub fn slug(text: &str) -> String {
    let lowered = text.trim().trim_start_matches('#').to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = !out.is_empty();
        } else {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tokens = tokenize("The quick brown fox and a dog");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "dog"]);
    }

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        let tokens = tokenize("Q3-Roadmap: Sarah's review!");
        assert_eq!(tokens, vec!["q3", "roadmap", "sarah", "review"]);
    }

    #[test]
    fn unicode_is_kept() {
        let tokens = tokenize("Café Zürich");
        assert_eq!(tokens, vec!["café", "zürich"]);
    }

    #[test]
    fn unique_keeps_first_order() {
        assert_eq!(
            unique_tokens("roadmap review roadmap plan"),
            vec!["roadmap", "review", "plan"]
        );
    }

    #[test]
    fn slug_normalizes_separators() {
        assert_eq!(slug("Product Strategy"), "product-strategy");
        assert_eq!(slug("#product_strategy"), "product-strategy");
        assert_eq!(slug("  team   sync "), "team-sync");
        assert_eq!(slug("work/Q3 plans"), "work/q3-plans");
    }
}
