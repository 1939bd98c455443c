//! Snippet extraction around matched terms.
//!
//! For each term's first case-insensitive occurrence the enclosing sentence
//! is used. When the sentence is too long, or there is no boundary to find,
//! a fixed-width character window around the match is used instead.
//! Snippets come back in document order, never relevance order.

const SENTENCE_BOUNDARIES: [char; 4] = ['.', '!', '?', '\n'];
const ELLIPSIS: &str = "…";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnippetOptions {
    /// Clamped to `1..=3`.
    pub max_snippets: usize,
    /// Characters kept on each side of a match in window mode.
    pub window: usize,
    /// Sentences longer than this fall back to window mode.
    pub max_chars: usize,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            max_snippets: 3,
            window: 80,
            max_chars: 240,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Excerpt {
    start: usize,
    end: usize,
    leading: bool,
    trailing: bool,
}

/// Extract up to `max_snippets` excerpts around the first occurrence of each
/// term. Terms are tried in the given order; earlier terms win when there
/// are more matches than slots.
pub fn extract_snippets(content: &str, terms: &[String], options: &SnippetOptions) -> Vec<String> {
    let limit = options.max_snippets.clamp(1, 3);
    if content.trim().is_empty() || terms.is_empty() {
        return Vec::new();
    }

    let (folded, offsets) = fold_case(content);
    let mut excerpts: Vec<Excerpt> = Vec::new();

    for term in terms {
        if excerpts.len() >= limit {
            break;
        }
        // Same per-char fold as the content; `str::to_lowercase` maps a
        // word-final Σ to ς and would never match.
        let (needle, _) = fold_case(term.trim());
        if needle.is_empty() {
            continue;
        }
        let Some(pos) = folded.find(&needle) else {
            continue;
        };
        let start = offsets[pos];
        let end = offsets[pos + needle.len()].max(next_boundary(content, start));

        if excerpts.iter().any(|e| start < e.end && end > e.start) {
            continue;
        }
        excerpts.push(excerpt_around(content, start, end, options));
    }

    excerpts.sort_by_key(|e| e.start);
    excerpts
        .into_iter()
        .filter_map(|e| render(content, e))
        .collect()
}

/// Lowercased copy of `text` plus a map from each folded byte to the byte
/// offset of the original char it came from. The map has one trailing entry
/// for `text.len()`.
fn fold_case(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (i, c) in text.char_indices() {
        for lower in c.to_lowercase() {
            let before = folded.len();
            folded.push(lower);
            offsets.extend(std::iter::repeat(i).take(folded.len() - before));
        }
    }
    offsets.push(text.len());
    (folded, offsets)
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map(|c| at + c.len_utf8())
        .unwrap_or(text.len())
}

fn excerpt_around(content: &str, start: usize, end: usize, options: &SnippetOptions) -> Excerpt {
    let sentence_start = content[..start]
        .rfind(SENTENCE_BOUNDARIES)
        .map(|i| i + 1)
        .unwrap_or(0);
    let sentence_end = content[end..]
        .find(SENTENCE_BOUNDARIES)
        .map(|i| {
            let at = end + i;
            // keep terminal punctuation, drop the newline
            if content[at..].starts_with('\n') {
                at
            } else {
                at + 1
            }
        })
        .unwrap_or(content.len());

    let sentence_chars = content[sentence_start..sentence_end].chars().count();
    let has_boundary = sentence_start > 0 || sentence_end < content.len();
    if sentence_chars <= options.max_chars && (has_boundary || sentence_chars <= options.window * 2) {
        return Excerpt {
            start: sentence_start,
            end: sentence_end,
            leading: false,
            trailing: false,
        };
    }

    let window_start = content[..start]
        .char_indices()
        .rev()
        .take(options.window)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let window_end = content[end..]
        .char_indices()
        .nth(options.window)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());

    Excerpt {
        start: window_start,
        end: window_end,
        leading: window_start > 0,
        trailing: window_end < content.len(),
    }
}

fn render(content: &str, excerpt: Excerpt) -> Option<String> {
    let raw = &content[excerpt.start..excerpt.end];
    let text = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let text = text
        .trim_start_matches(|c: char| matches!(c, '#' | '-' | '*' | '>') || c.is_whitespace())
        .trim();
    if text.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(text.len() + 2 * ELLIPSIS.len());
    if excerpt.leading {
        out.push_str(ELLIPSIS);
    }
    out.push_str(text);
    if excerpt.trailing {
        out.push_str(ELLIPSIS);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn returns_enclosing_sentence() {
        let content = "Intro line. We met Sarah Johnson about pricing. Later stuff.";
        let snippets = extract_snippets(content, &terms(&["sarah johnson"]), &SnippetOptions::default());
        assert_eq!(snippets, vec!["We met Sarah Johnson about pricing."]);
    }

    #[test]
    fn snippets_follow_document_order() {
        let content = "Pricing is first.\nThen the roadmap.\nFinally hiring.";
        let snippets = extract_snippets(
            content,
            &terms(&["hiring", "pricing", "roadmap"]),
            &SnippetOptions::default(),
        );
        assert_eq!(
            snippets,
            vec!["Pricing is first.", "Then the roadmap.", "Finally hiring."]
        );
    }

    #[test]
    fn same_sentence_is_not_repeated() {
        let content = "Roadmap and pricing together. Something else.";
        let snippets = extract_snippets(
            content,
            &terms(&["roadmap", "pricing"]),
            &SnippetOptions::default(),
        );
        assert_eq!(snippets.len(), 1);
    }

    #[test]
    fn long_sentence_falls_back_to_window() {
        let filler = "word ".repeat(100);
        let content = format!("{}budget {}", filler, filler);
        let options = SnippetOptions {
            window: 20,
            ..SnippetOptions::default()
        };
        let snippets = extract_snippets(&content, &terms(&["BUDGET"]), &options);
        assert_eq!(snippets.len(), 1);
        let s = &snippets[0];
        assert!(s.starts_with(ELLIPSIS) && s.ends_with(ELLIPSIS));
        assert!(s.contains("budget"));
        assert!(s.chars().count() < 60);
    }

    #[test]
    fn caps_at_three() {
        let content = "One alpha. Two beta. Three gamma. Four delta.";
        let options = SnippetOptions {
            max_snippets: 10,
            ..SnippetOptions::default()
        };
        let snippets = extract_snippets(
            content,
            &terms(&["delta", "alpha", "beta", "gamma"]),
            &options,
        );
        // delta wins a slot by priority, output is still in document order
        assert_eq!(snippets, vec!["One alpha.", "Two beta.", "Four delta."]);
    }

    #[test]
    fn unicode_is_char_safe() {
        let content = "Treffen in ZÜRICH mit Jürgen. Danach Straße.";
        let snippets = extract_snippets(content, &terms(&["zürich", "straße"]), &SnippetOptions::default());
        assert_eq!(snippets, vec!["Treffen in ZÜRICH mit Jürgen.", "Danach Straße."]);
    }

    #[test]
    fn word_final_sigma_matches() {
        let content = "Notes from ΟΔΥΣΣΕΥΣ on the voyage.";
        let snippets = extract_snippets(content, &terms(&["ΟΔΥΣΣΕΥΣ"]), &SnippetOptions::default());
        assert_eq!(snippets, vec!["Notes from ΟΔΥΣΣΕΥΣ on the voyage."]);
    }

    #[test]
    fn markdown_markers_are_trimmed() {
        let content = "## Action items\n- Follow up with Sarah on pricing\n";
        let snippets = extract_snippets(content, &terms(&["sarah"]), &SnippetOptions::default());
        assert_eq!(snippets, vec!["Follow up with Sarah on pricing"]);
    }

    #[test]
    fn missing_terms_yield_nothing() {
        assert!(extract_snippets("some text", &terms(&["absent"]), &SnippetOptions::default()).is_empty());
        assert!(extract_snippets("", &terms(&["x"]), &SnippetOptions::default()).is_empty());
    }
}
