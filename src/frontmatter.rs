//! Obsidian note parsing: frontmatter block, heading title, inline tags.
//!
//! Only the YAML subset notes actually use is understood:
//!
//! ```text
//! ---
//! title: Meeting with Sarah Johnson
//! tags: [meeting, product-strategy]
//! attendees:
//!   - "[[Sarah Johnson]]"
//!   - Bob Lee
//! ---
//! ```
//!
//! Block scalars (`summary: >` or `notes: |` followed by indented lines)
//! are read as one value, folded with spaces or kept line by line.
//! Nested maps under an empty key are tolerated and ignored. Anything else
//! that is not `key: value`, a list item, a comment, or blank is a parse
//! error and the note is skipped by the scan.

use std::collections::HashMap;

/// Fields pulled from a note's frontmatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub attendees: Vec<String>,
}

/// Split a note into its frontmatter and body.
///
/// A note without a leading `---` line has empty frontmatter and the whole
/// text as body. Returns an error message for malformed blocks.
pub fn split_frontmatter(text: &str) -> Result<(Frontmatter, &str), String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let first_end = text.find('\n').unwrap_or(text.len());
    if text[..first_end].trim_end() != "---" {
        return Ok((Frontmatter::default(), text));
    }

    let block_start = (first_end + 1).min(text.len());
    let mut offset = block_start;
    let mut block_end = None;
    for line in text[block_start..].split_inclusive('\n') {
        let bare = line.trim_end();
        if bare == "---" || bare == "..." {
            block_end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }

    let (end, body_start) = block_end.ok_or_else(|| "unterminated frontmatter block".to_string())?;
    let raw = parse_block(&text[block_start..end])?;

    let mut fm = Frontmatter::default();
    if let Some(values) = raw.get("title") {
        fm.title = values.first().cloned().filter(|t| !t.is_empty());
    }
    for key in ["tags", "tag"] {
        for value in raw.get(key).into_iter().flatten() {
            fm.tags.extend(
                value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .map(|t| t.trim().trim_start_matches('#'))
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
        }
    }
    for key in ["attendees", "attendee", "participants"] {
        for value in raw.get(key).into_iter().flatten() {
            fm.attendees.extend(
                value
                    .split(',')
                    .map(clean_scalar)
                    .filter(|a| !a.is_empty()),
            );
        }
    }

    Ok((fm, &text[body_start..]))
}

/// Parse the lines between the delimiters into `key → values`.
fn parse_block(block: &str) -> Result<HashMap<String, Vec<String>>, String> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    let mut open_key: Option<String> = None;
    let mut scalar: Option<BlockScalar> = None;

    for (n, line) in block.lines().enumerate() {
        if let Some(open) = scalar.as_mut() {
            if line.trim().is_empty() || line.starts_with(' ') || line.starts_with('\t') {
                open.lines.push(line.trim().to_string());
                continue;
            }
            if let Some(done) = scalar.take() {
                done.finish(&mut map);
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if trimmed == "-" || trimmed.starts_with("- ") {
            let key = open_key
                .as_ref()
                .ok_or_else(|| format!("line {}: list item without a key", n + 1))?;
            let item = clean_scalar(trimmed.trim_start_matches('-'));
            if !item.is_empty() {
                map.entry(key.clone()).or_default().push(item);
            }
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if indented && open_key.is_some() {
            // nested mapping under an open key
            continue;
        }

        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| format!("line {}: expected `key: value`", n + 1))?;
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(format!("line {}: empty key", n + 1));
        }
        let value = value.trim();

        if value.is_empty() {
            map.entry(key.clone()).or_default();
            open_key = Some(key);
        } else if let Some(folded) = block_scalar_style(value) {
            scalar = Some(BlockScalar {
                key,
                folded,
                lines: Vec::new(),
            });
            open_key = None;
        } else if is_inline_list(value) {
            let inner = &value[1..value.len() - 1];
            let items = map.entry(key).or_default();
            items.extend(split_inline_list(inner).map(clean_scalar).filter(|i| !i.is_empty()));
            open_key = None;
        } else {
            map.entry(key).or_default().push(unquote(value).to_string());
            open_key = None;
        }
    }
    if let Some(done) = scalar {
        done.finish(&mut map);
    }

    Ok(map)
}

/// A `key: |` or `key: >` value collecting its indented lines.
struct BlockScalar {
    key: String,
    folded: bool,
    lines: Vec<String>,
}

impl BlockScalar {
    fn finish(self, map: &mut HashMap<String, Vec<String>>) {
        let sep = if self.folded { " " } else { "\n" };
        let value = self.lines.join(sep).trim().to_string();
        let entry = map.entry(self.key).or_default();
        if !value.is_empty() {
            entry.push(value);
        }
    }
}

/// `Some(folded)` for a block scalar indicator such as `|`, `>-` or `|2+`.
fn block_scalar_style(value: &str) -> Option<bool> {
    let mut chars = value.chars();
    let folded = match chars.next()? {
        '|' => false,
        '>' => true,
        _ => return None,
    };
    chars
        .all(|c| matches!(c, '-' | '+') || c.is_ascii_digit())
        .then_some(folded)
}

fn is_inline_list(value: &str) -> bool {
    if !(value.starts_with('[') && value.ends_with(']')) {
        return false;
    }
    // A lone `[[Wiki Link]]` is a scalar, not a list.
    !(value.starts_with("[[") && value.ends_with("]]") && value.matches("[[").count() == 1)
}

/// Split on commas that are not inside `[[...]]` links.
fn split_inline_list(inner: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts.into_iter()
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

/// Unquote and unwrap `[[Name|Alias]]` links to `Name`.
fn clean_scalar(value: &str) -> String {
    let v = unquote(value).trim();
    let v = match v.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
        Some(link) => link.split('|').next().unwrap_or(link),
        None => v,
    };
    v.trim().to_string()
}

/// Text of the first level-one heading, if any.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("# "))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Inline Obsidian `#tags` in the body, skipping fenced code blocks.
pub fn inline_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let mut prev: Option<char> = None;
        let mut chars = line.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let at_boundary = prev.map_or(true, char::is_whitespace);
            prev = Some(c);
            if c != '#' || !at_boundary {
                continue;
            }
            let rest = &line[i + 1..];
            let len = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_alphanumeric() || matches!(ch, '_' | '-' | '/')))
                .map(|(j, _)| j)
                .unwrap_or(rest.len());
            let tag = &rest[..len];
            if !tag.is_empty() && tag.chars().any(|ch| !ch.is_ascii_digit()) {
                tags.push(tag.to_lowercase());
            }
            // skip past the tag body
            while let Some(&(j, ch)) = chars.peek() {
                if j > i + len {
                    break;
                }
                prev = Some(ch);
                chars.next();
            }
        }
    }

    tags
}
