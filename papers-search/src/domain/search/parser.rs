//! Parser for the list literal a classification model answers with.
//!
//! Models are asked for a bare list such as `["Finite Automata", "2022"]`, but
//! in practice also wrap it in code fences, use single quotes, or leave
//! numbers unquoted. All of those are accepted.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::traits::{Result, SearchError};

static FENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)\s*```").unwrap());

/// Parse a model response into a set of category tokens.
///
/// Blank tokens are discarded. Anything that is not a list literal is a
/// `MalformedResponse` carrying the raw text.
///
/// # Examples
///
/// ```
/// use papers_search::domain::search::parse_category_list;
///
/// let tokens = parse_category_list("['Finite Automata', 2022]").unwrap();
/// assert!(tokens.contains("Finite Automata"));
/// assert!(tokens.contains("2022"));
/// ```
pub fn parse_category_list(raw: &str) -> Result<BTreeSet<String>> {
    let malformed = || SearchError::MalformedResponse(raw.to_string());

    let unfenced = FENCE_PATTERN
        .captures(raw)
        .and_then(|cap| cap.get(1))
        .map_or(raw, |m| m.as_str());

    // The first bracketed literal that reads as a list is the answer; later
    // brackets are commentary.
    let items = list_literals(unfenced)
        .find_map(|literal| parse_json_list(literal).or_else(|| parse_quoted_list(literal)))
        .ok_or_else(malformed)?;

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// Every balanced `[...]` in `text`, in order of their opening bracket.
fn list_literals(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('[')
        .filter_map(move |(start, _)| balanced_list(&text[start..]))
}

/// The list literal opening at the start of `text`, up to its matching `]`.
///
/// Quotes only open a string at the start of an item, so apostrophes inside
/// bare words do not hide the closing bracket.
fn balanced_list(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous = ' ';

    for (i, c) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
                previous = c;
            }
            continue;
        }

        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            '\'' | '"' if matches!(previous, '[' | ',') => quote = Some(c),
            _ => {}
        }
        if !c.is_whitespace() {
            previous = c;
        }
    }

    None
}

fn parse_json_list(literal: &str) -> Option<Vec<String>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(literal).ok()?;
    values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Lenient reader for list literals with single-quoted or bare items.
fn parse_quoted_list(literal: &str) -> Option<Vec<String>> {
    let inner = literal.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => item.push(chars.next()?),
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => item.push(c),
                }
            }
            if !closed {
                return None;
            }
            items.push(item);
        } else {
            let mut item = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                if c == '[' || c == ']' || c == '\'' || c == '"' {
                    return None;
                }
                item.push(c);
                chars.next();
            }
            items.push(item);
        }

        // Only separators may follow an item.
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None | Some(',') => {}
            Some(_) => return None,
        }
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_json_list() {
        let tokens = parse_category_list(r#"["Finite Automata", "Regular Languages"]"#).unwrap();
        assert_eq!(tokens, set(&["Finite Automata", "Regular Languages"]));
    }

    #[test]
    fn parses_single_quoted_list() {
        let tokens = parse_category_list("['2022', '2023', \"Turing Machines\"]").unwrap();
        assert_eq!(tokens, set(&["2022", "2023", "Turing Machines"]));
    }

    #[test]
    fn parses_escaped_quotes() {
        let tokens = parse_category_list(r"['Dijkstra\'s Algorithm']").unwrap();
        assert_eq!(tokens, set(&["Dijkstra's Algorithm"]));
    }

    #[test]
    fn parses_bare_numbers() {
        assert_eq!(
            parse_category_list("[2022, 2023]").unwrap(),
            set(&["2022", "2023"])
        );
        assert_eq!(
            parse_category_list("[2022, 'Paper 1']").unwrap(),
            set(&["2022", "Paper 1"])
        );
    }

    #[test]
    fn strips_code_fences_and_prose() {
        let raw = "Here you go:\n```json\n[\"Graphs\"]\n```";
        assert_eq!(parse_category_list(raw).unwrap(), set(&["Graphs"]));

        let raw = "The categories are ['Sets'].";
        assert_eq!(parse_category_list(raw).unwrap(), set(&["Sets"]));
    }

    #[test]
    fn ignores_brackets_after_the_list() {
        let raw = "[\"Graphs\"]\nI left out [Sets] on purpose.";
        assert_eq!(parse_category_list(raw).unwrap(), set(&["Graphs"]));

        let raw = "['Turing Machines'] (see [1] for why)";
        assert_eq!(parse_category_list(raw).unwrap(), set(&["Turing Machines"]));
    }

    #[test]
    fn brackets_inside_items_are_kept() {
        let raw = r#"["Arrays [2D]", "Graphs"] and more"#;
        assert_eq!(parse_category_list(raw).unwrap(), set(&["Arrays [2D]", "Graphs"]));
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(parse_category_list("[]").unwrap().is_empty());
        assert!(parse_category_list("[ '', '  ' ]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_lists() {
        for raw in ["Finite Automata", "", "{\"a\": 1}", "['unterminated]", "['a' 'b']"] {
            assert!(
                matches!(parse_category_list(raw), Err(SearchError::MalformedResponse(_))),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn malformed_error_keeps_raw_text() {
        match parse_category_list("no list here") {
            Err(SearchError::MalformedResponse(raw)) => assert_eq!(raw, "no list here"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
