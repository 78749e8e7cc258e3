//! Case-insensitive, token-bounded text matching.
//!
//! Type and function names are matched without parsing, so `INT` must not fire
//! inside `INTEGER` or `POINT`, and `IF` must not fire inside `IFNULL`. A side of
//! the needle is only boundary-checked when the needle itself starts or ends with
//! an identifier character: `NOW()` and `$match` carry their own delimiters.

use std::ops::Range;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte ranges of every token-bounded, ASCII case-insensitive occurrence of
/// `needle` in `haystack`, left to right and non-overlapping.
pub fn find_tokens(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    // ASCII lowercasing keeps byte offsets stable.
    bounded(
        haystack,
        &haystack.to_ascii_lowercase(),
        &needle.to_ascii_lowercase(),
    )
}

/// Like [`find_tokens`], but the text must match byte for byte.
pub fn find_exact_tokens(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    bounded(haystack, haystack, needle)
}

/// Occurrences of `needle` in `searched` (a same-length view of `haystack`)
/// that are not glued to identifier characters in `haystack`.
fn bounded(haystack: &str, searched: &str, needle: &str) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }

    let check_before = needle.chars().next().is_some_and(is_ident_char);
    let check_after = needle.chars().next_back().is_some_and(is_ident_char);

    searched
        .match_indices(needle)
        .map(|(start, m)| start..start + m.len())
        .filter(|range| {
            let before_ok = !check_before
                || !haystack[..range.start]
                    .chars()
                    .next_back()
                    .is_some_and(is_ident_char);
            let after_ok =
                !check_after || !haystack[range.end..].chars().next().is_some_and(is_ident_char);
            before_ok && after_ok
        })
        .collect()
}

/// True if `needle` occurs in `haystack` as a whole token.
pub fn contains_token(haystack: &str, needle: &str) -> bool {
    !find_tokens(haystack, needle).is_empty()
}

/// Replace all token-bounded occurrences of each source with its target in a
/// single pass over the original text.
///
/// Replacements never cascade: output of one mapping is not re-scanned by
/// another. Where two sources match at the same position the longer one wins.
pub fn replace_tokens(haystack: &str, replacements: &[(&str, &str)]) -> String {
    let mut hits: Vec<(Range<usize>, &str)> = Vec::new();
    for (source, target) in replacements {
        for range in find_tokens(haystack, source) {
            hits.push((range, *target));
        }
    }

    // Leftmost first, then longest.
    hits.sort_by(|(a, _), (b, _)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    for (range, target) in hits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&haystack[cursor..range.start]);
        out.push_str(target);
        cursor = range.end;
    }
    out.push_str(&haystack[cursor..]);
    out
}

/// Replace every exact, token-bounded occurrence of `needle`.
///
/// Returns `None` when there is none, so callers can tell a missing original
/// apart from a no-op rewrite.
pub fn replace_exact_tokens(haystack: &str, needle: &str, replacement: &str) -> Option<String> {
    let hits = find_exact_tokens(haystack, needle);
    if hits.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    for range in hits {
        out.push_str(&haystack[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&haystack[cursor..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_does_not_match_inside_longer() {
        assert!(!contains_token("id INTEGER NOT NULL", "INT"));
        assert!(contains_token("id INT NOT NULL", "int"));
        assert!(!contains_token("IFNULL(a, b)", "IF"));
        assert!(!contains_token("DEFAULT CHARSET=utf8mb4", "SET"));
    }

    #[test]
    fn test_delimited_needles() {
        assert!(contains_token("created_at DEFAULT NOW()", "NOW()"));
        assert!(contains_token("{ $match: { a: 1 } }", "$match"));
        assert!(!contains_token("{ $matches: 1 }", "$match"));
        assert!(contains_token("flag TINYINT(1) NOT NULL", "TINYINT(1)"));
    }

    #[test]
    fn test_find_tokens_positions() {
        let text = "a INT, b int, c POINT";
        assert_eq!(find_tokens(text, "INT"), vec![2..5, 9..12]);
    }

    #[test]
    fn test_replace_is_single_pass() {
        let ddl = "a DATETIME, b TIMESTAMP";
        let out = replace_tokens(
            ddl,
            &[("DATETIME", "TIMESTAMP"), ("TIMESTAMP", "TIMESTAMP WITH TIME ZONE")],
        );
        assert_eq!(out, "a TIMESTAMP, b TIMESTAMP WITH TIME ZONE");
    }

    #[test]
    fn test_replace_prefers_longest_at_same_position() {
        let out = replace_tokens("x TINYINT(1)", &[("TINYINT", "SMALLINT"), ("TINYINT(1)", "BOOLEAN")]);
        assert_eq!(out, "x BOOLEAN");
    }

    #[test]
    fn test_replace_without_hits_is_identity() {
        let text = "SELECT 1";
        assert_eq!(replace_tokens(text, &[("NVL", "COALESCE")]), text);
        assert_eq!(replace_tokens(text, &[]), text);
    }

    #[test]
    fn test_exact_replace_respects_case_and_tokens() {
        let ddl = "a INT AUTO_INCREMENT, b TINYINT AUTO_INCREMENT, c int AUTO_INCREMENT";
        assert_eq!(
            replace_exact_tokens(ddl, "INT AUTO_INCREMENT", "SERIAL").unwrap(),
            "a SERIAL, b TINYINT AUTO_INCREMENT, c int AUTO_INCREMENT"
        );
        assert_eq!(replace_exact_tokens("x BIGINT AUTO_INCREMENT", "INT AUTO_INCREMENT", "SERIAL"), None);
    }

    #[test]
    fn test_exact_replace_with_delimited_needles() {
        assert_eq!(
            replace_exact_tokens("SELECT `id`, `idx` FROM t", "`id`", "\"id\"").unwrap(),
            "SELECT \"id\", `idx` FROM t"
        );
        assert_eq!(
            replace_exact_tokens(") ENGINE=InnoDB;", " ENGINE=InnoDB", "").unwrap(),
            ");"
        );
    }
}
