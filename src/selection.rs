//! Track selection input parsing
//!
//! Accepts comma- or space-separated 1-based indices, inclusive ranges such as
//! `4-6`, and the token `all`. Bad tokens are reported and skipped, never fatal.

use std::collections::BTreeSet;

/// Why a token of the selection input was ignored
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejected {
    /// Not a number, a range or `all`
    Invalid(String),
    /// Well-formed but outside `1..=count`
    OutOfRange(String),
}

/// Parsed selection: the chosen 1-based indices plus rejected tokens
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Chosen indices, ascending and deduplicated
    pub indices: BTreeSet<usize>,
    /// Tokens that were skipped, in input order
    pub rejected: Vec<Rejected>,
}

impl Selection {
    /// Whether an index was chosen
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Whether nothing was chosen
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Parse `input` against a list of `count` items
///
/// # Examples
///
/// ```
/// use catalog_dl::selection::parse_selection;
///
/// let sel = parse_selection("2,4-6,9", 10);
/// assert_eq!(sel.indices.into_iter().collect::<Vec<_>>(), vec![2, 4, 5, 6, 9]);
/// ```
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let mut selection = Selection::default();
    let in_range = |n: usize| (1..=count).contains(&n);

    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.eq_ignore_ascii_case("all") {
            selection.indices.extend(1..=count);
            continue;
        }

        if let Some((start, end)) = token.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>()) else {
                selection.rejected.push(Rejected::Invalid(token.to_string()));
                continue;
            };
            if start > end || !in_range(start) || !in_range(end) {
                selection.rejected.push(Rejected::OutOfRange(token.to_string()));
                continue;
            }
            selection.indices.extend(start..=end);
            continue;
        }

        match token.parse::<usize>() {
            Ok(n) if in_range(n) => {
                selection.indices.insert(n);
            }
            Ok(_) => selection.rejected.push(Rejected::OutOfRange(token.to_string())),
            Err(_) => selection.rejected.push(Rejected::Invalid(token.to_string())),
        }
    }

    selection
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn chosen(sel: &Selection) -> Vec<usize> {
        sel.indices.iter().copied().collect()
    }

    #[test]
    fn indices_and_ranges_combine() {
        let sel = parse_selection("2,4-6,9", 10);
        assert_eq!(chosen(&sel), vec![2, 4, 5, 6, 9]);
        assert!(sel.rejected.is_empty());
    }

    #[test]
    fn zero_and_past_end_are_reported_and_excluded() {
        let sel = parse_selection("0,3,11", 10);
        assert_eq!(chosen(&sel), vec![3]);
        assert_eq!(
            sel.rejected,
            vec![
                Rejected::OutOfRange("0".into()),
                Rejected::OutOfRange("11".into())
            ]
        );
    }

    #[test]
    fn invalid_tokens_are_skipped() {
        let sel = parse_selection("1, x, 3-y, 5", 5);
        assert_eq!(chosen(&sel), vec![1, 5]);
        assert_eq!(
            sel.rejected,
            vec![Rejected::Invalid("x".into()), Rejected::Invalid("3-y".into())]
        );
    }

    #[test]
    fn all_selects_everything() {
        assert_eq!(chosen(&parse_selection("all", 4)), vec![1, 2, 3, 4]);
        assert_eq!(chosen(&parse_selection(" ALL ", 2)), vec![1, 2]);
    }

    #[test]
    fn reversed_or_overlong_ranges_are_out_of_range() {
        let sel = parse_selection("6-4,8-12", 10);
        assert!(sel.is_empty());
        assert_eq!(sel.rejected.len(), 2);
    }

    #[test]
    fn empty_input_selects_nothing() {
        let sel = parse_selection("", 10);
        assert!(sel.is_empty());
        assert!(sel.rejected.is_empty());
    }
}
