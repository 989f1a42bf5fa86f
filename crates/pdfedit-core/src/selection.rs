//! Page selection
//!
//! Parses user-facing page-range expressions like `"1-3, 5, 8-10"` into a
//! [`PageIndexSet`] of zero-based page indices. The parser never rejects
//! indices past the end of a document; consumers skip those with
//! [`PageIndexSet::within`].

use crate::error::PageRangeError;
use std::fmt;

/// Sorted, deduplicated zero-based page indices.
///
/// Stored as merged inclusive runs, so a huge range costs no more than a
/// single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndexSet {
    /// Ascending, non-overlapping, non-adjacent `(first, last)` runs
    ranges: Vec<(usize, usize)>,
}

impl PageIndexSet {
    /// Every page of a document with `page_count` pages.
    pub fn all(page_count: usize) -> Self {
        match page_count.checked_sub(1) {
            Some(last) => Self {
                ranges: vec![(0, last)],
            },
            None => Self::default(),
        }
    }

    /// Build from 1-based page numbers. Zeros have no index and are dropped.
    pub fn from_page_numbers(pages: &[u32]) -> Self {
        let mut ranges = Vec::with_capacity(pages.len());
        for &page in pages {
            if page == 0 {
                tracing::warn!("Ignoring page number 0 (pages start at 1)");
                continue;
            }
            let index = page as usize - 1;
            ranges.push((index, index));
        }
        Self::from_ranges(ranges)
    }

    fn from_ranges(mut ranges: Vec<(usize, usize)>) -> Self {
        ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (first, last) in ranges {
            match merged.last_mut() {
                Some(prev) if first <= prev.1.saturating_add(1) => prev.1 = prev.1.max(last),
                _ => merged.push((first, last)),
            }
        }
        Self { ranges: merged }
    }

    pub fn len(&self) -> usize {
        self.ranges.iter().map(|&(first, last)| last - first + 1).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        let pos = self.ranges.partition_point(|&(_, last)| last < index);
        self.ranges
            .get(pos)
            .is_some_and(|&(first, _)| first <= index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|&(first, last)| first..=last)
    }

    /// The inclusive `(first, last)` runs making up the set
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Indices that exist in a document with `page_count` pages.
    pub fn within(&self, page_count: usize) -> impl Iterator<Item = usize> + '_ {
        self.ranges
            .iter()
            .take_while(move |&&(first, _)| first < page_count)
            .flat_map(move |&(first, last)| first..=last.min(page_count - 1))
    }

    /// Number of indices at or past `page_count`
    fn count_beyond(&self, page_count: usize) -> usize {
        self.ranges
            .iter()
            .map(|&(first, last)| {
                if last < page_count {
                    0
                } else {
                    last - first.max(page_count) + 1
                }
            })
            .sum()
    }

    /// Format back into a compact 1-based expression, e.g. `"1-3,5"`.
    pub fn to_expression(&self) -> String {
        self.ranges
            .iter()
            .map(|&(first, last)| {
                if first == last {
                    format!("{}", first + 1)
                } else {
                    format!("{}-{}", first + 1, last + 1)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for PageIndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}

/// Parse a page-range expression into zero-based indices.
///
/// Tokens are comma separated; each is either a 1-based page number or an
/// inclusive `start-end` range. Empty tokens are skipped and surrounding
/// whitespace is ignored. `page_count` is informational only: indices at or
/// beyond it are kept, and callers drop them when applying the selection.
///
/// ```
/// use pdfedit_core::selection::parse;
///
/// let set = parse("5, 1-3", 10).unwrap();
/// assert_eq!(set.to_vec(), vec![0, 1, 2, 4]);
/// ```
pub fn parse(expression: &str, page_count: usize) -> Result<PageIndexSet, PageRangeError> {
    let mut ranges = Vec::new();

    for part in expression.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_page_number(start, part)?;
            let end = parse_page_number(end, part)?;

            if start > end {
                return Err(PageRangeError::InvalidRange { start, end });
            }

            ranges.push((start as usize - 1, end as usize - 1));
        } else {
            let page = parse_page_number(part, part)? as usize;
            ranges.push((page - 1, page - 1));
        }
    }

    let set = PageIndexSet::from_ranges(ranges);

    let beyond = set.count_beyond(page_count);
    if beyond > 0 {
        tracing::debug!(
            "{} selected page(s) are beyond the document's {} pages",
            beyond,
            page_count
        );
    }

    Ok(set)
}

fn parse_page_number(raw: &str, token: &str) -> Result<u32, PageRangeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PageRangeError::Parse {
            token: token.to_string(),
            reason: "missing page number",
        });
    }

    let page: u32 = raw.parse().map_err(|_| PageRangeError::Parse {
        token: token.to_string(),
        reason: "not a page number",
    })?;

    if page == 0 {
        return Err(PageRangeError::Parse {
            token: token.to_string(),
            reason: "page numbers start at 1",
        });
    }

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ranges_and_singles() {
        let result = parse("1-3,5", 10).unwrap();
        assert_eq!(result.to_vec(), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_parse_is_order_independent() {
        let result = parse("5,1-3", 10).unwrap();
        assert_eq!(result.to_vec(), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_parse_deduplicates() {
        assert_eq!(parse("2,2,2", 10).unwrap().to_vec(), vec![1]);
        assert_eq!(parse("1-3, 2-4", 10).unwrap().to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_empty_expression() {
        assert!(parse("", 10).unwrap().is_empty());
        assert!(parse(" , ,", 10).unwrap().is_empty());
    }

    #[test]
    fn test_parse_trailing_comma_and_whitespace() {
        let result = parse(" 1 - 2 , 4 ,", 10).unwrap();
        assert_eq!(result.to_vec(), vec![0, 1, 3]);
    }

    #[test]
    fn test_parse_non_numeric_fails() {
        let err = parse("abc", 10).unwrap_err();
        assert!(matches!(err, PageRangeError::Parse { .. }));
    }

    #[test]
    fn test_parse_malformed_ranges_fail() {
        for expr in ["1-", "-3", "1-2-3", "a-3", "1.5", "-1"] {
            let err = parse(expr, 10).unwrap_err();
            assert!(
                matches!(err, PageRangeError::Parse { .. }),
                "{expr:?} should fail to parse, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_reversed_range_fails() {
        let err = parse("5-3", 10).unwrap_err();
        assert_eq!(err, PageRangeError::InvalidRange { start: 5, end: 3 });
    }

    #[test]
    fn test_parse_page_zero_fails() {
        assert!(parse("0", 10).is_err());
        assert!(parse("0-2", 10).is_err());
    }

    #[test]
    fn test_parse_keeps_out_of_range_indices() {
        let result = parse("2,40", 3).unwrap();
        assert_eq!(result.to_vec(), vec![1, 39]);
        assert_eq!(result.within(3).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_parse_huge_range_stays_compact() {
        let set = parse("1-4000000000", 3).unwrap();
        assert_eq!(set.ranges(), &[(0, 3_999_999_999)]);
        assert_eq!(set.len(), 4_000_000_000);
        assert_eq!(set.within(3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(set.contains(3_999_999_999));
        assert!(!set.contains(4_000_000_000));
        assert_eq!(set.to_expression(), "1-4000000000");
        assert_eq!(parse(&set.to_expression(), 3).unwrap(), set);
    }

    #[test]
    fn test_adjacent_and_overlapping_runs_merge() {
        let set = parse("7-9,1-3,4,8-12", 20).unwrap();
        assert_eq!(set.ranges(), &[(0, 3), (6, 11)]);
        assert_eq!(set.len(), 10);
        assert_eq!(set.within(8).collect::<Vec<_>>(), vec![0, 1, 2, 3, 6, 7]);
        assert_eq!(set.within(0).count(), 0);
    }

    #[test]
    fn test_to_expression_compacts_runs() {
        let set = parse("1,2,3,5,7-8", 10).unwrap();
        assert_eq!(set.to_expression(), "1-3,5,7-8");
        assert_eq!(set.to_string(), "1-3,5,7-8");
    }

    #[test]
    fn test_all_and_from_page_numbers() {
        assert_eq!(PageIndexSet::all(3).to_vec(), vec![0, 1, 2]);
        assert!(PageIndexSet::all(0).is_empty());
        let set = PageIndexSet::from_page_numbers(&[3, 0, 1, 3]);
        assert_eq!(set.to_vec(), vec![0, 2]);
        assert!(set.contains(2));
        assert!(!set.contains(1));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn token() -> impl Strategy<Value = String> {
            prop_oneof![
                (1u32..200).prop_map(|p| p.to_string()),
                (1u32..200, 0u32..20).prop_map(|(s, len)| format!("{}-{}", s, s + len)),
            ]
        }

        proptest! {
            #[test]
            fn parse_never_panics(input in ".{0,64}") {
                let _ = parse(&input, 10);
            }

            #[test]
            fn parsed_indices_are_sorted_and_unique(tokens in prop::collection::vec(token(), 0..12)) {
                let set = parse(&tokens.join(","), 50).unwrap();
                let indices = set.to_vec();
                prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            }

            #[test]
            fn reparsing_expression_is_idempotent(tokens in prop::collection::vec(token(), 0..12)) {
                let set = parse(&tokens.join(","), 50).unwrap();
                let again = parse(&set.to_expression(), 50).unwrap();
                prop_assert_eq!(set, again);
            }

            #[test]
            fn single_page_maps_to_index(page in 1u32..10_000) {
                let set = parse(&page.to_string(), 10).unwrap();
                prop_assert_eq!(set.to_vec(), vec![page as usize - 1]);
            }

            #[test]
            fn runs_agree_with_expanded_pages(
                tokens in prop::collection::vec(token(), 0..12),
                index in 0usize..250,
            ) {
                let set = parse(&tokens.join(","), 50).unwrap();
                let mut expanded = std::collections::BTreeSet::new();
                for token in &tokens {
                    let (first, last) = match token.split_once('-') {
                        Some((a, b)) => (a.parse::<usize>().unwrap(), b.parse::<usize>().unwrap()),
                        None => {
                            let page = token.parse::<usize>().unwrap();
                            (page, page)
                        }
                    };
                    expanded.extend(first - 1..last);
                }
                prop_assert_eq!(set.to_vec(), expanded.iter().copied().collect::<Vec<_>>());
                prop_assert_eq!(set.len(), expanded.len());
                prop_assert_eq!(set.contains(index), expanded.contains(&index));
                prop_assert_eq!(
                    set.within(20).collect::<Vec<_>>(),
                    expanded.range(..20).copied().collect::<Vec<_>>()
                );
            }
        }
    }
}
