//! Page-range parsing for PDF splitting.
//!
//! Users type ranges such as `"1-3, 5, 8-10"`: comma-separated tokens, each a
//! single 1-based page or an inclusive `start-end` span. Parsing is lenient:
//! a token that is not a number (or a span whose ends are not numbers) is
//! dropped, and pages outside the document are dropped rather than clamped.
//! The only failure signal is an empty [`PageSelection`], which callers turn
//! into [`crate::ConvertError::EmptyRange`].

use serde::Serialize;
use std::collections::BTreeSet;

/// Zero-based page indices, unique and strictly increasing, each below the
/// page count they were resolved against.
///
/// Only [`parse_range`] and [`PageSelection::all`] build one, so it can be
/// serialised for reports but not deserialised:
///
/// ```compile_fail
/// let _: docshift::PageSelection = serde_json::from_str("[3, 1, 1]").unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSelection(Vec<usize>);

impl PageSelection {
    /// Every page of a `total_pages` document.
    pub fn all(total_pages: usize) -> Self {
        PageSelection((0..total_pages).collect())
    }

    /// Parse a user range expression against a document of `total_pages`.
    pub fn parse(range: &str, total_pages: usize) -> Self {
        parse_range(range, total_pages)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// The selection as 1-based page numbers, for display.
    pub fn page_numbers(&self) -> Vec<usize> {
        self.0.iter().map(|i| i + 1).collect()
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.0
    }
}

/// Parse `range_str` into a normalised selection of zero-based page indices.
///
/// ```
/// use docshift::parse_range;
///
/// let pages = parse_range("2-4,1,9", 5);
/// assert_eq!(pages.indices(), &[0, 1, 2, 3]);
/// ```
pub fn parse_range(range_str: &str, total_pages: usize) -> PageSelection {
    let mut pages = BTreeSet::new();

    for token in tokens(range_str) {
        match token {
            Token::Page(page) => {
                if (1..=total_pages).contains(&page) {
                    pages.insert(page - 1);
                }
            }
            Token::Span(start, end) => {
                // Only the in-bounds part of the span can contribute pages.
                let lo = start.max(1);
                let hi = end.min(total_pages);
                pages.extend((lo..=hi).map(|p| p - 1));
            }
        }
    }

    PageSelection(pages.into_iter().collect())
}

/// True when `range_str` holds at least one token that could select a page
/// in a document large enough. Lets hosts reject a hopeless range before any
/// document is opened.
pub fn has_page_tokens(range_str: &str) -> bool {
    tokens(range_str).any(|token| match token {
        Token::Page(page) => page >= 1,
        Token::Span(start, end) => start.max(1) <= end,
    })
}

enum Token {
    Page(usize),
    Span(usize, usize),
}

/// Well-formed tokens of a range expression; malformed ones are skipped.
fn tokens(range_str: &str) -> impl Iterator<Item = Token> + '_ {
    range_str.split(',').map(str::trim).filter_map(|token| {
        if token.is_empty() {
            return None;
        }
        match token.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse::<usize>().ok()?;
                let end = end.trim().parse::<usize>().ok()?;
                Some(Token::Span(start, end))
            }
            None => token.parse::<usize>().ok().map(Token::Page),
        }
    })
}
