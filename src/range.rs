//! Page range selection.
//!
//! A [`PageRange`] is an ordered list of inclusive, 0-based page intervals.
//! Intervals may overlap; [`PageRange::materialize`] folds them into the
//! ascending set of pages that take part in an export.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An inclusive interval of 0-based page indices.
///
/// Serialized as a `[first, last]` pair; deserialization goes through
/// [`PageRangeEntry::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct PageRangeEntry {
    first: usize,
    last: usize,
}

impl PageRangeEntry {
    /// Create an entry covering `first..=last`.
    pub fn new(first: usize, last: usize) -> Result<Self> {
        if first > last {
            return Err(Error::InvalidPageRange(format!(
                "first page {} is after last page {}",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    /// Create an entry covering a single page.
    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
        }
    }

    /// First page (inclusive).
    pub fn first(&self) -> usize {
        self.first
    }

    /// Last page (inclusive).
    pub fn last(&self) -> usize {
        self.last
    }
}

impl TryFrom<(usize, usize)> for PageRangeEntry {
    type Error = Error;

    fn try_from((first, last): (usize, usize)) -> Result<Self> {
        Self::new(first, last)
    }
}

impl From<PageRangeEntry> for (usize, usize) {
    fn from(entry: PageRangeEntry) -> Self {
        (entry.first, entry.last)
    }
}

/// Pages selected for an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRange {
    entries: Vec<PageRangeEntry>,
}

impl PageRange {
    /// Create an empty range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Range covering every page of a document with `total` pages.
    pub fn all(total: usize) -> Self {
        let mut range = Self::new();
        if total > 0 {
            range.entries.push(PageRangeEntry {
                first: 0,
                last: total - 1,
            });
        }
        range
    }

    /// Range covering one page.
    pub fn single(index: usize) -> Self {
        Self {
            entries: vec![PageRangeEntry::single(index)],
        }
    }

    /// Build a range from `(first, last)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(first, last)| PageRangeEntry::new(first, last))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Append an entry.
    pub fn push(&mut self, entry: PageRangeEntry) {
        self.entries.push(entry);
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[PageRangeEntry] {
        &self.entries
    }

    /// Whether the range selects nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff the range is exactly one entry naming one page.
    pub fn is_single_page(&self) -> bool {
        matches!(self.entries.as_slice(), [only] if only.first == only.last)
    }

    /// Expand into the ascending, deduplicated set of selected pages.
    ///
    /// Entries reaching past `total` are rejected rather than clamped.
    pub fn materialize(&self, total: usize) -> Result<BTreeSet<usize>> {
        let mut pages = BTreeSet::new();
        for entry in &self.entries {
            if entry.last >= total {
                return Err(Error::PageOutOfRange(entry.last, total));
            }
            pages.extend(entry.first..=entry.last);
        }
        Ok(pages)
    }

    /// Parse user text such as `"1-3,5"` (1-based, inclusive).
    ///
    /// `"all"` and the empty string need the page count, so they resolve
    /// against `total`.
    pub fn parse_with_total(s: &str, total: usize) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::all(total));
        }

        let mut range = Self::new();
        for part in s.split(',') {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (parse_page_number(start)?, parse_page_number(end)?),
                None => {
                    let page = parse_page_number(part)?;
                    (page, page)
                }
            };
            range.push(PageRangeEntry::new(start - 1, end - 1)?);
        }
        Ok(range)
    }
}

fn parse_page_number(s: &str) -> Result<usize> {
    let number: usize = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPageRange(format!("invalid page number '{}'", s.trim())))?;
    if number == 0 {
        return Err(Error::InvalidPageRange("page numbers start at 1".into()));
    }
    Ok(number)
}
