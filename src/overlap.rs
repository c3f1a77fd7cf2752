//! Overlap search over sorted sequences of intervals.
//!
//! Annotated intervals are not guaranteed to be disjoint (genes may be nested
//! within other genes and alternative exons frequently overlap), so a plain
//! binary search over start positions cannot locate every overlapping entry.
//! Entries are therefore held in a [`SortedSpans`], which keeps them sorted
//! ascending by start (ties broken by end) alongside the running maximum of
//! their end positions. The search runs in two phases:
//!
//! 1. An _anchor search_ binary searches the running maximum end for the
//!    first entry that could reach the query, then scans forward while the
//!    entries start at or before the end of the query. The first entry that
//!    overlaps the query is the anchor. No anchor is found only if no entry
//!    overlaps the query.
//! 2. A _neighbor expansion_ walks outward from the anchor in both directions,
//!    collecting entries for as long as they continue to overlap the query.
//!
//! Expansion in each direction stops at the first entry that does not overlap
//! the query. For disjoint entries this yields exactly the set of overlapping
//! entries. For non-disjoint entries, an overlapping entry that sits beyond a
//! non-overlapping neighbor (e.g., a long gene, then a short gene that ends
//! before the query, then a gene that overlaps the query) is not reported.
//!
//! ```
//! use regionmap::core::Interval;
//! use regionmap::overlap::Containment;
//! use regionmap::overlap::SortedSpans;
//!
//! let spans = SortedSpans::new(vec![
//!     "400-500".parse::<Interval>()?,
//!     "100-200".parse::<Interval>()?,
//!     "150-250".parse::<Interval>()?,
//! ]);
//!
//! let query = "160-170".parse::<Interval>()?;
//! let matches = spans.find_overlaps(&query);
//!
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches[0].index(), 0);
//! assert_eq!(matches[1].index(), 1);
//! assert!(matches.iter().all(|m| m.containment() == Containment::Both));
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::core::Interval;
use crate::core::Position;

/// An entry that spans an interval.
pub trait Span {
    /// Gets the interval spanned by the entry.
    fn interval(&self) -> &Interval;
}

impl Span for Interval {
    fn interval(&self) -> &Interval {
        self
    }
}

impl<S: Span> Span for &S {
    fn interval(&self) -> &Interval {
        (*self).interval()
    }
}

/// Which of the query's endpoints fall within an overlapping entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Containment {
    /// Both the start and the end of the query fall within the entry.
    Both,

    /// Only the start of the query falls within the entry.
    Start,

    /// Only the end of the query falls within the entry.
    End,

    /// Neither endpoint falls within the entry (the query covers the entry
    /// entirely).
    Neither,
}

impl Containment {
    /// Determines the containment of the `query` endpoints within `entry`.
    ///
    /// Containment is inclusive: an endpoint that sits exactly on the first
    /// or last position of `entry` falls within it.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    /// use regionmap::overlap::Containment;
    ///
    /// let exon = "1000-1200".parse::<Interval>()?;
    ///
    /// let query = "1100-1150".parse::<Interval>()?;
    /// assert_eq!(Containment::of(&exon, &query), Containment::Both);
    ///
    /// let query = "1000-1200".parse::<Interval>()?;
    /// assert_eq!(Containment::of(&exon, &query), Containment::Both);
    ///
    /// let query = "1150-1850".parse::<Interval>()?;
    /// assert_eq!(Containment::of(&exon, &query), Containment::Start);
    ///
    /// let query = "900-1100".parse::<Interval>()?;
    /// assert_eq!(Containment::of(&exon, &query), Containment::End);
    ///
    /// let query = "900-1300".parse::<Interval>()?;
    /// assert_eq!(Containment::of(&exon, &query), Containment::Neither);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn of(entry: &Interval, query: &Interval) -> Self {
        match (entry.contains(query.start()), entry.contains(query.end())) {
            (true, true) => Containment::Both,
            (true, false) => Containment::Start,
            (false, true) => Containment::End,
            (false, false) => Containment::Neither,
        }
    }
}

/// An entry that overlaps a query.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Match {
    /// The index of the entry within the searched sequence.
    index: usize,

    /// Which of the query's endpoints fall within the entry.
    containment: Containment,
}

impl Match {
    /// Gets the index of the matched entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Gets the containment of the query within the matched entry.
    pub fn containment(&self) -> Containment {
        self.containment
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Sorted spans
////////////////////////////////////////////////////////////////////////////////////////

/// Entries sorted ascending by start position (ties broken by end position)
/// along with the running maximum of their end positions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortedSpans<S> {
    /// The entries.
    entries: Vec<S>,

    /// The greatest end position among `entries[..=i]` for each `i`.
    max_ends: Vec<Position>,
}

impl<S> Default for SortedSpans<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_ends: Vec::new(),
        }
    }
}

impl<S: Span> SortedSpans<S> {
    /// Creates a new [`SortedSpans`], sorting the entries.
    pub fn new(entries: Vec<S>) -> Self {
        let mut spans = Self {
            entries,
            max_ends: Vec::new(),
        };

        spans.sort();
        spans
    }

    /// Gets the entries in sorted order.
    pub fn entries(&self) -> &[S] {
        &self.entries
    }

    /// Gets the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the entries that overlap `query`.
    ///
    /// The matches are returned in increasing index order. An empty result
    /// means that no entry overlaps the query.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    /// use regionmap::overlap::SortedSpans;
    ///
    /// // The first interval contains the query even though the two short
    /// // intervals after it end before the query starts.
    /// let spans = SortedSpans::new(vec![
    ///     "1-50000".parse::<Interval>()?,
    ///     "100-200".parse::<Interval>()?,
    ///     "300-400".parse::<Interval>()?,
    /// ]);
    ///
    /// let matches = spans.find_overlaps(&"20000-20100".parse::<Interval>()?);
    /// assert_eq!(matches.len(), 1);
    /// assert_eq!(matches[0].index(), 0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn find_overlaps(&self, query: &Interval) -> Vec<Match> {
        let anchor = match self.find_anchor(query) {
            Some(anchor) => anchor,
            None => return Vec::new(),
        };

        let matched = |index: usize| {
            let interval = self.entries[index].interval();
            interval.overlaps(query).then(|| Match {
                index,
                containment: Containment::of(interval, query),
            })
        };

        let mut results = (0..anchor).rev().map_while(matched).collect::<Vec<_>>();
        results.reverse();

        results.extend((anchor..self.entries.len()).map_while(matched));
        results
    }

    /// Finds the entries that overlap `query` and pairs them with their
    /// containment.
    ///
    /// This is a convenience over [`SortedSpans::find_overlaps()`] for when
    /// the matched entries themselves are needed rather than their indices.
    pub fn overlapping<'a>(
        &'a self,
        query: &Interval,
    ) -> impl Iterator<Item = (&'a S, Containment)> + 'a {
        self.find_overlaps(query)
            .into_iter()
            .map(move |m| (&self.entries[m.index()], m.containment()))
    }

    /// Finds the index of the first entry that overlaps `query`.
    ///
    /// Every entry before the first index whose running maximum end reaches
    /// the start of the query ends before the query. From there, entries are
    /// scanned until one overlaps or one starts after the end of the query.
    fn find_anchor(&self, query: &Interval) -> Option<usize> {
        let first = self
            .max_ends
            .partition_point(|&end| end < query.start());

        self.entries
            .iter()
            .enumerate()
            .skip(first)
            .take_while(|(_, entry)| entry.interval().start() <= query.end())
            .find(|(_, entry)| entry.interval().overlaps(query))
            .map(|(i, _)| i)
    }

    /// Appends an entry.
    ///
    /// The entries must be re-sorted with [`SortedSpans::sort()`] before
    /// searching.
    pub(crate) fn push(&mut self, entry: S) {
        self.entries.push(entry);
    }

    /// Sorts the entries and rebuilds the running maximum end.
    pub(crate) fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.interval().cmp(b.interval()));

        self.max_ends = self
            .entries
            .iter()
            .scan(Position::MIN, |max, entry| {
                *max = (*max).max(entry.interval().end());
                Some(*max)
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;
    use rust_lapper as lapper;

    use super::*;

    fn interval(start: u64, end: u64) -> Interval {
        Interval::try_new(start, end).unwrap()
    }

    fn spans(intervals: &[(u64, u64)]) -> SortedSpans<Interval> {
        SortedSpans::new(intervals.iter().map(|&(s, e)| interval(s, e)).collect())
    }

    fn indices(matches: &[Match]) -> Vec<usize> {
        matches.iter().map(|m| m.index()).collect()
    }

    /// Generates disjoint intervals with random lengths and gaps.
    fn disjoint_intervals(rng: &mut StdRng, n: usize) -> Vec<Interval> {
        let mut position = rng.gen_range(1..50u64);
        let mut intervals = Vec::with_capacity(n);

        for _ in 0..n {
            let start = position + rng.gen_range(1..40u64);
            let end = start + rng.gen_range(0..60u64);
            intervals.push(interval(start, end));
            position = end;
        }

        intervals
    }

    /// Generates intervals that freely nest and overlap, mixing a few long
    /// intervals in with many short ones.
    fn nested_intervals(rng: &mut StdRng, n: usize) -> Vec<Interval> {
        (0..n)
            .map(|_| {
                let start = rng.gen_range(1..2_000u64);
                let length = if rng.gen_bool(0.1) {
                    rng.gen_range(200..1_500u64)
                } else {
                    rng.gen_range(0..30u64)
                };
                interval(start, start + length)
            })
            .collect()
    }

    fn linear_scan(entries: &[Interval], query: &Interval) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.overlaps(query))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_empty_entries() {
        let spans = SortedSpans::<Interval>::default();
        assert!(spans.is_empty());
        assert!(spans.find_overlaps(&interval(1, 10)).is_empty());
    }

    #[test]
    fn test_new_sorts_entries() {
        let spans = spans(&[(50, 60), (10, 40), (10, 20)]);

        assert_eq!(spans.len(), 3);
        assert_eq!(
            spans.entries(),
            &[interval(10, 20), interval(10, 40), interval(50, 60)]
        );
        assert_eq!(spans.max_ends, vec![20, 40, 60]);
    }

    #[test]
    fn test_no_overlap() {
        let spans = spans(&[(10, 20), (30, 40), (50, 60)]);

        assert!(spans.find_overlaps(&interval(1, 9)).is_empty());
        assert!(spans.find_overlaps(&interval(21, 29)).is_empty());
        assert!(spans.find_overlaps(&interval(61, 100)).is_empty());
    }

    #[test]
    fn test_single_overlap_with_containment() {
        let spans = spans(&[(10, 20), (30, 40), (50, 60)]);

        let matches = spans.find_overlaps(&interval(32, 38));
        assert_eq!(indices(&matches), vec![1]);
        assert_eq!(matches[0].containment(), Containment::Both);

        let matches = spans.find_overlaps(&interval(35, 45));
        assert_eq!(indices(&matches), vec![1]);
        assert_eq!(matches[0].containment(), Containment::Start);

        let matches = spans.find_overlaps(&interval(25, 30));
        assert_eq!(indices(&matches), vec![1]);
        assert_eq!(matches[0].containment(), Containment::End);
    }

    #[test]
    fn test_query_spanning_several_entries() {
        let spans = spans(&[(10, 20), (30, 40), (50, 60)]);

        let matches = spans.find_overlaps(&interval(15, 55));
        assert_eq!(indices(&matches), vec![0, 1, 2]);
        assert_eq!(
            matches.iter().map(|m| m.containment()).collect::<Vec<_>>(),
            vec![Containment::Start, Containment::Neither, Containment::End]
        );
    }

    #[test]
    fn test_intentionally_overlapping_entries() {
        let spans = spans(&[(100, 200), (150, 250)]);

        let matches = spans.find_overlaps(&interval(160, 170));
        assert_eq!(indices(&matches), vec![0, 1]);
    }

    #[test]
    fn test_expansion_collects_nested_entries() {
        let spans = spans(&[
            (1, 5),
            (90, 300),
            (100, 200),
            (120, 180),
            (140, 160),
            (145, 400),
            (500, 600),
        ]);

        let matches = spans.find_overlaps(&interval(150, 155));
        assert_eq!(indices(&matches), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_long_entry_behind_short_entries_is_found() {
        // The short entries end before the query starts.
        let short = spans(&[(1, 1000), (10, 20), (30, 40)]);
        let query = interval(500, 510);

        assert_eq!(short.find_anchor(&query), Some(0));
        assert_eq!(indices(&short.find_overlaps(&query)), vec![0]);
        assert_eq!(short.find_overlaps(&query)[0].containment(), Containment::Both);

        let long = spans(&[(1, 50000), (100, 200), (300, 400)]);
        assert_eq!(
            indices(&long.find_overlaps(&interval(20000, 20100))),
            vec![0]
        );
    }

    #[test]
    fn test_anchor_is_found_among_non_overlapping_neighbors() {
        let spans = spans(&[(1, 5), (10, 900), (20, 30), (40, 50), (60, 70), (80, 90)]);

        assert_eq!(spans.find_anchor(&interval(95, 99)), Some(1));
        assert_eq!(spans.find_anchor(&interval(901, 950)), None);
    }

    #[test]
    fn test_expansion_stops_at_first_gap() {
        // The third entry overlaps but sits behind the second, which does not.
        let spans = spans(&[(1, 1000), (10, 20), (400, 600)]);
        let query = interval(500, 510);

        assert_eq!(linear_scan(spans.entries(), &query), vec![0, 2]);
        assert_eq!(indices(&spans.find_overlaps(&query)), vec![0]);
    }

    #[test]
    fn test_overlapping_yields_entries() {
        let spans = spans(&[(10, 20), (30, 40)]);

        let results = spans.overlapping(&interval(18, 32)).collect::<Vec<_>>();
        assert_eq!(
            results,
            vec![
                (&interval(10, 20), Containment::Start),
                (&interval(30, 40), Containment::End),
            ]
        );
    }

    #[test]
    fn test_push_then_sort() {
        let mut spans = SortedSpans::default();
        spans.push(interval(30, 40));
        spans.push(interval(1, 100));
        spans.sort();

        assert_eq!(spans.entries()[0], interval(1, 100));
        assert_eq!(indices(&spans.find_overlaps(&interval(50, 60))), vec![0]);
    }

    #[test]
    fn test_randomized_disjoint_against_linear_scan() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let n = rng.gen_range(0..100usize);
            let spans = SortedSpans::new(disjoint_intervals(&mut rng, n));
            let max = spans.entries().last().map(|e| e.end()).unwrap_or(100) + 50;

            for _ in 0..50 {
                let start = rng.gen_range(1..max);
                let end = start + rng.gen_range(0..120u64);
                let query = interval(start, end);

                let expected = linear_scan(spans.entries(), &query);
                let actual = indices(&spans.find_overlaps(&query));

                assert_eq!(actual, expected, "query {query} against {spans:?}");
            }
        }
    }

    #[test]
    fn test_randomized_nested_against_linear_scan() {
        let mut rng = StdRng::seed_from_u64(0xa11c);

        for _ in 0..200 {
            let n = rng.gen_range(1..80usize);
            let spans = SortedSpans::new(nested_intervals(&mut rng, n));

            for _ in 0..50 {
                let start = rng.gen_range(1..3_500u64);
                let end = start + rng.gen_range(0..50u64);
                let query = interval(start, end);

                let expected = linear_scan(spans.entries(), &query);
                let actual = indices(&spans.find_overlaps(&query));

                // The anchor is always the first overlapping entry.
                assert_eq!(
                    spans.find_anchor(&query),
                    expected.first().copied(),
                    "query {query} against {spans:?}"
                );
                assert_eq!(actual.is_empty(), expected.is_empty());
                assert_eq!(actual.first(), expected.first());
                assert!(actual.iter().all(|i| expected.contains(i)));
            }
        }
    }

    #[test]
    fn test_randomized_disjoint_against_lapper() {
        let mut rng = StdRng::seed_from_u64(42);
        let spans = SortedSpans::new(disjoint_intervals(&mut rng, 500));

        // `rust-lapper` works with half-open intervals.
        let tree = lapper::Lapper::new(
            spans
                .entries()
                .iter()
                .enumerate()
                .map(|(i, e)| lapper::Interval {
                    start: e.start(),
                    stop: e.end() + 1,
                    val: i,
                })
                .collect::<Vec<_>>(),
        );

        let max = spans.entries().last().map(|e| e.end()).unwrap_or(100) + 50;
        for _ in 0..2_000 {
            let start = rng.gen_range(1..max);
            let end = start + rng.gen_range(0..200u64);
            let query = interval(start, end);

            let mut expected = tree
                .find(query.start(), query.end() + 1)
                .map(|iv| iv.val)
                .collect::<Vec<_>>();
            expected.sort_unstable();

            assert_eq!(indices(&spans.find_overlaps(&query)), expected);
        }
    }
}
