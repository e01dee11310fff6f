mod fold;
mod interval;

pub(crate) use fold::render_id;
pub(crate) use interval::Interval;

use crate::error::Error;
use crate::SetAlgebra;
use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default cap on the number of members a parsed set may represent.
pub const DEFAULT_MAX_MEMBERS: u64 = 1 << 24;

/// Knobs shared by `RangeSet` and `NodeSet` construction.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Minimum run length before folding prefers `lo-hi/step` notation.
    /// `None` disables stepped folding.
    pub autostep: Option<usize>,
    /// Parsing fails with [`Error::ResourceLimit`] when a set would
    /// represent more members than this.
    pub max_members: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            autostep: None,
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }
}

impl ParseOptions {
    pub fn autostep(mut self, threshold: usize) -> Self {
        self.autostep = Some(threshold);
        self
    }

    pub fn max_members(mut self, max: u64) -> Self {
        self.max_members = max;
        self
    }
}

/// One parsed `N`, `N-M` or `N-M/S` term with its padding width.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct RangeStep {
    pub start: u32,
    pub end: u32,
    pub step: u32,
    pub pad: u32,
}

impl RangeStep {
    pub(crate) fn members(&self) -> u64 {
        u64::from((self.end - self.start) / self.step) + 1
    }
}

/// An ordered set of non-negative ids with optional zero-padding.
///
/// Stored as disjoint closed intervals in increasing order. Padding is a
/// display attribute only: membership and equality ignore it.
#[derive(Debug, Clone, Default)]
pub struct RangeSet {
    intervals: Vec<Interval>,
    autostep: Option<usize>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_autostep(mut self, autostep: Option<usize>) -> Self {
        self.autostep = autostep;
        self
    }

    pub fn set_autostep(&mut self, autostep: Option<usize>) {
        self.autostep = autostep;
    }

    pub fn autostep(&self) -> Option<usize> {
        self.autostep
    }

    /// Parses comma-separated `N`, `N-M` or `N-M/S` terms.
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self, Error> {
        crate::collections::parsers::range_set_expr(input, opts)
    }

    /// Adds the members of a parsed term. Members already present keep
    /// their current padding.
    pub(crate) fn push_step(&mut self, rs: &RangeStep) {
        let term: Vec<Interval> = if rs.step == 1 {
            vec![Interval::new(rs.start, rs.end, rs.pad)]
        } else {
            (rs.start..=rs.end)
                .step_by(rs.step as usize)
                .map(|v| Interval::new(v, v, rs.pad))
                .collect()
        };
        self.intervals = interval::merge_disjoint(
            &self.intervals,
            &interval::subtract(&term, &self.intervals),
        );
    }

    /// Number of distinct members.
    pub fn len(&self) -> u64 {
        self.intervals.iter().map(Interval::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        let idx = self.intervals.partition_point(|iv| iv.hi < id);
        self.intervals.get(idx).map_or(false, |iv| iv.lo <= id)
    }

    /// Iterates members in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.padded_iter(),
        }
    }

    pub(crate) fn padded_iter(&self) -> PaddedIter<'_> {
        PaddedIter {
            intervals: self.intervals.iter(),
            cur: None,
        }
    }

    /// First (smallest) member.
    pub(crate) fn first(&self) -> Option<u32> {
        self.intervals.first().map(|iv| iv.lo)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            intervals: interval::merge_disjoint(
                &self.intervals,
                &interval::subtract(&other.intervals, &self.intervals),
            ),
            autostep: self.autostep,
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            intervals: interval::intersect(&self.intervals, &other.intervals),
            autostep: self.autostep,
        }
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self {
            intervals: interval::subtract(&self.intervals, &other.intervals),
            autostep: self.autostep,
        }
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        Self {
            intervals: interval::merge_disjoint(
                &interval::subtract(&self.intervals, &other.intervals),
                &interval::subtract(&other.intervals, &self.intervals),
            ),
            autostep: self.autostep,
        }
    }

    /// Compacts the set into its canonical string form, honoring the
    /// stored autostep threshold.
    pub fn fold(&self) -> String {
        self.fold_with(self.autostep)
    }

    pub(crate) fn fold_with(&self, autostep: Option<usize>) -> String {
        debug!(
            "folding {} members held in {} intervals",
            self.len(),
            self.intervals.len()
        );
        match autostep {
            Some(t) if t >= 2 => fold::fold_stepped(self.padded_iter(), t),
            _ => fold::fold_intervals(&self.intervals),
        }
    }

    /// Rebuilds a set from ascending, deduplicated `(id, pad)` members.
    pub(crate) fn from_padded_members(members: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut intervals = Vec::new();
        for (v, pad) in members {
            interval::push_coalesced(&mut intervals, Interval::new(v, v, pad));
        }
        Self {
            intervals,
            autostep: None,
        }
    }

    /// Maximal contiguous runs ignoring padding, for membership comparison.
    fn runs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let mut iter = self.intervals.iter().peekable();
        std::iter::from_fn(move || {
            let first = iter.next()?;
            let (lo, mut hi) = (first.lo, first.hi);
            while let Some(next) = iter.peek() {
                if hi < u32::MAX && next.lo == hi + 1 {
                    hi = next.hi;
                    iter.next();
                } else {
                    break;
                }
            }
            Some((lo, hi))
        })
    }
}

impl PartialEq for RangeSet {
    fn eq(&self, other: &Self) -> bool {
        self.runs().eq(other.runs())
    }
}

impl Eq for RangeSet {}

impl From<u32> for RangeSet {
    fn from(id: u32) -> Self {
        Self {
            intervals: vec![Interval::new(id, id, 0)],
            autostep: None,
        }
    }
}

impl From<Vec<u32>> for RangeSet {
    fn from(mut ids: Vec<u32>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self::from_padded_members(ids.into_iter().map(|v| (v, 0)))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fold())
    }
}

impl FromStr for RangeSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fold())
    }
}

impl<'de> Deserialize<'de> for RangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl SetAlgebra for RangeSet {
    fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self, Error> {
        RangeSet::parse_with(input, opts)
    }

    fn update(&mut self, other: &Self) {
        *self = self.union(other);
    }

    fn intersection_update(&mut self, other: &Self) {
        *self = self.intersection(other);
    }

    fn difference_update(&mut self, other: &Self) {
        *self = self.difference(other);
    }

    fn symmetric_difference_update(&mut self, other: &Self) {
        *self = self.symmetric_difference(other);
    }

    fn count(&self) -> u64 {
        self.len()
    }

    fn fold(&self) -> String {
        RangeSet::fold(self)
    }

    fn expand(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.padded_iter().map(|(v, pad)| render_id(v, pad)))
    }
}

/// Ascending member iterator.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: PaddedIter<'a>,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }
}

/// Ascending `(member, pad)` iterator used for rendering.
#[derive(Debug, Clone)]
pub(crate) struct PaddedIter<'a> {
    intervals: std::slice::Iter<'a, Interval>,
    cur: Option<Interval>,
}

impl Iterator for PaddedIter<'_> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let iv = match &mut self.cur {
            Some(iv) => iv,
            None => {
                self.cur = Some(*self.intervals.next()?);
                self.cur.as_mut().unwrap()
            }
        };

        let item = (iv.lo, iv.pad);
        if iv.lo == iv.hi {
            self.cur = None;
        } else {
            iv.lo += 1;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fold_roundtrip() {
        let rs = RangeSet::parse("1,5,18-31").unwrap();
        assert_eq!(rs.fold(), "1,5,18-31");
        assert_eq!(rs.len(), 16);

        let back = RangeSet::parse(&rs.fold()).unwrap();
        assert_eq!(back, rs);
    }

    #[test]
    fn test_parse_merges_terms() {
        assert_eq!(RangeSet::parse("1-3,2-5,9").unwrap().fold(), "1-5,9");
        assert_eq!(RangeSet::parse("5,1,3").unwrap().fold(), "1,3,5");
        assert_eq!(RangeSet::parse("1-10/3").unwrap().fold(), "1,4,7,10");
        assert_eq!(RangeSet::parse("4-5,3,6").unwrap().fold(), "3-6");
    }

    #[test]
    fn test_parse_empty() {
        let rs = RangeSet::parse("").unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.fold(), "");
    }

    #[test]
    fn test_padding() {
        let rs = RangeSet::parse("01-03").unwrap();
        assert_eq!(rs.fold(), "01-03");
        assert_eq!(
            rs.expand().collect::<Vec<_>>(),
            vec!["01", "02", "03"]
        );

        // Width is not part of identity
        assert_eq!(rs, RangeSet::parse("1-3").unwrap());
    }

    #[test]
    fn test_autostep() {
        let opts = ParseOptions::default().autostep(3);
        let rs = RangeSet::parse_with("2,4,6", &opts).unwrap();
        assert_eq!(rs.fold(), "2-6/2");

        let opts = ParseOptions::default().autostep(4);
        let rs = RangeSet::parse_with("2,4,6", &opts).unwrap();
        assert_eq!(rs.fold(), "2,4,6");
    }

    #[test]
    fn test_contains() {
        let rs = RangeSet::parse("1,5,18-31").unwrap();
        assert!(rs.contains(1));
        assert!(!rs.contains(2));
        assert!(rs.contains(18));
        assert!(rs.contains(31));
        assert!(!rs.contains(32));
    }

    #[test]
    fn test_iter_restartable() {
        let rs = RangeSet::parse("3,5-7").unwrap();
        assert_eq!(rs.iter().collect::<Vec<_>>(), vec![3, 5, 6, 7]);
        assert_eq!(rs.iter().collect::<Vec<_>>(), vec![3, 5, 6, 7]);
    }

    #[test]
    fn test_union_pads_from_left() {
        let a = RangeSet::parse("01-03").unwrap();
        let b = RangeSet::parse("2-5").unwrap();
        assert_eq!(a.union(&b).fold(), "01-03,4-5");
        assert_eq!(b.union(&a).fold(), "01,2-5");
    }

    #[test]
    fn test_algebra() {
        let a = RangeSet::parse("1-10").unwrap();
        let b = RangeSet::parse("5-15").unwrap();

        assert_eq!(a.union(&b).fold(), "1-15");
        assert_eq!(a.intersection(&b).fold(), "5-10");
        assert_eq!(a.difference(&b).fold(), "1-4");
        assert_eq!(a.symmetric_difference(&b).fold(), "1-4,11-15");
    }

    #[test]
    fn test_inclusion_exclusion() {
        let a = RangeSet::parse("1-10,20-29").unwrap();
        let b = RangeSet::parse("5-24/3,40").unwrap();

        assert_eq!(
            a.union(&b).len() + a.intersection(&b).len(),
            a.len() + b.len()
        );
        assert_eq!(
            a.symmetric_difference(&b),
            a.union(&b).difference(&a.intersection(&b))
        );
    }

    #[test]
    fn test_update_ops() {
        let mut a = RangeSet::parse("1-5").unwrap();
        a.difference_update(&RangeSet::parse("3").unwrap());
        assert_eq!(a.fold(), "1-2,4-5");

        let mut a = RangeSet::parse("1-5").unwrap();
        a.intersection_update(&RangeSet::parse("4-9").unwrap());
        assert_eq!(a.fold(), "4-5");
    }

    #[test]
    fn test_fold_idempotent() {
        for input in ["1,5,18-31", "01-03,7", "0-100/7"] {
            let folded = RangeSet::parse(input).unwrap().fold();
            assert_eq!(RangeSet::parse(&folded).unwrap().fold(), folded);
        }
    }

    #[test]
    fn test_from_vec() {
        let rs = RangeSet::from(vec![4, 1, 2, 2, 9]);
        assert_eq!(rs.fold(), "1-2,4,9");
    }
}
