use std::fmt;

/// A closed interval of ids carrying an optional zero-padding width.
///
/// `pad == 0` means no padding; otherwise every member renders with at
/// least `pad` digits, zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    pub lo: u32,
    pub hi: u32,
    pub pad: u32,
}

impl Interval {
    pub(crate) fn new(lo: u32, hi: u32, pad: u32) -> Self {
        debug_assert!(lo <= hi);
        Self { lo, hi, pad }
    }

    pub(crate) fn len(&self) -> u64 {
        u64::from(self.hi - self.lo) + 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = self.pad as usize;
        if self.lo == self.hi {
            write!(f, "{:0>pad$}", self.lo)
        } else {
            write!(f, "{:0>pad$}-{:0>pad$}", self.lo, self.hi)
        }
    }
}

/// Appends an interval to a canonical list, coalescing it with the last
/// entry when they touch and share a padding width. The interval must start
/// after the last entry ends.
pub(crate) fn push_coalesced(res: &mut Vec<Interval>, iv: Interval) {
    if let Some(last) = res.last_mut() {
        debug_assert!(iv.lo > last.hi);
        if last.pad == iv.pad && iv.lo == last.hi + 1 {
            last.hi = iv.hi;
            return;
        }
    }
    res.push(iv);
}

/// Merges two canonical lists covering disjoint members into one canonical
/// list.
pub(crate) fn merge_disjoint(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        let take_a = j >= b.len() || (i < a.len() && a[i].lo <= b[j].lo);
        let iv = if take_a {
            i += 1;
            a[i - 1]
        } else {
            j += 1;
            b[j - 1]
        };
        push_coalesced(&mut res, iv);
    }

    res
}

/// Members of `a` not covered by `b`, keeping `a`'s padding.
pub(crate) fn subtract(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut res = Vec::new();
    let mut j = 0;

    for iv in a {
        let mut lo = iv.lo;
        while j < b.len() && b[j].hi < lo {
            j += 1;
        }

        let mut k = j;
        let mut consumed = false;
        while k < b.len() && b[k].lo <= iv.hi {
            if b[k].lo > lo {
                push_coalesced(&mut res, Interval::new(lo, b[k].lo - 1, iv.pad));
            }
            if b[k].hi >= iv.hi {
                consumed = true;
                break;
            }
            lo = lo.max(b[k].hi + 1);
            k += 1;
        }

        if !consumed && lo <= iv.hi {
            push_coalesced(&mut res, Interval::new(lo, iv.hi, iv.pad));
        }
    }

    res
}

/// Members present in both lists, keeping `a`'s padding.
pub(crate) fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut res = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let lo = a[i].lo.max(b[j].lo);
        let hi = a[i].hi.min(b[j].hi);
        if lo <= hi {
            push_coalesced(&mut res, Interval::new(lo, hi, a[i].pad));
        }
        if a[i].hi <= b[j].hi {
            i += 1;
        } else {
            j += 1;
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ivs(bounds: &[(u32, u32)]) -> Vec<Interval> {
        bounds
            .iter()
            .map(|&(lo, hi)| Interval::new(lo, hi, 0))
            .collect()
    }

    #[test]
    fn test_merge_disjoint() {
        assert_eq!(
            merge_disjoint(&ivs(&[(0, 2), (9, 9)]), &ivs(&[(4, 5)])),
            ivs(&[(0, 2), (4, 5), (9, 9)])
        );
        assert_eq!(merge_disjoint(&ivs(&[(0, 2)]), &[]), ivs(&[(0, 2)]));
        assert_eq!(merge_disjoint(&[], &ivs(&[(0, 2)])), ivs(&[(0, 2)]));
        // Touching intervals with the same width coalesce
        assert_eq!(
            merge_disjoint(&ivs(&[(0, 2)]), &ivs(&[(3, 5)])),
            ivs(&[(0, 5)])
        );
        // Touching intervals with different widths stay apart
        assert_eq!(
            merge_disjoint(&ivs(&[(0, 2)]), &[Interval::new(3, 5, 2)]),
            vec![Interval::new(0, 2, 0), Interval::new(3, 5, 2)]
        );
    }

    #[test]
    fn test_subtract() {
        assert_eq!(
            subtract(&ivs(&[(1, 10)]), &ivs(&[(3, 3), (6, 7)])),
            ivs(&[(1, 2), (4, 5), (8, 10)])
        );
        assert_eq!(subtract(&ivs(&[(1, 10)]), &ivs(&[(0, 20)])), vec![]);
        assert_eq!(subtract(&ivs(&[(1, 10)]), &[]), ivs(&[(1, 10)]));
        assert_eq!(
            subtract(&ivs(&[(1, 3), (8, 9)]), &ivs(&[(3, 8)])),
            ivs(&[(1, 2), (9, 9)])
        );
        assert_eq!(
            subtract(&ivs(&[(5, 5), (7, 7)]), &ivs(&[(5, 5)])),
            ivs(&[(7, 7)])
        );
    }

    #[test]
    fn test_subtract_spanning_other() {
        // One subtrahend interval spans several minuend intervals
        assert_eq!(
            subtract(&ivs(&[(1, 2), (4, 5), (9, 9)]), &ivs(&[(0, 6)])),
            ivs(&[(9, 9)])
        );
    }

    #[test]
    fn test_intersect() {
        assert_eq!(
            intersect(&ivs(&[(1, 10)]), &ivs(&[(3, 3), (6, 12)])),
            ivs(&[(3, 3), (6, 10)])
        );
        assert_eq!(intersect(&ivs(&[(1, 2)]), &ivs(&[(3, 4)])), vec![]);
        assert_eq!(intersect(&ivs(&[(1, 4)]), &[]), vec![]);
        // Padding comes from the left operand
        assert_eq!(
            intersect(&[Interval::new(1, 4, 2)], &ivs(&[(2, 3)])),
            vec![Interval::new(2, 3, 2)]
        );
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval::new(3, 3, 0).to_string(), "3");
        assert_eq!(Interval::new(3, 7, 0).to_string(), "3-7");
        assert_eq!(Interval::new(3, 7, 2).to_string(), "03-07");
        assert_eq!(Interval::new(98, 102, 3).to_string(), "098-102");
    }
}
