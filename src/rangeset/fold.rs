use super::interval::Interval;
use itertools::Itertools;
use log::trace;

/// Renders an id with its padding width.
pub(crate) fn render_id(value: u32, pad: u32) -> String {
    let pad = pad as usize;
    format!("{value:0>pad$}")
}

/// Folds a canonical interval list into comma-separated `lo-hi` terms.
pub(super) fn fold_intervals(intervals: &[Interval]) -> String {
    intervals.iter().map(Interval::to_string).join(",")
}

/// Folds members into terms, re-expressing uniform-step runs of at least
/// `threshold` members as `lo-hi/step`.
///
/// The scan is greedy: a run's step is the gap between its first two
/// members and it extends while the step and padding stay uniform. A run
/// below the threshold contributes its first member only and the scan
/// resumes at the second, so trailing members stay available for later
/// runs. Step-1 runs fold to `lo-hi` unconditionally.
pub(super) fn fold_stepped(members: impl Iterator<Item = (u32, u32)>, threshold: usize) -> String {
    let m: Vec<(u32, u32)> = members.collect();
    let mut terms = Vec::new();
    let mut i = 0;

    while i < m.len() {
        let (start, pad) = m[i];
        if i + 1 == m.len() {
            terms.push(render_id(start, pad));
            break;
        }

        let (second, pad2) = m[i + 1];
        if pad2 != pad {
            terms.push(render_id(start, pad));
            i += 1;
            continue;
        }

        let step = second - start;
        let mut j = i + 1;
        while j + 1 < m.len() && m[j + 1].1 == pad && m[j + 1].0 == m[j].0 + step {
            j += 1;
        }

        let count = j - i + 1;
        if step == 1 {
            terms.push(format!("{}-{}", render_id(start, pad), render_id(m[j].0, pad)));
            i = j + 1;
        } else if count >= threshold {
            terms.push(format!(
                "{}-{}/{}",
                render_id(start, pad),
                render_id(m[j].0, pad),
                step
            ));
            i = j + 1;
        } else {
            terms.push(render_id(start, pad));
            i += 1;
        }
    }

    trace!("folded {} members into {} terms", m.len(), terms.len());
    terms.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(members: &[u32], threshold: usize) -> String {
        fold_stepped(members.iter().map(|&v| (v, 0)), threshold)
    }

    #[test]
    fn test_fold_intervals() {
        assert_eq!(
            fold_intervals(&[
                Interval::new(1, 1, 0),
                Interval::new(5, 5, 0),
                Interval::new(18, 31, 0)
            ]),
            "1,5,18-31"
        );
        assert_eq!(fold_intervals(&[Interval::new(1, 3, 2)]), "01-03");
        assert_eq!(fold_intervals(&[]), "");
    }

    #[test]
    fn test_stepped_runs() {
        assert_eq!(fold(&[2, 4, 6], 3), "2-6/2");
        assert_eq!(fold(&[2, 4, 6], 4), "2,4,6");
        assert_eq!(fold(&[2, 4, 6, 8], 4), "2-8/2");
        assert_eq!(fold(&[0, 3, 6, 9, 11], 3), "0-9/3,11");
    }

    #[test]
    fn test_contiguous_always_folds() {
        assert_eq!(fold(&[1, 2], 5), "1-2");
        assert_eq!(fold(&[1, 2, 3, 4], 5), "1-4");
    }

    #[test]
    fn test_failed_run_releases_members() {
        // 7 must stay available to join the contiguous run behind it
        assert_eq!(fold(&[5, 7, 8, 9, 10], 3), "5,7-10");
    }

    #[test]
    fn test_mixed_runs() {
        assert_eq!(fold(&[1, 2, 3, 4, 6, 8, 10], 3), "1-4,6-10/2");
        assert_eq!(fold(&[1], 3), "1");
        assert_eq!(fold(&[], 3), "");
    }

    #[test]
    fn test_padding_breaks_runs() {
        // 8 and 010 have different widths so no common run is formed
        let members = [(8, 0), (10, 3), (12, 3), (14, 3)];
        assert_eq!(
            fold_stepped(members.iter().copied(), 3),
            "8,010-014/2"
        );
    }

    #[test]
    fn test_render_id() {
        assert_eq!(render_id(5, 0), "5");
        assert_eq!(render_id(5, 3), "005");
        assert_eq!(render_id(1234, 3), "1234");
    }
}
