use crate::rangeset::{render_id, RangeSet};

/// Literal template of a pattern with the numeric slots erased.
///
/// `parts[i]` is the literal text before slot `i` (possibly empty) and
/// `suffix` the trailing literal text, if any. `node[1-5]p[0-1]` has
/// parts `["node", "p"]` and no suffix. Node names group by skeleton, so
/// this is the map key in `NodeSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Skeleton {
    parts: Vec<String>,
    suffix: Option<String>,
}

impl Skeleton {
    pub(crate) fn new(parts: Vec<String>, suffix: Option<String>) -> Self {
        Self { parts, suffix }
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.parts.len()
    }

    /// Renders one node name from per-slot `(id, pad)` values.
    pub(crate) fn render(&self, values: &[(u32, u32)]) -> String {
        debug_assert_eq!(values.len(), self.parts.len());
        let mut out = String::new();
        for (part, &(v, pad)) in self.parts.iter().zip(values) {
            out.push_str(part);
            out.push_str(&render_id(v, pad));
        }
        if let Some(suffix) = &self.suffix {
            out.push_str(suffix);
        }
        out
    }

    /// Renders the compact form. A slot whose fold is a single scalar
    /// keeps no brackets (`node3`, not `node[3]`); ranged or multi-term
    /// bodies are bracketed.
    pub(crate) fn render_folded(&self, folded_slots: &[String]) -> String {
        debug_assert_eq!(folded_slots.len(), self.parts.len());
        let mut out = String::new();
        for (part, body) in self.parts.iter().zip(folded_slots) {
            out.push_str(part);
            let scalar = !body.contains(|c: char| matches!(c, '-' | ',' | '/'));
            if scalar {
                out.push_str(body);
            } else {
                out.push('[');
                out.push_str(body);
                out.push(']');
            }
        }
        if let Some(suffix) = &self.suffix {
            out.push_str(suffix);
        }
        out
    }
}

/// A parsed pattern token: a skeleton plus one range set per slot.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub(crate) skeleton: Skeleton,
    pub(crate) slots: Vec<RangeSet>,
}

impl Pattern {
    pub(crate) fn new(skeleton: Skeleton, slots: Vec<RangeSet>) -> Self {
        debug_assert_eq!(skeleton.num_slots(), slots.len());
        Self { skeleton, slots }
    }

    /// Number of names the pattern stands for.
    pub(crate) fn member_count(&self) -> u64 {
        self.slots
            .iter()
            .fold(1u64, |acc, rs| acc.saturating_mul(rs.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let sk = Skeleton::new(vec!["node".into(), "p".into()], Some("-ib".into()));
        assert_eq!(sk.render(&[(1, 0), (7, 2)]), "node1p07-ib");
        assert_eq!(
            sk.render_folded(&["1-5".into(), "0,2".into()]),
            "node[1-5]p[0,2]-ib"
        );
        // Scalar bodies keep no brackets
        assert_eq!(
            sk.render_folded(&["3".into(), "07".into()]),
            "node3p07-ib"
        );
    }

    #[test]
    fn test_render_no_slots() {
        let sk = Skeleton::new(vec![], Some("login".into()));
        assert_eq!(sk.render(&[]), "login");
        assert_eq!(sk.render_folded(&[]), "login");
    }

    #[test]
    fn test_member_count() {
        let sk = Skeleton::new(vec!["a".into(), "b".into()], None);
        let p = Pattern::new(
            sk,
            vec![
                RangeSet::parse("1-5").unwrap(),
                RangeSet::parse("0-1").unwrap(),
            ],
        );
        assert_eq!(p.member_count(), 10);
    }
}
