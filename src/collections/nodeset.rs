use super::parsers;
use super::pattern::{Pattern, Skeleton};
use super::product::{Product, ProductSet, ProductSetIter};
use crate::error::Error;
use crate::rangeset::{PaddedIter, ParseOptions, RangeSet};
use crate::SetAlgebra;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Slot contents for one skeleton. The arity is a function of the
/// skeleton, so two entries under the same key always have the same
/// variant.
#[derive(Debug, Clone)]
enum Slots {
    Literal,
    Single(RangeSet),
    Product(ProductSet),
}

impl Slots {
    fn from_ranges(mut slots: Vec<RangeSet>) -> Self {
        match slots.len() {
            0 => Slots::Literal,
            1 => Slots::Single(slots.swap_remove(0)),
            _ => {
                let mut ps = ProductSet::default();
                ps.insert(Product { slots });
                Slots::Product(ps)
            }
        }
    }

    fn count(&self) -> u64 {
        match self {
            Slots::Literal => 1,
            Slots::Single(rs) => rs.len(),
            Slots::Product(ps) => ps.len(),
        }
    }

    fn union_update(&mut self, other: &Slots) {
        match (self, other) {
            (Slots::Literal, Slots::Literal) => {}
            (Slots::Single(a), Slots::Single(b)) => *a = a.union(b),
            (Slots::Product(a), Slots::Product(b)) => a.union_update(b),
            _ => unreachable!("slot arity differs for identical skeletons"),
        }
    }

    fn intersection(&self, other: &Slots) -> Option<Slots> {
        match (self, other) {
            (Slots::Literal, Slots::Literal) => Some(Slots::Literal),
            (Slots::Single(a), Slots::Single(b)) => {
                let r = a.intersection(b);
                (!r.is_empty()).then_some(Slots::Single(r))
            }
            (Slots::Product(a), Slots::Product(b)) => {
                let r = a.intersection(b);
                (!r.is_empty()).then_some(Slots::Product(r))
            }
            _ => unreachable!("slot arity differs for identical skeletons"),
        }
    }

    fn difference(&self, other: &Slots) -> Option<Slots> {
        match (self, other) {
            (Slots::Literal, Slots::Literal) => None,
            (Slots::Single(a), Slots::Single(b)) => {
                let r = a.difference(b);
                (!r.is_empty()).then_some(Slots::Single(r))
            }
            (Slots::Product(a), Slots::Product(b)) => {
                let r = a.difference(b);
                (!r.is_empty()).then_some(Slots::Product(r))
            }
            _ => unreachable!("slot arity differs for identical skeletons"),
        }
    }

    fn symmetric_difference(&self, other: &Slots) -> Option<Slots> {
        match (self, other) {
            (Slots::Literal, Slots::Literal) => None,
            (Slots::Single(a), Slots::Single(b)) => {
                let r = a.symmetric_difference(b);
                (!r.is_empty()).then_some(Slots::Single(r))
            }
            (Slots::Product(a), Slots::Product(b)) => {
                let r = a.symmetric_difference(b);
                (!r.is_empty()).then_some(Slots::Product(r))
            }
            _ => unreachable!("slot arity differs for identical skeletons"),
        }
    }

    fn same_members(&self, other: &Slots) -> bool {
        match (self, other) {
            (Slots::Literal, Slots::Literal) => true,
            (Slots::Single(a), Slots::Single(b)) => a == b,
            (Slots::Product(a), Slots::Product(b)) => a.same_members(b),
            _ => unreachable!("slot arity differs for identical skeletons"),
        }
    }
}

/// An ordered set of node names sharing numeric patterns.
///
/// Names are grouped by skeleton (the literal template around the numeric
/// parts) in first-insertion order. Within a skeleton, members are stored
/// as ranges or as disjoint cartesian products of ranges, so counting and
/// iteration never materialize the expanded list.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    entries: IndexMap<Skeleton, Slots>,
    autostep: Option<usize>,
}

impl NodeSet {
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

    /// Parses patterns separated by commas and/or whitespace.
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self, Error> {
        parsers::node_set_expr(input, opts)
    }

    pub(crate) fn insert_pattern(&mut self, pattern: Pattern, max: u64) -> Result<(), Error> {
        let requested = self.len().saturating_add(pattern.member_count());
        if requested > max {
            return Err(Error::ResourceLimit { requested, max });
        }

        let incoming = Slots::from_ranges(pattern.slots);
        match self.entries.get_mut(&pattern.skeleton) {
            Some(slots) => slots.union_update(&incoming),
            None => {
                self.entries.insert(pattern.skeleton, incoming);
            }
        }
        Ok(())
    }

    /// Number of distinct names.
    pub fn len(&self) -> u64 {
        self.entries.values().map(Slots::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// In-place union.
    pub fn update(&mut self, other: &Self) {
        for (k, v) in &other.entries {
            match self.entries.get_mut(k) {
                Some(slots) => slots.union_update(v),
                None => {
                    self.entries.insert(k.clone(), v.clone());
                }
            }
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut entries = IndexMap::new();
        for (k, v) in &self.entries {
            if let Some(ov) = other.entries.get(k) {
                if let Some(r) = v.intersection(ov) {
                    entries.insert(k.clone(), r);
                }
            }
        }
        Self {
            entries,
            autostep: self.autostep,
        }
    }

    pub fn difference(&self, other: &Self) -> Self {
        let mut entries = IndexMap::new();
        for (k, v) in &self.entries {
            let r = match other.entries.get(k) {
                None => Some(v.clone()),
                Some(ov) => v.difference(ov),
            };
            if let Some(r) = r {
                entries.insert(k.clone(), r);
            }
        }
        Self {
            entries,
            autostep: self.autostep,
        }
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut entries = IndexMap::new();
        for (k, v) in &self.entries {
            let r = match other.entries.get(k) {
                None => Some(v.clone()),
                Some(ov) => v.symmetric_difference(ov),
            };
            if let Some(r) = r {
                entries.insert(k.clone(), r);
            }
        }
        for (k, v) in &other.entries {
            if !self.entries.contains_key(k) {
                entries.insert(k.clone(), v.clone());
            }
        }
        Self {
            entries,
            autostep: self.autostep,
        }
    }

    pub fn intersection_update(&mut self, other: &Self) {
        *self = self.intersection(other);
    }

    pub fn difference_update(&mut self, other: &Self) {
        *self = self.difference(other);
    }

    pub fn symmetric_difference_update(&mut self, other: &Self) {
        *self = self.symmetric_difference(other);
    }

    /// Iterates rendered names: skeletons in insertion order, members in
    /// ascending cartesian order within each skeleton.
    pub fn iter(&self) -> NodeSetIter<'_> {
        NodeSetIter {
            entries: self.entries.iter(),
            cur: None,
        }
    }

    /// Compacts the set into its canonical string form.
    pub fn fold(&self) -> String {
        let mut terms = Vec::new();
        for (sk, slots) in &self.entries {
            match slots {
                Slots::Literal => terms.push(sk.render(&[])),
                Slots::Single(rs) => {
                    terms.push(sk.render_folded(&[rs.fold_with(self.autostep)]));
                }
                Slots::Product(ps) => {
                    for p in ps.folded_products() {
                        let folded: Vec<String> = p
                            .slots
                            .iter()
                            .map(|rs| rs.fold_with(self.autostep))
                            .collect();
                        terms.push(sk.render_folded(&folded));
                    }
                }
            }
        }
        terms.join(",")
    }
}

impl PartialEq for NodeSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(k, v)| {
                other
                    .entries
                    .get(k)
                    .map_or(false, |ov| v.same_members(ov))
            })
    }
}

impl Eq for NodeSet {}

impl fmt::Display for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fold())
    }
}

impl FromStr for NodeSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for NodeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fold())
    }
}

impl<'de> Deserialize<'de> for NodeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl SetAlgebra for NodeSet {
    fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self, Error> {
        NodeSet::parse_with(input, opts)
    }

    fn update(&mut self, other: &Self) {
        NodeSet::update(self, other);
    }

    fn intersection_update(&mut self, other: &Self) {
        NodeSet::intersection_update(self, other);
    }

    fn difference_update(&mut self, other: &Self) {
        NodeSet::difference_update(self, other);
    }

    fn symmetric_difference_update(&mut self, other: &Self) {
        NodeSet::symmetric_difference_update(self, other);
    }

    fn count(&self) -> u64 {
        self.len()
    }

    fn fold(&self) -> String {
        NodeSet::fold(self)
    }

    fn expand(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.iter())
    }
}

enum EntryIter<'a> {
    Literal(bool),
    Single(PaddedIter<'a>),
    Product(ProductSetIter<'a>),
}

impl EntryIter<'_> {
    fn next_values(&mut self) -> Option<Vec<(u32, u32)>> {
        match self {
            EntryIter::Literal(done) => {
                if *done {
                    None
                } else {
                    *done = true;
                    Some(Vec::new())
                }
            }
            EntryIter::Single(it) => it.next().map(|v| vec![v]),
            EntryIter::Product(it) => it.next(),
        }
    }
}

/// Lazy name iterator, restartable from [`NodeSet::iter`].
pub struct NodeSetIter<'a> {
    entries: indexmap::map::Iter<'a, Skeleton, Slots>,
    cur: Option<(&'a Skeleton, EntryIter<'a>)>,
}

impl Iterator for NodeSetIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((sk, it)) = &mut self.cur {
                if let Some(values) = it.next_values() {
                    return Some(sk.render(&values));
                }
            }
            let (sk, slots) = self.entries.next()?;
            let it = match slots {
                Slots::Literal => EntryIter::Literal(false),
                Slots::Single(rs) => EntryIter::Single(rs.padded_iter()),
                Slots::Product(ps) => EntryIter::Product(ps.iter()),
            };
            self.cur = Some((sk, it));
        }
    }
}
