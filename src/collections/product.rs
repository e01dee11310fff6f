use crate::rangeset::{PaddedIter, RangeSet};
use log::trace;

/// A cartesian product of per-slot ranges, one axis per numeric slot of a
/// skeleton. `a[1-2]b[5-6]` is one product with two axes.
#[derive(Debug, Clone)]
pub(crate) struct Product {
    pub(crate) slots: Vec<RangeSet>,
}

impl Product {
    pub(crate) fn len(&self) -> u64 {
        self.slots
            .iter()
            .fold(1u64, |acc, rs| acc.saturating_mul(rs.len()))
    }

    pub(crate) fn iter(&self) -> ProductIter<'_> {
        ProductIter {
            product: self,
            iters: self.slots.iter().map(RangeSet::padded_iter).collect(),
            current: Vec::with_capacity(self.slots.len()),
            started: false,
            done: false,
        }
    }

    /// Intersection along every axis, or `None` when some axis is empty.
    pub(crate) fn intersection(&self, other: &Product) -> Option<Product> {
        let mut slots = Vec::with_capacity(self.slots.len());
        for (a, b) in self.slots.iter().zip(&other.slots) {
            let inter = a.intersection(b);
            if inter.is_empty() {
                return None;
            }
            slots.push(inter);
        }
        Some(Product { slots })
    }

    /// Splits `self` into pairwise-disjoint products covering exactly the
    /// tuples not in `other`. Peels one axis at a time: the part of the
    /// axis outside `other` keeps the remaining axes whole, the part
    /// inside is narrowed and carried to the next axis.
    pub(crate) fn difference(&self, other: &Product) -> Vec<Product> {
        for (a, b) in self.slots.iter().zip(&other.slots) {
            if a.intersection(b).is_empty() {
                return vec![self.clone()];
            }
        }

        let mut pieces = Vec::new();
        let mut remaining = self.slots.clone();
        for axis in 0..self.slots.len() {
            let outside = remaining[axis].difference(&other.slots[axis]);
            if !outside.is_empty() {
                let mut slots = remaining.clone();
                slots[axis] = outside;
                pieces.push(Product { slots });
            }
            remaining[axis] = remaining[axis].intersection(&other.slots[axis]);
        }
        pieces
    }
}

/// Tuple iterator over one product, in odometer order (last axis fastest).
pub(crate) struct ProductIter<'a> {
    product: &'a Product,
    iters: Vec<PaddedIter<'a>>,
    current: Vec<(u32, u32)>,
    started: bool,
    done: bool,
}

impl Iterator for ProductIter<'_> {
    type Item = Vec<(u32, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            for it in &mut self.iters {
                match it.next() {
                    Some(v) => self.current.push(v),
                    None => {
                        self.done = true;
                        return None;
                    }
                }
            }
            return Some(self.current.clone());
        }

        let mut axis = self.iters.len();
        loop {
            if axis == 0 {
                self.done = true;
                return None;
            }
            axis -= 1;
            if let Some(v) = self.iters[axis].next() {
                self.current[axis] = v;
                return Some(self.current.clone());
            }
            self.iters[axis] = self.product.slots[axis].padded_iter();
            match self.iters[axis].next() {
                Some(v) => self.current[axis] = v,
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

/// A union of products over the same axes, kept pairwise disjoint so that
/// counting and iteration never see a tuple twice.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProductSet {
    products: Vec<Product>,
}

impl ProductSet {
    pub(crate) fn len(&self) -> u64 {
        self.products.iter().map(Product::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Adds a product, keeping only the parts not already covered.
    pub(crate) fn insert(&mut self, p: Product) {
        let mut pieces = vec![p];
        for existing in &self.products {
            pieces = pieces
                .iter()
                .flat_map(|q| q.difference(existing))
                .collect();
            if pieces.is_empty() {
                return;
            }
        }
        self.products.extend(pieces);
    }

    pub(crate) fn union_update(&mut self, other: &Self) {
        for p in &other.products {
            self.insert(p.clone());
        }
    }

    pub(crate) fn intersection(&self, other: &Self) -> Self {
        let mut products = Vec::new();
        for a in &self.products {
            for b in &other.products {
                if let Some(p) = a.intersection(b) {
                    products.push(p);
                }
            }
        }
        Self { products }
    }

    pub(crate) fn difference(&self, other: &Self) -> Self {
        let mut products = Vec::new();
        for a in &self.products {
            let mut pieces = vec![a.clone()];
            for b in &other.products {
                pieces = pieces.iter().flat_map(|q| q.difference(b)).collect();
                if pieces.is_empty() {
                    break;
                }
            }
            products.extend(pieces);
        }
        Self { products }
    }

    pub(crate) fn symmetric_difference(&self, other: &Self) -> Self {
        let mut res = self.difference(other);
        res.products.extend(other.difference(self).products);
        Self {
            products: res.products,
        }
    }

    pub(crate) fn iter(&self) -> ProductSetIter<'_> {
        ProductSetIter {
            products: self.products.iter(),
            cur: None,
        }
    }

    /// Tuple-level equality, ignoring how the set is cut into products.
    pub(crate) fn same_members(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut a: Vec<Vec<u32>> = self
            .iter()
            .map(|t| t.iter().map(|&(v, _)| v).collect())
            .collect();
        let mut b: Vec<Vec<u32>> = other
            .iter()
            .map(|t| t.iter().map(|&(v, _)| v).collect())
            .collect();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    /// Rebuilds a compact product list for display. Small sets are split
    /// into single tuples first so the merge can regroup them freely;
    /// large sets are merged as-is to stay cheap.
    pub(crate) fn folded_products(&self) -> Vec<Product> {
        let n = self.products.len() as u64;
        let mut products = if self.len() <= n.saturating_mul(n) {
            full_split(&self.products)
        } else {
            let mut products = self.products.clone();
            sort_products(&mut products);
            products
        };
        merge_products(&mut products);
        trace!(
            "folded {} products into {}",
            self.products.len(),
            products.len()
        );
        products
    }
}

/// Yields every tuple of every product, duplicate-free thanks to the
/// disjointness invariant.
pub(crate) struct ProductSetIter<'a> {
    products: std::slice::Iter<'a, Product>,
    cur: Option<ProductIter<'a>>,
}

impl<'a> Iterator for ProductSetIter<'a> {
    type Item = Vec<(u32, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cur) = &mut self.cur {
                if let Some(t) = cur.next() {
                    return Some(t);
                }
            }
            self.cur = Some(self.products.next()?.iter());
        }
    }
}

fn full_split(products: &[Product]) -> Vec<Product> {
    let mut tuples: Vec<Vec<(u32, u32)>> = products.iter().flat_map(Product::iter).collect();
    tuples.sort_unstable_by(|a, b| a.iter().map(|t| t.0).cmp(b.iter().map(|t| t.0)));
    tuples
        .into_iter()
        .map(|vals| Product {
            slots: vals
                .into_iter()
                .map(|(v, pad)| RangeSet::from_padded_members([(v, pad)]))
                .collect(),
        })
        .collect()
}

fn sort_products(products: &mut [Product]) {
    products.sort_by_cached_key(|p| {
        p.slots
            .iter()
            .map(|rs| rs.first().unwrap_or(0))
            .collect::<Vec<_>>()
    });
}

/// Repeatedly fuses pairs of products that differ along at most one axis,
/// replacing them with one product whose differing axis is the union.
fn merge_products(products: &mut Vec<Product>) {
    loop {
        let mut merged = false;
        let mut dellst = vec![false; products.len()];

        for i in 0..products.len() {
            if dellst[i] {
                continue;
            }
            for j in (i + 1)..products.len() {
                if dellst[j] {
                    continue;
                }
                let (head, tail) = products.split_at_mut(j);
                let pi = &mut head[i];
                let pj = &tail[0];

                let mut diff_axis = None;
                let mut diffs = 0;
                for axis in 0..pi.slots.len() {
                    if pi.slots[axis] != pj.slots[axis] {
                        diffs += 1;
                        diff_axis = Some(axis);
                        if diffs > 1 {
                            break;
                        }
                    }
                }
                if diffs > 1 {
                    continue;
                }
                if let Some(axis) = diff_axis {
                    pi.slots[axis] = pi.slots[axis].union(&pj.slots[axis]);
                }
                dellst[j] = true;
                merged = true;
            }
        }

        if !merged {
            break;
        }
        let mut flags = dellst.into_iter();
        products.retain(|_| !flags.next().unwrap_or(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(exprs: &[&str]) -> Product {
        Product {
            slots: exprs.iter().map(|s| RangeSet::parse(s).unwrap()).collect(),
        }
    }

    fn render(products: &[Product]) -> String {
        products
            .iter()
            .map(|p| {
                p.slots
                    .iter()
                    .map(|rs| format!("[{}]", rs.fold()))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_product_iter() {
        let p = product(&["1-2", "5-6"]);
        let tuples: Vec<Vec<u32>> = p
            .iter()
            .map(|t| t.iter().map(|&(v, _)| v).collect())
            .collect();
        assert_eq!(
            tuples,
            vec![vec![1, 5], vec![1, 6], vec![2, 5], vec![2, 6]]
        );
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_product_difference() {
        // Carve the overlap out of a square
        let pieces = product(&["0-10", "0-10"]).difference(&product(&["8-18", "8-18"]));
        assert_eq!(render(&pieces), "[0-7][0-10],[8-10][0-7]");

        // Disjoint products stay whole
        let pieces = product(&["0-3", "0-3"]).difference(&product(&["5-6", "0-3"]));
        assert_eq!(render(&pieces), "[0-3][0-3]");

        // Full coverage leaves nothing
        let pieces = product(&["1-2", "1-2"]).difference(&product(&["0-5", "0-5"]));
        assert!(pieces.is_empty());
    }

    #[test]
    fn test_insert_keeps_disjoint() {
        let mut ps = ProductSet::default();
        ps.insert(product(&["0-10", "0-10"]));
        ps.insert(product(&["5-15", "5-15"]));
        // two 11x11 squares sharing a 6x6 corner
        assert_eq!(ps.len(), 121 + 121 - 36);
        assert_eq!(ps.iter().count() as u64, ps.len());
    }

    #[test]
    fn test_intersection() {
        let mut a = ProductSet::default();
        a.insert(product(&["1,3,5,7,9", "1-7", "3"]));
        a.insert(product(&["1,3,5,7,9", "1-7", "2"]));
        let mut b = ProductSet::default();
        b.insert(product(&["2-5", "7", "2-3"]));

        let inter = a.intersection(&b);
        assert_eq!(render(&inter.folded_products()), "[3,5][7][2-3]");
    }

    #[test]
    fn test_fold_merges_single_axis() {
        let mut ps = ProductSet::default();
        ps.insert(product(&["0-10", "0-10"]));
        ps.insert(product(&["0-20", "0-10"]));
        assert_eq!(render(&ps.folded_products()), "[0-20][0-10]");
    }

    #[test]
    fn test_fold_overlapping_squares() {
        let mut ps = ProductSet::default();
        ps.insert(product(&["0-10", "0-10"]));
        ps.insert(product(&["8-18", "8-18"]));
        ps.insert(product(&["11-18", "0-7"]));
        assert_eq!(ps.len(), 297);
        assert_eq!(
            render(&ps.folded_products()),
            "[0-10][0-10],[8-10][11-18],[11-18][0-18]"
        );
    }

    #[test]
    fn test_same_members() {
        let mut a = ProductSet::default();
        a.insert(product(&["0-10", "0-10"]));
        let mut b = ProductSet::default();
        b.insert(product(&["0-5", "0-10"]));
        b.insert(product(&["6-10", "0-10"]));
        assert!(a.same_members(&b));

        b.insert(product(&["20", "20"]));
        assert!(!a.same_members(&b));
    }
}
