//! Compact representation and algebra for cluster node sets.
//!
//! Node names like `node[1-5]` or `a[1-2]b[1-2]-ib` are kept in their
//! compact form: counting, iterating and set operations work on ranges
//! and products of ranges, never on expanded name lists.
//!
//! ```
//! use noderange::NodeSet;
//!
//! # fn main() -> Result<(), noderange::Error> {
//! let mut nodes: NodeSet = "node[1-5]".parse()?;
//! nodes.difference_update(&"node3".parse()?);
//! assert_eq!(nodes.to_string(), "node[1-2,4-5]");
//! assert_eq!(nodes.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! Bare numeric ranges are available on their own through [`RangeSet`]:
//!
//! ```
//! use noderange::RangeSet;
//!
//! # fn main() -> Result<(), noderange::Error> {
//! let ids: RangeSet = "1,5,18-31".parse()?;
//! assert_eq!(ids.len(), 16);
//! assert!(ids.contains(20));
//! # Ok(())
//! # }
//! ```

mod collections;
mod error;
mod rangeset;

pub use collections::{NodeSet, NodeSetIter};
pub use error::{Error, ParseError, ParseErrorKind};
pub use rangeset::{Iter as RangeSetIter, ParseOptions, RangeSet, DEFAULT_MAX_MEMBERS};

/// Operations shared by [`RangeSet`] and [`NodeSet`], for callers that
/// work generically over either flavor of set.
pub trait SetAlgebra: Sized {
    fn parse_with(input: &str, opts: &ParseOptions) -> Result<Self, Error>;

    /// In-place union.
    fn update(&mut self, other: &Self);
    fn intersection_update(&mut self, other: &Self);
    fn difference_update(&mut self, other: &Self);
    fn symmetric_difference_update(&mut self, other: &Self);

    /// Number of distinct members.
    fn count(&self) -> u64;

    /// Canonical compact string form.
    fn fold(&self) -> String;

    /// Rendered members, lazily.
    fn expand(&self) -> Box<dyn Iterator<Item = String> + '_>;
}
