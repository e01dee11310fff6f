mod nodeset;
pub(crate) mod parsers;
mod pattern;
mod product;

pub use nodeset::{NodeSet, NodeSetIter};
