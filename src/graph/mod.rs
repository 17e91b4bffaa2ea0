//! Association graph post-processing.
//!
//! Everything here is a pure function over plain data: backend rows become a
//! [`Graph`] through [`aggregate`], and a [`FilterState`] narrows that base
//! graph into a [`DisplayGraph`] for the canvas. Nothing in this module knows
//! about rendering.

mod aggregate;
mod highlight;
mod neighborhood;
mod threshold;
mod types;

pub use aggregate::{AggregateOptions, DEFAULT_WEIGHT_SCALE, EdgeMerge, aggregate};
pub use highlight::{DisplayGraph, FilterState, Highlight};
pub use threshold::EdgeRule;
pub use types::{Graph, NodeId, NodeKind, RawAssociationRecord};
