//! Node identifiers.

use serde::Serialize;
use std::fmt;

use crate::arena::ArenaId;

/// Position of a node in its graph's arena.
///
/// Only meaningful for the graph (or loader cache) that issued it. Ordering
/// follows allocation order, which is bottom-up: a target's dependencies are
/// always allocated before the target itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(u32);

impl ArenaId for NodeId {
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
