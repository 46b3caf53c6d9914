//! Cycle detection during graph construction.
//!
//! The detector tracks the chain of targets currently being resolved. It is
//! not a general cycle search: it only sees edges the loader traverses, and
//! the loader traverses every declared target edge of every uncached target.

use crate::error::GraphLoadingError;
use crate::node::NodeKey;

/// In-progress resolution chain for one load.
#[derive(Debug, Default)]
pub struct CircularDetector {
    chain: Vec<NodeKey>,
}

impl CircularDetector {
    /// Creates a detector with an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that resolving `from` now requires resolving `to`.
    ///
    /// `from` is pushed if it is not already the innermost entry. Fails with
    /// the full cycle, starting and ending at `to`, when `to` is still in
    /// progress.
    pub fn start(&mut self, from: &NodeKey, to: &NodeKey) -> Result<(), GraphLoadingError> {
        if self.chain.last() != Some(from) {
            self.chain.push(from.clone());
        }
        if let Some(position) = self.chain.iter().position(|key| key == to) {
            let mut cycle = self.chain[position..].to_vec();
            cycle.push(to.clone());
            tracing::debug!(
                "circular dependency detected while resolving {} -> {}",
                from,
                to
            );
            return Err(GraphLoadingError::CircularDependency { cycle });
        }
        self.chain.push(to.clone());
        Ok(())
    }

    /// Marks `node` as fully resolved.
    ///
    /// Only the innermost entry can complete; completing anything else is a no-op.
    pub fn complete(&mut self, node: &NodeKey) {
        if self.chain.last() == Some(node) {
            self.chain.pop();
        }
    }

    /// Returns `true` when nothing is being resolved.
    pub fn is_idle(&self) -> bool {
        self.chain.is_empty()
    }
}
