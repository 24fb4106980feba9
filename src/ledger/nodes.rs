//! Round-robin node selection.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ledger::types::{AccountId, Network};

/// Rotates through the node accounts of a network.
///
/// Each transaction is addressed to one node at build time, so spreading
/// consecutive builds over the node set spreads submission load.
#[derive(Debug)]
pub struct NodeSelector {
    nodes: Vec<AccountId>,
    counter: AtomicUsize,
}

impl NodeSelector {
    pub fn new(nodes: Vec<AccountId>) -> Self {
        Self {
            nodes,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn for_network(network: Network) -> Self {
        Self::new(network.node_accounts())
    }

    /// Next node in rotation, `None` when no nodes are known.
    pub fn next_node(&self) -> Option<AccountId> {
        if self.nodes.is_empty() {
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        Some(self.nodes[index])
    }

    pub fn nodes(&self) -> &[AccountId] {
        &self.nodes
    }
}
