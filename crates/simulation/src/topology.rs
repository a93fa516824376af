//! Deterministic wiring of the opinion network.
//!
//! Three kinds of directed edges carry sentiment:
//! - every initiator broadcasts to every retail investor,
//! - retail investors are partitioned into consecutive neighbour
//!   groups and hear the other members of their group,
//! - each momentum trader is attached round-robin to one retail group
//!   and hears its members, which is how retail sentiment spills into
//!   systematic flow.
//!
//! The graph is a pure function of the population layout, so identical
//! configs always wire identically.

use std::ops::Range;

/// Directed opinion edges, stored inbound: `inbound[i]` lists the
/// agents whose broadcasts agent `i` receives.
#[derive(Debug, Clone)]
pub struct OpinionGraph {
    inbound: Vec<Vec<usize>>,
}

impl OpinionGraph {
    /// Wire the network for a population of `total` agents laid out
    /// with the given index ranges.
    pub fn wire(
        total: usize,
        retail: Range<usize>,
        momentum: Range<usize>,
        initiators: Range<usize>,
        group_size: usize,
    ) -> Self {
        let mut inbound = vec![Vec::new(); total];
        let group_size = group_size.max(1);

        for listener in retail.clone() {
            inbound[listener].extend(initiators.clone());
        }

        let groups: Vec<Vec<usize>> = retail
            .clone()
            .collect::<Vec<_>>()
            .chunks(group_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        for group in &groups {
            for &listener in group {
                for &speaker in group {
                    if speaker != listener {
                        inbound[listener].push(speaker);
                    }
                }
            }
        }

        if !groups.is_empty() {
            for (offset, listener) in momentum.enumerate() {
                let group = &groups[offset % groups.len()];
                inbound[listener].extend(group.iter().copied());
            }
        }

        Self { inbound }
    }

    /// Agents whose broadcasts `listener` receives.
    pub fn inbound(&self, listener: usize) -> &[usize] {
        &self.inbound[listener]
    }

    pub fn len(&self) -> usize {
        self.inbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty()
    }

    /// Extend the graph with an agent outside the opinion network.
    pub(crate) fn add_isolated(&mut self) {
        self.inbound.push(Vec::new());
    }
}
