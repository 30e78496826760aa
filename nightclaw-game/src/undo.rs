//! Bounded history of full session snapshots.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{NodeId, UNDO_DEPTH};
use crate::inventory::Item;
use crate::stats::Stats;

/// Everything an undo restores, copied by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub current_node: NodeId,
    pub return_to: NodeId,
    pub stats: Stats,
    pub items: Vec<Item>,
    pub log: Vec<String>,
}

/// Most-recent-last stack that forgets its oldest entry past `depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStack {
    entries: VecDeque<GameSnapshot>,
    depth: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(UNDO_DEPTH)
    }
}

impl UndoStack {
    /// A depth of zero is raised to one.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            entries: VecDeque::with_capacity(depth + 1),
            depth,
        }
    }

    pub fn push(&mut self, snapshot: GameSnapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<GameSnapshot> {
        self.entries.pop_back()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&GameSnapshot> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_RETURN;

    fn snapshot(node: NodeId) -> GameSnapshot {
        GameSnapshot {
            current_node: node,
            return_to: NO_RETURN,
            stats: Stats::default(),
            items: Vec::new(),
            log: vec![format!("at {node}")],
        }
    }

    #[test]
    fn evicts_oldest_past_depth() {
        let mut stack = UndoStack::default();
        for node in 1..=6 {
            stack.push(snapshot(node));
            assert!(stack.len() <= 5);
        }
        assert_eq!(stack.len(), 5);

        let popped: Vec<_> = std::iter::from_fn(|| stack.pop())
            .map(|entry| entry.current_node)
            .collect();
        assert_eq!(popped, [6, 5, 4, 3, 2]);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut stack = UndoStack::new(3);
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn zero_depth_keeps_one_entry() {
        let mut stack = UndoStack::new(0);
        stack.push(snapshot(1));
        stack.push(snapshot(2));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.peek().map(|entry| entry.current_node), Some(2));
    }
}
