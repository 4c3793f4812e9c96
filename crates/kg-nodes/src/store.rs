//! Versioned node store.
//!
//! Reads resolve the latest committed version of a node. Writes go through
//! [`NodeStore::get_writable`], which clones the committed node into a
//! pending version; [`NodeStore::commit`] publishes every pending change at
//! once and [`NodeStore::discard`] drops them.

use std::collections::HashMap;

use crate::card::CardNode;
use crate::node::NodeKey;

/// Cards addressed by [`NodeKey`] with clone-on-write updates.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    committed: HashMap<NodeKey, CardNode>,
    /// `None` marks a pending removal.
    pending: HashMap<NodeKey, Option<CardNode>>,
    version: u64,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new card; it becomes readable after the next commit.
    pub fn insert(&mut self, card: impl Into<CardNode>) -> NodeKey {
        let card = card.into();
        let key = card.key();
        self.pending.insert(key, Some(card));
        key
    }

    /// The committed version of a node.
    pub fn get_latest(&self, key: NodeKey) -> Option<&CardNode> {
        self.committed.get(&key)
    }

    /// A pending copy of a node, cloned from the committed version on first
    /// access. Nodes staged for removal are not writable.
    pub fn get_writable(&mut self, key: NodeKey) -> Option<&mut CardNode> {
        if !self.pending.contains_key(&key) {
            let card = self.committed.get(&key)?.clone();
            self.pending.insert(key, Some(card));
        }
        self.pending.get_mut(&key)?.as_mut()
    }

    /// Stage removal of a node. Returns whether the node existed.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        let exists = match self.pending.get(&key) {
            Some(pending) => pending.is_some(),
            None => self.committed.contains_key(&key),
        };
        if exists {
            self.pending.insert(key, None);
        }
        exists
    }

    /// Publish pending changes, returning the new version.
    ///
    /// The version only advances when something was pending.
    pub fn commit(&mut self) -> u64 {
        if self.pending.is_empty() {
            return self.version;
        }
        let changes = self.pending.len();
        for (key, card) in self.pending.drain() {
            match card {
                Some(card) => {
                    self.committed.insert(key, card);
                }
                None => {
                    self.committed.remove(&key);
                }
            }
        }
        self.version += 1;
        tracing::debug!(version = self.version, changes, "Committed node store");
        self.version
    }

    /// Drop every pending change.
    pub fn discard(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(changes = self.pending.len(), "Discarded pending nodes");
        }
        self.pending.clear();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Committed nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CardNode> {
        self.committed.values()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}
