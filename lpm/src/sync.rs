// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Writer-serializing wrapper around [`NetworkTrie`].

use std::sync::Arc;

use net::{AddressFamily, Network};
use parking_lot::Mutex;

use crate::errors::TrieError;
use crate::trie::{NetworkTrie, TrieMatch};

/// A [`NetworkTrie`] whose writers are serialized internally.
///
/// Mutations take one mutex for their whole duration, which is all the
/// base trie's single-writer contract asks for. Readers never lock: they
/// go straight to the lock-free base structure, so lookups and rendering
/// proceed concurrently with any writer.
#[derive(Debug)]
pub struct SharedNetworkTrie<V> {
    trie: NetworkTrie<V>,
    write_lock: Mutex<()>,
}

impl<V> Default for SharedNetworkTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SharedNetworkTrie<V> {
    /// Create an empty trie.
    #[must_use]
    pub fn new() -> Self {
        SharedNetworkTrie {
            trie: NetworkTrie::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Serialized [`NetworkTrie::add`].
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::Duplicate`] if the exact network is already
    /// present as a value node.
    pub fn add(&self, network: Network, value: V) -> Result<(), TrieError> {
        let _guard = self.write_lock.lock();
        self.trie.add(network, value)
    }

    /// Serialized [`NetworkTrie::try_add`].
    pub fn try_add(&self, network: Network, value: V) -> bool {
        let _guard = self.write_lock.lock();
        self.trie.try_add(network, value)
    }

    /// Serialized [`NetworkTrie::get_or_add_with`].
    pub fn get_or_add_with<F>(&self, network: Network, value: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        let _guard = self.write_lock.lock();
        self.trie.get_or_add_with(network, value)
    }

    /// Serialized [`NetworkTrie::remove`].
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if the network is not present as a
    /// value node.
    pub fn remove(&self, network: &Network) -> Result<(), TrieError> {
        let _guard = self.write_lock.lock();
        self.trie.remove(network)
    }

    /// Serialized [`NetworkTrie::try_remove`].
    pub fn try_remove(&self, network: &Network) -> bool {
        let _guard = self.write_lock.lock();
        self.trie.try_remove(network)
    }

    /// Serialized [`NetworkTrie::clear`].
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.trie.clear();
    }

    /// Lock-free [`NetworkTrie::get`].
    #[must_use]
    pub fn get(&self, network: &Network) -> Option<TrieMatch<V>> {
        self.trie.get(network)
    }

    /// Lock-free [`NetworkTrie::get_match`].
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if no entry covers the query.
    pub fn get_match<Q>(&self, query: Q) -> Result<TrieMatch<V>, TrieError>
    where
        Q: Into<Network>,
    {
        self.trie.get_match(query)
    }

    /// Lock-free [`NetworkTrie::try_get_match`].
    pub fn try_get_match<Q>(&self, query: Q) -> Option<TrieMatch<V>>
    where
        Q: Into<Network>,
    {
        self.trie.try_get_match(query)
    }

    /// Lock-free [`NetworkTrie::get_matches`].
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if no entry covers the query.
    pub fn get_matches<Q>(&self, query: Q) -> Result<Vec<TrieMatch<V>>, TrieError>
    where
        Q: Into<Network>,
    {
        self.trie.get_matches(query)
    }

    /// Lock-free [`NetworkTrie::try_get_matches`].
    pub fn try_get_matches<Q>(&self, query: Q) -> Vec<TrieMatch<V>>
    where
        Q: Into<Network>,
    {
        self.trie.try_get_matches(query)
    }

    /// Lock-free [`NetworkTrie::count`].
    #[must_use]
    pub fn count(&self) -> usize {
        self.trie.count()
    }

    /// Lock-free [`NetworkTrie::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Lock-free [`NetworkTrie::to_text_tree`].
    #[must_use]
    pub fn to_text_tree(&self, family: AddressFamily) -> String {
        self.trie.to_text_tree(family)
    }

    /// Lock-free [`NetworkTrie::to_text_tree_with`].
    #[must_use]
    pub fn to_text_tree_with<F>(&self, family: AddressFamily, display: F) -> String
    where
        F: FnMut(&Network, &V) -> String,
    {
        self.trie.to_text_tree_with(family, display)
    }
}

impl<V> From<NetworkTrie<V>> for SharedNetworkTrie<V> {
    fn from(trie: NetworkTrie<V>) -> Self {
        SharedNetworkTrie {
            trie,
            write_lock: Mutex::new(()),
        }
    }
}
