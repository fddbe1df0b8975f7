// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! The variable-stride binary trie.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use net::{AddressFamily, Network};

use crate::errors::TrieError;
use crate::node::Node;

/// A longest-prefix-match trie over IPv4 and IPv6 networks.
///
/// One instance holds two independent trees, one per address family, each
/// rooted at a permanent `0.0.0.0/0` / `::/0` routing node; operations
/// dispatch on the family of their argument and the trees never mix.
/// Sibling networks that share no inserted supernet hang off synthetic
/// *routing nodes* representing their smallest common supernet; routing
/// nodes appear and disappear as value nodes come and go, and the final
/// shape depends only on the set of inserted networks, never on insertion
/// order.
///
/// # Concurrency
///
/// The trie is lock-free for readers under a single-writer contract: at
/// most one thread may call [`add`](NetworkTrie::add),
/// [`remove`](NetworkTrie::remove), [`clear`](NetworkTrie::clear) or their
/// variants at a time (enforce externally, or use
/// [`SharedNetworkTrie`](crate::SharedNetworkTrie)), while any number of
/// threads match, count, and render concurrently. Every structural
/// mutation is published by a single release-store of one child slot, so
/// readers observe either the pre-update or the post-update shape and
/// never a torn node; replaced nodes stay alive for as long as a reader
/// still holds them.
pub struct NetworkTrie<V> {
    root_v4: ArcSwap<Node<V>>,
    root_v6: ArcSwap<Node<V>>,
    count: AtomicUsize,
}

/// One matched entry: the inserted network and its payload.
#[derive(Debug, Clone)]
pub struct TrieMatch<V> {
    /// The inserted network that covers the query
    pub network: Network,
    /// The payload stored with it
    pub value: Arc<V>,
}

struct Step<V> {
    node: Arc<Node<V>>,
    /// Slot this node occupies under its predecessor on the path;
    /// meaningless for the root.
    slot: usize,
}

impl<V> NetworkTrie<V> {
    /// Create an empty trie.
    #[must_use]
    pub fn new() -> Self {
        NetworkTrie {
            root_v4: ArcSwap::from_pointee(Node::routing(Network::root(AddressFamily::Ipv4))),
            root_v6: ArcSwap::from_pointee(Node::routing(Network::root(AddressFamily::Ipv6))),
            count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn root(&self, family: AddressFamily) -> &ArcSwap<Node<V>> {
        match family {
            AddressFamily::Ipv4 => &self.root_v4,
            AddressFamily::Ipv6 => &self.root_v6,
        }
    }

    /// Walk from the root toward `target`, collecting the visited path.
    ///
    /// Descent stops at the first slot that is empty, holds a node more
    /// specific than the target, or holds a node the target diverges from.
    /// The returned path always starts at the root.
    fn walk(root: &Arc<Node<V>>, target: &Network) -> Vec<Step<V>> {
        let mut path = Vec::with_capacity(8);
        let mut current = Arc::clone(root);
        path.push(Step {
            node: Arc::clone(root),
            slot: 0,
        });
        while current.prefix() < target.prefix() {
            let slot = current.slot_of(target.bits());
            let Some(child) = current.child(slot) else {
                break;
            };
            if child.prefix() > target.prefix()
                || target.bits() & child.mask_bits() != child.bits()
            {
                break;
            }
            path.push(Step {
                node: Arc::clone(&child),
                slot,
            });
            current = child;
        }
        path
    }

    /// Insert a network with its payload.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::Duplicate`] if the exact network is already
    /// present as a value node.
    #[tracing::instrument(level = "trace", skip(self, value), err)]
    pub fn add(&self, network: Network, value: V) -> Result<(), TrieError> {
        self.insert(network, Arc::new(value)).map(|_| ())
    }

    /// Insert a network with its payload, reporting a duplicate as `false`.
    pub fn try_add(&self, network: Network, value: V) -> bool {
        self.insert(network, Arc::new(value)).is_ok()
    }

    /// Return the payload stored for the exact network, inserting the
    /// result of `value` first if absent.
    pub fn get_or_add_with<F>(&self, network: Network, value: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(existing) = self.get(&network) {
            return existing.value;
        }
        match self.insert(network, Arc::new(value())) {
            Ok(payload) => payload,
            // an insert after a failed exact lookup can only collide if the
            // single-writer contract was violated
            Err(_) => unreachable!(),
        }
    }

    fn insert(&self, network: Network, payload: Arc<V>) -> Result<Arc<V>, TrieError> {
        let root = self.root(network.family()).load_full();
        let path = Self::walk(&root, &network);
        let last = path.last().unwrap_or_else(|| unreachable!());

        if *last.node.network() == network {
            // the node already exists; either it is a routing node we can
            // promote in place, or the caller inserted a duplicate
            if last.node.is_value() {
                return Err(TrieError::Duplicate(network));
            }
            last.node.promote(Arc::clone(&payload));
        } else {
            let slot = last.node.slot_of(network.bits());
            match last.node.child(slot) {
                None => {
                    last.node
                        .set_child(slot, Some(Arc::new(Node::value(network, Arc::clone(&payload)))));
                }
                Some(existing) if network.contains(existing.network()) => {
                    // the new network slides in between the slot's current
                    // occupant and its parent
                    let node = Node::value(network, Arc::clone(&payload));
                    node.set_child(node.slot_of(existing.bits()), Some(existing));
                    last.node.set_child(slot, Some(Arc::new(node)));
                }
                Some(existing) => {
                    // siblings with no inserted supernet; interpose a
                    // routing node at their smallest common supernet
                    let supernet =
                        Network::smallest_enclosing(&network, existing.network())
                            .unwrap_or_else(|_| unreachable!());
                    let routing = Node::routing(supernet);
                    routing.set_child(
                        routing.slot_of(network.bits()),
                        Some(Arc::new(Node::value(network, Arc::clone(&payload)))),
                    );
                    routing.set_child(routing.slot_of(existing.bits()), Some(existing));
                    last.node.set_child(slot, Some(Arc::new(routing)));
                }
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(payload)
    }

    /// Remove the exact network.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if the network is not present as a
    /// value node.
    #[tracing::instrument(level = "trace", skip(self), err)]
    pub fn remove(&self, network: &Network) -> Result<(), TrieError> {
        if self.try_remove(network) {
            Ok(())
        } else {
            Err(TrieError::NotFound(*network))
        }
    }

    /// Remove the exact network, reporting absence as `false`.
    pub fn try_remove(&self, network: &Network) -> bool {
        let root = self.root(network.family()).load_full();
        let path = Self::walk(&root, network);
        let last = path.last().unwrap_or_else(|| unreachable!());
        if last.node.network() != network || !last.node.is_value() {
            return false;
        }
        last.node.demote();

        // collapse dead routing nodes back toward the root: an empty one is
        // unlinked, a single-child one is spliced out, and the first node
        // that still needs to exist stops the sweep
        for depth in (1..path.len()).rev() {
            let node = &path[depth].node;
            if node.is_value() {
                break;
            }
            let parent = &path[depth - 1].node;
            let slot = path[depth].slot;
            match (node.child(0), node.child(1)) {
                (None, None) => parent.set_child(slot, None),
                (Some(only), None) | (None, Some(only)) => parent.set_child(slot, Some(only)),
                (Some(_), Some(_)) => break,
            }
        }
        self.count.fetch_sub(1, Ordering::Relaxed);
        true
    }

    /// The payload stored for the exact network, if any.
    #[must_use]
    pub fn get(&self, network: &Network) -> Option<TrieMatch<V>> {
        let root = self.root(network.family()).load_full();
        let path = Self::walk(&root, network);
        let last = path.last()?;
        if last.node.network() != network {
            return None;
        }
        last.node.payload().map(|value| TrieMatch {
            network: *network,
            value,
        })
    }

    fn visit_matches<F>(&self, query: &Network, mut visit: F)
    where
        F: FnMut(Network, Arc<V>),
    {
        let mut current = self.root(query.family()).load_full();
        loop {
            if let Some(payload) = current.payload() {
                visit(*current.network(), payload);
            }
            if current.prefix() >= query.prefix() {
                break;
            }
            let slot = current.slot_of(query.bits());
            let Some(child) = current.child(slot) else {
                break;
            };
            if child.prefix() > query.prefix()
                || query.bits() & child.mask_bits() != child.bits()
            {
                break;
            }
            current = child;
        }
    }

    /// Longest-prefix match for an address or network.
    ///
    /// A network query only matches entries at most as specific as the
    /// query itself, so a `/25` query cannot return a `/32` entry.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if no entry covers the query.
    pub fn get_match<Q>(&self, query: Q) -> Result<TrieMatch<V>, TrieError>
    where
        Q: Into<Network>,
    {
        let query = query.into();
        self.try_get_match(query).ok_or(TrieError::NotFound(query))
    }

    /// Longest-prefix match, `None` when nothing covers the query.
    pub fn try_get_match<Q>(&self, query: Q) -> Option<TrieMatch<V>>
    where
        Q: Into<Network>,
    {
        let query = query.into();
        let mut best = None;
        self.visit_matches(&query, |network, value| best = Some(TrieMatch { network, value }));
        best
    }

    /// Every entry covering the query, least specific first.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::NotFound`] if no entry covers the query.
    pub fn get_matches<Q>(&self, query: Q) -> Result<Vec<TrieMatch<V>>, TrieError>
    where
        Q: Into<Network>,
    {
        let query = query.into();
        let matches = self.try_get_matches(query);
        if matches.is_empty() {
            Err(TrieError::NotFound(query))
        } else {
            Ok(matches)
        }
    }

    /// Every entry covering the query, least specific first; empty when
    /// nothing covers it.
    pub fn try_get_matches<Q>(&self, query: Q) -> Vec<TrieMatch<V>>
    where
        Q: Into<Network>,
    {
        let query = query.into();
        let mut matches = Vec::new();
        self.visit_matches(&query, |network, value| {
            matches.push(TrieMatch { network, value });
        });
        matches
    }

    /// Drop every entry of both families.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn clear(&self) {
        self.root_v4
            .store(Arc::new(Node::routing(Network::root(AddressFamily::Ipv4))));
        self.root_v6
            .store(Arc::new(Node::routing(Network::root(AddressFamily::Ipv6))));
        self.count.store(0, Ordering::Relaxed);
    }

    /// Number of value nodes across both families.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// True when no value node exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl<V> Default for NetworkTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for NetworkTrie<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkTrie")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
