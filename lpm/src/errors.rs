// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Trie error conditions.

use net::Network;

/// An error raised by trie mutation or lookup.
///
/// These are the only trie error paths; the `try_*` method family reports
/// the same two conditions through its return value instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    /// The network is already present as a value node.
    #[error("network {0} is already present")]
    Duplicate(Network),
    /// No value node matches the request.
    #[error("network {0} is not present")]
    NotFound(Network),
}
