// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Pure set algebra over networks: summarization, splitting, and
//! subtraction. None of it touches the trie.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::NetworkError;
use crate::family::AddressFamily;
use crate::network::Network;

/// Coalesce complementary sibling networks into their supernets until no
/// pair remains.
///
/// Exact duplicates collapse; nested networks are kept as given (CIDR
/// networks are either disjoint or nested, and a subnet of a broader
/// network in the input is preserved rather than absorbed). The result is
/// sorted.
#[must_use]
pub fn summarize<I>(networks: I) -> Vec<Network>
where
    I: IntoIterator<Item = Network>,
{
    // bucket by family and prefix so merging walks one level at a time,
    // most specific first
    let mut buckets: BTreeMap<(AddressFamily, u8), BTreeSet<Network>> = BTreeMap::new();
    for network in networks {
        buckets
            .entry((network.family(), network.prefix()))
            .or_default()
            .insert(network);
    }

    let mut result = Vec::new();
    for family in [AddressFamily::Ipv4, AddressFamily::Ipv6] {
        for prefix in (1..=family.bit_length()).rev() {
            let Some(mut bucket) = buckets.remove(&(family, prefix)) else {
                continue;
            };
            while let Some(network) = bucket.pop_first() {
                let sibling = network
                    .complementary()
                    .unwrap_or_else(|_| unreachable!());
                if bucket.remove(&sibling) {
                    let supernet = Network::new(network.address(), prefix - 1)
                        .unwrap_or_else(|_| unreachable!());
                    buckets
                        .entry((family, prefix - 1))
                        .or_default()
                        .insert(supernet);
                } else {
                    result.push(network);
                }
            }
        }
        if let Some(bucket) = buckets.remove(&(family, 0)) {
            result.extend(bucket);
        }
    }
    result.sort_unstable();
    result
}

impl Network {
    /// The ascending sequence of `prefix`-length networks covering `self`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::SplitTooFine`] when `prefix` exceeds the
    /// family's bit length, [`NetworkError::InvalidPrefix`] when it is
    /// coarser than `self`, and [`NetworkError::Overflow`] when the subnet
    /// count cannot be materialized.
    pub fn split(&self, prefix: u8) -> Result<Vec<Network>, NetworkError> {
        let family = self.family();
        if prefix > family.bit_length() {
            return Err(NetworkError::SplitTooFine {
                network: *self,
                prefix,
            });
        }
        if prefix < self.prefix() {
            return Err(NetworkError::InvalidPrefix { family, prefix });
        }
        if prefix == self.prefix() {
            return Ok(vec![*self]);
        }
        let count = 1u128
            .checked_shl(u32::from(prefix - self.prefix()))
            .ok_or(NetworkError::Overflow(family))?;
        let step = 1u128 << (family.bit_length() - prefix);
        let mut subnets = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        let mut bits = self.bits();
        for _ in 0..count {
            subnets.push(Network::from_parts(family, bits, prefix));
            bits = bits.wrapping_add(step);
        }
        Ok(subnets)
    }

    /// Everything in `self` except the strictly contained `other`, as the
    /// minimal ascending set of networks.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NotContained`] unless
    /// `self.contains(other)`; checking up front keeps the halving loop
    /// bounded.
    pub fn subtract(&self, other: &Network) -> Result<Vec<Network>, NetworkError> {
        if !self.contains(other) {
            return Err(NetworkError::NotContained(*self, *other));
        }
        let mut remainder = Vec::with_capacity(usize::from(other.prefix() - self.prefix()));
        let mut current = *self;
        while current.prefix() < other.prefix() {
            let halves = current.split(current.prefix() + 1)?;
            let (low, high) = (halves[0], halves[1]);
            if low.contains_or_equal(other) {
                remainder.push(high);
                current = low;
            } else {
                remainder.push(low);
                current = high;
            }
        }
        remainder.sort_unstable();
        Ok(remainder)
    }
}
