// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Error conditions raised by network construction and arithmetic.

use std::net::IpAddr;

use crate::family::AddressFamily;
use crate::network::Network;

/// An error raised when constructing or operating on a [`Network`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The prefix length exceeds what the address family can hold.
    #[error("invalid prefix length /{prefix}, max for {family} is /{max}", max = family.bit_length())]
    InvalidPrefix {
        /// Family the prefix was validated against
        family: AddressFamily,
        /// The offending prefix length
        prefix: u8,
    },
    /// The mask is not a contiguous run of leading one bits.
    #[error("{0} is not a contiguous network mask")]
    InvalidMask(IpAddr),
    /// The input neither parses as an address literal nor resolves as a
    /// hostname.
    #[error("failed to parse or resolve '{0}' as an address")]
    MalformedAddress(String),
    /// Two operands of different address families were combined.
    #[error("address family mismatch: {0} vs {1}")]
    UnsupportedFamily(AddressFamily, AddressFamily),
    /// Block arithmetic left the family's address space.
    #[error("network arithmetic overflows the {0} address space")]
    Overflow(AddressFamily),
    /// The whole address space has no sibling to flip into.
    #[error("{0} has no complementary network")]
    NoComplement(Network),
    /// First/last host queries are undefined on the whole address space.
    #[error("{0} has no host addresses")]
    NoHosts(Network),
    /// The requested subnet prefix is finer than the address length.
    #[error("cannot split {network} into /{prefix} subnets")]
    SplitTooFine {
        /// The network being split
        network: Network,
        /// The requested subnet prefix length
        prefix: u8,
    },
    /// Subtraction requires the argument to be strictly contained.
    #[error("{0} does not strictly contain {1}")]
    NotContained(Network, Network),
}
