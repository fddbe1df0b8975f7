// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Address classification over preloaded tries.
//!
//! Both classifiers are ordinary longest-prefix lookups against read-only
//! tries built once on first use; the allocation table holds both families
//! side by side in a single instance.

use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use net::Network;

use crate::trie::NetworkTrie;

/// Special-purpose allocation of an address per the IANA registries.
///
/// Addresses outside every special-purpose range classify as
/// [`AddressAllocation::Public`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressAllocation {
    /// `0.0.0.0/8`, `::/128`
    Unspecified,
    /// `127.0.0.0/8`, `::1/128`
    Loopback,
    /// RFC 1918 ranges
    Private,
    /// `100.64.0.0/10`, carrier-grade NAT
    SharedAddressSpace,
    /// `169.254.0.0/16`, `fe80::/10`
    LinkLocal,
    /// TEST-NET ranges and `2001:db8::/32`
    Documentation,
    /// `198.18.0.0/15`
    Benchmarking,
    /// `224.0.0.0/4`, `ff00::/8`
    Multicast,
    /// `240.0.0.0/4`
    Reserved,
    /// `255.255.255.255/32`
    LimitedBroadcast,
    /// `fc00::/7`
    UniqueLocal,
    /// `::ffff:0:0/96`
    Ipv4Mapped,
    /// `64:ff9b::/96`
    Nat64,
    /// `100::/64`
    Discard,
    /// `2001::/32`
    Teredo,
    /// `192.88.99.0/24`, `2002::/16`
    SixToFour,
    /// Everything else
    Public,
}

/// Historical class of an IPv4 address. IPv6 is classless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass {
    /// `0.0.0.0` through `127.255.255.255`
    A,
    /// `128.0.0.0` through `191.255.255.255`
    B,
    /// `192.0.0.0` through `223.255.255.255`
    C,
    /// `224.0.0.0` through `239.255.255.255`, multicast
    D,
    /// `240.0.0.0` through `255.255.255.255`, reserved
    E,
}

impl Display for AddressAllocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressAllocation::Unspecified => "unspecified",
            AddressAllocation::Loopback => "loopback",
            AddressAllocation::Private => "private",
            AddressAllocation::SharedAddressSpace => "shared address space",
            AddressAllocation::LinkLocal => "link local",
            AddressAllocation::Documentation => "documentation",
            AddressAllocation::Benchmarking => "benchmarking",
            AddressAllocation::Multicast => "multicast",
            AddressAllocation::Reserved => "reserved",
            AddressAllocation::LimitedBroadcast => "limited broadcast",
            AddressAllocation::UniqueLocal => "unique local",
            AddressAllocation::Ipv4Mapped => "IPv4-mapped",
            AddressAllocation::Nat64 => "NAT64",
            AddressAllocation::Discard => "discard",
            AddressAllocation::Teredo => "Teredo",
            AddressAllocation::SixToFour => "6to4",
            AddressAllocation::Public => "public",
        };
        write!(f, "{name}")
    }
}

impl Display for AddressClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressClass::A => write!(f, "A"),
            AddressClass::B => write!(f, "B"),
            AddressClass::C => write!(f, "C"),
            AddressClass::D => write!(f, "D"),
            AddressClass::E => write!(f, "E"),
        }
    }
}

const fn v4(octets: [u8; 4], prefix: u8) -> Network {
    Network::new_assert(
        IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
        prefix,
    )
}

const fn v6(segments: [u16; 8], prefix: u8) -> Network {
    Network::new_assert(
        IpAddr::V6(Ipv6Addr::new(
            segments[0],
            segments[1],
            segments[2],
            segments[3],
            segments[4],
            segments[5],
            segments[6],
            segments[7],
        )),
        prefix,
    )
}

const ALLOCATIONS: &[(Network, AddressAllocation)] = &[
    (v4([0, 0, 0, 0], 8), AddressAllocation::Unspecified),
    (v4([10, 0, 0, 0], 8), AddressAllocation::Private),
    (v4([100, 64, 0, 0], 10), AddressAllocation::SharedAddressSpace),
    (v4([127, 0, 0, 0], 8), AddressAllocation::Loopback),
    (v4([169, 254, 0, 0], 16), AddressAllocation::LinkLocal),
    (v4([172, 16, 0, 0], 12), AddressAllocation::Private),
    (v4([192, 0, 2, 0], 24), AddressAllocation::Documentation),
    (v4([192, 88, 99, 0], 24), AddressAllocation::SixToFour),
    (v4([192, 168, 0, 0], 16), AddressAllocation::Private),
    (v4([198, 18, 0, 0], 15), AddressAllocation::Benchmarking),
    (v4([198, 51, 100, 0], 24), AddressAllocation::Documentation),
    (v4([203, 0, 113, 0], 24), AddressAllocation::Documentation),
    (v4([224, 0, 0, 0], 4), AddressAllocation::Multicast),
    (v4([240, 0, 0, 0], 4), AddressAllocation::Reserved),
    (v4([255, 255, 255, 255], 32), AddressAllocation::LimitedBroadcast),
    (v6([0, 0, 0, 0, 0, 0, 0, 0], 128), AddressAllocation::Unspecified),
    (v6([0, 0, 0, 0, 0, 0, 0, 1], 128), AddressAllocation::Loopback),
    (v6([0, 0, 0, 0, 0, 0xffff, 0, 0], 96), AddressAllocation::Ipv4Mapped),
    (v6([0x64, 0xff9b, 0, 0, 0, 0, 0, 0], 96), AddressAllocation::Nat64),
    (v6([0x100, 0, 0, 0, 0, 0, 0, 0], 64), AddressAllocation::Discard),
    (v6([0x2001, 0, 0, 0, 0, 0, 0, 0], 32), AddressAllocation::Teredo),
    (v6([0x2001, 0xdb8, 0, 0, 0, 0, 0, 0], 32), AddressAllocation::Documentation),
    (v6([0x2002, 0, 0, 0, 0, 0, 0, 0], 16), AddressAllocation::SixToFour),
    (v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7), AddressAllocation::UniqueLocal),
    (v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10), AddressAllocation::LinkLocal),
    (v6([0xff00, 0, 0, 0, 0, 0, 0, 0], 8), AddressAllocation::Multicast),
];

const CLASSES: &[(Network, AddressClass)] = &[
    (v4([0, 0, 0, 0], 1), AddressClass::A),
    (v4([128, 0, 0, 0], 2), AddressClass::B),
    (v4([192, 0, 0, 0], 3), AddressClass::C),
    (v4([224, 0, 0, 0], 4), AddressClass::D),
    (v4([240, 0, 0, 0], 4), AddressClass::E),
];

fn preloaded<T: Copy>(entries: &[(Network, T)]) -> NetworkTrie<T> {
    let trie = NetworkTrie::new();
    for (network, value) in entries {
        let inserted = trie.try_add(*network, *value);
        debug_assert!(inserted, "classifier table has a duplicate entry");
    }
    trie
}

static ALLOCATION_TRIE: LazyLock<NetworkTrie<AddressAllocation>> =
    LazyLock::new(|| preloaded(ALLOCATIONS));

static CLASS_TRIE: LazyLock<NetworkTrie<AddressClass>> = LazyLock::new(|| preloaded(CLASSES));

/// Classify an address against the IANA special-purpose registries.
#[must_use]
pub fn address_allocation(addr: IpAddr) -> AddressAllocation {
    ALLOCATION_TRIE
        .try_get_match(addr)
        .map_or(AddressAllocation::Public, |hit| *hit.value)
}

/// The historical class of an IPv4 address; `None` for IPv6.
#[must_use]
pub fn address_class(addr: IpAddr) -> Option<AddressClass> {
    CLASS_TRIE.try_get_match(addr).map(|hit| *hit.value)
}
