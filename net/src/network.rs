// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! The canonical network value: an address family, a 128-bit network
//! address, and a prefix length.

use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};
use std::str::FromStr;

use bnum::types::U256;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use tracing::debug;

use crate::errors::NetworkError;
use crate::family::{AddressFamily, address_to_bits, bits_to_address};

/// An IP network in CIDR terms, canonical by construction.
///
/// Host bits are truncated away when a `Network` is built, so two values
/// are equal exactly when family, network address, and prefix length agree.
/// The derived ordering sorts IPv4 before IPv6, then by network address,
/// then by prefix length; `Option<Network>` consequently sorts `None`
/// before any network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Network {
    family: AddressFamily,
    bits: u128,
    prefix: u8,
}

impl Network {
    /// Build a network from an address and a prefix length, truncating any
    /// set host bits.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidPrefix`] if `prefix` exceeds the
    /// family's bit length.
    #[tracing::instrument(level = "trace")]
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Network, NetworkError> {
        let (bits, family) = address_to_bits(&addr);
        let mask = family.network_mask(prefix)?;
        Ok(Network {
            family,
            bits: bits & mask,
            prefix,
        })
    }

    /// Validating constructor which panics on a bad prefix, for const
    /// tables and testing.
    ///
    /// Avoid this method outside const contexts or testing settings.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` exceeds the family's bit length.
    #[must_use]
    pub const fn new_assert(addr: IpAddr, prefix: u8) -> Network {
        let (bits, family) = address_to_bits(&addr);
        assert!(prefix <= family.bit_length(), "invalid prefix length");
        let mask = if prefix == 0 {
            0
        } else {
            (u128::MAX >> (128 - prefix as u32)) << (family.bit_length() - prefix)
        };
        Network {
            family,
            bits: bits & mask,
            prefix,
        }
    }

    /// The host route covering exactly `addr`.
    #[must_use]
    pub const fn host(addr: IpAddr) -> Network {
        let (bits, family) = address_to_bits(&addr);
        Network {
            family,
            bits,
            prefix: family.bit_length(),
        }
    }

    /// Build a network from an address and a dotted/grouped mask.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnsupportedFamily`] if address and mask
    /// disagree on family, [`NetworkError::InvalidMask`] if the mask is not
    /// a contiguous prefix.
    #[tracing::instrument(level = "trace")]
    pub fn with_mask(addr: IpAddr, mask: IpAddr) -> Result<Network, NetworkError> {
        let (_, family) = address_to_bits(&addr);
        let (mask_bits, mask_family) = address_to_bits(&mask);
        if family != mask_family {
            return Err(NetworkError::UnsupportedFamily(family, mask_family));
        }
        Network::new(addr, family.prefix_from_mask(mask_bits)?)
    }

    /// The whole address space of a family: `0.0.0.0/0` or `::/0`.
    #[must_use]
    pub const fn root(family: AddressFamily) -> Network {
        Network {
            family,
            bits: 0,
            prefix: 0,
        }
    }

    pub(crate) const fn from_parts(family: AddressFamily, bits: u128, prefix: u8) -> Network {
        Network {
            family,
            bits,
            prefix,
        }
    }

    /// The network's address family.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        self.family
    }

    /// The network address as the shared 128-bit form.
    #[must_use]
    pub const fn bits(&self) -> u128 {
        self.bits
    }

    /// The prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// The network mask bits, from the family's mask table.
    #[must_use]
    pub fn mask_bits(&self) -> u128 {
        self.family
            .network_mask(self.prefix)
            .unwrap_or_else(|_| unreachable!())
    }

    /// The host mask bits complementing [`Network::mask_bits`].
    #[must_use]
    pub fn host_mask_bits(&self) -> u128 {
        self.family
            .host_mask(self.prefix)
            .unwrap_or_else(|_| unreachable!())
    }

    /// Single-bit mask splitting this network into its two halves; zero
    /// for host routes.
    #[must_use]
    pub const fn split_mask(&self) -> u128 {
        self.family.split_mask(self.prefix)
    }

    /// The network address.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        bits_to_address(self.bits, self.family)
    }

    /// The network mask as an address.
    #[must_use]
    pub fn mask(&self) -> IpAddr {
        bits_to_address(self.mask_bits(), self.family)
    }

    /// The wildcard (inverted) mask as an address.
    #[must_use]
    pub fn wildcard(&self) -> IpAddr {
        bits_to_address(self.host_mask_bits(), self.family)
    }

    /// The highest address of the network.
    #[must_use]
    pub fn broadcast(&self) -> IpAddr {
        bits_to_address(self.bits | self.host_mask_bits(), self.family)
    }

    /// True for host routes (`/32` and `/128`).
    #[must_use]
    pub const fn is_host(&self) -> bool {
        self.prefix == self.family.bit_length()
    }

    /// True for the whole address space (`/0`).
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.prefix == 0
    }

    /// Number of addresses covered, `2^(bit_length - prefix)`.
    ///
    /// 256-bit wide so that `::/0` is exact.
    #[must_use]
    pub fn total_addresses(&self) -> U256 {
        (U256::MAX >> (U256::BITS - 1))
            .checked_shl(u32::from(self.family.bit_length() - self.prefix))
            .unwrap_or_else(|| unreachable!())
    }

    /// Number of assignable host addresses.
    ///
    /// Point-to-point networks (`/31`, `/127`) count both addresses, host
    /// routes count one, and the whole address space counts every address.
    #[must_use]
    pub fn total_hosts(&self) -> U256 {
        let width = self.family.bit_length();
        let one = U256::MAX >> (U256::BITS - 1);
        if self.prefix == width {
            one
        } else if self.prefix == width - 1 {
            one + one
        } else if self.prefix == 0 {
            self.total_addresses()
        } else {
            self.total_addresses() - (one + one)
        }
    }

    /// The first assignable host address.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoHosts`] for `/0`.
    pub fn first_host(&self) -> Result<IpAddr, NetworkError> {
        if self.prefix == 0 {
            return Err(NetworkError::NoHosts(*self));
        }
        if self.prefix >= self.family.bit_length() - 1 {
            return Ok(self.address());
        }
        Ok(bits_to_address(self.bits + 1, self.family))
    }

    /// The last assignable host address.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoHosts`] for `/0`.
    pub fn last_host(&self) -> Result<IpAddr, NetworkError> {
        if self.prefix == 0 {
            return Err(NetworkError::NoHosts(*self));
        }
        if self.prefix >= self.family.bit_length() - 1 {
            return Ok(self.broadcast());
        }
        Ok(bits_to_address((self.bits | self.host_mask_bits()) - 1, self.family))
    }

    /// True if `other` is a strict subnetwork of `self`.
    #[must_use]
    pub fn contains(&self, other: &Network) -> bool {
        self.family == other.family
            && self.prefix < other.prefix
            && other.bits & self.mask_bits() == self.bits
    }

    /// True if `other` is a subnetwork of `self` or equal to it.
    #[must_use]
    pub fn contains_or_equal(&self, other: &Network) -> bool {
        self.family == other.family
            && self.prefix <= other.prefix
            && other.bits & self.mask_bits() == self.bits
    }

    /// True if the address lies within this network.
    #[must_use]
    pub fn contains_address(&self, addr: &IpAddr) -> bool {
        self.contains_or_equal(&Network::host(*addr))
    }

    /// The sibling network sharing every network bit but the last.
    ///
    /// An involution: `n.complementary()?.complementary()? == n`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoComplement`] for `/0`.
    pub fn complementary(&self) -> Result<Network, NetworkError> {
        if self.prefix == 0 {
            return Err(NetworkError::NoComplement(*self));
        }
        Ok(Network {
            bits: self.bits ^ (1 << (self.family.bit_length() - self.prefix)),
            ..*self
        })
    }

    /// The unique smallest network containing both `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnsupportedFamily`] when the operands
    /// disagree on family.
    pub fn smallest_enclosing(a: &Network, b: &Network) -> Result<Network, NetworkError> {
        if a.family != b.family {
            return Err(NetworkError::UnsupportedFamily(a.family, b.family));
        }
        let family = a.family;
        if a.prefix == 0 || b.prefix == 0 {
            return Ok(Network::root(family));
        }
        let divergence = a.bits ^ b.bits;
        if divergence == 0 {
            return Ok(if a.prefix <= b.prefix { *a } else { *b });
        }
        #[allow(clippy::cast_possible_truncation)] // upper bounded to 128
        let highest = 128 - divergence.leading_zeros() as u8;
        let prefix = (family.bit_length() - highest)
            .min(a.prefix)
            .min(b.prefix);
        let mask = family
            .network_mask(prefix)
            .unwrap_or_else(|_| unreachable!());
        Ok(Network {
            family,
            bits: a.bits & mask,
            prefix,
        })
    }

    /// Advance by `blocks` networks of this prefix length.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Overflow`] when the result leaves the
    /// family's address space.
    pub fn checked_add(&self, blocks: u128) -> Result<Network, NetworkError> {
        let offset = self.block_offset(blocks)?;
        let bits = self
            .bits
            .checked_add(offset)
            .ok_or(NetworkError::Overflow(self.family))?;
        if bits & !self.family.full_mask() != 0 {
            return Err(NetworkError::Overflow(self.family));
        }
        Ok(Network { bits, ..*self })
    }

    /// Retreat by `blocks` networks of this prefix length.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Overflow`] when the result undershoots the
    /// family's address space.
    pub fn checked_sub(&self, blocks: u128) -> Result<Network, NetworkError> {
        let offset = self.block_offset(blocks)?;
        let bits = self
            .bits
            .checked_sub(offset)
            .ok_or(NetworkError::Overflow(self.family))?;
        Ok(Network { bits, ..*self })
    }

    fn block_offset(&self, blocks: u128) -> Result<u128, NetworkError> {
        if self.prefix == 0 {
            // a single block spans the whole space; only a no-op fits
            return if blocks == 0 {
                Ok(0)
            } else {
                Err(NetworkError::Overflow(self.family))
            };
        }
        let block_size = 1u128 << (self.family.bit_length() - self.prefix);
        blocks
            .checked_mul(block_size)
            .ok_or(NetworkError::Overflow(self.family))
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address(), self.prefix)
    }
}

fn parse_address(input: &str) -> Result<IpAddr, NetworkError> {
    let input = input.trim();
    if let Ok(addr) = input.parse::<IpAddr>() {
        return Ok(addr);
    }
    // not an address literal; fall back to name resolution and take the
    // first resolved address
    debug!(input, "address literal parse failed, resolving as hostname");
    (input, 0u16)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|resolved| resolved.ip())
        .ok_or_else(|| NetworkError::MalformedAddress(input.to_string()))
}

impl FromStr for Network {
    type Err = NetworkError;

    /// Parse `address/prefix`, `address mask`, or a bare address (host
    /// route). An address part that is not a literal is resolved as a
    /// hostname; the first resolved address wins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((addr, prefix)) = s.split_once('/') {
            let addr = parse_address(addr)?;
            let prefix = prefix
                .trim()
                .parse::<u8>()
                .map_err(|_| NetworkError::MalformedAddress(s.to_string()))?;
            Network::new(addr, prefix)
        } else if let Some((addr, mask)) = s.split_once(' ') {
            Network::with_mask(parse_address(addr)?, parse_address(mask)?)
        } else {
            Ok(Network::host(parse_address(s)?))
        }
    }
}

impl serde::Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct NetworkVisitor;

        impl serde::de::Visitor<'_> for NetworkVisitor {
            type Value = Network;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "a network in address/prefix form")
            }

            fn visit_str<E>(self, value: &str) -> Result<Network, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(NetworkVisitor)
    }
}

impl From<IpAddr> for Network {
    fn from(addr: IpAddr) -> Self {
        Network::host(addr)
    }
}

impl From<Ipv4Addr> for Network {
    fn from(addr: Ipv4Addr) -> Self {
        Network::host(IpAddr::V4(addr))
    }
}

impl From<Ipv6Addr> for Network {
    fn from(addr: Ipv6Addr) -> Self {
        Network::host(IpAddr::V6(addr))
    }
}

impl From<Ipv4Net> for Network {
    fn from(value: Ipv4Net) -> Self {
        Network::new(IpAddr::V4(value.addr()), value.prefix_len())
            .unwrap_or_else(|_| unreachable!())
    }
}

impl From<Ipv6Net> for Network {
    fn from(value: Ipv6Net) -> Self {
        Network::new(IpAddr::V6(value.addr()), value.prefix_len())
            .unwrap_or_else(|_| unreachable!())
    }
}

impl From<IpNet> for Network {
    fn from(value: IpNet) -> Self {
        match value {
            IpNet::V4(net) => net.into(),
            IpNet::V6(net) => net.into(),
        }
    }
}

impl From<Network> for IpNet {
    fn from(value: Network) -> Self {
        IpNet::new(value.address(), value.prefix()).unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnum::cast::As;

    fn net(s: &str) -> Network {
        s.parse().expect("test network")
    }

    #[test]
    fn construction_truncates_host_bits() {
        let n = Network::new("192.168.10.55".parse().unwrap(), 24).unwrap();
        assert_eq!(n, net("192.168.10.0/24"));
        assert_eq!(n.address(), "192.168.10.0".parse::<IpAddr>().unwrap());
        assert_eq!(n.to_string(), "192.168.10.0/24");

        let n = Network::new("2001:db8::dead:beef".parse().unwrap(), 32).unwrap();
        assert_eq!(n.to_string(), "2001:db8::/32");
    }

    #[test]
    fn prefix_bounds_are_enforced() {
        assert!(matches!(
            Network::new("10.0.0.0".parse().unwrap(), 33),
            Err(NetworkError::InvalidPrefix { prefix: 33, .. })
        ));
        assert!(Network::new("::".parse().unwrap(), 128).is_ok());
        assert!(Network::new("::".parse().unwrap(), 129).is_err());
    }

    #[test]
    fn parse_forms() {
        assert_eq!(net("10.11.12.0/24").prefix(), 24);
        assert_eq!(net("10.11.12.13"), net("10.11.12.13/32"));
        assert_eq!(net("10.11.12.0 255.255.255.0"), net("10.11.12.0/24"));
        assert_eq!(net("fe80::1"), net("fe80::1/128"));
        assert_eq!(net(" 10.0.0.0/8 "), net("10.0.0.0/8"));
    }

    #[test]
    fn parse_failures() {
        assert!(matches!(
            "10.0.0.0 255.0.255.0".parse::<Network>(),
            Err(NetworkError::InvalidMask(_))
        ));
        assert!(matches!(
            "10.0.0.0 ffff::".parse::<Network>(),
            Err(NetworkError::UnsupportedFamily(..))
        ));
        assert!(matches!(
            "10.0.0.0/x".parse::<Network>(),
            Err(NetworkError::MalformedAddress(_))
        ));
        assert!(matches!(
            "host.invalid".parse::<Network>(),
            Err(NetworkError::MalformedAddress(_))
        ));
    }

    #[test]
    fn ordering_is_family_then_address_then_prefix() {
        let mut networks = vec![
            net("2001:db8::/32"),
            net("10.0.0.0/8"),
            net("10.0.0.0/24"),
            net("::/0"),
            net("9.255.0.0/16"),
        ];
        networks.sort();
        assert_eq!(
            networks,
            vec![
                net("9.255.0.0/16"),
                net("10.0.0.0/8"),
                net("10.0.0.0/24"),
                net("::/0"),
                net("2001:db8::/32"),
            ]
        );
        assert!(None < Some(net("0.0.0.0/0")));
    }

    #[test]
    fn derived_addresses() {
        let n = net("192.168.10.0/24");
        assert_eq!(n.mask(), "255.255.255.0".parse::<IpAddr>().unwrap());
        assert_eq!(n.wildcard(), "0.0.0.255".parse::<IpAddr>().unwrap());
        assert_eq!(n.broadcast(), "192.168.10.255".parse::<IpAddr>().unwrap());
        assert_eq!(
            n.first_host().unwrap(),
            "192.168.10.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            n.last_host().unwrap(),
            "192.168.10.254".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn totals_match_the_tables() {
        assert_eq!(net("10.0.0.0/24").total_addresses(), 256u16.as_::<U256>());
        assert_eq!(net("10.0.0.0/24").total_hosts(), 254u16.as_::<U256>());
        assert_eq!(net("10.0.0.0/31").total_hosts(), 2u8.as_::<U256>());
        assert_eq!(net("10.0.0.1/32").total_hosts(), 1u8.as_::<U256>());
        assert_eq!(net("0.0.0.0/0").total_hosts(), (1u64 << 32).as_::<U256>());
        assert_eq!(
            net("::/0").total_addresses(),
            u128::MAX.as_::<U256>() + 1u8.as_::<U256>()
        );
    }

    #[test]
    fn host_edges() {
        assert!(matches!(
            net("0.0.0.0/0").first_host(),
            Err(NetworkError::NoHosts(_))
        ));
        let p2p = net("10.0.0.2/31");
        assert_eq!(p2p.first_host().unwrap(), p2p.address());
        assert_eq!(p2p.last_host().unwrap(), p2p.broadcast());
        let host = net("10.0.0.7/32");
        assert_eq!(host.first_host().unwrap(), host.address());
        assert_eq!(host.last_host().unwrap(), host.address());
    }

    #[test]
    fn containment() {
        let outer = net("10.0.0.0/8");
        let inner = net("10.20.0.0/16");
        assert!(outer.contains(&inner));
        assert!(outer.contains_or_equal(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&outer));
        assert!(outer.contains_or_equal(&outer));
        assert!(!outer.contains(&net("11.0.0.0/16")));
        assert!(!outer.contains(&net("2001:db8::/32")));
        assert!(outer.contains_address(&"10.99.1.2".parse().unwrap()));
        assert!(!outer.contains_address(&"11.0.0.1".parse().unwrap()));
    }

    #[test]
    fn complementary_flips_the_last_network_bit() {
        assert_eq!(
            net("10.20.30.4/31").complementary().unwrap(),
            net("10.20.30.6/31")
        );
        assert_eq!(
            net("0.0.0.0/1").complementary().unwrap(),
            net("128.0.0.0/1")
        );
        let n = net("2001:db8::/32");
        assert_eq!(n.complementary().unwrap().complementary().unwrap(), n);
        assert!(matches!(
            net("::/0").complementary(),
            Err(NetworkError::NoComplement(_))
        ));
    }

    #[test]
    fn smallest_enclosing_pairs() {
        // disjoint siblings meet at their common supernet
        assert_eq!(
            Network::smallest_enclosing(&net("10.20.30.4/32"), &net("10.20.30.5/32")).unwrap(),
            net("10.20.30.4/31")
        );
        assert_eq!(
            Network::smallest_enclosing(&net("128.0.0.0/5"), &net("241.104.240.0/21")).unwrap(),
            net("128.0.0.0/1")
        );
        // a contained operand is itself the enclosure
        assert_eq!(
            Network::smallest_enclosing(&net("10.0.0.0/8"), &net("10.0.0.1/32")).unwrap(),
            net("10.0.0.0/8")
        );
        // identical bits, different prefixes
        assert_eq!(
            Network::smallest_enclosing(&net("10.0.0.0/16"), &net("10.0.0.0/24")).unwrap(),
            net("10.0.0.0/16")
        );
        assert_eq!(
            Network::smallest_enclosing(&net("::/0"), &net("2001:db8::/32")).unwrap(),
            net("::/0")
        );
        assert!(matches!(
            Network::smallest_enclosing(&net("10.0.0.0/8"), &net("2001:db8::/32")),
            Err(NetworkError::UnsupportedFamily(..))
        ));
    }

    #[test]
    fn block_arithmetic() {
        let n = net("10.0.0.0/24");
        assert_eq!(n.checked_add(1).unwrap(), net("10.0.1.0/24"));
        assert_eq!(n.checked_add(256).unwrap(), net("10.1.0.0/24"));
        assert_eq!(net("10.0.1.0/24").checked_sub(1).unwrap(), n);
        assert!(matches!(
            net("255.255.255.0/24").checked_add(1),
            Err(NetworkError::Overflow(_))
        ));
        assert!(matches!(
            net("0.0.0.0/24").checked_sub(1),
            Err(NetworkError::Overflow(_))
        ));
        assert!(net("0.0.0.0/0").checked_add(1).is_err());
        assert_eq!(
            net("2001:db8::/32").checked_add(1).unwrap(),
            net("2001:db9::/32")
        );
    }

    #[test]
    fn serde_round_trip() {
        let n = net("192.0.2.0/24");
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"192.0.2.0/24\"");
        let back: Network = serde_json::from_str("\"192.0.2.0/24\"").unwrap();
        assert_eq!(back, n);

        let v6 = net("2001:db8::/48");
        let yaml = serde_yaml_ng::to_string(&v6).unwrap();
        assert_eq!(serde_yaml_ng::from_str::<Network>(&yaml).unwrap(), v6);
        assert!(serde_json::from_str::<Network>("\"not a network\"").is_err());
    }

    #[test]
    fn ipnet_round_trip() {
        let n = Network::from("192.168.0.0/16".parse::<IpNet>().unwrap());
        assert_eq!(n, net("192.168.0.0/16"));
        assert_eq!(IpNet::from(n).to_string(), "192.168.0.0/16");
        let v6 = Network::from("2001:db8::/32".parse::<Ipv6Net>().unwrap());
        assert_eq!(v6, net("2001:db8::/32"));
    }
}
