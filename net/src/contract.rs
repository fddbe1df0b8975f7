// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Value generators for property testing.
//!
//! Enable the `testing` feature to use these generators from a downstream
//! crate.

use std::ops::Bound;

use bolero::{Driver, TypeGenerator, ValueGenerator};

use crate::family::AddressFamily;
use crate::network::Network;

impl TypeGenerator for AddressFamily {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        Some(if driver.gen_bool(Some(0.5))? {
            AddressFamily::Ipv4
        } else {
            AddressFamily::Ipv6
        })
    }
}

impl TypeGenerator for Network {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        let family: AddressFamily = driver.produce()?;
        let prefix = driver.gen_u8(Bound::Included(&0), Bound::Included(&family.bit_length()))?;
        let bits = driver.gen_u128(Bound::Included(&0), Bound::Included(&family.full_mask()))?;
        let mask = family
            .network_mask(prefix)
            .unwrap_or_else(|_| unreachable!());
        Some(Network::from_parts(family, bits & mask, prefix))
    }
}

/// Value generator which produces networks contained by the provided one.
///
/// Returns `None` for host routes, which contain nothing.
pub struct ContainedNetworkGenerator(Network);

impl ContainedNetworkGenerator {
    /// Create a new [`ContainedNetworkGenerator`]
    #[must_use]
    pub const fn new(network: Network) -> Self {
        Self(network)
    }
}

impl ValueGenerator for ContainedNetworkGenerator {
    type Output = Network;

    fn generate<D: Driver>(&self, driver: &mut D) -> Option<Self::Output> {
        let family = self.0.family();
        let width = family.bit_length();
        if self.0.prefix() == width {
            return None;
        }
        let extension =
            driver.gen_u8(Bound::Excluded(&self.0.prefix()), Bound::Included(&width))?;
        let random = driver.gen_u128(Bound::Included(&0), Bound::Included(&u128::MAX))?;
        let extension_mask = family
            .network_mask(extension)
            .unwrap_or_else(|_| unreachable!());
        let bits = self.0.bits() | (random & extension_mask & !self.0.mask_bits());
        Some(Network::from_parts(family, bits, extension))
    }
}

/// Generates two networks, the first guaranteed to strictly contain the
/// second.
pub struct NetworkAndSubNetworkGenerator;

impl ValueGenerator for NetworkAndSubNetworkGenerator {
    type Output = (Network, Network);

    fn generate<D: Driver>(&self, driver: &mut D) -> Option<Self::Output> {
        let network: Network = driver.produce()?;
        let sub_network = ContainedNetworkGenerator(network).generate(driver)?;
        Some((network, sub_network))
    }
}
