// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! IP network value types: address families, canonical CIDR networks, and
//! the set algebra over them.
//!
//! Both families share one 128-bit representation so that a single lookup
//! structure can hold IPv4 and IPv6 entries side by side.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

#[cfg(any(test, feature = "testing"))]
pub mod contract;
mod errors;
mod family;
mod network;
mod summarize;

pub use errors::NetworkError;
pub use family::{AddressFamily, address_to_bits, bits_to_address};
pub use network::Network;
pub use summarize::summarize;
