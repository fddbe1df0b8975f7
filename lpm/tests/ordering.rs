// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Order-independence and membership properties over randomized sets.

use std::collections::BTreeSet;
use std::net::IpAddr;

use lpm::NetworkTrie;
use net::{AddressFamily, Network};
use rand::Rng;
use rand::RngExt;
use rand::seq::SliceRandom;

fn random_network(rng: &mut impl Rng) -> Network {
    if rng.random_bool(0.5) {
        let addr = IpAddr::V4(std::net::Ipv4Addr::from_bits(rng.random()));
        Network::new(addr, rng.random_range(0..=32)).expect("valid v4 prefix")
    } else {
        let addr = IpAddr::V6(std::net::Ipv6Addr::from_bits(rng.random()));
        Network::new(addr, rng.random_range(0..=128)).expect("valid v6 prefix")
    }
}

fn random_set(rng: &mut impl Rng, size: usize) -> Vec<Network> {
    let mut set = BTreeSet::new();
    while set.len() < size {
        set.insert(random_network(rng));
    }
    set.into_iter().collect()
}

fn trie_from(networks: &[Network]) -> NetworkTrie<()> {
    let trie = NetworkTrie::new();
    for network in networks {
        trie.add(*network, ()).expect("set elements are unique");
    }
    trie
}

fn render_both(trie: &NetworkTrie<()>) -> String {
    format!(
        "{}\n{}",
        trie.to_text_tree(AddressFamily::Ipv4),
        trie.to_text_tree(AddressFamily::Ipv6)
    )
}

#[test]
fn insertion_order_never_changes_the_tree() {
    let mut rng = rand::rng();
    let mut networks = random_set(&mut rng, 100);
    let baseline = render_both(&trie_from(&networks));
    for _ in 0..1_000 {
        networks.shuffle(&mut rng);
        let permuted = trie_from(&networks);
        assert_eq!(render_both(&permuted), baseline);
        assert_eq!(permuted.count(), networks.len());
    }
}

#[test]
fn membership_survives_a_round_trip() {
    let mut rng = rand::rng();
    let networks = random_set(&mut rng, 100);
    let trie = trie_from(&networks);

    for network in &networks {
        let hit = trie.get_match(*network).expect("just inserted");
        assert_eq!(hit.network, *network);
    }

    let mut removed = Vec::new();
    let mut kept = Vec::new();
    for (index, network) in networks.iter().enumerate() {
        if index % 2 == 0 {
            removed.push(*network);
        } else {
            kept.push(*network);
        }
    }

    for network in &removed {
        trie.remove(network).expect("present before removal");
    }
    assert_eq!(trie.count(), kept.len());

    for network in &kept {
        assert_eq!(trie.get_match(*network).expect("still present").network, *network);
    }
    for network in &removed {
        // gone, unless a surviving less specific network still covers it
        if let Some(hit) = trie.try_get_match(*network) {
            assert_ne!(hit.network, *network);
            assert!(hit.network.contains_or_equal(network));
        }
    }
}
