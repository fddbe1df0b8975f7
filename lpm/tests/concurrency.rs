// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! A reader must never observe a torn tree while a writer churns: the
//! pre-installed host route stays matchable through every intermediate
//! shape the writer publishes.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use lpm::SharedNetworkTrie;
use net::Network;

fn net(s: &str) -> Network {
    s.parse().expect("test network")
}

#[test]
fn readers_always_see_the_sentinel_through_writer_churn() {
    let trie: SharedNetworkTrie<&str> = SharedNetworkTrie::new();
    trie.add(net("0.0.0.0/32"), "Success").unwrap();

    let zero: IpAddr = "0.0.0.0".parse().unwrap();
    let churn: Vec<(Network, Network)> = (1..=31u8)
        .map(|prefix| {
            let network = Network::new(zero, prefix).expect("valid prefix");
            (network, network.complementary().expect("prefix > 0"))
        })
        .collect();

    let done = AtomicBool::new(false);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..10_000 {
                for (network, complement) in &churn {
                    assert!(trie.try_add(*network, "zero side"));
                    assert!(trie.try_add(*complement, "one side"));
                }
                for (network, complement) in &churn {
                    assert!(trie.try_remove(network));
                    assert!(trie.try_remove(complement));
                }
            }
            done.store(true, Ordering::Release);
        });
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let hit = trie
                    .get_match(zero)
                    .expect("the sentinel host route is never removed");
                assert_eq!(hit.network, net("0.0.0.0/32"));
                assert_eq!(*hit.value, "Success");
            }
        });
    });

    // only the sentinel survives the churn
    assert_eq!(trie.count(), 1);
    assert_eq!(*trie.get_match(zero).unwrap().value, "Success");
}
