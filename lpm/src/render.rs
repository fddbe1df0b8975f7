// SPDX-License-Identifier: Apache-2.0
// Copyright Nettrie Authors

//! Deterministic text rendering of one family's tree.
//!
//! The output is part of the test contract: the shape assertions in the
//! test suite compare rendered trees verbatim, and order-independence of
//! insertion is defined as equality of renderings.

use std::sync::Arc;

use net::{AddressFamily, Network};

use crate::node::Node;
use crate::trie::NetworkTrie;

struct Frame<V> {
    node: Arc<Node<V>>,
    /// Glyph columns contributed by the ancestors
    columns: String,
    slot: usize,
    is_last: bool,
    is_root: bool,
}

impl<V> NetworkTrie<V> {
    /// Render one family's tree, one line per node.
    ///
    /// Routing nodes carry a leading `@`; every node but the root carries
    /// a ` [slot]` suffix naming its child slot under its parent.
    #[must_use]
    pub fn to_text_tree(&self, family: AddressFamily) -> String {
        self.render(family, |_, _| None)
    }

    /// Like [`NetworkTrie::to_text_tree`], appending `display`'s text
    /// after each value node.
    #[must_use]
    pub fn to_text_tree_with<F>(&self, family: AddressFamily, mut display: F) -> String
    where
        F: FnMut(&Network, &V) -> String,
    {
        self.render(family, move |network, value| Some(display(network, value)))
    }

    fn render<F>(&self, family: AddressFamily, mut display: F) -> String
    where
        F: FnMut(&Network, &V) -> Option<String>,
    {
        let mut out = String::new();
        let mut stack = vec![Frame {
            node: self.root(family).load_full(),
            columns: String::new(),
            slot: 0,
            is_last: true,
            is_root: true,
        }];
        while let Some(frame) = stack.pop() {
            if !frame.is_root {
                out.push_str(&frame.columns);
                out.push_str(if frame.is_last { "└──" } else { "├──" });
            }
            let payload = frame.node.payload();
            if payload.is_none() {
                out.push('@');
            }
            out.push_str(&frame.node.network().to_string());
            if !frame.is_root {
                out.push_str(&format!(" [{}]", frame.slot));
            }
            if let Some(payload) = &payload {
                if let Some(text) = display(frame.node.network(), payload) {
                    out.push(' ');
                    out.push_str(&text);
                }
            }
            out.push('\n');

            let child_columns = if frame.is_root {
                String::new()
            } else {
                let mut columns = frame.columns;
                columns.push_str(if frame.is_last { "   " } else { "│  " });
                columns
            };
            let children: Vec<(usize, Arc<Node<V>>)> = [0, 1]
                .into_iter()
                .filter_map(|slot| frame.node.child(slot).map(|child| (slot, child)))
                .collect();
            let sibling_count = children.len();
            // push right-hand children first so slot 0 is emitted first
            for (position, (slot, child)) in children.into_iter().enumerate().rev() {
                stack.push(Frame {
                    node: child,
                    columns: child_columns.clone(),
                    slot,
                    is_last: position == sibling_count - 1,
                    is_root: false,
                });
            }
        }
        if out.ends_with('\n') {
            out.pop();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Network {
        s.parse().expect("test network")
    }

    #[test]
    fn empty_trees_render_their_roots() {
        let trie: NetworkTrie<()> = NetworkTrie::new();
        assert_eq!(trie.to_text_tree(AddressFamily::Ipv4), "@0.0.0.0/0");
        assert_eq!(trie.to_text_tree(AddressFamily::Ipv6), "@::/0");
    }

    #[test]
    fn glyphs_and_slots() {
        let trie = NetworkTrie::new();
        trie.add(net("10.20.30.4/32"), ()).unwrap();
        trie.add(net("10.20.30.5/32"), ()).unwrap();
        trie.add(net("192.0.2.0/24"), ()).unwrap();
        assert_eq!(
            trie.to_text_tree(AddressFamily::Ipv4),
            "@0.0.0.0/0\n\
             ├──@10.20.30.4/31 [0]\n\
             │  ├──10.20.30.4/32 [0]\n\
             │  └──10.20.30.5/32 [1]\n\
             └──192.0.2.0/24 [1]"
        );
    }

    #[test]
    fn value_root_is_not_marked_routing() {
        let trie = NetworkTrie::new();
        trie.add(net("0.0.0.0/0"), ()).unwrap();
        assert_eq!(trie.to_text_tree(AddressFamily::Ipv4), "0.0.0.0/0");
    }

    #[test]
    fn payload_text_follows_value_nodes() {
        let trie = NetworkTrie::new();
        trie.add(net("10.0.0.0/8"), "corp").unwrap();
        trie.add(net("10.128.0.0/9"), "lab").unwrap();
        let rendered =
            trie.to_text_tree_with(AddressFamily::Ipv4, |_, label| format!("<{label}>"));
        assert_eq!(
            rendered,
            "@0.0.0.0/0\n\
             └──10.0.0.0/8 [0] <corp>\n\
             \u{20}  └──10.128.0.0/9 [1] <lab>"
        );
    }
}
