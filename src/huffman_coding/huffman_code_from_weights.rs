//! This helper function is part of the huffman encoding system.
//!
//! The chunk compressor counts how often each of the 512 symbols is used. This helper generates
//! huffman code lengths (depth tables) from those frequency weights. Each length is stored in a
//! 4-bit nibble of the chunk header, so the maximum code length is 15 bits. If the weights supplied
//! create longer codes, the weights will be flattened and another attempt will be made.
//!

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::tools::symbol::SYMBOLS;

/// Longest code that fits in a nibble of the code length table.
pub const MAX_CODE_LENGTH: u8 = 15;

#[derive(Debug)]
enum NodeData {
    Kids(Box<Node>, Box<Node>),
    Leaf(u16),
}

#[derive(Debug)]
struct Node {
    weight: u32,
    depth: u8,
    /// Creation order, so equal weights pop in a stable order.
    seq: u32,
    node_data: NodeData,
}

impl Ord for Node {
    /// Reversed, so the BinaryHeap pops the lightest node first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Node {}

/// Build code lengths (0 for unused symbols) from symbol frequencies. No length exceeds
/// MAX_CODE_LENGTH. A lone used symbol gets length 1.
pub fn improve_code_len_from_weights(sym_weight: &[u32; SYMBOLS]) -> [u8; SYMBOLS] {
    let mut lengths = [0_u8; SYMBOLS];

    // Only symbols that occur get a code. Weights carry a depth in the low byte (see add_weights).
    let mut weight = sym_weight
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(i, &f)| (f.min(0x00ff_ffff) << 8, i as u16))
        .collect::<Vec<(u32, u16)>>();

    match weight.len() {
        0 => return lengths,
        1 => {
            lengths[weight[0].1 as usize] = 1;
            return lengths;
        }
        _ => {}
    }

    // We need to make codes of 15 bits or less. If we can't, we will adjust the weights and try again.
    loop {
        let mut seq = 0_u32;
        let mut tree: BinaryHeap<Node> = weight
            .iter()
            .map(|&(w, sym)| {
                seq += 1;
                Node {
                    weight: w,
                    depth: 0,
                    seq,
                    node_data: NodeData::Leaf(sym),
                }
            })
            .collect();

        // ...then pare it down to one single node with child nodes.
        while tree.len() > 1 {
            let (Some(left_child), Some(right_child)) = (tree.pop(), tree.pop()) else {
                break;
            };
            seq += 1;
            tree.push(Node {
                weight: add_weights(left_child.weight, right_child.weight),
                depth: left_child.depth.max(right_child.depth) + 1,
                seq,
                node_data: NodeData::Kids(Box::new(left_child), Box::new(right_child)),
            });
        }

        let Some(root) = tree.pop() else {
            return lengths;
        };
        if root.depth <= MAX_CODE_LENGTH {
            let mut leaves = Vec::with_capacity(weight.len());
            return_leaves(&root, 0, &mut leaves);
            for (sym, len) in leaves {
                lengths[sym as usize] = len;
            }
            return lengths;
        }

        // Adjust weights by dividing each weight by 2 and adding 1.
        // This "flattens" the node tree. Then go try this again.
        trace!("Huffman tree depth {} too deep, flattening weights", root.depth);
        for item in weight.iter_mut() {
            let mut j = item.0 >> 8;
            j = 1 + (j / 2);
            item.0 = j << 8;
        }
    }
}

/// Recursively walk the tree and return in "leaves" how far (deep) from the root node each leaf is.
/// Depth is the same as the code length.
fn return_leaves(node: &Node, depth: u8, leaves: &mut Vec<(u16, u8)>) {
    match &node.node_data {
        NodeData::Kids(left_child, right_child) => {
            return_leaves(left_child, depth + 1, leaves);
            return_leaves(right_child, depth + 1, leaves);
        }
        NodeData::Leaf(sym) => {
            leaves.push((*sym, depth));
        }
    };
}

/// Julian's version of weight adding for parent nodes. The low byte keeps the subtree depth so
/// that, between equal weights, shallower subtrees are merged first.
#[inline(always)]
fn add_weights(a: u32, b: u32) -> u32 {
    let weight_mask: u32 = 0xffffff00;
    let depth_mask: u32 = 0x000000ff;
    ((a & weight_mask) + (b & weight_mask)) | (1 + (a & depth_mask).max(b & depth_mask))
}
