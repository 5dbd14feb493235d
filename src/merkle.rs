use crate::*;

use indexmap::IndexMap;

/// Deepest tree this crate will manage. Leaf indices are `u32`, so a depth-31
/// tree (2^31 leaves) is the largest that leaves headroom for the capacity
/// arithmetic.
pub const MAX_TREE_DEPTH: u32 = 31;

/// Fixed-depth incremental Merkle tree of voter commitments.
///
/// Leaves fill contiguously from index 0; unfilled slots contribute a
/// deterministic per-level zero hash. Insertion maintains, per level, the most
/// recently computed left-subtree hash, so each insertion recomputes the root
/// in O(depth) rather than O(size).
///
/// Insertion order is visible and significant: the external prover recomputes
/// a Merkle path against the same sequential indexing to produce a matching
/// proof.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipTree {
    depth: u32,
    next_index: u32,
    root: TreeHash,
    filled: Vec<TreeHash>,
    zeros: Vec<TreeHash>,
    // Insertion-ordered, so iteration yields leaves by index while the
    // duplicate check and index lookup stay O(1).
    leaves: IndexMap<Commitment, u32>,
}

impl MembershipTree {
    /// Create an empty tree with capacity `2^depth`.
    pub fn new(depth: u32) -> Result<Self, ValidationError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(ValidationError::InvalidTreeDepth(depth));
        }

        // zeros[level] is the hash of an empty subtree of that height;
        // zeros[depth] is the root of a fully empty tree.
        let mut zeros = Vec::with_capacity(depth as usize + 1);
        let mut current = TreeHash::from_bytes([0; 32]);
        zeros.push(current);
        for _ in 0..depth {
            current = node_hash(&current, &current);
            zeros.push(current);
        }

        Ok(MembershipTree {
            depth,
            next_index: 0,
            root: zeros[depth as usize],
            filled: zeros[..depth as usize].to_vec(),
            zeros,
            leaves: IndexMap::new(),
        })
    }

    /// Insert a commitment into the next free slot, returning its leaf index.
    ///
    /// Rejects with `CapacityExceeded` when all `2^depth` slots are filled and
    /// with `CommitmentAlreadyRegistered` on a duplicate leaf. No state
    /// changes on rejection.
    pub fn insert(&mut self, commitment: Commitment) -> Result<u32, ValidationError> {
        if u64::from(self.next_index) >= self.capacity() {
            return Err(ValidationError::CapacityExceeded);
        }
        if self.leaves.contains_key(&commitment) {
            return Err(ValidationError::CommitmentAlreadyRegistered);
        }

        let index = self.next_index;
        let mut node = TreeHash::from(commitment);
        let mut position = index;

        for level in 0..self.depth as usize {
            if position % 2 == 0 {
                // Left child: remember it for the sibling that arrives later,
                // pair with the zero subtree for now.
                self.filled[level] = node;
                node = node_hash(&node, &self.zeros[level]);
            } else {
                node = node_hash(&self.filled[level], &node);
            }
            position /= 2;
        }

        self.root = node;
        self.leaves.insert(commitment, index);
        self.next_index += 1;

        Ok(index)
    }

    /// The current root over all filled leaves plus zero-fill.
    pub fn root(&self) -> TreeHash {
        self.root
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of filled leaves.
    pub fn len(&self) -> u32 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Look up the leaf index of a registered commitment.
    pub fn leaf_index(&self, commitment: &Commitment) -> Option<u32> {
        self.leaves.get(commitment).copied()
    }

    /// Sibling path for the leaf at `index`, for off-system proof generation.
    ///
    /// This is a read-only helper that recomputes interior nodes from the
    /// stored leaves, O(n) in the number of leaves. It never touches the
    /// incremental insertion state.
    pub fn merkle_path(&self, index: u32) -> Result<MerklePath, ValidationError> {
        if index >= self.next_index {
            return Err(ValidationError::LeafIndexOutOfBounds(index));
        }

        let mut level_nodes: Vec<TreeHash> =
            self.leaves.keys().map(|leaf| TreeHash::from(*leaf)).collect();
        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut indices = Vec::with_capacity(self.depth as usize);
        let mut position = index as usize;

        for level in 0..self.depth as usize {
            let sibling = if position % 2 == 0 {
                level_nodes
                    .get(position + 1)
                    .copied()
                    .unwrap_or(self.zeros[level])
            } else {
                level_nodes[position - 1]
            };
            siblings.push(sibling);
            indices.push((position % 2) as u8);

            let mut next_level = Vec::with_capacity((level_nodes.len() + 1) / 2);
            for pair in level_nodes.chunks(2) {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(self.zeros[level]);
                next_level.push(node_hash(&left, &right));
            }
            level_nodes = next_level;
            position /= 2;
        }

        Ok(MerklePath { siblings, indices })
    }
}

/// Sibling hashes from a leaf up to the root.
///
/// `indices[i]` is 0 when the climbing node is the left child at level `i`
/// and 1 when it is the right child. Independent provers must re-hash with
/// exactly this rule to reproduce the root.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MerklePath {
    pub siblings: Vec<TreeHash>,
    pub indices: Vec<u8>,
}

impl MerklePath {
    /// Re-hash `leaf` up the path.
    pub fn compute_root(&self, leaf: TreeHash) -> TreeHash {
        let mut node = leaf;
        for (sibling, index) in self.siblings.iter().zip(self.indices.iter()) {
            node = if *index == 0 {
                node_hash(&node, sibling)
            } else {
                node_hash(sibling, &node)
            };
        }
        node
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}
