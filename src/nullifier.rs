use crate::*;

use indexmap::IndexSet;

/// Set of spent nullifier hashes.
///
/// Each hash is accepted at most once. Check-and-set is atomic relative to
/// the rest of a vote transaction because all mutation runs through the
/// election controller's serial executor.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct NullifierRegistry {
    spent: IndexSet<NullifierHash>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        NullifierRegistry::default()
    }

    /// Record the hash on first use, reject it on any later use.
    pub fn try_spend(&mut self, hash: NullifierHash) -> Result<(), ValidationError> {
        if !self.spent.insert(hash) {
            return Err(ValidationError::NullifierAlreadySpent);
        }
        Ok(())
    }

    pub fn is_spent(&self, hash: &NullifierHash) -> bool {
        self.spent.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
