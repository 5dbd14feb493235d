use crate::*;

use rand::Rng;

/// A voter's secret identity values. Held client-side only; the election core
/// sees the commitment as a tree leaf and, at vote time, the nullifier hash.
///
/// The off-system prover consumes these together with a [`MerklePath`] to
/// produce a membership proof.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoterSecret {
    pub secret_nullifier: [u8; 32],
    pub secret_blinding: [u8; 32],
}

impl VoterSecret {
    /// Draw fresh secrets from the OS random source.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng {};
        VoterSecret {
            secret_nullifier: csprng.gen(),
            secret_blinding: csprng.gen(),
        }
    }

    /// The commitment a validator registers on the voter's behalf.
    pub fn commitment(&self) -> Commitment {
        commitment_hash(&self.secret_nullifier, &self.secret_blinding)
    }

    /// The nullifier hash this voter submits for the given election.
    pub fn nullifier_hash(&self, context: &ElectionContext) -> NullifierHash {
        crate::nullifier_hash(&self.secret_nullifier, context)
    }
}
