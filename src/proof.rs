use crate::*;

/// Opaque zero-knowledge proof bytes, produced by the off-system prover.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Proof(#[serde(with = "hex_serde")] pub Vec<u8>);

impl Proof {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Proof(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Public inputs a proof is verified against.
///
/// A valid proof attests, in zero knowledge, that (i) a hidden commitment is
/// a leaf under `root` and (ii) `nullifier_hash` was derived from that
/// commitment's secret nullifier and `context`. Because the root and context
/// are bound into the proof, it cannot be replayed against another tree state
/// or another election.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicInputs {
    pub root: TreeHash,
    pub nullifier_hash: NullifierHash,
    pub context: ElectionContext,
}

impl PublicInputs {
    /// Canonical byte encoding: `root || nullifier_hash || context`.
    ///
    /// Independent prover implementations must feed public inputs to the
    /// proving system in exactly this order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(96);
        bytes.extend_from_slice(self.root.as_bytes());
        bytes.extend_from_slice(self.nullifier_hash.as_bytes());
        bytes.extend_from_slice(self.context.as_bytes());
        bytes
    }
}

/// Binding to the externally supplied proving system.
///
/// The core never implements the proof cryptography; deployments wire in a
/// verifier for whatever circuit their provers target. The circuit's tree
/// depth must match the election's configured depth - that is a deployment
/// contract this crate cannot check at runtime.
pub trait ProofVerifier {
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool;
}
