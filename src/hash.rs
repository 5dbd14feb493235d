use crate::Error;

use digest::Digest;
use rand::Rng;
use serde::Deserialize;
use sha2::Sha256;

// Domain-separation tags. The prover and this crate must agree on these,
// they are part of the interop contract alongside `PublicInputs::to_bytes`.
const COMMITMENT_TAG: u8 = 0x00;
const NULLIFIER_TAG: u8 = 0x01;
const NODE_TAG: u8 = 0x02;

macro_rules! bytes32_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) [u8; 32]);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|_| Error::BadHex)?;
                if bytes.len() != 32 {
                    return Err(Error::BadLength);
                }
                let mut inner = [0; 32];
                inner.copy_from_slice(&bytes);
                Ok($name(inner))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

bytes32_newtype! {
    /// A node hash in the membership tree. The root is the public anchor a
    /// membership proof is checked against.
    TreeHash
}

bytes32_newtype! {
    /// A hash committing to a voter's secret identity values, stored as a
    /// tree leaf. The preimage never enters the system.
    Commitment
}

bytes32_newtype! {
    /// Marks "this registered identity already voted" without revealing
    /// which commitment it corresponds to.
    NullifierHash
}

bytes32_newtype! {
    /// Identifies one election. Bound into every nullifier hash and proof so
    /// neither can be replayed against a different election.
    ElectionContext
}

impl ElectionContext {
    /// Draw a fresh election context from the OS random source.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng {};
        ElectionContext(csprng.gen())
    }
}

impl From<Commitment> for TreeHash {
    fn from(commitment: Commitment) -> Self {
        TreeHash(commitment.0)
    }
}

fn sha256_tagged(tag: u8, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(&[tag]);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Commitment over a voter's secret values: `sha256(0x00 || nullifier || blinding)`.
pub fn commitment_hash(secret_nullifier: &[u8; 32], secret_blinding: &[u8; 32]) -> Commitment {
    Commitment(sha256_tagged(
        COMMITMENT_TAG,
        &[secret_nullifier, secret_blinding],
    ))
}

/// Nullifier hash for one election: `sha256(0x01 || nullifier || context)`.
///
/// The same voter always derives the same value for a given election, but the
/// value cannot be linked back to the commitment without the secret.
pub fn nullifier_hash(secret_nullifier: &[u8; 32], context: &ElectionContext) -> NullifierHash {
    NullifierHash(sha256_tagged(
        NULLIFIER_TAG,
        &[secret_nullifier, context.as_bytes()],
    ))
}

/// Interior tree node: `sha256(0x02 || left || right)`.
pub fn node_hash(left: &TreeHash, right: &TreeHash) -> TreeHash {
    TreeHash(sha256_tagged(NODE_TAG, &[&left.0, &right.0]))
}
