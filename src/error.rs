use crate::ElectionPhase;

use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("zkballot: invalid hexadecimal")]
    BadHex,

    #[error("zkballot: wrong length for 32-byte value")]
    BadLength,

    #[error("zkballot: malformed ciphertext")]
    MalformedCiphertext,

    #[error("zkballot: ballot encryption failed")]
    EncryptionFailed,

    #[error("zkballot: failed to decrypt ballot")]
    DecryptionFailed,

    #[error("zkballot: decrypted ballot is not valid UTF-8")]
    BallotNotUtf8,

    #[error("zkballot: decrypted ballot is missing its salt")]
    MissingSalt,

    #[error("zkballot: CBOR error deserializing submission: {0}")]
    CBORDeserialization(#[from] serde_cbor::Error),

    #[error("zkballot: JSON error deserializing submission: {0}")]
    JSONDeserialization(#[from] serde_json::Error),
}

/// Rejections surfaced by the gated mutating operations.
///
/// Every mutating operation either commits in full or rejects synchronously
/// with one of these; no partial state change survives a rejection.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("zkballot validation: membership tree is at capacity")]
    CapacityExceeded,

    #[error("zkballot validation: tree depth {0} is out of range")]
    InvalidTreeDepth(u32),

    #[error("zkballot validation: commitment is already registered")]
    CommitmentAlreadyRegistered,

    #[error("zkballot validation: voter {0} is already registered")]
    VoterAlreadyRegistered(uuid::Uuid),

    #[error("zkballot validation: no leaf at index {0}")]
    LeafIndexOutOfBounds(u32),

    #[error("zkballot validation: proof was generated against a stale root")]
    RootMismatch,

    #[error("zkballot validation: membership proof did not verify")]
    ProofInvalid,

    #[error("zkballot validation: nullifier has already been spent")]
    NullifierAlreadySpent,

    #[error("zkballot validation: revealed key is not the pair of the published encoding key")]
    KeyMismatch,

    #[error("zkballot validation: operation requires phase {expected}, current phase is {actual}")]
    PhaseViolation {
        expected: ElectionPhase,
        actual: ElectionPhase,
    },

    #[error("zkballot validation: caller is not authorized for this operation")]
    Unauthorized,
}
