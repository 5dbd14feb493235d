use crate::*;

use ed25519_dalek::PublicKey;
use indexmap::IndexSet;
use num_enum::TryFromPrimitive;
use uuid::Uuid;

/// Election lifecycle. Transitions are monotonic: each one is triggered by a
/// single privileged action and none is reversible.
#[derive(
    Serialize, Deserialize, TryFromPrimitive, Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ElectionPhase {
    Setup = 1,
    Registration = 2,
    Voting = 3,
    Revealed = 4,
}

impl std::fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ElectionPhase::Setup => "setup",
            ElectionPhase::Registration => "registration",
            ElectionPhase::Voting => "voting",
            ElectionPhase::Revealed => "revealed",
        };
        write!(f, "{}", name)
    }
}

/// Deployment parameters fixed at setup.
///
/// The tree depth must match the depth baked into the external prover's
/// circuit; a mismatch is undetectable here and is a deployment-time
/// contract.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ElectionConfig {
    pub depth: u32,
    pub context: ElectionContext,

    #[serde(with = "EncodingKeyHex")]
    pub encoding_key: EncodingKey,
}

/// The payload a voter submits during the voting phase. The voter computes
/// the proof and nullifier hash locally; none of their secrets appear here.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoteSubmission {
    pub ballot: EncodedBallot,
    pub nullifier_hash: NullifierHash,
    pub root: TreeHash,
    pub proof: Proof,
}

impl VoteSubmission {
    /// Pack into bytes
    pub fn as_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Unpack from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // If it starts with `{` then it's JSON
        if bytes.first() == Some(&b'{') {
            Ok(serde_json::from_slice(bytes)?)
        } else {
            Ok(serde_cbor::from_slice(bytes)?)
        }
    }
}

/// Owns all mutable election state and routes every mutation through phase-
/// and role-gated methods; no component exposes a raw mutator.
///
/// The controller is a serial state machine: the embedding ledger substrate
/// calls each mutating method one at a time in total order, and every method
/// performs all of its checks before its first state change, so an operation
/// either commits in full or leaves no trace.
pub struct Election<V: ProofVerifier> {
    config: ElectionConfig,
    phase: ElectionPhase,
    owner: PublicKey,
    validators: Vec<PublicKey>,
    registered_voters: IndexSet<Uuid>,
    tree: MembershipTree,
    nullifiers: NullifierRegistry,
    ledger: VoteLedger,
    keys: KeyCustody,
    verifier: V,
}

impl<V: ProofVerifier> Election<V> {
    /// Create an election in the Setup phase. Publishes the encoding key,
    /// fixes the tree depth and binds the proof verifier.
    pub fn new(owner: PublicKey, config: ElectionConfig, verifier: V) -> Result<Self, ValidationError> {
        let tree = MembershipTree::new(config.depth)?;
        let keys = KeyCustody::publish(config.encoding_key.clone());

        Ok(Election {
            config,
            phase: ElectionPhase::Setup,
            owner,
            validators: Vec::new(),
            registered_voters: IndexSet::new(),
            tree,
            nullifiers: NullifierRegistry::new(),
            ledger: VoteLedger::new(),
            keys,
            verifier,
        })
    }

    /// Grant a validator the right to register commitments. Owner only, and
    /// only before voting opens.
    pub fn add_validator(
        &mut self,
        caller: &PublicKey,
        validator: PublicKey,
    ) -> Result<(), ValidationError> {
        self.require_owner(caller)?;
        if self.phase > ElectionPhase::Registration {
            return Err(ValidationError::PhaseViolation {
                expected: ElectionPhase::Registration,
                actual: self.phase,
            });
        }

        if !self.validators.contains(&validator) {
            self.validators.push(validator);
        }
        Ok(())
    }

    /// Setup -> Registration. Owner only.
    pub fn open_registration(&mut self, caller: &PublicKey) -> Result<(), ValidationError> {
        self.require_owner(caller)?;
        self.require_phase(ElectionPhase::Setup)?;
        self.phase = ElectionPhase::Registration;
        Ok(())
    }

    /// Register a voter's commitment into the membership tree, returning its
    /// leaf index. Validator only, Registration phase only.
    ///
    /// `voter_id` is single-use: it marks this real-world identity as
    /// registered without ever being linkable to the commitment's preimage.
    pub fn register_commitment(
        &mut self,
        caller: &PublicKey,
        voter_id: Uuid,
        commitment: Commitment,
    ) -> Result<u32, ValidationError> {
        self.require_validator(caller)?;
        self.require_phase(ElectionPhase::Registration)?;

        if self.registered_voters.contains(&voter_id) {
            return Err(ValidationError::VoterAlreadyRegistered(voter_id));
        }

        // The tree checks capacity and duplicates before mutating anything.
        let index = self.tree.insert(commitment)?;
        self.registered_voters.insert(voter_id);

        Ok(index)
    }

    /// Registration -> Voting. Owner only. Registration is closed before
    /// voting opens so that no late commitment can invalidate a proof a voter
    /// has already computed.
    pub fn open_voting(&mut self, caller: &PublicKey) -> Result<(), ValidationError> {
        self.require_owner(caller)?;
        self.require_phase(ElectionPhase::Registration)?;
        self.phase = ElectionPhase::Voting;
        Ok(())
    }

    /// Accept or reject a vote, returning the ledger ordinal on acceptance.
    ///
    /// Accepted only if all of the following hold, checked in order: the
    /// phase is Voting; the submitted root equals the current tree root (a
    /// stale root means the voter must regenerate their proof); the proof
    /// verifies against {root, nullifier hash, election context}; the
    /// nullifier has never been spent. The ballot is appended only after
    /// every check has passed.
    pub fn cast_vote(&mut self, submission: &VoteSubmission) -> Result<u64, ValidationError> {
        self.require_phase(ElectionPhase::Voting)?;

        if submission.root != self.tree.root() {
            return Err(ValidationError::RootMismatch);
        }

        let inputs = PublicInputs {
            root: submission.root,
            nullifier_hash: submission.nullifier_hash,
            context: self.config.context,
        };
        if !self.verifier.verify(&submission.proof, &inputs) {
            return Err(ValidationError::ProofInvalid);
        }

        self.nullifiers.try_spend(submission.nullifier_hash)?;
        Ok(self.ledger.append(submission.ballot.clone()))
    }

    /// Voting -> Revealed. Owner only; the supplied key must be the pair of
    /// the published encoding key, otherwise the phase stays at Voting.
    pub fn reveal_decoding_key(
        &mut self,
        caller: &PublicKey,
        key: DecodingKey,
    ) -> Result<(), ValidationError> {
        self.require_owner(caller)?;
        self.require_phase(ElectionPhase::Voting)?;

        self.keys.reveal(key)?;
        self.phase = ElectionPhase::Revealed;
        Ok(())
    }

    // Reads. Served against the latest committed state, never blocking.

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn current_root(&self) -> TreeHash {
        self.tree.root()
    }

    pub fn tree(&self) -> &MembershipTree {
        &self.tree
    }

    pub fn nullifiers(&self) -> &NullifierRegistry {
        &self.nullifiers
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        self.keys.encoding_key()
    }

    /// The decoding key, available once the election is Revealed.
    pub fn decoding_key(&self) -> Option<&DecodingKey> {
        self.keys.decoding_key()
    }

    pub fn votes_len(&self) -> u64 {
        self.ledger.len()
    }

    pub fn votes_page(&self, offset: u64, limit: u64) -> &[EncodedBallot] {
        self.ledger.page(offset, limit)
    }

    pub fn is_validator(&self, key: &PublicKey) -> bool {
        self.validators.contains(key)
    }

    fn require_phase(&self, expected: ElectionPhase) -> Result<(), ValidationError> {
        if self.phase != expected {
            return Err(ValidationError::PhaseViolation {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn require_owner(&self, caller: &PublicKey) -> Result<(), ValidationError> {
        if *caller != self.owner {
            return Err(ValidationError::Unauthorized);
        }
        Ok(())
    }

    fn require_validator(&self, caller: &PublicKey) -> Result<(), ValidationError> {
        if !self.validators.contains(caller) {
            return Err(ValidationError::Unauthorized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::mock::{self, MockProofSystem};
    use num_enum::TryFromPrimitive;

    fn new_election(depth: u32) -> (Election<MockProofSystem>, PublicKey, PublicKey, DecodingKey) {
        let (_, owner) = generate_identity();
        let (_, validator) = generate_identity();
        let (decoding_key, encoding_key) = generate_encoding_keypair();
        let config = ElectionConfig {
            depth,
            context: ElectionContext::generate(),
            encoding_key,
        };

        let mut election = Election::new(owner, config, MockProofSystem).unwrap();
        election.add_validator(&owner, validator).unwrap();
        (election, owner, validator, decoding_key)
    }

    fn register(
        election: &mut Election<MockProofSystem>,
        validator: &PublicKey,
        secret: &VoterSecret,
    ) -> u32 {
        election
            .register_commitment(validator, Uuid::new_v4(), secret.commitment())
            .unwrap()
    }

    fn submission_for(
        election: &Election<MockProofSystem>,
        secret: &VoterSecret,
        index: u32,
        option: &str,
    ) -> VoteSubmission {
        let path = election.tree().merkle_path(index).unwrap();
        VoteSubmission {
            ballot: encode_ballot(election.encoding_key(), option).unwrap(),
            nullifier_hash: secret.nullifier_hash(&election.config().context),
            root: election.current_root(),
            proof: mock::prove(secret, &path),
        }
    }

    #[test]
    fn phase_enum_representation() {
        assert_eq!(ElectionPhase::Setup as u8, 1);
        assert_eq!(
            ElectionPhase::try_from_primitive(3).unwrap(),
            ElectionPhase::Voting
        );
        assert!(ElectionPhase::try_from_primitive(5).is_err());
        assert!(ElectionPhase::Setup < ElectionPhase::Revealed);
        assert_eq!(format!("{}", ElectionPhase::Voting), "voting");
    }

    #[test]
    fn role_gating() {
        let (mut election, owner, validator, _) = new_election(2);
        let (_, stranger) = generate_identity();
        let secret = VoterSecret::generate();

        assert_eq!(
            election.open_registration(&stranger),
            Err(ValidationError::Unauthorized)
        );
        assert_eq!(
            election.add_validator(&validator, stranger),
            Err(ValidationError::Unauthorized)
        );

        election.open_registration(&owner).unwrap();

        // Neither the owner nor a stranger may register commitments
        for caller in &[owner, stranger] {
            assert_eq!(
                election.register_commitment(caller, Uuid::new_v4(), secret.commitment()),
                Err(ValidationError::Unauthorized)
            );
        }
        assert!(election.is_validator(&validator));
        assert!(!election.is_validator(&stranger));
    }

    #[test]
    fn phase_gating() {
        let (mut election, owner, validator, _) = new_election(2);
        let secret = VoterSecret::generate();

        // Registration is closed during Setup
        assert!(matches!(
            election.register_commitment(&validator, Uuid::new_v4(), secret.commitment()),
            Err(ValidationError::PhaseViolation {
                expected: ElectionPhase::Registration,
                actual: ElectionPhase::Setup,
            })
        ));

        election.open_registration(&owner).unwrap();
        register(&mut election, &validator, &secret);
        election.open_voting(&owner).unwrap();

        // ...and after voting opens
        assert!(matches!(
            election.register_commitment(&validator, Uuid::new_v4(), VoterSecret::generate().commitment()),
            Err(ValidationError::PhaseViolation { .. })
        ));

        // Validators can no longer be added either
        let (_, late) = generate_identity();
        assert!(matches!(
            election.add_validator(&owner, late),
            Err(ValidationError::PhaseViolation { .. })
        ));
    }

    #[test]
    fn duplicate_voter_id_rejected() {
        let (mut election, owner, validator, _) = new_election(2);
        election.open_registration(&owner).unwrap();

        let voter_id = Uuid::new_v4();
        election
            .register_commitment(&validator, voter_id, VoterSecret::generate().commitment())
            .unwrap();

        let root = election.current_root();
        assert_eq!(
            election.register_commitment(&validator, voter_id, VoterSecret::generate().commitment()),
            Err(ValidationError::VoterAlreadyRegistered(voter_id))
        );
        // The rejected registration left the tree untouched
        assert_eq!(election.current_root(), root);
        assert_eq!(election.tree().len(), 1);
    }

    #[test]
    fn stale_root_rejected_atomically() {
        let (mut election, owner, validator, _) = new_election(2);
        election.open_registration(&owner).unwrap();

        let secret = VoterSecret::generate();
        let index = register(&mut election, &validator, &secret);
        let stale_root = election.current_root();
        let stale_path = election.tree().merkle_path(index).unwrap();

        // Another registration moves the root after this voter proved
        register(&mut election, &validator, &VoterSecret::generate());
        election.open_voting(&owner).unwrap();

        let submission = VoteSubmission {
            ballot: encode_ballot(election.encoding_key(), "1").unwrap(),
            nullifier_hash: secret.nullifier_hash(&election.config().context),
            root: stale_root,
            proof: mock::prove(&secret, &stale_path),
        };
        assert_eq!(
            election.cast_vote(&submission),
            Err(ValidationError::RootMismatch)
        );
        assert_eq!(election.votes_len(), 0);
        assert!(election.nullifiers().is_empty());

        // Regenerating against the current root recovers the vote
        let retry = submission_for(&election, &secret, index, "1");
        election.cast_vote(&retry).unwrap();
        assert_eq!(election.votes_len(), 1);
    }

    #[test]
    fn invalid_proof_rejected_atomically() {
        let (mut election, owner, validator, _) = new_election(2);
        election.open_registration(&owner).unwrap();
        let secret = VoterSecret::generate();
        let index = register(&mut election, &validator, &secret);
        election.open_voting(&owner).unwrap();

        let mut submission = submission_for(&election, &secret, index, "1");
        submission.proof = Proof::from_bytes(vec![0; 8]);

        assert_eq!(
            election.cast_vote(&submission),
            Err(ValidationError::ProofInvalid)
        );
        assert_eq!(election.votes_len(), 0);
        assert!(election.nullifiers().is_empty());
    }

    #[test]
    fn reveal_requires_the_paired_key() {
        let (mut election, owner, validator, decoding_key) = new_election(2);
        election.open_registration(&owner).unwrap();
        register(&mut election, &validator, &VoterSecret::generate());
        election.open_voting(&owner).unwrap();

        let (wrong_key, _) = generate_encoding_keypair();
        assert_eq!(
            election.reveal_decoding_key(&owner, wrong_key),
            Err(ValidationError::KeyMismatch)
        );
        assert_eq!(election.phase(), ElectionPhase::Voting);
        assert!(election.decoding_key().is_none());

        election.reveal_decoding_key(&owner, decoding_key).unwrap();
        assert_eq!(election.phase(), ElectionPhase::Revealed);
        assert!(election.decoding_key().is_some());

        // The transition is terminal: voting and re-revealing are both gone
        let secret = VoterSecret::generate();
        let submission = VoteSubmission {
            ballot: EncodedBallot(vec![0; 4]),
            nullifier_hash: secret.nullifier_hash(&election.config().context),
            root: election.current_root(),
            proof: Proof::from_bytes(vec![]),
        };
        assert!(matches!(
            election.cast_vote(&submission),
            Err(ValidationError::PhaseViolation { .. })
        ));
        // Rejected before anything was touched, like the other cast failures
        assert_eq!(election.votes_len(), 0);
        assert!(election.nullifiers().is_empty());
        let (another_key, _) = generate_encoding_keypair();
        assert!(matches!(
            election.reveal_decoding_key(&owner, another_key),
            Err(ValidationError::PhaseViolation { .. })
        ));
    }

    #[test]
    fn submission_wire_formats() {
        let submission = VoteSubmission {
            ballot: EncodedBallot(vec![0xaa, 0xbb]),
            nullifier_hash: NullifierHash::from_bytes([1; 32]),
            root: TreeHash::from_bytes([2; 32]),
            proof: Proof::from_bytes(vec![0x01, 0x02]),
        };

        // Binary and human-readable forms both round-trip through the
        // format-sniffing decoder
        let cbor = submission.as_bytes().unwrap();
        let from_cbor = VoteSubmission::from_bytes(&cbor).unwrap();
        assert_eq!(from_cbor.ballot, submission.ballot);
        assert_eq!(from_cbor.root, submission.root);

        let json = serde_json::to_vec(&submission).unwrap();
        let from_json = VoteSubmission::from_bytes(&json).unwrap();
        assert_eq!(from_json.nullifier_hash, submission.nullifier_hash);
        assert_eq!(from_json.proof, submission.proof);

        // Hex rendering of byte fields in the JSON form
        let text = String::from_utf8(json).unwrap();
        assert!(text.contains("\"aabb\""));
    }

    #[test]
    fn config_round_trip() {
        let (_, encoding_key) = generate_encoding_keypair();
        let config = ElectionConfig {
            depth: 20,
            context: ElectionContext::generate(),
            encoding_key: encoding_key.clone(),
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: ElectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.depth, 20);
        assert_eq!(back.context, config.context);
        assert_eq!(back.encoding_key, encoding_key);
    }
}
