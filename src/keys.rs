//! Vote-encoding key material: an Integrated Encryption Scheme on Twisted
//! Edwards Curve25519, plus the custody rules for the election keypair.
//!
//! The encoding (public) key is published when the election is created; every
//! ballot is encrypted against it client-side. The decoding (private) key is
//! withheld until the authority reveals it, after which anyone can decrypt the
//! full vote list and re-derive the tally.
//!
//! Note the key uses the ed25519 secret-key representation but a direct
//! scalar-multiplication public key, so an encoding keypair must never double
//! as a signing keypair.

use crate::{Error, ValidationError};

use aes_gcm::aead::{generic_array::GenericArray, Aead, NewAead};
use aes_gcm::Aes256Gcm;
use curve25519_dalek::constants;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{PublicKey, SecretKey, PUBLIC_KEY_LENGTH};
use hkdf::Hkdf;
use rand::Rng;
use sha2::Sha256;

const NONCE_LENGTH: usize = 12;

/// The withheld half of the election keypair.
pub type DecodingKey = SecretKey;

type SymmetricKey = [u8; 32];

/// The published half of the election keypair. Ballots are encrypted against
/// it; it cannot decrypt anything.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EncodingKey(PublicKey);

impl EncodingKey {
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// Construct from bytes. Returns None if the bytes are not a valid
    /// curve point.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match PublicKey::from_bytes(bytes) {
            Ok(public) => Some(EncodingKey(public)),
            Err(_) => None,
        }
    }

    /// Re-derive the encoding key from a decoding key.
    ///
    /// This is the pairing check the reveal operation relies on: a claimed
    /// decoding key is accepted only if this derivation reproduces the
    /// published encoding key.
    pub fn from_decoding_key(secret: &DecodingKey) -> Self {
        let point = &Scalar::from_bits(secret.to_bytes()) * &constants::ED25519_BASEPOINT_TABLE;
        let public = PublicKey::from_bytes(&point.compress().to_bytes()).unwrap();
        EncodingKey(public)
    }

    fn as_point(&self) -> EdwardsPoint {
        // The inner key was validated on construction, so the compressed
        // point always decompresses.
        CompressedEdwardsY::from_slice(self.0.as_bytes())
            .decompress()
            .unwrap()
    }
}

impl PartialEq for EncodingKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl AsRef<[u8]> for EncodingKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Generate an election keypair from the OS random source.
pub fn generate_encoding_keypair() -> (DecodingKey, EncodingKey) {
    let mut csprng = rand::rngs::OsRng {};
    let ed25519_dalek::Keypair { public: _, secret } =
        ed25519_dalek::Keypair::generate(&mut csprng);
    let public = EncodingKey::from_decoding_key(&secret);
    (secret, public)
}

/// Generate an ed25519 identity keypair, used for owner and validator roles.
pub fn generate_identity() -> (SecretKey, PublicKey) {
    let mut csprng = rand::rngs::OsRng {};
    let ed25519_dalek::Keypair { public, secret } = ed25519_dalek::Keypair::generate(&mut csprng);
    (secret, public)
}

/// Encrypt a message against the encoding key.
///
/// Ciphertext layout: `ephemeral_pk(32) || nonce(12) || aes_gcm_ciphertext`.
pub fn encrypt(receiver: &EncodingKey, msg: &[u8]) -> Result<Vec<u8>, Error> {
    let (ephemeral_sk, ephemeral_pk) = generate_encoding_keypair();
    let key = encapsulate(&ephemeral_sk, receiver);

    let aead = Aes256Gcm::new(GenericArray::from_slice(&key));
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng {}.fill(&mut nonce);

    let encrypted = aead
        .encrypt(GenericArray::from_slice(&nonce), msg)
        .map_err(|_| Error::EncryptionFailed)?;

    let mut ciphertext = Vec::with_capacity(PUBLIC_KEY_LENGTH + NONCE_LENGTH + encrypted.len());
    ciphertext.extend_from_slice(ephemeral_pk.as_bytes());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend(encrypted);

    Ok(ciphertext)
}

/// Decrypt a ciphertext with the decoding key.
pub fn decrypt(receiver: &DecodingKey, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if ciphertext.len() <= PUBLIC_KEY_LENGTH + NONCE_LENGTH {
        return Err(Error::MalformedCiphertext);
    }

    let ephemeral_pk = EncodingKey::from_bytes(&ciphertext[..PUBLIC_KEY_LENGTH])
        .ok_or(Error::MalformedCiphertext)?;
    let nonce = &ciphertext[PUBLIC_KEY_LENGTH..PUBLIC_KEY_LENGTH + NONCE_LENGTH];
    let encrypted = &ciphertext[PUBLIC_KEY_LENGTH + NONCE_LENGTH..];

    let key = decapsulate(receiver, &ephemeral_pk);
    let aead = Aes256Gcm::new(GenericArray::from_slice(&key));

    aead.decrypt(GenericArray::from_slice(nonce), encrypted)
        .map_err(|_| Error::DecryptionFailed)
}

fn shared_point(secret: &SecretKey, public: &EncodingKey) -> [u8; 32] {
    let point = public.as_point() * Scalar::from_bits(secret.to_bytes());
    point.compress().to_bytes()
}

fn derive_symmetric_key(ephemeral_pk: &EncodingKey, shared: &[u8; 32]) -> SymmetricKey {
    let mut master = Vec::with_capacity(64);
    master.extend_from_slice(ephemeral_pk.as_bytes());
    master.extend_from_slice(shared);

    let hkdf = Hkdf::<Sha256>::new(None, &master);
    let mut key = [0u8; 32];
    hkdf.expand(&[], &mut key).unwrap();
    key
}

fn encapsulate(ephemeral_sk: &SecretKey, receiver: &EncodingKey) -> SymmetricKey {
    let shared = shared_point(ephemeral_sk, receiver);
    let ephemeral_pk = EncodingKey::from_decoding_key(ephemeral_sk);
    derive_symmetric_key(&ephemeral_pk, &shared)
}

fn decapsulate(receiver_sk: &SecretKey, ephemeral_pk: &EncodingKey) -> SymmetricKey {
    let shared = shared_point(receiver_sk, ephemeral_pk);
    derive_symmetric_key(ephemeral_pk, &shared)
}

/// Custodies the election keypair's visibility timing: the encoding key is
/// public from construction, the decoding key appears exactly once, at
/// reveal, and is immutable and permanently readable afterwards.
#[derive(Debug)]
pub struct KeyCustody {
    published: EncodingKey,
    revealed: Option<DecodingKey>,
}

impl KeyCustody {
    /// Publish the encoding key. Happens once, at election setup.
    pub fn publish(key: EncodingKey) -> Self {
        KeyCustody {
            published: key,
            revealed: None,
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.published
    }

    /// Accept the decoding key iff it is the mathematical pair of the
    /// published encoding key. A bogus key would make every ballot decode to
    /// garbage, so the mismatch is rejected here rather than discovered at
    /// tally time.
    pub fn reveal(&mut self, key: DecodingKey) -> Result<(), ValidationError> {
        if EncodingKey::from_decoding_key(&key) != self.published {
            return Err(ValidationError::KeyMismatch);
        }
        self.revealed = Some(key);
        Ok(())
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed.is_some()
    }

    pub fn decoding_key(&self) -> Option<&DecodingKey> {
        self.revealed.as_ref()
    }
}
