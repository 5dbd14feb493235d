use crate::keys;
use crate::*;

use rand::Rng;

/// Separator between the vote option and its salt inside the plaintext.
const SALT_SEPARATOR: char = '-';

/// An encrypted ballot as stored in the vote ledger.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EncodedBallot(#[serde(with = "hex_serde")] pub Vec<u8>);

impl EncodedBallot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt a vote option against the election's encoding key.
///
/// The plaintext convention is `"<option>-<salt>"` with an 8-byte random
/// salt, so two ballots for the same option never produce identical
/// ciphertexts on a small option set.
pub fn encode_ballot(key: &EncodingKey, option: &str) -> Result<EncodedBallot, Error> {
    let salt: [u8; 8] = rand::rngs::OsRng {}.gen();
    let plaintext = format!("{}{}{}", option, SALT_SEPARATOR, hex::encode(salt));

    Ok(EncodedBallot(keys::encrypt(key, plaintext.as_bytes())?))
}

/// Decrypt a stored ballot and strip the salt, returning the vote option.
///
/// Anyone holding the revealed decoding key pages through the ledger and
/// calls this per entry; tallying is deliberately left to the observer.
pub fn decode_ballot(key: &DecodingKey, ballot: &EncodedBallot) -> Result<String, Error> {
    let plaintext = keys::decrypt(key, &ballot.0)?;
    let plaintext = String::from_utf8(plaintext).map_err(|_| Error::BallotNotUtf8)?;

    // The salt follows the last separator; the option itself may contain one.
    match plaintext.rsplit_once(SALT_SEPARATOR) {
        Some((option, _salt)) => Ok(option.to_string()),
        None => Err(Error::MissingSalt),
    }
}
