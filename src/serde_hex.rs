// We define in our crate:
use crate::EncodingKey;
use std::borrow::Cow;

pub use hex_buffer_serde::Hex;

// a single-purpose type for use in `#[serde(with)]`
pub enum EncodingKeyHex {}

impl Hex<EncodingKey> for EncodingKeyHex {
    type Error = String;

    fn create_bytes(key: &EncodingKey) -> Cow<[u8]> {
        key.to_bytes().to_vec().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<EncodingKey, String> {
        EncodingKey::from_bytes(bytes).ok_or_else(|| "invalid encoding key".to_string())
    }
}
