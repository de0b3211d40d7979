use std::array::TryFromSliceError;

use hex::FromHexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UtilsError {
    #[error("Hex utils error {0}")]
    HexUtils(#[from] FromHexError),
    #[error("TryFromSlice utils error {0}")]
    TryFromSlice(#[from] TryFromSliceError),
}

/// Converts bytes to 0x-prefixed hex string.
pub fn hex_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Converts 0x-prefixed hex string to bytes.
pub fn hex_decode<T: AsRef<str>>(string: T) -> Result<Vec<u8>, UtilsError> {
    let s = string.as_ref().trim_start_matches("0x");
    Ok(hex::decode(s)?)
}

/// Converts 0x-prefixed hex string to a 32 byte array, e.g., a root or a hashed key.
pub fn hex_decode_32<T: AsRef<str>>(string: T) -> Result<[u8; 32], UtilsError> {
    let bytes = hex_decode(string)?;
    Ok(bytes.as_slice().try_into()?)
}
