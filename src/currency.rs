use crate::errors::RemoteError;

/// Placeholder taker account used for order-book queries when the caller
/// supplies no real taking account.
pub const ACCOUNT_ONE: &str = "rrrrrrrrrrrrrrrrrrrrBZbvji";

/// A 160-bit currency code.
///
/// The native asset is the all-zero code. A 3-character human-readable code
/// occupies bytes 12..15 of the 20-byte representation; anything longer is
/// only accepted as a full 40-character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency([u8; 20]);

impl Currency {
    /// The native asset code (all zeroes).
    pub const NATIVE: Currency = Currency([0u8; 20]);

    /// Parses a human-readable currency code.
    ///
    /// `"XRP"` (any case) and the empty string denote the native asset.
    pub fn from_human(code: &str) -> Result<Self, RemoteError> {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("XRP") {
            return Ok(Self::NATIVE);
        }
        if code.len() == 40 && code.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut raw = [0u8; 20];
            hex::decode_to_slice(code, &mut raw)
                .map_err(|_| RemoteError::InvalidCurrency(code.to_string()))?;
            return Ok(Self(raw));
        }
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            let mut raw = [0u8; 20];
            raw[12..15].copy_from_slice(code.as_bytes());
            return Ok(Self(raw));
        }
        Err(RemoteError::InvalidCurrency(code.to_string()))
    }

    /// Canonical 40-character uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }
}
