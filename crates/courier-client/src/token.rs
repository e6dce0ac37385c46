//! Session-token addressing.
//!
//! An access token is self-describing: the client derives the storage
//! address of its own session record from the token alone, with no
//! server round trip. The raw token bytes split into a fixed-length
//! prefix (the list id, re-encoded with the sortable alphabet generated
//! ids use) and a remainder (hashed into the element id).

use base64::{
    alphabet,
    engine::{self, general_purpose},
    Engine,
};
use sha2::{Digest, Sha256};

use courier_crypto::GENERATED_ID_BYTES_LENGTH;

use crate::error::LoginError;

/// Sortable base64 variant used for generated ids: digits sort before
/// upper case before lower case, matching server-side id ordering.
const BASE64_EXT: alphabet::Alphabet = match alphabet::Alphabet::new(
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_",
) {
    Ok(alphabet) => alphabet,
    Err(_) => panic!("invalid base64ext alphabet"),
};

const BASE64_EXT_ENGINE: engine::GeneralPurpose =
    engine::GeneralPurpose::new(&BASE64_EXT, general_purpose::NO_PAD);

/// The two-part address of a stored session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAddress {
    pub list_id: String,
    pub element_id: String,
}

impl SessionAddress {
    /// Derive the session-record address from an access token.
    ///
    /// Fails with [`LoginError::InvalidSessionToken`] if the token is
    /// not valid base64url or carries fewer raw bytes than a generated
    /// id.
    pub fn from_access_token(access_token: &str) -> Result<Self, LoginError> {
        let raw = general_purpose::URL_SAFE_NO_PAD
            .decode(access_token)
            .map_err(|err| LoginError::InvalidSessionToken(err.to_string()))?;

        if raw.len() < GENERATED_ID_BYTES_LENGTH {
            return Err(LoginError::InvalidSessionToken(format!(
                "token carries {} bytes, need at least {}",
                raw.len(),
                GENERATED_ID_BYTES_LENGTH
            )));
        }

        let (prefix, remainder) = raw.split_at(GENERATED_ID_BYTES_LENGTH);
        Ok(Self {
            list_id: BASE64_EXT_ENGINE.encode(prefix),
            element_id: general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(remainder)),
        })
    }
}
