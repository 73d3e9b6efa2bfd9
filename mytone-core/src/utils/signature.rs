//! HMAC-SHA256 signatures for time-limited download links.
//!
//! Payload: `key|expires`, hex encoded. The link stays valid while
//! `now <= expires`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signed link has expired")]
    Expired,

    #[error("Signature mismatch")]
    Mismatch,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

pub fn generate_download_signature(
    secret: &str,
    key: &str,
    expires: i64,
) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;

    mac.update(format!("{}|{}", key, expires).as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a signature against the expected one using constant-time comparison.
pub fn verify_download_signature(
    secret: &str,
    key: &str,
    expires: i64,
    signature: &str,
    now: i64,
) -> Result<(), SignatureError> {
    if now > expires {
        return Err(SignatureError::Expired);
    }

    let expected = generate_download_signature(secret, key, expires)?;
    let expected_bytes = expected.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Err(SignatureError::Mismatch);
    }

    if bool::from(expected_bytes.ct_eq(signature_bytes)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "download_secret";
    const KEY: &str = "mytone-app-release.apk";

    #[test]
    fn test_valid_until_expiry() {
        let expires = 1_700_003_600;
        let signature = generate_download_signature(SECRET, KEY, expires).unwrap();

        assert_eq!(
            verify_download_signature(SECRET, KEY, expires, &signature, 1_700_000_000),
            Ok(())
        );
        assert_eq!(
            verify_download_signature(SECRET, KEY, expires, &signature, expires),
            Ok(())
        );
    }

    #[test]
    fn test_rejected_after_expiry() {
        let expires = 1_700_003_600;
        let signature = generate_download_signature(SECRET, KEY, expires).unwrap();

        assert_eq!(
            verify_download_signature(SECRET, KEY, expires, &signature, expires + 1),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_tampered_expiry_is_rejected() {
        let expires = 1_700_003_600;
        let signature = generate_download_signature(SECRET, KEY, expires).unwrap();

        assert_eq!(
            verify_download_signature(SECRET, KEY, expires + 86_400, &signature, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let expires = 1_700_003_600;
        let signature = generate_download_signature("other", KEY, expires).unwrap();

        assert_eq!(
            verify_download_signature(SECRET, KEY, expires, &signature, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }
}
