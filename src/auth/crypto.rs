//! RSA credential encryption for the login form
//!
//! The site hands out a fresh RSA public key (hex modulus + exponent) per
//! login attempt and expects both credential fields encrypted with PKCS#1
//! v1.5 padding, hex-encoded.

use crate::{Error, Result};
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};

/// Public key material from the key endpoint
///
/// Fetched fresh per login attempt and discarded afterwards; the server may
/// rotate keys between sessions.
#[derive(Debug, Clone)]
pub struct RsaKeyMaterial {
    /// Hex-encoded modulus
    pub modulus: String,
    /// Hex-encoded public exponent
    pub exponent: String,
}

impl RsaKeyMaterial {
    /// Extract key material from the decoded key-endpoint payload
    ///
    /// Expects `{"data":{"rsaModulus":"..","publicExponent":".."}}`; either
    /// field absent or empty is a [`Error::MissingKeyMaterial`].
    pub fn from_payload(payload: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|_| Error::missing_key_material(crate::utils::body_excerpt(payload)))?;
        let data = &value["data"];

        let field = |name: &str| {
            data.get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match (field("rsaModulus"), field("publicExponent")) {
            (Some(modulus), Some(exponent)) => Ok(Self { modulus, exponent }),
            _ => Err(Error::missing_key_material(crate::utils::body_excerpt(
                payload,
            ))),
        }
    }

    /// Encrypt a credential, returning the hex-encoded ciphertext
    pub fn encrypt(&self, credential: &str) -> Result<String> {
        let modulus = BigUint::parse_bytes(self.modulus.as_bytes(), 16).ok_or_else(|| {
            Error::missing_key_material(format!("modulus is not hex: {}", self.modulus))
        })?;
        let exponent = BigUint::parse_bytes(self.exponent.as_bytes(), 16).ok_or_else(|| {
            Error::missing_key_material(format!("exponent is not hex: {}", self.exponent))
        })?;

        let key = RsaPublicKey::new(modulus, exponent)?;
        let ciphertext = key.encrypt(
            &mut rand::thread_rng(),
            Pkcs1v15Encrypt,
            credential.as_bytes(),
        )?;
        Ok(hex::encode(ciphertext))
    }
}
