//! RS512 session tokens.
//!
//! A token is a compact JWT, `base64url(header).base64url(claims).base64url(sig)`,
//! signed with RSASSA-PKCS1-v1_5 over SHA-512. Claims carry only the username and
//! no expiry, so a token is valid for as long as the signing key is.

use base64ct::{Base64UrlUnpadded, Encoding};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use thiserror::Error;
use utoipa::ToSchema;

pub const TOKEN_ALGORITHM: &str = "RS512";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("failed to parse RSA key")]
    KeyParse,
    #[error("failed to encode claims")]
    Encode(#[from] serde_json::Error),
    #[error("failed to sign token")]
    Signing(#[from] rsa::signature::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl TokenHeader {
    fn rs512() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// The identity asserted by a token. Built fresh per issuance.
#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
}

impl Claims {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// The service keypair, parsed once at startup and shared read-only.
pub struct TokenKeys {
    signing_key: SigningKey<Sha512>,
    verifying_key: VerifyingKey<Sha512>,
}

impl TokenKeys {
    /// Build from an RSA private key (PKCS#8 or PKCS#1, PEM or DER); the public
    /// half is derived from it.
    ///
    /// # Errors
    /// Returns `TokenError::KeyParse` if the key cannot be decoded.
    pub fn from_private_key_pem_or_der(pem_or_der: &[u8]) -> Result<Self, TokenError> {
        let private_key = decode_private_key(pem_or_der)?;
        let verifying_key = VerifyingKey::<Sha512>::new(RsaPublicKey::from(&private_key));
        Ok(Self {
            signing_key: SigningKey::<Sha512>::new(private_key),
            verifying_key,
        })
    }

    #[must_use]
    pub const fn verifying_key(&self) -> &VerifyingKey<Sha512> {
        &self.verifying_key
    }

    /// # Errors
    /// Returns an error if the claims cannot be encoded or signing fails.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        issue(claims, &self.signing_key)
    }

    /// # Errors
    /// See [`verify`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, &self.verifying_key)
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("alg", &TOKEN_ALGORITHM)
            .field("signing_key", &"***")
            .finish_non_exhaustive()
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

fn decode_private_key(pem_or_der: &[u8]) -> Result<RsaPrivateKey, TokenError> {
    if pem_or_der.starts_with(b"-----BEGIN") {
        let s = std::str::from_utf8(pem_or_der).map_err(|_| TokenError::KeyParse)?;
        let s = s.trim();
        if let Ok(k) = RsaPrivateKey::from_pkcs8_pem(s) {
            return Ok(k);
        }
        if let Ok(k) = RsaPrivateKey::from_pkcs1_pem(s) {
            return Ok(k);
        }
        return Err(TokenError::KeyParse);
    }

    if let Ok(k) = RsaPrivateKey::from_pkcs8_der(pem_or_der) {
        return Ok(k);
    }
    if let Ok(k) = RsaPrivateKey::from_pkcs1_der(pem_or_der) {
        return Ok(k);
    }
    Err(TokenError::KeyParse)
}

/// Decode an RSA public key (SPKI or PKCS#1, PEM or DER) for verification.
///
/// # Errors
/// Returns `TokenError::KeyParse` if the key cannot be decoded.
pub fn decode_public_key(pem_or_der: &[u8]) -> Result<VerifyingKey<Sha512>, TokenError> {
    let public_key = if pem_or_der.starts_with(b"-----BEGIN") {
        let s = std::str::from_utf8(pem_or_der).map_err(|_| TokenError::KeyParse)?;
        let s = s.trim();
        RsaPublicKey::from_public_key_pem(s)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(s))
            .map_err(|_| TokenError::KeyParse)?
    } else {
        RsaPublicKey::from_public_key_der(pem_or_der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(pem_or_der))
            .map_err(|_| TokenError::KeyParse)?
    };
    Ok(VerifyingKey::<Sha512>::new(public_key))
}

/// Serialize `claims` and sign them with `signing_key`.
///
/// # Errors
/// Returns an error if the claims cannot be encoded or signing fails.
pub fn issue(claims: &Claims, signing_key: &SigningKey<Sha512>) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&TokenHeader::rs512())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature: Signature = signing_key.try_sign(signing_input.as_bytes())?;
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature.to_vec());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Check structure and signature of `token` and return its claims.
///
/// # Errors
/// - `TokenError::Malformed` if the token is not three base64url parts, the
///   header or claims are not the expected JSON, or the algorithm is not RS512.
/// - `TokenError::SignatureMismatch` if the signature does not verify under
///   `verifying_key`.
pub fn verify(token: &str, verifying_key: &VerifyingKey<Sha512>) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::Malformed)?;
    let claims_b64 = parts.next().ok_or(TokenError::Malformed)?;
    let sig_b64 = parts.next().ok_or(TokenError::Malformed)?;
    if parts.next().is_some() {
        return Err(TokenError::Malformed);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(TokenError::Malformed);
    }

    let signature_bytes =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Malformed)?;
    let signature =
        Signature::try_from(signature_bytes.as_slice()).map_err(|_| TokenError::Malformed)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| TokenError::SignatureMismatch)?;

    b64d_json(claims_b64)
}
