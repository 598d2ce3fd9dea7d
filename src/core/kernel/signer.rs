use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signer trait for request authentication
///
/// Implementations must be deterministic: the same payload always yields the
/// same signature. The REST client calls this from concurrent requests, so
/// implementations must also be `Send + Sync`.
pub trait Signer: Send + Sync {
    /// Sign the canonical payload (the encoded query string without `signature`)
    fn sign(&self, payload: &str) -> String;
}

/// HMAC-SHA256 signer producing lowercase hex digests
pub struct HmacSigner {
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key: Secret::new(secret_key),
        }
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign(&self, payload: &str) -> String {
        // HMAC accepts keys of any length, so this cannot fail
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC can take key of any size"));
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
