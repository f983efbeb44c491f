//! GitHub webhook payload parsing and signature verification

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the GitHub payload signature
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// The subset of a GitHub push event the daemon cares about
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Git ref the push targeted, e.g. `refs/heads/master`
    #[serde(rename = "ref", default)]
    pub git_ref: String,

    /// Full commit SHA after the push
    #[serde(default = "default_commit")]
    pub after: String,
}

fn default_commit() -> String {
    "unknown".to_string()
}

impl Default for PushEvent {
    fn default() -> Self {
        Self {
            git_ref: String::new(),
            after: default_commit(),
        }
    }
}

/// Verify a GitHub `X-Hub-Signature-256` header against the raw request
/// body. The header value is `"sha256=" + hex(HMAC-SHA256(secret, body))`;
/// the comparison runs in constant time via `Mac::verify_slice`.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the signature header value for a body. Used by tests and by
/// operators re-triggering a deployment by hand.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    // new_from_slice accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// First 7 characters of a commit SHA, the form used in logs and responses
pub fn short_commit(sha: &str) -> String {
    sha.chars().take(7).collect()
}
