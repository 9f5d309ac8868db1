//! HMAC signing for webhooks and storage URLs
//!
//! Two unrelated callers share the same primitive. The payment processor
//! signs webhook deliveries with `t=<unix>,v1=<hex>` over
//! `"{timestamp}.{body}"`, which we verify before trusting the payload.
//! The object store trusts expiring URLs we mint by signing
//! `"{method}\n{key}\n{expires}"`; the server itself never moves file
//! bytes.

use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// How far a webhook timestamp may drift before it is rejected as a replay
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature header is malformed")]
    Malformed,
    #[error("Signature timestamp is outside the tolerance window")]
    Stale,
    #[error("Signature does not match")]
    Mismatch,
}

fn hmac_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Splits a `t=<unix>,v1=<hex>` header into its timestamp and signature
fn parse_signature_header(header: &str) -> Result<(i64, String), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signature = Some(value.to_string()),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(v1)) if !v1.is_empty() => Ok((t, v1)),
        _ => Err(SignatureError::Malformed),
    }
}

/// Computes the webhook signature header for a body at a given timestamp.
///
/// This is the sending side of the scheme; the sandbox provider and the
/// tests use it to produce deliveries the server will accept.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let message = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    format!("t={},v1={}", timestamp, hmac_hex(secret, &message))
}

/// Verifies a webhook delivery against the shared secret.
///
/// The signature covers `"{timestamp}.{body}"`, the timestamp must fall
/// within the replay tolerance window, and the comparison is constant
/// time.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
) -> Result<(), SignatureError> {
    let (timestamp, provided) = parse_signature_header(header)?;

    let drift = (Utc::now().timestamp() - timestamp).abs();
    if drift > WEBHOOK_TOLERANCE_SECS {
        return Err(SignatureError::Stale);
    }

    let message = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let expected = hmac_hex(secret, &message);

    if expected.as_bytes().ct_eq(provided.as_bytes()).into() {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds a fresh object-storage key under the given prefix
///
/// The key keeps a recognizable slug of the original file name but gets a
/// UUID in front, so two uploads of `flyer.pdf` never collide and the file
/// name cannot smuggle path separators into the key.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let mut slug: String = file_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if slug.is_empty() {
        slug = "file".to_string();
    }

    format!("{}/{}-{}", prefix, Uuid::new_v4(), slug)
}

/// Mints expiring signed URLs for the object store
///
/// The store validates `signature` against the same secret before
/// accepting a PUT or serving a GET, so a leaked URL goes dead once
/// `expires` passes.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: String,
}

impl UrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }

    fn signature(&self, method: &str, key: &str, expires: i64) -> String {
        let message = format!("{}\n{}\n{}", method, key, expires);
        hmac_hex(&self.secret, &message)
    }

    fn signed_url(&self, method: &str, key: &str, ttl: TimeDelta) -> String {
        let expires = (Utc::now() + ttl).timestamp();
        format!(
            "{}/storage/{}?expires={}&signature={}",
            self.base_url,
            key,
            expires,
            self.signature(method, key, expires)
        )
    }

    /// Signed URL the client PUTs file bytes to
    pub fn upload_url(&self, key: &str, ttl: TimeDelta) -> String {
        self.signed_url("PUT", key, ttl)
    }

    /// Signed URL the client GETs file bytes from
    pub fn download_url(&self, key: &str, ttl: TimeDelta) -> String {
        self.signed_url("GET", key, ttl)
    }

    /// Checks a signature the store presents back, for gateways that
    /// delegate validation to us
    pub fn verify(
        &self,
        method: &str,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<(), SignatureError> {
        if expires < Utc::now().timestamp() {
            return Err(SignatureError::Stale);
        }

        let expected = self.signature(method, key, expires);
        if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_roundtrip() {
        let secret = "whsec_test";
        let body = br#"{"event_type":"checkout.completed","provider_ref":"cs_1"}"#;
        let header = sign_webhook_payload(secret, Utc::now().timestamp(), body);

        assert_eq!(verify_webhook_signature(secret, &header, body), Ok(()));
    }

    #[test]
    fn test_webhook_rejects_wrong_secret() {
        let body = b"{}";
        let header = sign_webhook_payload("whsec_a", Utc::now().timestamp(), body);

        assert_eq!(
            verify_webhook_signature("whsec_b", &header, body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_webhook_rejects_tampered_body() {
        let secret = "whsec_test";
        let header = sign_webhook_payload(secret, Utc::now().timestamp(), b"original");

        assert_eq!(
            verify_webhook_signature(secret, &header, b"tampered"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_webhook_rejects_old_timestamp() {
        let secret = "whsec_test";
        let body = b"{}";
        let stale = Utc::now().timestamp() - WEBHOOK_TOLERANCE_SECS - 1;
        let header = sign_webhook_payload(secret, stale, body);

        assert_eq!(
            verify_webhook_signature(secret, &header, body),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn test_webhook_rejects_malformed_header() {
        assert_eq!(
            verify_webhook_signature("whsec_test", "not-a-header", b"{}"),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_webhook_signature("whsec_test", "t=123", b"{}"),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_webhook_signature("whsec_test", "v1=deadbeef", b"{}"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_parse_signature_header_order_insensitive() {
        let (t, v1) = parse_signature_header("v1=cafe,t=1700000000").unwrap();
        assert_eq!(t, 1_700_000_000);
        assert_eq!(v1, "cafe");
    }

    #[test]
    fn test_upload_url_shape_and_verification() {
        let signer = UrlSigner::new("https://club.example.org", "storage-secret");
        let url = signer.upload_url("documents/bylaws.pdf", TimeDelta::minutes(15));

        assert!(url.starts_with("https://club.example.org/storage/documents/bylaws.pdf?expires="));

        // Pull the parameters back out and verify them
        let query = url.split_once('?').unwrap().1;
        let mut expires = 0i64;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse().unwrap(),
                Some(("signature", v)) => signature = v.to_string(),
                _ => {}
            }
        }

        assert!(
            signer
                .verify("PUT", "documents/bylaws.pdf", expires, &signature)
                .is_ok()
        );
        // The same signature must not authorise a GET
        assert_eq!(
            signer.verify("GET", "documents/bylaws.pdf", expires, &signature),
            Err(SignatureError::Mismatch)
        );
        // Nor a different key
        assert_eq!(
            signer.verify("PUT", "documents/minutes.pdf", expires, &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_expired_url_is_rejected() {
        let signer = UrlSigner::new("https://club.example.org", "storage-secret");
        let expires = Utc::now().timestamp() - 60;
        let signature = signer.signature("GET", "photos/m42.jpg", expires);

        assert_eq!(
            signer.verify("GET", "photos/m42.jpg", expires, &signature),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn test_different_secrets_produce_different_signatures() {
        let a = UrlSigner::new("https://club.example.org", "secret-a");
        let b = UrlSigner::new("https://club.example.org", "secret-b");

        assert_ne!(
            a.signature("GET", "photos/m42.jpg", 1_700_000_000),
            b.signature("GET", "photos/m42.jpg", 1_700_000_000)
        );
    }

    #[test]
    fn test_object_key_slugs_the_file_name() {
        let key = object_key("documents", "fall flyer (final).pdf");

        assert!(key.starts_with("documents/"));
        assert!(key.ends_with("-fall-flyer--final-.pdf"));
        assert!(!key.contains(' '));
        assert!(!key.contains('('));
    }

    #[test]
    fn test_object_key_never_collides() {
        assert_ne!(
            object_key("photos", "m31.jpg"),
            object_key("photos", "m31.jpg")
        );
    }

    #[test]
    fn test_object_key_survives_a_hostile_file_name() {
        let key = object_key("documents", "../../etc/passwd");

        assert!(key.starts_with("documents/"));
        // Dots survive but separators do not
        assert!(!key[10..].contains('/'));
    }

    #[test]
    fn test_object_key_with_empty_name_still_has_a_slug() {
        let key = object_key("photos", "  ");
        assert!(key.ends_with("-file"));
    }
}
