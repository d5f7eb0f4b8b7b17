//! HMAC-SHA256 signed URLs for stored objects.
//!
//! A signed URL has the shape
//! `<base>/storage/<bucket>/<path>?expires=<unix>&signature=<hex>` where the
//! signature covers `"<bucket>/<path>\n<expires>"`. A URL is valid while
//! `now < expires`.

use crate::material::SignedFileReference;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use lectern_core::{AppError, AppResult};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a signed URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signature does not match the bucket, path and expiry
    #[error("signature does not match")]
    Invalid,
    /// Signature is valid but the expiry has passed
    #[error("link has expired")]
    Expired,
}

/// The parts of a URL issued by [`UrlSigner::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLocation {
    pub bucket: String,
    /// Object path, percent-decoded
    pub path: String,
    pub expires: i64,
    pub signature: String,
}

/// Signs and verifies object URLs with a shared secret.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: Url,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Create a signer for URLs served under `base_url`.
    pub fn new(secret: impl AsRef<[u8]>, base_url: &str) -> AppResult<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(AppError::Config("URL signing secret cannot be empty".to_string()));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid public base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Public base URL cannot carry paths: {}",
                base_url
            )));
        }

        Ok(Self { secret, base_url })
    }

    /// Hex signature for `bucket`/`path` expiring at `expires` (unix seconds).
    pub fn signature(&self, bucket: &str, path: &str, expires: i64) -> AppResult<String> {
        let mac = self.mac(bucket, path, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Sign `bucket`/`path` for `ttl` starting at `now`.
    pub fn sign(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<SignedFileReference> {
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AppError::Config(format!("Signed URL TTL too large: {:?}", ttl)))?;
        let expires = now.timestamp() + ttl_secs;
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or_else(|| AppError::Storage(format!("Invalid expiry timestamp: {}", expires)))?;

        let signature = self.signature(bucket, path, expires)?;

        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("Public base URL cannot carry paths".to_string()))?;
            segments.pop_if_empty().push("storage").push(bucket);
            segments.extend(path.split('/'));
        }
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);

        Ok(SignedFileReference {
            url: url.to_string(),
            expires_at,
        })
    }

    /// Check a signature and expiry presented at `now`.
    pub fn verify(
        &self,
        bucket: &str,
        path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;
        let mac = self
            .mac(bucket, path, expires)
            .map_err(|_| SignatureError::Invalid)?;
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if now.timestamp() >= expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    /// Split a URL under `<base>/storage/` into its signed parts.
    ///
    /// Returns `None` for any other origin or path prefix, or when the
    /// `expires`/`signature` parameters are missing. The signature itself is
    /// not checked here.
    pub fn locate(&self, reference: &str) -> Option<SignedLocation> {
        let url = Url::parse(reference).ok()?;
        if url.origin() != self.base_url.origin() {
            return None;
        }

        let mut segments = url.path_segments()?;
        let prefix = self
            .base_url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .chain(std::iter::once("storage"));
        for expected in prefix {
            if segments.next()? != expected {
                return None;
            }
        }

        let bucket = decode_segment(segments.next()?)?;
        let path = segments
            .map(decode_segment)
            .collect::<Option<Vec<_>>>()?
            .join("/");
        if bucket.is_empty() || path.is_empty() {
            return None;
        }

        let mut expires = None;
        let mut signature = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "expires" => expires = value.parse().ok(),
                "signature" => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        Some(SignedLocation {
            bucket,
            path,
            expires: expires?,
            signature: signature?,
        })
    }

    fn mac(&self, bucket: &str, path: &str, expires: i64) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Config(format!("Invalid URL signing secret: {}", e)))?;
        mac.update(format!("{}/{}\n{}", bucket, path, expires).as_bytes());
        Ok(mac)
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
