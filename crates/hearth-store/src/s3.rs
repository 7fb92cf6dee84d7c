//! S3-compatible storage backend.
//!
//! Talks to any S3-compatible object store (AWS S3, MinIO, Garage) over
//! its REST API with AWS Signature Version 4 request signing. Requests use
//! path-style addressing (`{endpoint}/{bucket}/{key}`) so self-hosted
//! stores work without wildcard DNS.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use hearth_core::{Error, Result};

use crate::StorageBackend;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const UNSIGNED_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Endpoint without trailing slash, e.g. `https://s3.example.com`.
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

/// S3 storage backend.
pub struct S3Backend {
    config: S3Config,
    client: Client,
}

impl S3Backend {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket,
            key
        )
    }

    fn canonical_path(&self, key: &str) -> String {
        format!("/{}/{}", self.config.bucket, key)
    }

    fn host(&self) -> String {
        let stripped = self
            .config
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        stripped.trim_end_matches('/').to_string()
    }

    async fn signed_request(
        &self,
        method: Method,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response> {
        let now = Utc::now();
        let url = self.object_url(key);
        let path = self.canonical_path(key);
        let payload_hash = sha256_hex(&body);

        let signed = sign_request(
            &self.config,
            &self.host(),
            method.as_str(),
            &path,
            &payload_hash,
            now,
        );

        let mut req = self
            .client
            .request(method, &url)
            .header("Host", self.host())
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &signed.authorization);
        if let Some(ct) = content_type {
            req = req.header("Content-Type", ct);
        }
        if !body.is_empty() {
            req = req.body(body);
        }

        Ok(req.send().await?)
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn write(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        debug!(
            subsystem = "store",
            component = "s3",
            op = "write",
            storage_key = %key,
            byte_size = data.len(),
            "Putting object"
        );
        let resp = self
            .signed_request(Method::PUT, key, data.to_vec(), Some(content_type))
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "PUT {} returned {}",
                key,
                resp.status()
            )));
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .signed_request(Method::GET, key, Vec::new(), None)
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound(format!("object {}", key))),
            s if s.is_success() => Ok(resp.bytes().await?.to_vec()),
            s => Err(Error::Storage(format!("GET {} returned {}", key, s))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let resp = self
            .signed_request(Method::DELETE, key, Vec::new(), None)
            .await?;
        // DELETE on a missing key is a no-op, matching the filesystem backend.
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(Error::Storage(format!(
                "DELETE {} returned {}",
                key,
                resp.status()
            )));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let resp = self
            .signed_request(Method::HEAD, key, Vec::new(), None)
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(Error::Storage(format!("HEAD {} returned {}", key, s))),
        }
    }

    async fn probe(&self) -> bool {
        // HEAD on the bucket root. Network errors and 5xx mean the store is
        // unreachable; 403/404 still prove the endpoint answers.
        let now = Utc::now();
        let path = format!("/{}", self.config.bucket);
        let url = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket
        );
        let payload_hash = sha256_hex(&[]);
        let signed = sign_request(&self.config, &self.host(), "HEAD", &path, &payload_hash, now);

        let result = self
            .client
            .head(&url)
            .header("Host", self.host())
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &signed.authorization)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_server_error() => {
                warn!(
                    subsystem = "store",
                    component = "s3",
                    op = "probe",
                    status = %resp.status(),
                    "Object store returned server error"
                );
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "s3",
                    op = "probe",
                    error_msg = %e,
                    "Object store unreachable"
                );
                false
            }
        }
    }

    fn kind(&self) -> &'static str {
        "s3"
    }
}

struct SignedHeaders {
    amz_date: String,
    authorization: String,
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute SigV4 headers for a request with no query string.
///
/// The signed header set is fixed to `host;x-amz-content-sha256;x-amz-date`,
/// which is all the backend ever sends besides Content-Type (deliberately
/// left unsigned for S3-compatible stores that normalize it).
fn sign_request(
    config: &S3Config,
    host: &str,
    method: &str,
    canonical_path: &str,
    payload_hash: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let signed_headers = "host;x-amz-content-sha256;x-amz-date";
    let canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        host, payload_hash, amz_date
    );
    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        method, canonical_path, canonical_headers, signed_headers, payload_hash
    );

    let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, config.region, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        UNSIGNED_ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", config.secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, config.region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        UNSIGNED_ALGORITHM, config.access_key, credential_scope, signed_headers, signature
    );

    SignedHeaders {
        amz_date,
        authorization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> S3Config {
        S3Config {
            endpoint: "https://s3.example.com".to_string(),
            region: "us-east-1".to_string(),
            bucket: "family-photos".to_string(),
            access_key: "AKIAEXAMPLE".to_string(),
            secret_key: "secretsecretsecret".to_string(),
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_object_url_is_path_style() {
        let backend = S3Backend::new(test_config());
        assert_eq!(
            backend.object_url("photos/01/1.bin"),
            "https://s3.example.com/family-photos/photos/01/1.bin"
        );
    }

    #[test]
    fn test_host_strips_scheme_and_trailing_slash() {
        let mut config = test_config();
        config.endpoint = "http://minio.local:9000/".to_string();
        let backend = S3Backend::new(config);
        assert_eq!(backend.host(), "minio.local:9000");
    }

    #[test]
    fn test_signature_is_deterministic() {
        let config = test_config();
        let hash = sha256_hex(b"payload");
        let a = sign_request(&config, "s3.example.com", "PUT", "/family-photos/k", &hash, fixed_time());
        let b = sign_request(&config, "s3.example.com", "PUT", "/family-photos/k", &hash, fixed_time());
        assert_eq!(a.authorization, b.authorization);
        assert_eq!(a.amz_date, "20250615T123000Z");
    }

    #[test]
    fn test_signature_changes_with_payload() {
        let config = test_config();
        let a = sign_request(
            &config,
            "s3.example.com",
            "PUT",
            "/family-photos/k",
            &sha256_hex(b"one"),
            fixed_time(),
        );
        let b = sign_request(
            &config,
            "s3.example.com",
            "PUT",
            "/family-photos/k",
            &sha256_hex(b"two"),
            fixed_time(),
        );
        assert_ne!(a.authorization, b.authorization);
    }

    #[test]
    fn test_authorization_header_shape() {
        let config = test_config();
        let hash = sha256_hex(&[]);
        let signed = sign_request(&config, "s3.example.com", "GET", "/family-photos/k", &hash, fixed_time());

        assert!(signed.authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIAEXAMPLE/20250615/us-east-1/s3/aws4_request"));
        assert!(signed
            .authorization
            .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));

        let sig = signed
            .authorization
            .rsplit("Signature=")
            .next()
            .unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_payload_hash_matches_known_value() {
        // SHA-256 of the empty string, as required for bodyless requests.
        assert_eq!(
            sha256_hex(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
