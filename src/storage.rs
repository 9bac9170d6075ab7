// =============================================================================
// Blob-store client — HMAC-SHA256 shared-key signed GETs
// =============================================================================
//
// Thin HTTPS client for the upstream price-history store. Blobs are addressed
// as `{endpoint}/{container}/{blob_prefix}/{SYMBOL}.json`. When an access key
// is configured every request carries a date header and
//
//   Authorization: SharedKey {account}:{hex(HMAC-SHA256(key, "GET\n{date}\n{path}"))}
//
// SECURITY: the access key is never logged or serialized.
// =============================================================================

use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Date header carried by every request and covered by the signature.
const DATE_HEADER: &str = "x-hel-date";

/// Upstream blob store client.
#[derive(Clone)]
pub struct StorageClient {
    account: String,
    endpoint: String,
    container: String,
    blob_prefix: String,
    access_key: Option<String>,
    client: reqwest::Client,
}

impl StorageClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client. `access_key` of `None` sends unsigned requests
    /// (anonymous-read stores, local test gateways).
    pub fn new(cfg: &StorageConfig, access_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        debug!(
            endpoint = %cfg.endpoint,
            container = %cfg.container,
            signed = access_key.is_some(),
            "StorageClient initialised"
        );

        Self {
            account: cfg.account.clone(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            container: cfg.container.clone(),
            blob_prefix: cfg.blob_prefix.clone(),
            access_key,
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Signing helpers
    // -------------------------------------------------------------------------

    /// Produce an HMAC-SHA256 hex signature of `string_to_sign`.
    fn sign(key: &str, string_to_sign: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key size");
        mac.update(string_to_sign.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Store path of the blob holding `symbol`'s price history.
    fn blob_path(&self, symbol: &str) -> String {
        format!("/{}/{}/{}.json", self.container, self.blob_prefix, symbol)
    }

    // -------------------------------------------------------------------------
    // Fetch
    // -------------------------------------------------------------------------

    /// GET the raw price-history blob for `symbol`.
    ///
    /// # Errors
    /// - `StorageError::BlobNotFound` on upstream 404.
    /// - `StorageError::Status` on any other non-success status.
    /// - `StorageError::Transport` on connection/timeout failures.
    pub async fn fetch_blob(&self, symbol: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.blob_path(symbol);
        let url = format!("{}{}", self.endpoint, path);
        let date = chrono::Utc::now().to_rfc2822();

        let mut request = self.client.get(&url).header(DATE_HEADER, &date);
        if let Some(key) = &self.access_key {
            let signature = Self::sign(key, &format!("GET\n{date}\n{path}"));
            request = request.header(
                AUTHORIZATION,
                format!("SharedKey {}:{}", self.account, signature),
            );
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            warn!(%path, "blob not found upstream");
            return Err(StorageError::BlobNotFound(path));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!(%path, size = bytes.len(), "blob downloaded");
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> StorageClient {
        StorageClient::new(&StorageConfig::default(), key.map(String::from))
    }

    #[test]
    fn blob_path_layout() {
        let c = client(None);
        assert_eq!(
            c.blob_path("MSFT"),
            "/price-history/iex-price-history/MSFT.json"
        );
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let cfg = StorageConfig {
            endpoint: "https://example.net/".into(),
            ..StorageConfig::default()
        };
        let c = StorageClient::new(&cfg, None);
        assert_eq!(c.endpoint, "https://example.net");
    }

    #[test]
    fn sign_matches_rfc4231_vector() {
        // RFC 4231 test case 2.
        let sig = StorageClient::sign("Jefe", "what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn sign_is_key_dependent() {
        let a = StorageClient::sign("key-a", "GET\ndate\n/path");
        let b = StorageClient::sign("key-b", "GET\ndate\n/path");
        assert_ne!(a, b);
    }
}
