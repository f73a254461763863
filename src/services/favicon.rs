//! FaviconSvc: normalize → negative cache → positive cache →
//! rate-limit gate → external fetch → generic-fallback detection →
//! write-through cache, in that order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::cache::{keys, NegativeCache, RateLimitGate, TypedCache};
use crate::cache::CacheStatus;
use crate::error::ServiceError;

use super::Served;

/// 1x1 transparent PNG, embedded so the fallback never depends on I/O.
/// Validated at startup by [`FALLBACK_PNG`]; a corrupt embed is a build
/// defect, hence the panic-on-invalid-embed policy.
const EMBEDDED_FALLBACK_PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0x7a, 0x5e, 0xab, 0x3f, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44,
    0xae, 0x42, 0x60, 0x82,
];

static FALLBACK_PNG: Lazy<Vec<u8>> = Lazy::new(|| {
    let bytes = EMBEDDED_FALLBACK_PNG_BYTES.to_vec();
    if bytes.len() < 8 || &bytes[0..8] != b"\x89PNG\r\n\x1a\n" {
        panic!("embedded favicon fallback is not a valid PNG");
    }
    bytes
});

/// MD5 digests of known "generic" icons some providers serve in place of a
/// real 404. Populated as such providers are observed; empty by default
/// means every successful fetch is trusted as-is.
static KNOWN_GENERIC_MD5: &[&str] = &[];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaviconPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FaviconPayload {
    fn fallback() -> Self {
        Self {
            bytes: FALLBACK_PNG.clone(),
            content_type: "image/png".to_string(),
        }
    }
}

#[async_trait]
pub trait FaviconFetcher: Send + Sync {
    async fn fetch(&self, host: &str) -> Result<FaviconPayload, ServiceError>;
}

pub struct ReqwestFaviconFetcher {
    client: reqwest::Client,
}

impl ReqwestFaviconFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("hateblog-favicon-fetcher/1.0")
            .build()
            .expect("reqwest client config is valid");
        Self { client }
    }
}

#[async_trait]
impl FaviconFetcher for ReqwestFaviconFetcher {
    async fn fetch(&self, host: &str) -> Result<FaviconPayload, ServiceError> {
        let url = format!("https://{host}/favicon.ico");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::DependencyUnavailable(format!(
                "favicon fetch returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?
            .to_vec();

        Ok(FaviconPayload { bytes, content_type })
    }
}

#[derive(Clone)]
pub struct FaviconSvc {
    fetcher: Arc<dyn FaviconFetcher>,
    positive_cache: TypedCache<FaviconPayload>,
    negative_cache: NegativeCache,
    rate_limit: RateLimitGate,
    ttl_positive: Duration,
    ttl_negative: Duration,
    rate_limit_window: Duration,
}

impl FaviconSvc {
    pub fn new(
        fetcher: Arc<dyn FaviconFetcher>,
        positive_cache: TypedCache<FaviconPayload>,
        negative_cache: NegativeCache,
        rate_limit: RateLimitGate,
        ttl_positive: Duration,
        ttl_negative: Duration,
        rate_limit_window: Duration,
    ) -> Self {
        Self {
            fetcher,
            positive_cache,
            negative_cache,
            rate_limit,
            ttl_positive,
            ttl_negative,
            rate_limit_window,
        }
    }

    pub async fn get(&self, domain: &str) -> Result<Served<FaviconPayload>, ServiceError> {
        let host = normalize_domain(domain)?;

        let negative_key = keys::favicon_negative(&host);
        if self.negative_cache.is_marked(&negative_key).await {
            return Ok((FaviconPayload::fallback(), CacheStatus::Hit));
        }

        let positive_key = keys::favicon_binary(&host);
        if let Some(payload) = self.positive_cache.get(&positive_key).await? {
            return Ok((payload, CacheStatus::Hit));
        }

        let rate_key = keys::favicon_rate_limit(&host);
        if !self.rate_limit.try_enter(&rate_key, self.rate_limit_window).await {
            return Err(ServiceError::RateLimited);
        }

        match self.fetcher.fetch(&host).await {
            Ok(mut payload) => {
                if is_known_generic(&payload.bytes) {
                    payload = FaviconPayload::fallback();
                }
                self.positive_cache.set(&positive_key, &payload, self.ttl_positive).await;
                Ok((payload, CacheStatus::Miss))
            }
            Err(_) => {
                self.negative_cache.mark(&negative_key, self.ttl_negative).await;
                Ok((FaviconPayload::fallback(), CacheStatus::Miss))
            }
        }
    }
}

fn is_known_generic(bytes: &[u8]) -> bool {
    if KNOWN_GENERIC_MD5.is_empty() {
        return false;
    }
    let digest = format!("{:x}", md5::compute(bytes));
    KNOWN_GENERIC_MD5.contains(&digest.as_str())
}

/// Lowercase host, strip scheme/path/userinfo/port if a full URL was given,
/// reject control/whitespace characters, strip a trailing dot.
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize_domain(input: &str) -> Result<String, ServiceError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidArgument("domain is required".to_string()));
    }
    if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ServiceError::InvalidArgument("domain contains invalid characters".to_string()));
    }

    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let host_and_port = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let without_userinfo = host_and_port.rsplit('@').next().unwrap_or(host_and_port);

    let host = without_userinfo.rsplit(':').last().unwrap_or(without_userinfo);

    if host.chars().any(|c| c == '/' || c.is_control()) {
        return Err(ServiceError::InvalidArgument("domain contains invalid characters".to_string()));
    }

    let host = host.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return Err(ServiceError::InvalidArgument("domain is required".to_string()));
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_scheme() {
        assert_eq!(normalize_domain("HTTPS://Example.com/path").unwrap(), "example.com");
    }

    #[test]
    fn normalize_strips_trailing_dot_and_port() {
        assert_eq!(normalize_domain("example.com.:8080").unwrap(), "example.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_domain("HTTP://Example.COM/").unwrap();
        let twice = normalize_domain(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_rejects_whitespace() {
        assert!(normalize_domain("exa mple.com").is_err());
    }

    #[test]
    fn normalize_rejects_empty() {
        assert!(normalize_domain("   ").is_err());
    }

    #[test]
    fn fallback_png_has_valid_signature() {
        assert_eq!(&FALLBACK_PNG[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
