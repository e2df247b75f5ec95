use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::utils::decompression::{CompressionFormat, DecompressionService};
use crate::utils::url::UrlUtils;

/// Fetches playlist and guide content, always bypassing caches and
/// transparently decompressing the body
#[async_trait]
pub trait DecompressingHttpClient: Send + Sync {
    /// Fetch URL and return raw decompressed bytes
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>>;

    /// Fetch URL and return decompressed text content
    async fn fetch_text(&self, url: &str) -> SourceResult<String> {
        let bytes = self.fetch_bytes(url).await?;
        let content = String::from_utf8(bytes).map_err(|e| {
            SourceError::fetch(
                UrlUtils::obfuscate_credentials(url),
                format!("Failed to decode content as UTF-8: {e}"),
            )
        })?;
        debug!("Fetched {} characters of text content", content.len());
        Ok(content)
    }
}

/// Default implementation of DecompressingHttpClient using reqwest
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    pub fn new(config: &HttpConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Underlying reqwest client, shared with the reachability probe
    pub fn inner_client(&self) -> &Client {
        &self.client
    }

    async fn process_response_to_bytes(response: Response, url: &str) -> SourceResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: UrlUtils::obfuscate_credentials(url),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            SourceError::fetch(
                UrlUtils::obfuscate_credentials(url),
                format!("Failed to read response: {e}"),
            )
        })?;
        debug!("Fetched {} bytes of raw content", bytes.len());

        let compression_format = DecompressionService::detect_compression_format(&bytes);
        if compression_format != CompressionFormat::Uncompressed {
            debug!("Content is {:?} compressed, decompressing", compression_format);
        }
        DecompressionService::decompress(bytes.to_vec())
    }
}

#[async_trait]
impl DecompressingHttpClient for StandardHttpClient {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Fetching content from: {}", safe_url);

        let response = self.client.get(url).send().await.map_err(|e| {
            SourceError::fetch(
                safe_url.clone(),
                UrlUtils::obfuscate_credentials(&e.to_string()),
            )
        })?;

        Self::process_response_to_bytes(response, url).await
    }
}
