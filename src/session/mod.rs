//! Authenticated storefront session.
//!
//! A [`Session`] owns the cookie-authenticated HTTP client and the endpoint
//! layout of the storefront. It is created once per run and passed by
//! reference to every pipeline stage.

mod client;

use std::path::Path;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use crate::auth::{load_cookie_file, load_cookies_into_jar};
use crate::error::SyncError;
use crate::purchase::PurchaseKey;

/// Storefront root used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.humblebundle.com/";

/// Default HTTP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const LIBRARY_PAGE_PATH: &str = "home/library";
const ORDER_API_PATH: &str = "api/v1/order/";
const ORDER_API_QUERY: &str = "all_tpkds=false";

/// Settings applied when a session is created.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Storefront root URL; cookies are validated against its host.
    pub base_url: Url,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Per-read idle timeout. `None` leaves the transport default.
    pub read_timeout: Option<Duration>,
}

impl SessionOptions {
    /// Options for the given storefront root with default timeouts.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
        }
    }
}

impl Default for SessionOptions {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self::with_base_url(base_url)
    }
}

/// URL layout of the storefront.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    host: String,
}

impl Endpoints {
    /// Creates the endpoint layout rooted at `base`.
    ///
    /// A missing trailing slash is added so relative joins stay under the
    /// base path.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] unless `base` is an http(s) URL with a host.
    pub fn new(mut base: Url) -> Result<Self, SyncError> {
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SyncError::invalid_url(base.as_str()));
        }
        let host = base
            .host_str()
            .ok_or_else(|| SyncError::invalid_url(base.as_str()))?
            .to_string();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base, host })
    }

    /// Storefront root.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Host the session cookies must belong to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Account library page holding the embedded purchase keys.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] if the join fails.
    pub fn library_page(&self) -> Result<Url, SyncError> {
        self.base
            .join(LIBRARY_PAGE_PATH)
            .map_err(|_| SyncError::invalid_url(format!("{}{LIBRARY_PAGE_PATH}", self.base)))
    }

    /// Purchase-detail API endpoint for one key.
    ///
    /// The key is percent-encoded as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] if the URL cannot be built.
    pub fn purchase_detail(&self, key: &PurchaseKey) -> Result<Url, SyncError> {
        let invalid = || SyncError::invalid_url(format!("{}{ORDER_API_PATH}{key}", self.base));
        let mut url = self.base.join(ORDER_API_PATH).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .push(key.as_str());
        url.set_query(Some(ORDER_API_QUERY));
        Ok(url)
    }
}

/// Cookie-authenticated storefront session.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl Session {
    /// Loads the cookie store at `cookie_store` and builds the session client.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CookieLoad`] when the file cannot be read or parsed
    /// or a storefront cookie is invalid, and [`SyncError::InvalidUrl`] /
    /// [`SyncError::Client`] for a bad base URL or client build failure.
    #[instrument(skip(options), fields(path = %cookie_store.display()))]
    pub fn initialize(cookie_store: &Path, options: &SessionOptions) -> Result<Self, SyncError> {
        let endpoints = Endpoints::new(options.base_url.clone())?;
        let cookies = load_cookie_file(cookie_store, endpoints.host())
            .map_err(|source| SyncError::cookie_load(cookie_store, source))?;
        info!(
            cookies = cookies.len(),
            host = endpoints.host(),
            "cookie store loaded"
        );

        let jar = load_cookies_into_jar(&cookies);
        let client = client::build_client(jar, options)?;
        Ok(Self { client, endpoints })
    }

    /// Storefront URL layout for this session.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Issues an authenticated GET.
    ///
    /// Only `200 OK` counts as success; the body is left unread for the
    /// caller to stream.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HttpStatus`] for any other status and
    /// [`SyncError::Network`] for transport failures.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Response, SyncError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::network(url, e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");
        if status != StatusCode::OK {
            return Err(SyncError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    /// GETs `url` and reads the whole body.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch), plus [`SyncError::Network`] when the
    /// body read fails.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let response = self.fetch(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::network(url, e))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_default_endpoints_match_storefront_layout() {
        let ep = endpoints(DEFAULT_BASE_URL);
        assert_eq!(ep.host(), "www.humblebundle.com");
        assert_eq!(
            ep.library_page().unwrap().as_str(),
            "https://www.humblebundle.com/home/library"
        );
        assert_eq!(
            ep.purchase_detail(&PurchaseKey::from("aBcD1234")).unwrap().as_str(),
            "https://www.humblebundle.com/api/v1/order/aBcD1234?all_tpkds=false"
        );
    }

    #[test]
    fn test_base_without_trailing_slash_keeps_prefix() {
        let ep = endpoints("http://127.0.0.1:8080/mirror");
        assert_eq!(
            ep.library_page().unwrap().as_str(),
            "http://127.0.0.1:8080/mirror/home/library"
        );
        assert_eq!(ep.host(), "127.0.0.1");
    }

    #[test]
    fn test_purchase_key_is_escaped_as_one_segment() {
        let ep = endpoints(DEFAULT_BASE_URL);
        let url = ep.purchase_detail(&PurchaseKey::from("a/b c")).unwrap();
        assert_eq!(url.path(), "/api/v1/order/a%2Fb%20c");
        assert_eq!(url.query(), Some("all_tpkds=false"));
    }

    #[test]
    fn test_non_http_base_rejected() {
        let result = Endpoints::new(Url::parse("file:///tmp/library").unwrap());
        assert!(matches!(result, Err(SyncError::InvalidUrl { .. })));
    }

    #[test]
    fn test_initialize_missing_cookie_file_is_cookie_load_failure() {
        let result = Session::initialize(
            Path::new("/nonexistent/cookies.txt"),
            &SessionOptions::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CookieLoad);
    }
}
