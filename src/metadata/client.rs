//! HTTP client used to fetch link targets

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

/// Time allowed to set up a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for a whole request, body included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirects followed before giving up
const MAX_REDIRECTS: usize = 1;

/// Errors while talking to a link target
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or protocol problems
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The target answered, but not with a success
    #[error("Unexpected status: {0}")]
    Status(u16),
}

/// Response headers of interest from a `HEAD` request
#[derive(Clone, Debug)]
pub struct PageHead {
    /// HTTP status code
    pub status: u16,

    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
}

impl PageHead {
    /// 2xx status?
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Does the page claim to be HTML?
    ///
    /// Servers that do not send a content type get the benefit of the doubt
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_none_or(|content_type| {
            let mime = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();

            mime == "text/html" || mime == "application/xhtml+xml"
        })
    }

    /// `charset` parameter of the content type, if any
    pub fn charset(&self) -> Option<&str> {
        self.content_type
            .as_deref()?
            .split(';')
            .skip(1)
            .filter_map(|parameter| parameter.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"'))
            .filter(|value| !value.is_empty())
    }
}

/// Fetch pages over HTTP
pub trait PageClient: Send + Sync + 'static {
    /// Headers only
    fn head(
        &self,
        url: &Url,
        user_agent: &str,
    ) -> impl Future<Output = Result<PageHead, FetchError>> + Send;

    /// Body of a `GET`, truncated to at most `max_bytes`
    fn get_capped(
        &self,
        url: &Url,
        max_bytes: usize,
        user_agent: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// [`PageClient`] on top of `reqwest`
#[derive(Clone, Debug)]
pub struct HttpPageClient {
    client: Client,
}

impl HttpPageClient {
    /// Create a client with short timeouts and a single redirect hop
    ///
    /// # Errors
    ///
    /// Will return `Err` when the TLS backend can not be initialized
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl PageClient for HttpPageClient {
    async fn head(&self, url: &Url, user_agent: &str) -> Result<PageHead, FetchError> {
        let response = self
            .client
            .head(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        Ok(PageHead {
            status: response.status().as_u16(),
            content_type,
        })
    }

    async fn get_capped(
        &self,
        url: &Url,
        max_bytes: usize,
        user_agent: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mut body = Vec::with_capacity(max_bytes.min(16 * 1024));

        while let Some(chunk) = response.chunk().await? {
            let remaining = max_bytes - body.len();

            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::debug!("Body of {url} truncated at {max_bytes} bytes");
                break;
            }

            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::response::Redirect;
    use axum::routing::get;
    use tokio::net::TcpListener;

    use super::*;
    use crate::metadata::MAX_BODY_BYTES;

    const BIG_BODY_BYTES: usize = 1024 * 1024;

    /// Serve a big page and a couple of redirects to it on a random local port
    async fn serve_pages() -> SocketAddr {
        let app = Router::new()
            .route(
                "/big",
                get(|| async {
                    (
                        [(axum::http::header::CONTENT_TYPE, "text/html")],
                        "a".repeat(BIG_BODY_BYTES),
                    )
                }),
            )
            .route("/one-hop", get(|| async { Redirect::temporary("/big") }))
            .route("/two-hops", get(|| async { Redirect::temporary("/one-hop") }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        address
    }

    fn url(address: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{address}{path}")).unwrap()
    }

    fn head(content_type: Option<&str>) -> PageHead {
        PageHead {
            status: 200,
            content_type: content_type.map(ToString::to_string),
        }
    }

    #[test]
    fn test_is_html() {
        assert!(head(Some("text/html")).is_html());
        assert!(head(Some("text/html; charset=UTF-8")).is_html());
        assert!(head(Some("Application/XHTML+XML")).is_html());
        assert!(head(None).is_html());

        assert!(!head(Some("application/pdf")).is_html());
        assert!(!head(Some("image/png")).is_html());
        assert!(!head(Some("application/json; charset=utf-8")).is_html());
    }

    #[test]
    fn test_charset() {
        assert_eq!(
            Some("ISO-8859-1"),
            head(Some("text/html; charset=ISO-8859-1")).charset()
        );
        assert_eq!(
            Some("windows-1252"),
            head(Some("text/html;Charset=\"windows-1252\"")).charset()
        );
        assert_eq!(None, head(Some("text/html")).charset());
        assert_eq!(None, head(Some("text/html; charset=")).charset());
        assert_eq!(None, head(None).charset());
    }

    #[test]
    fn test_is_success() {
        assert!(head(None).is_success());

        let not_found = PageHead {
            status: 404,
            content_type: None,
        };
        assert!(!not_found.is_success());
    }

    #[tokio::test]
    async fn test_body_is_capped() {
        let address = serve_pages().await;
        let client = HttpPageClient::new().unwrap();

        let head = client.head(&url(address, "/big"), "TestBot").await.unwrap();
        assert!(head.is_success());
        assert!(head.is_html());

        let body = client
            .get_capped(&url(address, "/big"), MAX_BODY_BYTES, "TestBot")
            .await
            .unwrap();

        assert_eq!(MAX_BODY_BYTES, body.len());
        assert!(body.iter().all(|byte| *byte == b'a'));
    }

    #[tokio::test]
    async fn test_single_redirect_is_followed() {
        let address = serve_pages().await;
        let client = HttpPageClient::new().unwrap();

        let body = client
            .get_capped(&url(address, "/one-hop"), MAX_BODY_BYTES, "TestBot")
            .await
            .unwrap();

        assert_eq!(MAX_BODY_BYTES, body.len());
    }

    #[tokio::test]
    async fn test_second_redirect_is_refused() {
        let address = serve_pages().await;
        let client = HttpPageClient::new().unwrap();

        let result = client
            .get_capped(&url(address, "/two-hops"), MAX_BODY_BYTES, "TestBot")
            .await;

        assert!(matches!(result, Err(FetchError::Request(err)) if err.is_redirect()));
    }
}
