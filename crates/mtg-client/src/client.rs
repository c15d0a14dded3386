//! Image API client.

use std::time::Duration;

use mtg_blocks::{ImageLookup, ImageRef};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::error::ClientError;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Path segment encoding: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Error payload returned by the API.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Blocking client for the image API.
///
/// Requests carry `Authorization: Bearer <token>` when a token is set.
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (trailing slashes are ignored)
    /// * `token` - Bearer token, if the API requires authentication
    /// * `timeout` - Global timeout for each request
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        }
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List images uploaded by the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, error status or malformed JSON.
    pub fn list_own_images(&self) -> Result<Vec<ImageRef>, ClientError> {
        let url = format!("{}/images", self.base_url);

        info!("Listing own images");

        let (status, body) = self.get(&url)?;
        if status >= 400 {
            return Err(response_error(status, &body));
        }

        let images: Vec<ImageRef> = serde_json::from_str(&body)?;
        info!("Found {} own images", images.len());
        Ok(images)
    }

    /// Fetch an image by its `{owner}/{name}` path.
    ///
    /// Returns `Ok(None)` when the server answers 404.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, other error statuses or
    /// malformed JSON.
    pub fn fetch_image(&self, path: &str) -> Result<Option<ImageRef>, ClientError> {
        let url = image_url(&self.base_url, path);

        debug!(path, "Fetching image");

        let (status, body) = self.get(&url)?;
        if status == 404 {
            return Ok(None);
        }
        if status >= 400 {
            return Err(response_error(status, &body));
        }

        Ok(Some(serde_json::from_str(&body)?))
    }

    fn get(&self, url: &str) -> Result<(u16, String), ClientError> {
        let mut request = self.agent.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call()?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read response body)".to_owned());

        Ok((status, body))
    }
}

impl ImageLookup for ApiClient {
    fn fetch_image_by_path(&self, path: &str) -> Option<ImageRef> {
        match self.fetch_image(path) {
            Ok(image) => image,
            Err(e) => {
                warn!(path, error = %e, "Image lookup failed");
                None
            }
        }
    }
}

/// URL of the single-image endpoint for `path`.
fn image_url(base_url: &str, path: &str) -> String {
    format!(
        "{base_url}/images/{}",
        utf8_percent_encode(path, SEGMENT_ENCODE_SET)
    )
}

/// Build an [`ClientError::HttpResponse`], preferring the API's `error` field.
fn response_error(status: u16, body: &str) -> ClientError {
    let body = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.to_owned(), |parsed| parsed.error);
    ClientError::HttpResponse { status, body }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use pretty_assertions::assert_eq;

    use super::*;

    /// Answer a single request with `status` and `body`; the handle yields the raw request head.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn client(base_url: &str, token: Option<&str>) -> ApiClient {
        ApiClient::new(base_url, token.map(str::to_owned), Duration::from_secs(5))
    }

    #[test]
    fn test_fetch_image_found() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"id":"7","path":"u2/q1.png","url":"https://s/q1?sig=x"}"#,
        );

        let image = client(&base_url, Some("secret")).fetch_image("u2/q1.png").unwrap();
        let request = server.join().unwrap();

        assert_eq!(image, Some(ImageRef::new("7", "u2/q1.png", "https://s/q1?sig=x")));
        assert!(request.starts_with("GET /images/u2%2Fq1.png HTTP/1.1\r\n"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret\r\n"));
    }

    #[test]
    fn test_fetch_image_not_found() {
        let (base_url, server) = serve_once("404 Not Found", r#"{"error":"Image not found"}"#);

        let image = client(&base_url, None).fetch_image("u2/missing.png").unwrap();
        server.join().unwrap();

        assert_eq!(image, None);
    }

    #[test]
    fn test_fetch_image_server_error() {
        let (base_url, server) = serve_once("500 Internal Server Error", r#"{"error":"db down"}"#);

        let error = client(&base_url, None).fetch_image("u2/q1.png").unwrap_err();
        server.join().unwrap();

        let ClientError::HttpResponse { status, body } = error else {
            panic!("expected HttpResponse");
        };
        assert_eq!(status, 500);
        assert_eq!(body, "db down");
    }

    #[test]
    fn test_fetch_image_malformed_json() {
        let (base_url, server) = serve_once("200 OK", "{not json");

        let error = client(&base_url, None).fetch_image("u2/q1.png").unwrap_err();
        server.join().unwrap();

        assert!(matches!(error, ClientError::Json(_)));
    }

    #[test]
    fn test_list_own_images() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"[{"id":"1","path":"u1/a.png","url":"https://s/a"},{"id":"2","path":"u1/b.png","url":"https://s/b"}]"#,
        );

        let images = client(&format!("{base_url}/"), None).list_own_images().unwrap();
        let request = server.join().unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[1].path, "u1/b.png");
        assert!(request.starts_with("GET /images HTTP/1.1\r\n"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_list_own_images_forbidden() {
        let (base_url, server) = serve_once("403 Forbidden", r#"{"error":"Forbidden"}"#);

        let error = client(&base_url, Some("expired")).list_own_images().unwrap_err();
        server.join().unwrap();

        assert_eq!(error.to_string(), "HTTP error: 403 - Forbidden");
    }

    #[test]
    fn test_lookup_server_error_yields_none() {
        let (base_url, server) = serve_once("500 Internal Server Error", r#"{"error":"db down"}"#);

        let image = client(&base_url, None).fetch_image_by_path("u2/q1.png");
        server.join().unwrap();

        assert!(image.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://api.test/", None, Duration::from_secs(1));
        assert_eq!(client.base_url(), "https://api.test");
    }

    #[test]
    fn test_image_url_encodes_slash() {
        assert_eq!(
            image_url("https://api.test", "u2/q1.png"),
            "https://api.test/images/u2%2Fq1.png"
        );
    }

    #[test]
    fn test_image_url_keeps_unreserved_marks() {
        assert_eq!(
            image_url("https://api.test", "u2/a-b_c.d!~*'().png"),
            "https://api.test/images/u2%2Fa-b_c.d!~*'().png"
        );
    }

    #[test]
    fn test_image_url_encodes_spaces_and_unicode() {
        assert_eq!(
            image_url("https://api.test", "u2/売上 q1.png"),
            "https://api.test/images/u2%2F%E5%A3%B2%E4%B8%8A%20q1.png"
        );
    }

    #[test]
    fn test_response_error_uses_error_field() {
        let error = response_error(403, r#"{"error":"Forbidden"}"#);
        let ClientError::HttpResponse { status, body } = error else {
            panic!("expected HttpResponse");
        };
        assert_eq!(status, 403);
        assert_eq!(body, "Forbidden");
    }

    #[test]
    fn test_response_error_falls_back_to_raw_body() {
        let error = response_error(502, "Bad Gateway");
        assert_eq!(error.to_string(), "HTTP error: 502 - Bad Gateway");
    }

    #[test]
    fn test_image_json_shape() {
        let image: ImageRef =
            serde_json::from_str(r#"{"id":"7","path":"u2/q1.png","url":"https://s/q1?sig=x"}"#)
                .unwrap();
        assert_eq!(image, ImageRef::new("7", "u2/q1.png", "https://s/q1?sig=x"));
    }

    #[test]
    fn test_lookup_unreachable_server_yields_none() {
        let client = ApiClient::new("http://127.0.0.1:9", None, Duration::from_millis(200));
        assert!(client.fetch_image_by_path("u2/q1.png").is_none());
    }
}
