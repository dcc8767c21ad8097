// ABOUTME: Single-attempt resource fetching used by every transport strategy.
// ABOUTME: Handles status checks, content-length limits, and charset decoding of feed bodies.

use std::collections::HashMap;

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::TransportError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Matches the encoding pseudo-attribute of an XML declaration.
static XML_ENCODING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#)
        .expect("valid xml encoding regex")
});

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    /// URL the attempt requested.
    pub url: String,
    /// URL of the response after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text using the content-type charset, the XML
    /// declaration, or detection, in that order.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes to a String.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let label = content_type
        .and_then(extract_charset)
        .or_else(|| xml_declared_encoding(body));

    if let Some(label) = label {
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Reads `encoding="..."` from a leading XML declaration.
fn xml_declared_encoding(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(256)];
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    XML_ENCODING_RE
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_lowercase())
}

/// Performs one GET request against `url`.
///
/// Any transport error, a non-2xx status, or an oversized body is reported as a
/// `Network` error. Nothing is retried here.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, TransportError> {
    if url.is_empty() {
        return Err(TransportError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        TransportError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(TransportError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.get(parsed_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| {
        TransportError::network(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::network(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(TransportError::network(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response.bytes().await.map_err(|e| {
        TransportError::network(
            url,
            "Fetch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(TransportError::network(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn create_test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed.xml");
            then.status(200)
                .header("content-type", "application/rss+xml; charset=utf-8")
                .body("<rss/>");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/feed.xml"), &FetchOptions::default()).await;
        mock.assert();

        let result = result.expect("fetch should succeed");
        assert_eq!(result.status, 200);
        assert_eq!(result.text_utf8(), "<rss/>");
    }

    #[tokio::test]
    async fn test_fetch_accepts_any_success_status() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed.xml");
            then.status(203).body("<feed/>");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/feed.xml"), &FetchOptions::default()).await;
        mock.assert();

        assert_eq!(result.expect("2xx is a success").status, 203);
    }

    #[tokio::test]
    async fn test_fetch_non_success_rejected() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not found");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/missing"), &FetchOptions::default()).await;
        mock.assert();

        let err = result.expect_err("should fail on 404");
        assert!(err.is_network());
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_sends_custom_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed").header("x-test", "yes");
            then.status(200).body("ok");
        });

        let mut headers = HashMap::new();
        headers.insert("x-test".to_string(), "yes".to_string());
        let opts = FetchOptions { headers };

        let client = create_test_client();
        let result = fetch(&client, &server.url("/feed"), &opts).await;
        mock.assert();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_scheme() {
        let client = create_test_client();
        let err = fetch(&client, "ftp://example.com/feed.xml", &FetchOptions::default())
            .await
            .expect_err("ftp is not supported");
        assert!(err.is_invalid_url());

        let err = fetch(&client, "", &FetchOptions::default())
            .await
            .expect_err("empty url");
        assert!(err.is_invalid_url());
    }

    #[test]
    fn test_max_content_length_constant() {
        assert_eq!(MAX_CONTENT_LENGTH, 10 * 1024 * 1024);
    }

    #[test]
    fn test_decode_iso_8859_1_from_xml_declaration() {
        let mut body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><t>caf".to_vec();
        body.push(0xe9);
        body.extend_from_slice(b"</t>");

        let decoded = decode_body(&body, Some("application/xml"));
        assert!(decoded.ends_with("caf\u{e9}</t>"));
    }

    #[test]
    fn test_header_charset_wins_over_declaration() {
        let body = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><t>caf\u{e9}</t>".as_bytes();
        let decoded = decode_body(body, Some("text/xml; charset=utf-8"));
        assert!(decoded.ends_with("caf\u{e9}</t>"));
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/xml; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("application/atom+xml"), None);
    }

    #[test]
    fn test_xml_declared_encoding() {
        assert_eq!(
            xml_declared_encoding(b"<?xml version='1.0' encoding='windows-1252'?><rss/>"),
            Some("windows-1252".to_string())
        );
        assert_eq!(xml_declared_encoding(b"<?xml version=\"1.0\"?><rss/>"), None);
        assert_eq!(xml_declared_encoding(b"<rss/>"), None);
    }
}
